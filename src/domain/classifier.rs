use crate::domain::category::Category;
use crate::infra::api::openai::ChatCompletionClient;
use crate::types::{AppConfig, ClassificationError};
use async_trait::async_trait;

/// 記事テキストを6カテゴリのいずれかに分類する
///
/// 実装は常にカテゴリを1つ返す。外部サービスの失敗などは実装内で吸収すること。
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Category;
}

/// キーワード表（上から順に評価し、最初に一致した規則を採用）
///
/// キーワードは単語の先頭一致で照合する（"router"は"routers"にも一致）。
const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (
        Category::Cybersecurity,
        &[
            "security", "cyber", "hack", "breach", "malware", "ransomware", "phishing",
            "vulnerab", "exploit", "zero day", "cve", "spyware", "botnet", "ddos", "backdoor",
            "infosec", "password",
        ],
    ),
    (
        Category::CloudComputing,
        &[
            "cloud", "aws", "azure", "kubernetes", "serverless", "saas", "data center",
            "datacenter", "hyperscale", "virtualiz",
        ],
    ),
    (
        Category::Networking,
        &[
            "network", "router", "5g", "wifi", "wi fi", "ethernet", "broadband", "bandwidth",
            "isp", "dns", "fiber", "starlink", "vpn", "ipv6", "bgp", "cisco",
        ],
    ),
    (
        Category::SoftwareDevelopment,
        &[
            "programming", "programmer", "developer", "software", "code", "coding", "github",
            "gitlab", "git", "python", "rust", "javascript", "typescript", "java", "golang",
            "compiler", "api", "sdk", "framework", "open source", "devops",
        ],
    ),
    (
        Category::Hardware,
        &[
            "chip", "cpu", "gpu", "processor", "semiconductor", "intel", "amd", "nvidia",
            "qualcomm", "motherboard", "ssd", "dram", "ddr", "laptop", "smartphone", "phone",
            "iphone", "pc", "graphics card", "raspberry pi", "tablet", "hardware",
        ],
    ),
];

// 小文字化し、英数字以外を空白1つに畳んだ文字列（先頭に空白を付ける）
fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {}", words.join(" "))
}

/// キーワード表による決定的な分類
/// どの規則にも一致しなければGeneral IT News
pub fn classify_by_keywords(text: &str) -> Category {
    let normalized = normalize_text(text);

    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|keyword| normalized.contains(&format!(" {}", keyword)))
        })
        .map(|(category, _)| *category)
        .unwrap_or(Category::GeneralItNews)
}

/// キーワード表による分類器（外部依存なし）
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> Category {
        classify_by_keywords(text)
    }
}

/// 外部モデルによる分類器
#[derive(Debug)]
pub struct ModelClassifier {
    client: ChatCompletionClient,
    instruction: String,
}

impl ModelClassifier {
    pub fn new(client: ChatCompletionClient) -> Self {
        let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        let instruction = format!(
            "You are a tech news classifier. Classify the given news title/summary into exactly \
             one of these categories: {}. Return ONLY the category name. Do not add punctuation \
             or explanations.",
            labels.join(", ")
        );
        Self {
            client,
            instruction,
        }
    }

    /// 外部サービスに問い合わせ、回答をカテゴリとして検証する
    /// 6値以外の回答は`MalformedResponse`
    pub async fn try_classify(&self, text: &str) -> Result<Category, ClassificationError> {
        let answer = self.client.complete(&self.instruction, text).await?;
        Category::parse_loose(&answer).ok_or_else(|| {
            ClassificationError::malformed(format!("カテゴリ外の回答: {}", answer.trim()))
        })
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    fn name(&self) -> &str {
        "model"
    }

    async fn classify(&self, text: &str) -> Category {
        if text.trim().is_empty() {
            return Category::GeneralItNews;
        }

        match self.try_classify(text).await {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!(model = %self.client.model(), error = %e, "モデル分類に失敗したためGeneral IT Newsで代用");
                Category::GeneralItNews
            }
        }
    }
}

/// 起動時に一度だけ選ぶ分類戦略
#[derive(Debug)]
pub enum ClassifierStrategy {
    Model(ModelClassifier),
    Keyword(KeywordClassifier),
}

impl ClassifierStrategy {
    /// APIキーが設定されていればモデル分類、なければキーワード分類
    pub fn from_config(config: &AppConfig) -> Self {
        match config.openai_api_key.as_deref() {
            Some(api_key) => {
                tracing::info!(model = %config.openai_model, "分類器: モデル分類を使用");
                Self::Model(ModelClassifier::new(ChatCompletionClient::new(
                    api_key,
                    &config.openai_base_url,
                    &config.openai_model,
                    config.classifier_timeout_secs,
                )))
            }
            None => {
                tracing::info!("APIキー未設定のため分類器: キーワード分類を使用");
                Self::Keyword(KeywordClassifier)
            }
        }
    }

    pub fn keyword() -> Self {
        Self::Keyword(KeywordClassifier)
    }
}

#[async_trait]
impl Classifier for ClassifierStrategy {
    fn name(&self) -> &str {
        match self {
            Self::Model(c) => c.name(),
            Self::Keyword(c) => c.name(),
        }
    }

    async fn classify(&self, text: &str) -> Category {
        match self {
            Self::Model(c) => c.classify(text).await,
            Self::Keyword(c) => c.classify(text).await,
        }
    }
}
