use std::str::FromStr;
use thiserror::Error;

/// 設定関連のエラー型
/// 設定ファイルや設定値の検証に関するエラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 設定値が不正
    #[error("設定値が不正です: {reason}")]
    InvalidValue { reason: String },

    /// 設定ファイルが見つからない
    #[error("設定ファイルが見つかりません: {path}")]
    MissingConfigFile { path: String },
}

impl ConfigError {
    /// 不正な設定値エラーを作成
    pub fn invalid_value<R: Into<String>>(reason: R) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// 設定ファイル不足エラーを作成
    pub fn missing_config_file<P: Into<String>>(path: P) -> Self {
        Self::MissingConfigFile { path: path.into() }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:news.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// 空白のみの値は未設定として扱う
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub classifier_timeout_secs: u64,
    pub feed_timeout_secs: u64,
    pub feed_entry_limit: usize,
    /// 未指定時は組み込みの3フィードを使う
    pub feeds_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            classifier_timeout_secs: 10,
            feed_timeout_secs: 30,
            feed_entry_limit: 5,
            feeds_file: None,
        }
    }
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    /// .envは呼び出し側（main）で読み込み済みであること
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            database_url: text("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: text("BIND_ADDR").unwrap_or(defaults.bind_addr),
            openai_api_key: text("OPENAI_API_KEY"),
            openai_base_url: text("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_model: text("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            classifier_timeout_secs: parse_number(
                "CLASSIFIER_TIMEOUT_SECS",
                text("CLASSIFIER_TIMEOUT_SECS"),
                defaults.classifier_timeout_secs,
            )?,
            feed_timeout_secs: parse_number(
                "FEED_TIMEOUT_SECS",
                text("FEED_TIMEOUT_SECS"),
                defaults.feed_timeout_secs,
            )?,
            feed_entry_limit: parse_number(
                "FEED_ENTRY_LIMIT",
                text("FEED_ENTRY_LIMIT"),
                defaults.feed_entry_limit,
            )?,
            feeds_file: text("FEEDS_FILE"),
        })
    }

    /// モデル分類器を使える資格情報があるか
    pub fn has_classifier_credential(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn parse_number<T: FromStr>(name: &str, value: Option<String>, default: T) -> ConfigResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            ConfigError::invalid_value(format!("{}は数値である必要があります: {}", name, raw))
        }),
    }
}
