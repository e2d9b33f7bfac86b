use crate::{
    domain::{
        article::{classification_text, ArticleStore, NewArticle},
        classifier::Classifier,
        feed::Feed,
        rss::{collect_feeds, FetchOptions, RawEntry},
    },
    infra::{api::http::HttpClient, parser::normalize},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// 取り込み1回分の集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    /// 成功したソースから取得した記事数
    pub fetched: usize,
    pub saved: usize,
    pub skipped_duplicates: usize,
    /// ソース単位・記事単位の失敗（1件1行）
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestionReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            fetched: 0,
            saved: 0,
            skipped_duplicates: 0,
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }
}

impl std::fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "取得{}件 / 新規保存{}件 / 重複スキップ{}件 / エラー{}件",
            self.fetched,
            self.saved,
            self.skipped_duplicates,
            self.errors.len()
        )
    }
}

/// 取得 → 日付正規化 → 分類 → 保存 の取り込み処理
///
/// 依存はすべて外から注入する。`run_ingestion`自体は失敗せず、
/// 失敗はレポートの`errors`に集約される。
pub struct IngestionPipeline {
    http: Arc<dyn HttpClient>,
    classifier: Arc<dyn Classifier>,
    store: ArticleStore,
    feeds: Vec<Feed>,
    options: FetchOptions,
}

impl IngestionPipeline {
    pub fn new(
        http: Arc<dyn HttpClient>,
        classifier: Arc<dyn Classifier>,
        store: ArticleStore,
        feeds: Vec<Feed>,
        options: FetchOptions,
    ) -> Self {
        Self {
            http,
            classifier,
            store,
            feeds,
            options,
        }
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// 全ソースを取り込み、集計結果を返す
    pub async fn run_ingestion(&self) -> IngestionReport {
        let mut report = IngestionReport::start();
        tracing::info!(
            feeds = self.feeds.len(),
            classifier = self.classifier.name(),
            "=== 取り込み開始 ==="
        );

        // 段階1: フィード取得（失敗したソースはスキップ）
        let collection = collect_feeds(self.http.as_ref(), &self.feeds, &self.options).await;
        report.errors.extend(collection.failures.iter().map(|e| e.to_string()));
        report.fetched = collection.entries.len();

        // 段階2: 記事ごとに正規化・分類・保存
        for entry in collection.entries {
            let url = entry.url.clone();
            let article = self.build_article(entry).await;

            match self.store.save(&article).await {
                Ok(outcome) if outcome.inserted => {
                    tracing::debug!(url = %url, category = %article.category, "記事を保存");
                    report.saved += 1;
                }
                Ok(_) => {
                    tracing::debug!(url = %url, "保存済みのためスキップ");
                    report.skipped_duplicates += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "記事の保存に失敗");
                    report.errors.push(format!("{}: {}", url, e));
                }
            }
        }

        report.finished_at = Utc::now();
        tracing::info!(
            fetched = report.fetched,
            saved = report.saved,
            skipped_duplicates = report.skipped_duplicates,
            errors = report.errors.len(),
            "=== 取り込み完了 ==="
        );
        report
    }

    async fn build_article(&self, entry: RawEntry) -> NewArticle {
        let ingested_at = Utc::now();
        let normalized = normalize(entry.published.as_deref());
        if !normalized.is_parsed() {
            tracing::debug!(url = %entry.url, raw = ?entry.published, "日付を解釈できないため取り込み時刻で代用");
        }
        let published_at = normalized.or_fallback(ingested_at);
        let category = self.classifier.classify(&classification_text(&entry)).await;

        NewArticle::from_raw_entry(entry, published_at, category, ingested_at)
    }
}
