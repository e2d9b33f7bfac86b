use crate::domain::category::Category;
use crate::domain::rss::RawEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// 保存済みの記事エンティティ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub ingested_at: DateTime<Utc>,
}

// 保存前の記事（idはストアが採番）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub category: Category,
    pub ingested_at: DateTime<Utc>,
}

impl NewArticle {
    /// フィードの記事から保存用の記事を組み立てる
    pub fn from_raw_entry(
        entry: RawEntry,
        published_at: DateTime<Utc>,
        category: Category,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: entry.title,
            summary: entry.summary,
            url: entry.url,
            published_at,
            source_name: entry.source_name,
            category,
            ingested_at,
        }
    }
}

/// 分類に渡すテキスト（タイトル + 概要）
pub fn classification_text(entry: &RawEntry) -> String {
    if entry.summary.is_empty() {
        entry.title.clone()
    } else {
        format!("{} {}", entry.title, entry.summary)
    }
}
