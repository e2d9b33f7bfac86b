use super::model::{Article, NewArticle};
use crate::domain::category::Category;
use crate::infra::storage::db::initialize_database;
use crate::types::{InfraError, InfraResult, SaveOutcome, ValidationError};
use sqlx::SqlitePool;

/// 検索文字列の上限（文字数）
pub const MAX_QUERY_LENGTH: usize = 200;

/// 外部からの検索で返す最大件数
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

const SELECT_ALL: &str = r#"
    SELECT id, title, summary, url, published_at, source_name, category, ingested_at
    FROM articles
    ORDER BY published_at DESC, id DESC
    LIMIT ?
"#;

const SELECT_BY_TEXT: &str = r#"
    SELECT id, title, summary, url, published_at, source_name, category, ingested_at
    FROM articles
    WHERE (title_folded LIKE ? ESCAPE '\' OR summary_folded LIKE ? ESCAPE '\')
    ORDER BY published_at DESC, id DESC
    LIMIT ?
"#;

const SELECT_BY_CATEGORY: &str = r#"
    SELECT id, title, summary, url, published_at, source_name, category, ingested_at
    FROM articles
    WHERE category = ?
    ORDER BY published_at DESC, id DESC
    LIMIT ?
"#;

const SELECT_BY_TEXT_AND_CATEGORY: &str = r#"
    SELECT id, title, summary, url, published_at, source_name, category, ingested_at
    FROM articles
    WHERE (title_folded LIKE ? ESCAPE '\' OR summary_folded LIKE ? ESCAPE '\')
      AND category = ?
    ORDER BY published_at DESC, id DESC
    LIMIT ?
"#;

// 記事検索の条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    /// タイトル・概要の部分一致（大文字小文字を区別しない）
    pub text: Option<String>,
    /// カテゴリの完全一致
    pub category: Option<Category>,
    /// 未指定なら全件
    pub limit: Option<i64>,
}

impl ArticleQuery {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    /// 外部から受け取った検索条件を検証して組み立てる
    ///
    /// 空白のみの文字列は未指定として扱う。カテゴリはラベルの大文字小文字を区別しない。
    /// 件数は`DEFAULT_SEARCH_LIMIT`まで。
    pub fn from_params(
        text: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let text = text.map(str::trim).filter(|t| !t.is_empty());
        if let Some(t) = text {
            let length = t.chars().count();
            if length > MAX_QUERY_LENGTH {
                return Err(ValidationError::QueryTooLong {
                    length,
                    max: MAX_QUERY_LENGTH,
                });
            }
        }

        let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(value) => Some(
                Category::parse_loose(value)
                    .ok_or_else(|| ValidationError::unknown_category(value))?,
            ),
            None => None,
        };

        Ok(Self {
            text: text.map(str::to_string),
            category,
            limit: Some(DEFAULT_SEARCH_LIMIT),
        })
    }
}

// 検索用に大文字小文字を畳む（SQLiteのLIKEはASCIIしか畳まない）
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

// 小文字化し、LIKEの特殊文字をエスケープして部分一致パターンにする
fn like_pattern(text: &str) -> String {
    let escaped = fold_case(text)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// 記事ストア
///
/// urlの一意性はテーブルのUNIQUE制約で保証する。
/// 検索結果は公開日時の降順、同時刻はidの降順（後から保存したものが先）。
#[derive(Debug, Clone)]
pub struct ArticleStore {
    pool: SqlitePool,
}

impl ArticleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// スキーマを作成する（作成済みなら何もしない）
    pub async fn init(&self) -> InfraResult<()> {
        initialize_database(&self.pool).await
    }

    /// 記事を保存する
    /// 同じurlが既にあれば何もせず`inserted = false`を返す
    pub async fn save(&self, article: &NewArticle) -> InfraResult<SaveOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles
                (title, summary, url, source_name, category, published_at, ingested_at,
                 title_folded, summary_folded)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.url)
        .bind(&article.source_name)
        .bind(article.category.as_str())
        .bind(article.published_at)
        .bind(article.ingested_at)
        .bind(fold_case(&article.title))
        .bind(fold_case(&article.summary))
        .execute(&self.pool)
        .await
        .map_err(|e| InfraError::database_query("記事の保存", e))?;

        if result.rows_affected() > 0 {
            Ok(SaveOutcome::inserted())
        } else {
            Ok(SaveOutcome::duplicate())
        }
    }

    /// 条件に一致する記事を取得する
    ///
    /// 条件の有無に応じて4種類の固定クエリから1つを選ぶ。
    pub async fn search(&self, query: &ArticleQuery) -> InfraResult<Vec<Article>> {
        // SQLiteではLIMIT -1が無制限
        let limit = query.limit.unwrap_or(-1);

        let articles = match (&query.text, &query.category) {
            // 条件なし
            (None, None) => {
                sqlx::query_as::<_, Article>(SELECT_ALL)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            // 文字列のみ
            (Some(text), None) => {
                let pattern = like_pattern(text);
                sqlx::query_as::<_, Article>(SELECT_BY_TEXT)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            // カテゴリのみ
            (None, Some(category)) => {
                sqlx::query_as::<_, Article>(SELECT_BY_CATEGORY)
                    .bind(category.as_str())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            // 文字列 + カテゴリ
            (Some(text), Some(category)) => {
                let pattern = like_pattern(text);
                sqlx::query_as::<_, Article>(SELECT_BY_TEXT_AND_CATEGORY)
                    .bind(&pattern)
                    .bind(&pattern)
                    .bind(category.as_str())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        };

        articles.map_err(|e| InfraError::database_query("記事の検索", e))
    }

    /// idで記事を1件取得する
    pub async fn get(&self, id: i64) -> InfraResult<Option<Article>> {
        sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, summary, url, published_at, source_name, category, ingested_at
            FROM articles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| InfraError::database_query("記事の取得", e))
    }

    /// urlで記事を1件取得する（完全一致）
    pub async fn find_by_url(&self, url: &str) -> InfraResult<Option<Article>> {
        sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, summary, url, published_at, source_name, category, ingested_at
            FROM articles
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| InfraError::database_query("urlによる記事の取得", e))
    }

    /// 保存済みの記事数
    pub async fn count(&self) -> InfraResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| InfraError::database_query("記事数の取得", e))
    }

    /// 指定urlの行数
    pub async fn count_by_url(&self, url: &str) -> InfraResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| InfraError::database_query("urlごとの記事数の取得", e))
    }
}
