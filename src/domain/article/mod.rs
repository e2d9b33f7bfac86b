pub mod model;
pub mod repository;

// 公開APIの再エクスポート
pub use model::{classification_text, Article, NewArticle};
pub use repository::{ArticleQuery, ArticleStore, DEFAULT_SEARCH_LIMIT, MAX_QUERY_LENGTH};
