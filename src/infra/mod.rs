//! インフラ層
//!
//! - api: 外部HTTP（フィード取得・分類サービス）
//! - parser: 日付とフィード文書の解析
//! - storage: SQLiteとファイル読み込み

pub mod api;
pub mod parser;
pub mod storage;
