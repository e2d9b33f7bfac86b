//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - エラー型: フィード取得・分類・入力検証・インフラ
//! - 設定: 環境変数から組み立てるアプリケーション設定
//! - 保存結果: 記事1件の保存結果の統一表現

pub mod config;
pub mod error;
pub mod infra;

pub use config::{AppConfig, ConfigError, ConfigResult};
pub use error::{ClassificationError, DateParseError, FetchError, ValidationError};
pub use infra::{InfraError, InfraResult, SaveOutcome};
