//! アプリケーション層
//!
//! - workflow: 取得から保存までの取り込み処理
//! - trigger: 取り込みのバックグラウンド起動
//! - web: HTTPの窓口

pub mod trigger;
pub mod web;
pub mod workflow;
