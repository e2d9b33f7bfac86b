use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// HTTP取得のエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// 200番台以外のステータス
    #[error("HTTPステータス異常: {0}")]
    Status(u16),

    /// 接続失敗・タイムアウト・本文読み込み失敗
    #[error("HTTP通信エラー: {0}")]
    Transport(String),
}

/// HTTPクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// 指定されたURLからテキストを取得する
    ///
    /// # Arguments
    /// * `url` - 取得対象のURL
    /// * `timeout_secs` - タイムアウト時間（秒）
    async fn fetch_text(&self, url: &str, timeout_secs: u64) -> Result<String, HttpError>;
}

/// `reqwest` を使用した本番用のHTTPクライアント実装
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// 新しいHTTPクライアントを作成
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch_text(&self, url: &str, timeout_secs: u64) -> Result<String, HttpError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, "newsfeed/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| HttpError::Transport(format!("レスポンステキストの取得に失敗: {}", e)))
    }
}

/// テスト用のモックHTTPクライアント
///
/// 実際のHTTPリクエストを行わずに、URLごとに定義済みのレスポンスやエラーを返します。
/// 登録のないURLには`default`の結果を返します。
#[derive(Clone)]
pub struct MockHttpClient {
    responses: HashMap<String, Result<String, HttpError>>,
    default: Result<String, HttpError>,
}

impl MockHttpClient {
    /// 全URLに同じ本文を返すモッククライアントを作成
    pub fn new_success(mock_response: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default: Ok(mock_response.to_string()),
        }
    }

    /// 全URLで通信エラーを返すモッククライアントを作成
    pub fn new_error(error_message: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default: Err(HttpError::Transport(error_message.to_string())),
        }
    }

    /// 指定URLの本文を登録
    pub fn with_response(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// 指定URLのエラーを登録
    pub fn with_error(mut self, url: &str, error: HttpError) -> Self {
        self.responses.insert(url.to_string(), Err(error));
        self
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn fetch_text(&self, url: &str, _timeout_secs: u64) -> Result<String, HttpError> {
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}
