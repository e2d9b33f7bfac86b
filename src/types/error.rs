use thiserror::Error;

/// フィード取得のエラー型
/// 1ソース単位で発生し、ワークフロー全体を止めることはない
#[derive(Error, Debug)]
pub enum FetchError {
    /// 接続失敗・タイムアウトなど
    #[error("フィードの取得に失敗: {source_name} - {reason}")]
    Network { source_name: String, reason: String },

    /// 200以外のHTTPステータス
    #[error("フィードが異常なステータスを返却: {source_name} - {status}")]
    Status { source_name: String, status: u16 },

    /// XML不正、またはRSS/Atomとして解釈できない文書
    #[error("フィードの解析に失敗: {source_name} - {reason}")]
    MalformedFeed { source_name: String, reason: String },
}

impl FetchError {
    /// ネットワークエラーを作成
    pub fn network<S: Into<String>, R: Into<String>>(source_name: S, reason: R) -> Self {
        Self::Network {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// ステータスエラーを作成
    pub fn status<S: Into<String>>(source_name: S, status: u16) -> Self {
        Self::Status {
            source_name: source_name.into(),
            status,
        }
    }

    /// 解析エラーを作成
    pub fn malformed<S: Into<String>, R: Into<String>>(source_name: S, reason: R) -> Self {
        Self::MalformedFeed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            Self::Network { source_name, .. }
            | Self::Status { source_name, .. }
            | Self::MalformedFeed { source_name, .. } => source_name,
        }
    }
}

/// 日付文字列の解析エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("不正な日付形式: {input}")]
pub struct DateParseError {
    pub input: String,
}

/// 外部分類サービスのエラー型
/// 記事単位で吸収され、General IT Newsへフォールバックする
#[derive(Error, Debug)]
pub enum ClassificationError {
    /// 応答待ちが上限を超えた
    #[error("分類サービスがタイムアウトしました")]
    Timeout,

    /// 認証エラー（401/403）
    #[error("分類サービスの認証に失敗: status {status}")]
    Auth { status: u16 },

    /// 通信エラーやその他のHTTPエラー
    #[error("分類サービスへのリクエストに失敗: {reason}")]
    Http { reason: String },

    /// 応答本文が期待した形式ではない
    #[error("分類サービスの応答が不正: {reason}")]
    MalformedResponse { reason: String },
}

impl ClassificationError {
    pub fn http<R: Into<String>>(reason: R) -> Self {
        Self::Http {
            reason: reason.into(),
        }
    }

    pub fn malformed<R: Into<String>>(reason: R) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for ClassificationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::malformed(e.to_string())
        } else {
            Self::http(e.to_string())
        }
    }
}

/// 呼び出し側の入力不備（検索条件など）
/// 呼び出し元へそのまま返し、再試行はしない
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 定義されていないカテゴリ
    #[error("未対応のカテゴリです: {value}")]
    UnknownCategory { value: String },

    /// 検索文字列が長すぎる
    #[error("検索文字列が長すぎます: {length}文字（上限{max}文字）")]
    QueryTooLong { length: usize, max: usize },
}

impl ValidationError {
    pub fn unknown_category<V: Into<String>>(value: V) -> Self {
        Self::UnknownCategory {
            value: value.into(),
        }
    }
}
