//! フィード配信元と分類サービスのモックサーバー
//!
//! httpmockで外部通信を遮断したテスト環境を提供する。

use httpmock::prelude::*;
use serde_json::json;

/// RSSを組み立てる（itemは (タイトル, リンク, 公開日時) の組）
pub fn rss_xml(title: &str, items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, pub_date)| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>",
                title, link, pub_date
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{}</title><link>https://example.com</link><description>test</description>{}</channel></rss>"#,
        title, items
    )
}

/// フィード配信元のモックサーバー
pub struct FeedMockServer {
    server: MockServer,
}

impl FeedMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// 指定パスでフィード本文を返す
    pub async fn mock_feed(&self, path: &str, body: &str) {
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .header("content-type", "application/rss+xml")
                    .body(body);
            })
            .await;
    }

    /// 指定パスで異常ステータスを返す
    pub async fn mock_status(&self, path: &str, status: u16) {
        self.server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(status);
            })
            .await;
    }

    pub fn url(&self, path: &str) -> String {
        self.server.url(path)
    }
}

/// OpenAI互換の分類サービスのモックサーバー
pub struct ModelMockServer {
    server: MockServer,
}

impl ModelMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// 本文に`keyword`を含む問い合わせに`answer`で回答する
    pub async fn mock_answer_for(&self, keyword: &str, answer: &str) {
        self.server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains(keyword);
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": answer } }
                    ]
                }));
            })
            .await;
    }

    /// 全ての問い合わせに500で応答する
    pub async fn mock_failure(&self) {
        self.server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("internal error");
            })
            .await;
    }

    /// ChatCompletionClientに渡すベースURL
    pub fn base_url(&self) -> String {
        self.server.base_url()
    }
}
