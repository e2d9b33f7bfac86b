use crate::domain::feed::Feed;
use crate::infra::api::http::{HttpClient, HttpError};
use crate::infra::parser::{parse_feed_document, FeedDocument};
use crate::types::FetchError;
use futures::future::join_all;
use rss::Channel;
use serde::{Deserialize, Serialize};

/// フィードから読み取った保存前の記事（<item>/<entry>要素のみ対象）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub title: String,
    /// 空文字列の場合あり
    pub summary: String,
    pub url: String,
    /// フィード記載の日付文字列（未加工）
    pub published: Option<String>,
    pub source_name: String,
}

/// 取得時のオプション
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub timeout_secs: u64,
    /// 1ソースあたりの最大件数
    pub entry_limit: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            entry_limit: 5,
        }
    }
}

/// 全ソース取得の結果（成功分の記事と失敗したソース）
#[derive(Debug, Default)]
pub struct FeedCollection {
    pub entries: Vec<RawEntry>,
    pub failures: Vec<FetchError>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// RSSのチャンネルから<item>要素を抽出する関数
// リンクまたはタイトルがない記事は除外する
pub fn get_raw_entries_from_channel(channel: &Channel, source_name: &str) -> Vec<RawEntry> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let url = non_empty(item.link())?;
            let title = non_empty(item.title())?;
            let summary = non_empty(item.description())
                .or_else(|| non_empty(item.content()))
                .unwrap_or_default();

            Some(RawEntry {
                title,
                summary,
                url,
                published: non_empty(item.pub_date()),
                source_name: source_name.to_string(),
            })
        })
        .collect()
}

// Atomなどのエントリを抽出する関数
fn get_raw_entries_from_generic(
    feed: &feed_rs::model::Feed,
    source_name: &str,
) -> Vec<RawEntry> {
    feed.entries
        .iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| entry.links.first())?;
            let url = non_empty(Some(link.href.as_str()))?;
            let title = non_empty(entry.title.as_ref().map(|t| t.content.as_str()))?;
            let summary = non_empty(entry.summary.as_ref().map(|t| t.content.as_str()))
                .or_else(|| {
                    non_empty(entry.content.as_ref().and_then(|c| c.body.as_deref()))
                })
                .unwrap_or_default();

            Some(RawEntry {
                title,
                summary,
                url,
                published: entry.published.or(entry.updated).map(|dt| dt.to_rfc3339()),
                source_name: source_name.to_string(),
            })
        })
        .collect()
}

/// 解析済み文書から記事を抽出する
pub fn get_raw_entries_from_document(document: &FeedDocument, source_name: &str) -> Vec<RawEntry> {
    match document {
        FeedDocument::Rss(channel) => get_raw_entries_from_channel(channel, source_name),
        FeedDocument::Generic(feed) => get_raw_entries_from_generic(feed, source_name),
    }
}

/// 1つのフィードを取得して記事一覧を返す
pub async fn fetch_feed<H: HttpClient + ?Sized>(
    client: &H,
    feed: &Feed,
    options: &FetchOptions,
) -> Result<Vec<RawEntry>, FetchError> {
    let xml_content = client
        .fetch_text(&feed.link, options.timeout_secs)
        .await
        .map_err(|e| match e {
            HttpError::Status(status) => FetchError::status(&feed.name, status),
            HttpError::Transport(reason) => FetchError::network(&feed.name, reason),
        })?;

    let document = parse_feed_document(&xml_content)
        .map_err(|e| FetchError::malformed(&feed.name, format!("{:#}", e)))?;

    let mut entries = get_raw_entries_from_document(&document, &feed.name);
    entries.truncate(options.entry_limit);
    Ok(entries)
}

/// 全フィードを並行に取得し、成功分と失敗分をまとめる
///
/// 1ソースの失敗は他のソースに影響しない。記事はフィード一覧の順に並ぶ。
pub async fn collect_feeds<H: HttpClient + ?Sized>(
    client: &H,
    feeds: &[Feed],
    options: &FetchOptions,
) -> FeedCollection {
    let results = join_all(feeds.iter().map(|feed| fetch_feed(client, feed, options))).await;

    feeds
        .iter()
        .zip(results)
        .fold(FeedCollection::default(), |mut acc, (feed, result)| {
            match result {
                Ok(entries) => {
                    tracing::info!(source = %feed.name, count = entries.len(), "フィード取得完了");
                    acc.entries.extend(entries);
                }
                Err(e) => {
                    tracing::warn!(source = %feed.name, url = %feed.link, error = %e, "フィードをスキップ");
                    acc.failures.push(e);
                }
            }
            acc
        })
}

/// 全フィードを取得し、成功したソースの記事のみを返す
pub async fn fetch_all<H: HttpClient + ?Sized>(
    client: &H,
    feeds: &[Feed],
    options: &FetchOptions,
) -> Vec<RawEntry> {
    collect_feeds(client, feeds, options).await.entries
}
