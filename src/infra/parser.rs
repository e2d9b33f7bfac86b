use crate::types::DateParseError;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rss::Channel;
use std::io::{BufReader, Cursor};

/// オフセット付き書式（上から順に試す）
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

/// オフセットなし書式（UTCとして解釈する）
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

// "Tue, 02 Jan ..." の曜日部分を除いた残り
fn strip_weekday(input: &str) -> Option<&str> {
    let (day, rest) = input.split_once(',')?;
    let day = day.trim();
    (day.len() >= 3 && day.chars().all(|c| c.is_ascii_alphabetic())).then(|| rest.trim())
}

// 4桁以上の数字（年）を含むか
// 年のない入力をdateparserに渡すと現在日付で補完されてしまう
fn has_year(input: &str) -> bool {
    input
        .split(|c: char| !c.is_ascii_digit())
        .any(|digits| digits.len() >= 4)
}

/// 文字列を日付型に変換する
///
/// フィードごとに異なる日付表記を、固定の優先順で試して`DateTime<Utc>`に揃える。
///
/// 1. RFC 2822（RSSで一般的。`GMT`や`EST`などの旧式ゾーン名を含む）
///    曜日が日付と食い違う場合は曜日を無視する
/// 2. RFC 3339 / ISO 8601（オフセット付き）
/// 3. ISO 8601の変種（`+0000`形式のオフセット、秒なし、オフセットなしはUTC扱い）
/// 4. 日付のみ（`YYYY-MM-DD`、00:00 UTC）
/// 5. `dateparser`による汎用解析（時刻なしは00:00、タイムゾーンなしはUTC）
///    年を含まない入力は対象外
///
/// 現在時刻で補完することはないため、同じ入力には常に同じ結果を返す。
pub fn parse_date(date_str: &str) -> std::result::Result<DateTime<Utc>, DateParseError> {
    let input = date_str.trim();
    let error = || DateParseError {
        input: date_str.to_string(),
    };
    if input.is_empty() {
        return Err(error());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(Ok(dt)) = strip_weekday(input).map(DateTime::parse_from_rfc2822) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    if !has_year(input) {
        return Err(error());
    }
    dateparser::parse_with(input, &Utc, NaiveTime::MIN).map_err(|_| error())
}

/// 正規化済みの公開日時
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedDate {
    Parsed(DateTime<Utc>),
    /// 解析できなかった（取り込み時刻で代用する）
    Unknown,
}

impl NormalizedDate {
    pub fn or_fallback(self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Parsed(dt) => dt,
            Self::Unknown => fallback,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// 欠落・不正な日付を含めて公開日時を正規化する
/// 失敗してもエラーにはせず`Unknown`を返す
pub fn normalize(raw: Option<&str>) -> NormalizedDate {
    match raw.map(parse_date) {
        Some(Ok(dt)) => NormalizedDate::Parsed(dt),
        Some(Err(_)) | None => NormalizedDate::Unknown,
    }
}

/// 解析済みのフィード文書
#[derive(Debug)]
pub enum FeedDocument {
    /// RSS 2.0（rssクレート）
    Rss(Channel),
    /// Atom / RSS 1.0 など（feed-rsクレート）
    Generic(feed_rs::model::Feed),
}

/// XML文字列からフィード文書を解析する
///
/// まず`rss`でRSS 2.0として読み、拒否された場合はAtomなどの方言として`feed-rs`で読み直す。
/// どちらでも解釈できなければエラーを返す。
pub fn parse_feed_document(xml: &str) -> Result<FeedDocument> {
    if xml.trim().is_empty() {
        return Err(anyhow!("フィード本文が空です"));
    }

    match parse_channel_from_xml_str(xml) {
        Ok(channel) => Ok(FeedDocument::Rss(channel)),
        Err(rss_err) => {
            let feed = feed_rs::parser::parse(xml.as_bytes()).map_err(|e| {
                anyhow!(
                    "RSS/Atomとして解析できません (rss: {:#}, feed-rs: {})",
                    rss_err,
                    e
                )
            })?;
            Ok(FeedDocument::Generic(feed))
        }
    }
}

/// XML文字列からRSSチャンネルを解析する
pub fn parse_channel_from_xml_str(xml: &str) -> Result<Channel> {
    Channel::read_from(BufReader::new(Cursor::new(xml.as_bytes())))
        .context("RSSチャンネルの解析に失敗")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_common_date_formats() {
        // ISO 8601 / RFC 3339
        let expected = Utc.with_ymd_and_hms(2025, 8, 10, 12, 30, 0).unwrap();
        assert_eq!(parse_date("2025-08-10T12:30:00Z").unwrap(), expected);

        // RFC 2822 (RSSで一般的)
        assert_eq!(parse_date("Sun, 10 Aug 2025 12:30:00 +0000").unwrap(), expected);

        // オフセットなしはUTC扱い
        assert_eq!(parse_date("2025-08-10T12:30:00").unwrap(), expected);
        assert_eq!(parse_date("2025-08-10 12:30:00").unwrap(), expected);

        // コロンなしオフセット
        assert_eq!(parse_date("2025-08-10T21:30:00+0900").unwrap(), expected);
    }

    #[test]
    fn test_rfc2822_and_iso_are_same_instant() {
        let rfc2822 = parse_date("Mon, 02 Jan 2023 15:04:05 GMT").unwrap();
        let iso = parse_date("2023-01-02T15:04:05Z").unwrap();

        assert_eq!(rfc2822, iso);
        assert_eq!(iso, Utc.with_ymd_and_hms(2023, 1, 2, 15, 4, 5).unwrap());
    }

    #[test]
    fn test_rfc2822_with_wrong_weekday() {
        // 2023-01-02は月曜日だが、フィードによっては曜日が誤っている
        let expected = Utc.with_ymd_and_hms(2023, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(parse_date("Tue, 02 Jan 2023 15:04:05 GMT").unwrap(), expected);
        assert_eq!(parse_date("Tuesday, 02 Jan 2023 15:04:05 GMT").unwrap(), expected);
        assert_eq!(parse_date("02 Jan 2023 15:04:05 GMT").unwrap(), expected);
    }

    #[test]
    fn test_iso_without_seconds() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 2, 15, 4, 0).unwrap();
        assert_eq!(parse_date("2023-01-02T15:04Z").unwrap(), expected);
        assert_eq!(parse_date("2023-01-03T00:04+0900").unwrap(), expected);
        assert_eq!(parse_date("2023-01-02T15:04").unwrap(), expected);
    }

    #[test]
    fn test_time_only_is_rejected() {
        // 日付のない入力は当日の日付で補完せず失敗させる
        assert!(parse_date("10:00 am").is_err());
        assert!(parse_date("15:04:05").is_err());
        assert_eq!(normalize(Some("10:00 am")), NormalizedDate::Unknown);
    }

    #[test]
    fn test_parse_with_timezones() {
        let expected_utc = Utc.with_ymd_and_hms(2025, 8, 10, 12, 30, 0).unwrap();
        // JST (+09:00)
        assert_eq!(parse_date("2025-08-10T21:30:00+09:00").unwrap(), expected_utc);
        // PST (-08:00)
        assert_eq!(parse_date("2025-08-10T04:30:00-08:00").unwrap(), expected_utc);
        // 旧式ゾーン名 (EST = -0500)
        assert_eq!(
            parse_date("Sun, 10 Aug 2025 07:30:00 EST").unwrap(),
            expected_utc
        );
    }

    #[test]
    fn test_date_only_is_midnight_and_deterministic() {
        let first = parse_date("2025-08-10").unwrap();
        let second = parse_date("2025-08-10").unwrap();

        assert_eq!(first, Utc.with_ymd_and_hms(2025, 8, 10, 0, 0, 0).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_invalid_formats() {
        assert!(parse_date("invalid-date").is_err());
        assert!(parse_date("2025-13-40").is_err()); // 不正な月日
        assert!(parse_date("").is_err()); // 空文字列
        assert!(parse_date("   ").is_err());
    }

    #[test]
    fn test_parse_error_keeps_input() {
        let err = parse_date("yesterday-ish").unwrap_err();
        assert_eq!(err.input, "yesterday-ish");
        assert!(err.to_string().contains("yesterday-ish"));
    }

    #[test]
    fn test_normalize_falls_back() {
        let fallback = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(normalize(None), NormalizedDate::Unknown);
        assert_eq!(normalize(Some("garbage")).or_fallback(fallback), fallback);

        let parsed = normalize(Some("Wed, 23 Jul 2025 04:00:42 GMT"));
        assert!(parsed.is_parsed());
        assert_eq!(
            parsed.or_fallback(fallback),
            Utc.with_ymd_and_hms(2025, 7, 23, 4, 0, 42).unwrap()
        );
    }

    #[test]
    fn test_parse_rss_document() {
        let xml = r#"
            <rss version="2.0">
                <channel>
                    <title>Test Feed</title>
                    <link>http://example.com</link>
                    <description>Test</description>
                    <item>
                        <title>Test Article 1</title>
                        <link>http://example.com/article1</link>
                    </item>
                </channel>
            </rss>
            "#;

        match parse_feed_document(xml).unwrap() {
            FeedDocument::Rss(channel) => assert_eq!(channel.items().len(), 1),
            other => panic!("RSSとして解析されるべき: {:?}", other),
        }
    }

    #[test]
    fn test_parse_atom_document() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <feed xmlns="http://www.w3.org/2005/Atom">
                <title>Atom Feed</title>
                <id>urn:uuid:feed</id>
                <updated>2023-01-02T15:04:05Z</updated>
                <entry>
                    <title>Atom Entry</title>
                    <id>urn:uuid:entry-1</id>
                    <link href="https://example.com/atom/1"/>
                    <updated>2023-01-02T15:04:05Z</updated>
                </entry>
            </feed>"#;

        match parse_feed_document(xml).unwrap() {
            FeedDocument::Generic(feed) => assert_eq!(feed.entries.len(), 1),
            other => panic!("Atomとして解析されるべき: {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_document() {
        assert!(parse_feed_document("<invalid>xml content</broken>").is_err());
        assert!(parse_feed_document("").is_err());
        assert!(parse_feed_document("<html><body>not a feed</body></html>").is_err());
    }
}
