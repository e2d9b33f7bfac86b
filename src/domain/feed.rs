use crate::infra::storage::file::load_yaml_from_file;
use crate::types::{ConfigError, InfraResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 取得対象のフィード（ソース記述子）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub group: String,
    /// 記事の出典名として保存される
    pub name: String,
    pub link: String,
}

impl Feed {
    pub fn new(group: &str, name: &str, link: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            link: link.to_string(),
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.group, self.name, self.link)
    }
}

/// 組み込みの固定ソース一覧
pub fn default_feeds() -> Vec<Feed> {
    vec![
        Feed::new(
            "community",
            "Reddit",
            "https://www.reddit.com/r/technology/top/.rss?t=day",
        ),
        Feed::new(
            "tech",
            "Ars Technica",
            "http://feeds.arstechnica.com/arstechnica/technology-lab",
        ),
        Feed::new(
            "tech",
            "Tom's Hardware",
            "https://www.tomshardware.com/feeds/all",
        ),
    ]
}

// YAMLファイルの構造に対応する型（group -> name -> link）
type FeedMap = BTreeMap<String, BTreeMap<String, String>>;

/// YAMLファイルからフィード情報を読み込む
/// 並び順はgroup、nameの辞書順
pub fn load_feeds_from_yaml(file_path: &str) -> InfraResult<Vec<Feed>> {
    let feed_map: FeedMap = load_yaml_from_file(file_path)?;

    Ok(feed_map
        .into_iter()
        .flat_map(|(group, name_links)| {
            name_links
                .into_iter()
                .map(move |(name, link)| Feed {
                    group: group.clone(),
                    name,
                    link,
                })
        })
        .collect())
}

/// 設定に応じてフィード一覧を決める
pub fn resolve_feeds(feeds_file: Option<&str>) -> InfraResult<Vec<Feed>> {
    match feeds_file {
        Some(path) if !std::path::Path::new(path).exists() => {
            Err(ConfigError::missing_config_file(path).into())
        }
        Some(path) => load_feeds_from_yaml(path),
        None => Ok(default_feeds()),
    }
}
