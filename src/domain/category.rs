use crate::types::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 記事カテゴリ（閉じた6値）
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Cybersecurity")]
    Cybersecurity,
    #[serde(rename = "Software Development")]
    SoftwareDevelopment,
    #[serde(rename = "Hardware")]
    Hardware,
    #[serde(rename = "Networking")]
    Networking,
    #[serde(rename = "Cloud Computing")]
    CloudComputing,
    #[default]
    #[serde(rename = "General IT News")]
    GeneralItNews,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Cybersecurity,
        Category::SoftwareDevelopment,
        Category::Hardware,
        Category::Networking,
        Category::CloudComputing,
        Category::GeneralItNews,
    ];

    /// 保存・表示・プロンプトで使うラベル
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cybersecurity => "Cybersecurity",
            Category::SoftwareDevelopment => "Software Development",
            Category::Hardware => "Hardware",
            Category::Networking => "Networking",
            Category::CloudComputing => "Cloud Computing",
            Category::GeneralItNews => "General IT News",
        }
    }

    /// 大文字小文字と前後の空白・引用符・句点を無視して解釈する
    /// 外部からの入力（検索条件やモデルの回答）向け
    pub fn parse_loose(value: &str) -> Option<Category> {
        let cleaned = value
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
            .trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(cleaned))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    /// ラベルとの完全一致のみ受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::unknown_category(s))
    }
}

impl TryFrom<String> for Category {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
