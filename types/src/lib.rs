use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Input record ─────────────────────────────────────────────────────────

/// One poem as handed to the engine by the corpus loader.
///
/// `content` is already flattened: multi-line sources are joined before
/// a `Poem` is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poem {
    pub title: String,
    pub author: String,
    pub content: String,
    pub dynasty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Poem {
    /// Title and content joined with a single space, the text every
    /// per-document analysis runs over.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

// ── Place classification ─────────────────────────────────────────────────

/// Kind of geographic feature. Dictionary files may spell these in
/// Chinese (城市, 山脉, ...), exported JSON always uses the English tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoType {
    #[serde(alias = "城市")]
    City,
    #[serde(alias = "山脉", alias = "山")]
    Mountain,
    #[serde(alias = "河流")]
    River,
    #[serde(alias = "湖泊")]
    Lake,
    #[serde(alias = "地区")]
    Region,
    #[serde(alias = "关隘")]
    Pass,
    #[default]
    #[serde(alias = "未知")]
    Unknown,
}

impl GeoType {
    /// Read a type label as it appears in hand-written dictionary files.
    /// Labels outside the known set (古迹, 城镇, ...) are `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "city" | "城市" => Self::City,
            "mountain" | "山脉" | "山" => Self::Mountain,
            "river" | "河流" => Self::River,
            "lake" | "湖泊" => Self::Lake,
            "region" | "地区" => Self::Region,
            "pass" | "关隘" => Self::Pass,
            _ => Self::Unknown,
        }
    }

    pub fn as_chinese(&self) -> &'static str {
        match self {
            Self::City => "城市",
            Self::Mountain => "山脉",
            Self::River => "河流",
            Self::Lake => "湖泊",
            Self::Region => "地区",
            Self::Pass => "关隘",
            Self::Unknown => "未知",
        }
    }
}

/// Sentiment bucket derived from a clamped base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    PositiveNeutral,
    Neutral,
    NegativeNeutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

// ── geo_stats.json / sentiment_trend.json ────────────────────────────────

/// One dynasty's share of a place's occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynastyStat {
    pub dynasty: String,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<f64>,
    pub sentiment_distribution: BTreeMap<SentimentLabel, usize>,
}

/// Corpus-wide statistics for one canonical place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoStat {
    pub name: String,
    #[serde(rename = "type")]
    pub geo_type: GeoType,
    pub modern_name: String,
    pub total_count: usize,
    pub sentiment_distribution: BTreeMap<SentimentLabel, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_sentiment_score: Option<f64>,
    pub poets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    pub by_dynasty: Vec<DynastyStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentTrend {
    pub name: String,
    pub data: Vec<DynastyStat>,
}

// ── keyword_clouds.json ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCloud {
    pub name: String,
    pub keywords: Vec<Keyword>,
}

// ── poet_paths.json ──────────────────────────────────────────────────────

/// A place an author's poems mention, in corpus order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPoint {
    pub place: String,
    pub lat: f64,
    pub lng: f64,
    pub surface_forms: Vec<String>,
    pub first_title: String,
    #[serde(rename = "type")]
    pub geo_type: GeoType,
    pub modern_name: String,
}

/// A waypoint from the author's biographical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePoint {
    pub place: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCount {
    pub place: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoetPath {
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthplace: Option<String>,
    pub path: Vec<PathPoint>,
    pub reference_route: Vec<RoutePoint>,
    pub frequency: Vec<PlaceCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_type_accepts_chinese_alias() {
        let t: GeoType = serde_json::from_str("\"湖泊\"").unwrap();
        assert_eq!(t, GeoType::Lake);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"lake\"");
    }

    #[test]
    fn test_from_label_is_lenient() {
        assert_eq!(GeoType::from_label("山脉"), GeoType::Mountain);
        assert_eq!(GeoType::from_label("lake"), GeoType::Lake);
        assert_eq!(GeoType::from_label(" 关隘 "), GeoType::Pass);
        assert_eq!(GeoType::from_label("古迹"), GeoType::Unknown);
        assert_eq!(GeoType::from_label(""), GeoType::Unknown);
    }

    #[test]
    fn test_label_map_serializes_with_string_keys() {
        let mut dist = BTreeMap::new();
        dist.insert(SentimentLabel::PositiveNeutral, 2usize);
        let json = serde_json::to_string(&dist).unwrap();
        assert_eq!(json, r#"{"positive_neutral":2}"#);
    }

    #[test]
    fn test_full_text_joins_title_and_content() {
        let poem = Poem {
            title: "望岳".into(),
            author: "杜甫".into(),
            content: "岱宗夫如何".into(),
            dynasty: "唐".into(),
            source_path: None,
        };
        assert_eq!(poem.full_text(), "望岳 岱宗夫如何");
    }
}
