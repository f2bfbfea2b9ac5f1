//! Static tables loaded once at startup: geo dictionary, exclusion set,
//! coordinates and author profiles.
//!
//! Each table lives in an optional JSON file under the data directory.
//! A missing file silently selects the built-in table; a malformed one is
//! reported and the built-in table is used instead. Nothing here is fatal.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use poem_types::Coordinate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::dictionary::{GeoDictionary, GeoEntry};

pub const GEO_ENTITIES_FILE: &str = "geo_entities.json";
pub const COORDINATES_FILE: &str = "geo_coordinates.json";
pub const PROFILES_FILE: &str = "author_profiles.json";
pub const EXCLUDED_FILE: &str = "excluded_names.json";
pub const PLACE_LEXICON_FILE: &str = "place_lexicon.txt";

/// Read and parse one table. `None` means "use the built-in one".
fn load_table<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        debug!(path = %path.display(), "table file absent, using built-in");
        return None;
    }
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read table, using built-in");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed table, using built-in");
            None
        }
    }
}

// ── Exclusion set ────────────────────────────────────────────────────────

/// Generic scenery words that must never be reported as places.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExclusionSet {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_EXCLUDED.iter().copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

const BUILTIN_EXCLUDED: &[&str] = &[
    "千山", "江山", "山林", "青山", "四海", "江湖", "山川", "山河", "西山", "东山",
    "天下", "九州", "五湖", "六合", "八荒", "九域", "四方", "宇内", "寰中", "江表",
    "河朔", "塞北", "岭南", "漠北", "中原", "南疆", "北疆", "关内", "关外", "河东",
    "河西", "山南", "山北", "淮左", "淮右", "山水", "四面山", "山河大地", "山阜", "峽山",
    "峡山", "河明", "浮川", "居海", "如海", "福海", "海陽", "海國", "海霧江", "湖江",
    "北湖", "青草湖", "柳邊湖", "明河", "陂湖", "好山", "山開南國", "莫指雲山", "中峰", "中台",
    "陽洲", "花洲", "四海九州",
];

// ── Coordinates ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CoordinateTable {
    coords: HashMap<String, Coordinate>,
}

impl CoordinateTable {
    pub fn new(coords: HashMap<String, Coordinate>) -> Self {
        CoordinateTable { coords }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_COORDINATES
                .iter()
                .map(|(name, lat, lng)| (name.to_string(), Coordinate { lat: *lat, lng: *lng }))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<Coordinate> {
        self.coords.get(name).copied()
    }

    /// Look up by canonical name, falling back to the modern name.
    pub fn locate(&self, name: &str, modern_name: &str) -> Option<Coordinate> {
        self.get(name).or_else(|| self.get(modern_name))
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }
}

/// (name, lat, lng)
const BUILTIN_COORDINATES: &[(&str, f64, f64)] = &[
    ("长安", 34.3416, 108.9398),
    ("洛阳", 34.6167, 112.4537),
    ("扬州", 32.3942, 119.4127),
    ("苏州", 31.2989, 120.5853),
    ("杭州", 30.2741, 120.1551),
    ("成都", 30.5728, 104.0668),
    ("重庆", 29.563, 106.5516),
    ("南京", 32.0603, 118.7969),
    ("北京", 39.9042, 116.4074),
    ("潼关", 34.5442, 110.2467),
    ("终南山", 34.0165, 108.7514),
    ("华山", 34.4826, 110.1001),
    ("泰山", 36.2699, 117.1046),
    ("衡山", 27.2503, 112.7083),
    ("嵩山", 34.5123, 112.9403),
    ("会稽山", 30.04, 120.64),
    ("庐山", 29.5649, 115.9859),
    ("长江", 30.6, 114.0),
    ("黄河", 35.0, 111.0),
    ("洞庭湖", 29.22, 112.88),
    ("太湖", 31.15, 120.1),
    ("鄱阳湖", 29.0833, 116.2333),
    ("青海湖", 36.8833, 99.1),
    ("江南", 31.0, 118.0),
    ("关中", 34.2667, 108.9),
    ("巴蜀", 30.6667, 103.9667),
    ("岭南", 23.1291, 113.2644),
    ("襄阳", 32.0089, 112.1229),
    ("荆州", 30.3527, 112.19),
    ("长沙", 28.2282, 112.9388),
    ("桂林", 25.2736, 110.29),
    ("泉州", 24.8741, 118.6759),
    ("广州", 23.1291, 113.2644),
    ("福州", 26.0745, 119.2965),
    ("开封", 34.7973, 114.3076),
    ("太原", 37.8706, 112.5489),
    ("玉门关", 40.35, 94.87),
    ("嘉峪关", 39.802, 98.294),
    ("雁门关", 39.2284, 112.8939),
    ("兰亭", 29.997, 120.582),
    ("桃花源", 28.9025, 110.9429),
    ("岳阳楼", 29.3746, 113.0975),
    ("石鼓", 26.9018, 112.614),
    ("宣州", 30.9449, 118.7587),
    ("池州", 30.664, 117.4914),
    ("建昌", 27.9187, 116.3318),
    ("齐云山", 29.7844, 117.7937),
    ("泗州", 33.483, 118.7034),
    ("奉节", 31.0185, 109.4648),
    ("庐陵", 27.11, 114.98),
    ("眉山", 30.075, 103.85),
    ("济南", 36.6512, 117.1201),
    ("夔州", 31.05, 109.6333),
    ("惠州", 23.1115, 114.4158),
    ("鄱阳", 29.0, 116.667),
    ("上饶", 28.4546, 117.9434),
    ("金华", 29.0792, 119.6474),
];

// ── Author profiles ──────────────────────────────────────────────────────

/// One stop on an author's documented route.
#[derive(Debug, Clone, Deserialize)]
pub struct Waypoint {
    #[serde(alias = "地点")]
    pub place: String,
    #[serde(default, alias = "时期")]
    pub period: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorProfile {
    #[serde(default, alias = "籍贯")]
    pub birthplace: Option<String>,
    #[serde(default, alias = "主要行迹")]
    pub route: Vec<Waypoint>,
}

#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: HashMap<String, AuthorProfile>,
}

impl ProfileTable {
    pub fn new(profiles: HashMap<String, AuthorProfile>) -> Self {
        ProfileTable { profiles }
    }

    pub fn builtin() -> Self {
        let wp = |place: &str, period: &str| Waypoint {
            place: place.to_string(),
            period: Some(period.to_string()),
        };
        let mut profiles = HashMap::new();
        profiles.insert(
            "李白".to_string(),
            AuthorProfile {
                birthplace: Some("绵州昌隆县（今四川江油）".to_string()),
                route: vec![
                    wp("长安", "开元二十三年"),
                    wp("扬州", "天宝三载"),
                    wp("庐山", "天宝十四载"),
                ],
            },
        );
        profiles.insert(
            "杜甫".to_string(),
            AuthorProfile {
                birthplace: Some("河南巩县（今河南巩义）".to_string()),
                route: vec![
                    wp("长安", "开元二十九年"),
                    wp("奉节", "广德二年"),
                    wp("成都", "宝应元年"),
                ],
            },
        );
        Self::new(profiles)
    }

    pub fn get(&self, author: &str) -> Option<&AuthorProfile> {
        self.profiles.get(author)
    }
}

// ── Bundle ───────────────────────────────────────────────────────────────

/// Every static table, loaded once and shared read-only by all components.
#[derive(Debug, Clone)]
pub struct Resources {
    pub dictionary: GeoDictionary,
    pub exclusion: ExclusionSet,
    pub coordinates: CoordinateTable,
    pub profiles: ProfileTable,
    /// Extra words for the built-in location tagger.
    pub place_lexicon: Vec<String>,
}

impl Resources {
    #[cfg(test)]
    pub fn builtin() -> Self {
        Resources {
            dictionary: GeoDictionary::builtin(),
            exclusion: ExclusionSet::builtin(),
            coordinates: CoordinateTable::builtin(),
            profiles: ProfileTable::builtin(),
            place_lexicon: Vec::new(),
        }
    }

    pub fn load(data_dir: &Path) -> Self {
        let dictionary = load_table::<BTreeMap<String, GeoEntry>>(&data_dir.join(GEO_ENTITIES_FILE))
            .map(GeoDictionary::from_entries)
            .unwrap_or_else(GeoDictionary::builtin);
        let exclusion = load_table::<Vec<String>>(&data_dir.join(EXCLUDED_FILE))
            .map(ExclusionSet::new)
            .unwrap_or_else(ExclusionSet::builtin);
        let coordinates = load_table::<HashMap<String, Coordinate>>(&data_dir.join(COORDINATES_FILE))
            .map(CoordinateTable::new)
            .unwrap_or_else(CoordinateTable::builtin);
        let profiles = load_table::<HashMap<String, AuthorProfile>>(&data_dir.join(PROFILES_FILE))
            .map(ProfileTable::new)
            .unwrap_or_else(ProfileTable::builtin);
        let place_lexicon = load_lexicon(&data_dir.join(PLACE_LEXICON_FILE));

        info!(
            places = dictionary.len(),
            excluded = exclusion.len(),
            coordinates = coordinates.len(),
            lexicon = place_lexicon.len(),
            "static tables loaded"
        );

        Resources {
            dictionary,
            exclusion,
            coordinates,
            profiles,
            place_lexicon,
        }
    }
}

/// One word per line; blank lines and `#` comments skipped. Only the first
/// whitespace-separated field is used, so jieba-style user dictionaries work.
fn load_lexicon(path: &Path) -> Vec<String> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split_whitespace().next())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read place lexicon");
            Vec::new()
        }
    }
}
