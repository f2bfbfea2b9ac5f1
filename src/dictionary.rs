//! Canonical place records and the alias index built over them.
//!
//! Every surface form a poet might use (京兆, 镐京, 洞庭, ...) maps to one
//! canonical name, which is the key everything downstream aggregates on.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use poem_types::GeoType;
use serde::{Deserialize, Deserializer};
use tracing::debug;

// ── Records ──────────────────────────────────────────────────────────────

/// One entry of `geo_entities.json`, keyed by its canonical name.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoEntry {
    #[serde(rename = "type", default, deserialize_with = "lenient_geo_type")]
    pub geo_type: GeoType,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub modern_name: Option<String>,
}

/// Any type label is accepted; unrecognized ones become `Unknown` so one odd
/// entry cannot reject the whole file.
fn lenient_geo_type<'de, D>(deserializer: D) -> std::result::Result<GeoType, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.as_deref().map_or(GeoType::Unknown, GeoType::from_label))
}

#[derive(Debug, Clone)]
pub struct GeoRecord {
    pub canonical_name: String,
    pub geo_type: GeoType,
    pub modern_name: String,
    pub aliases: BTreeSet<String>,
}

/// What a surface form resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub canonical_name: String,
    pub geo_type: GeoType,
    pub modern_name: String,
}

// ── Dictionary ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeoDictionary {
    records: BTreeMap<String, GeoRecord>,
    alias_index: HashMap<String, Resolved>,
}

impl GeoDictionary {
    pub fn from_entries(entries: BTreeMap<String, GeoEntry>) -> Self {
        let records: BTreeMap<String, GeoRecord> = entries
            .into_iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, entry)| {
                let record = GeoRecord {
                    modern_name: entry.modern_name.unwrap_or_else(|| name.clone()),
                    geo_type: entry.geo_type,
                    aliases: entry.aliases.into_iter().filter(|a| !a.is_empty()).collect(),
                    canonical_name: name.clone(),
                };
                (name, record)
            })
            .collect();

        let mut alias_index: HashMap<String, Resolved> = HashMap::new();

        // Canonical names first: an alias may never shadow another record's own name.
        for record in records.values() {
            alias_index.insert(record.canonical_name.clone(), record.resolved());
        }
        for record in records.values() {
            for alias in &record.aliases {
                match alias_index.get(alias) {
                    Some(existing) if existing.canonical_name != record.canonical_name => {
                        debug!(
                            alias = %alias,
                            kept = %existing.canonical_name,
                            dropped = %record.canonical_name,
                            "alias claimed by two places"
                        );
                    }
                    Some(_) => {}
                    None => {
                        alias_index.insert(alias.clone(), record.resolved());
                    }
                }
            }
        }

        GeoDictionary {
            records,
            alias_index,
        }
    }

    /// The small table used when no dictionary file is supplied.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ENTRIES
            .iter()
            .map(|(name, geo_type, aliases, modern)| {
                (
                    name.to_string(),
                    GeoEntry {
                        geo_type: *geo_type,
                        aliases: aliases.iter().map(|a| a.to_string()).collect(),
                        modern_name: Some(modern.to_string()),
                    },
                )
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Resolve any surface form. Unknown forms resolve to themselves with
    /// `GeoType::Unknown`.
    pub fn resolve(&self, surface: &str) -> Resolved {
        match self.alias_index.get(surface) {
            Some(r) => r.clone(),
            None => Resolved {
                canonical_name: surface.to_string(),
                geo_type: GeoType::Unknown,
                modern_name: surface.to_string(),
            },
        }
    }

    /// Every key of the alias index: canonical names and aliases.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        self.alias_index.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl GeoRecord {
    fn resolved(&self) -> Resolved {
        Resolved {
            canonical_name: self.canonical_name.clone(),
            geo_type: self.geo_type,
            modern_name: self.modern_name.clone(),
        }
    }
}

/// (canonical, type, aliases, modern name)
const BUILTIN_ENTRIES: &[(&str, GeoType, &[&str], &str)] = &[
    ("长安", GeoType::City, &["京兆", "镐京", "大兴城"], "西安"),
    ("洛阳", GeoType::City, &["东都"], "洛阳"),
    ("会稽山", GeoType::Mountain, &["会稽"], "浙江绍兴会稽山"),
    ("洞庭湖", GeoType::Lake, &["洞庭", "八百里洞庭"], "湖南岳阳洞庭湖"),
    ("黄河", GeoType::River, &["河", "大河"], "黄河"),
    ("长江", GeoType::River, &["江", "大江", "扬子江"], "长江"),
    ("巴蜀", GeoType::Region, &["蜀中", "成都府"], "四川盆地"),
    ("江南", GeoType::Region, &["吴地", "三吴", "江东"], "长江中下游南岸"),
    ("潼关", GeoType::Pass, &["潼闕"], "陕西潼关县"),
    ("终南山", GeoType::Mountain, &["太乙山"], "陕西西安终南山"),
];
