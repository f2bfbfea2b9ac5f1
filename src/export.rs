//! JSON artifacts for the visualization layer.
//!
//! The exclusion set is applied again here, independently of extraction,
//! so every file is clean even if an upstream stage lets a name through.

use std::fs;
use std::path::{Path, PathBuf};

use poem_types::{GeoStat, KeywordCloud, PathPoint, PoetPath, RoutePoint, SentimentTrend};
use serde::Serialize;
use tracing::{error, info};

use crate::aggregate::AggregateViews;
use crate::error::Result;
use crate::resources::ExclusionSet;
use crate::trajectory::AuthorTrajectory;

pub const GEO_STATS_FILE: &str = "geo_stats.json";
pub const SENTIMENT_TREND_FILE: &str = "sentiment_trend.json";
pub const KEYWORD_CLOUDS_FILE: &str = "keyword_clouds.json";
pub const POET_PATHS_FILE: &str = "poet_paths.json";

/// The four artifacts, already scrubbed of excluded names.
#[derive(Debug)]
pub struct Exports {
    pub geo_stats: Vec<GeoStat>,
    pub sentiment_trend: Vec<SentimentTrend>,
    pub keyword_clouds: Vec<KeywordCloud>,
    pub poet_paths: Vec<PoetPath>,
}

impl Exports {
    pub fn build(
        views: AggregateViews,
        trajectories: &[AuthorTrajectory],
        exclusion: &ExclusionSet,
    ) -> Self {
        Exports {
            geo_stats: views
                .geo_stats
                .into_iter()
                .filter(|s| !exclusion.contains(&s.name))
                .collect(),
            sentiment_trend: views
                .sentiment_trend
                .into_iter()
                .filter(|s| !exclusion.contains(&s.name))
                .collect(),
            keyword_clouds: views
                .keyword_clouds
                .into_iter()
                .filter(|c| !exclusion.contains(&c.name))
                .collect(),
            poet_paths: trajectories
                .iter()
                .map(|t| poet_path(t, exclusion))
                .collect(),
        }
    }

    /// Write all four files into `dir`, creating it. A failed file is
    /// logged and the remaining files are still written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        let outcomes = [
            write_json(dir, GEO_STATS_FILE, &self.geo_stats),
            write_json(dir, SENTIMENT_TREND_FILE, &self.sentiment_trend),
            write_json(dir, KEYWORD_CLOUDS_FILE, &self.keyword_clouds),
            write_json(dir, POET_PATHS_FILE, &self.poet_paths),
        ];
        for outcome in outcomes {
            match outcome {
                Ok(path) => written.push(path),
                Err(e) => error!(error = %e, "export failed"),
            }
        }
        info!(dir = %dir.display(), files = written.len(), "exported analysis");
        Ok(written)
    }
}

/// Shape a trajectory for `poet_paths.json`. Points without a coordinate
/// cannot be drawn and are left out.
pub fn poet_path(t: &AuthorTrajectory, exclusion: &ExclusionSet) -> PoetPath {
    let path = t
        .occurrence_sequence
        .iter()
        .filter(|o| !exclusion.contains(&o.place))
        .filter_map(|o| {
            let c = o.coordinate?;
            Some(PathPoint {
                place: o.place.clone(),
                lat: c.lat,
                lng: c.lng,
                surface_forms: o.surface_forms.clone(),
                first_title: o.first_title.clone(),
                geo_type: o.geo_type,
                modern_name: o.modern_name.clone(),
            })
        })
        .collect();

    let reference_route = t
        .reference_route
        .iter()
        .filter(|r| !exclusion.contains(&r.place))
        .filter_map(|r| {
            let c = r.coordinate?;
            Some(RoutePoint {
                place: r.place.clone(),
                lat: c.lat,
                lng: c.lng,
                period: r.period.clone(),
            })
        })
        .collect();

    PoetPath {
        author: t.author.clone(),
        birthplace: t.birthplace.clone(),
        path,
        reference_route,
        frequency: t
            .frequency
            .iter()
            .filter(|f| !exclusion.contains(&f.place))
            .cloned()
            .collect(),
    }
}

fn write_json<T: Serialize>(dir: &Path, name: &str, data: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(data)?;
    fs::write(&path, &json)?;
    info!(path = %path.display(), bytes = json.len(), "wrote");
    Ok(path)
}

/// Read `geo_stats.json` back from an output directory.
pub fn read_geo_stats(dir: &Path) -> Result<Vec<GeoStat>> {
    let text = fs::read_to_string(dir.join(GEO_STATS_FILE))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::{Occurrence, RouteStop};
    use poem_types::{Coordinate, GeoType, PlaceCount};
    use std::collections::BTreeMap;

    fn stat(name: &str, count: usize) -> GeoStat {
        GeoStat {
            name: name.into(),
            geo_type: GeoType::Unknown,
            modern_name: name.into(),
            total_count: count,
            sentiment_distribution: BTreeMap::new(),
            avg_sentiment_score: None,
            poets: vec![],
            coordinate: None,
            by_dynasty: vec![],
        }
    }

    fn occurrence(place: &str, coordinate: Option<Coordinate>) -> Occurrence {
        Occurrence {
            doc_index: 0,
            place: place.into(),
            surface_forms: vec![place.into()],
            first_title: "题".into(),
            geo_type: GeoType::City,
            modern_name: place.into(),
            coordinate,
        }
    }

    fn trajectory() -> AuthorTrajectory {
        let here = Some(Coordinate { lat: 34.3, lng: 108.9 });
        AuthorTrajectory {
            author: "李白".into(),
            birthplace: Some("绵州".into()),
            reference_route: vec![
                RouteStop {
                    period: Some("天宝".into()),
                    place: "长安".into(),
                    coordinate: here,
                },
                RouteStop {
                    period: None,
                    place: "江山".into(),
                    coordinate: here,
                },
            ],
            frequency: vec![
                PlaceCount { place: "长安".into(), count: 2 },
                PlaceCount { place: "江山".into(), count: 1 },
                PlaceCount { place: "敬亭山".into(), count: 1 },
            ],
            occurrence_sequence: vec![
                occurrence("长安", here),
                occurrence("江山", here),
                occurrence("敬亭山", None),
                occurrence("长安", here),
            ],
        }
    }

    fn views(names: &[&str]) -> AggregateViews {
        AggregateViews {
            geo_stats: names.iter().map(|n| stat(n, 1)).collect(),
            sentiment_trend: names
                .iter()
                .map(|n| SentimentTrend { name: n.to_string(), data: vec![] })
                .collect(),
            keyword_clouds: names
                .iter()
                .map(|n| KeywordCloud { name: n.to_string(), keywords: vec![] })
                .collect(),
        }
    }

    #[test]
    fn test_exports_scrub_excluded_names() {
        let exclusion = ExclusionSet::builtin();
        let exports = Exports::build(views(&["长安", "江山", "天下"]), &[trajectory()], &exclusion);
        assert_eq!(exports.geo_stats.len(), 1);
        assert_eq!(exports.sentiment_trend.len(), 1);
        assert_eq!(exports.keyword_clouds.len(), 1);

        let p = &exports.poet_paths[0];
        assert!(p.path.iter().all(|pt| pt.place != "江山"));
        assert!(p.frequency.iter().all(|f| f.place != "江山"));
        assert!(p.reference_route.iter().all(|r| r.place != "江山"));
    }

    #[test]
    fn test_points_without_coordinates_dropped() {
        let p = poet_path(&trajectory(), &ExclusionSet::builtin());
        let places: Vec<&str> = p.path.iter().map(|pt| pt.place.as_str()).collect();
        assert_eq!(places, vec!["长安", "长安"]);
        assert_eq!(p.frequency.len(), 2, "frequency keeps places without coordinates");
        assert_eq!(p.reference_route.len(), 1);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let exports = Exports::build(views(&["洞庭湖"]), &[trajectory()], &ExclusionSet::builtin());
        let written = exports.write(&out).unwrap();
        assert_eq!(written.len(), 4);

        let raw = fs::read_to_string(out.join(GEO_STATS_FILE)).unwrap();
        assert!(raw.contains("洞庭湖"), "UTF-8 is written unescaped");
        let back = read_geo_stats(&out).unwrap();
        assert_eq!(back[0].name, "洞庭湖");
        assert!(fs::read_to_string(out.join(POET_PATHS_FILE)).unwrap().contains("李白"));
    }

    #[test]
    fn test_one_failed_file_does_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        // A directory where the stats file should go makes that write fail.
        fs::create_dir_all(out.join(GEO_STATS_FILE)).unwrap();

        let exports = Exports::build(views(&["洞庭湖"]), &[trajectory()], &ExclusionSet::builtin());
        let written = exports.write(&out).unwrap();
        assert_eq!(written.len(), 3);
        assert!(!written.contains(&out.join(GEO_STATS_FILE)));
        for name in [SENTIMENT_TREND_FILE, KEYWORD_CLOUDS_FILE, POET_PATHS_FILE] {
            assert!(out.join(name).is_file(), "{name} written");
        }
    }
}
