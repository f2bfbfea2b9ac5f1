//! Corpus-wide statistics per canonical place.
//!
//! A [`GeoAggregator`] is fed one document at a time. Aggregators built on
//! disjoint slices of the corpus can be combined with [`GeoAggregator::merge`]:
//! counts, label distributions and score sums add, poet sets union, and
//! per-dynasty ordering uses the smallest corpus index seen, so the result
//! does not depend on merge order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use poem_types::{DynastyStat, GeoStat, GeoType, KeywordCloud, Poem, SentimentLabel, SentimentTrend};
use tracing::warn;

use crate::extract::Mention;
use crate::resources::{CoordinateTable, ExclusionSet};
use crate::sentiment::SentimentResult;
use crate::services::KeywordRanker;

/// Keywords kept per place.
pub const KEYWORDS_PER_PLACE: usize = 30;

#[derive(Debug, Clone, Default, PartialEq)]
struct ScoreTally {
    count: usize,
    score_sum: f64,
    distribution: BTreeMap<SentimentLabel, usize>,
}

impl ScoreTally {
    fn add(&mut self, label: SentimentLabel, score: f64) {
        self.count += 1;
        self.score_sum += score;
        *self.distribution.entry(label).or_insert(0) += 1;
    }

    fn absorb(&mut self, other: ScoreTally) {
        self.count += other.count;
        self.score_sum += other.score_sum;
        for (label, n) in other.distribution {
            *self.distribution.entry(label).or_insert(0) += n;
        }
    }

    fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.score_sum / self.count as f64)
    }
}

#[derive(Debug, Clone)]
struct DynastyTally {
    /// Smallest corpus index that contributed.
    first_seen: usize,
    tally: ScoreTally,
}

#[derive(Debug, Clone)]
struct PlaceAccumulator {
    geo_type: GeoType,
    modern_name: String,
    tally: ScoreTally,
    poets: BTreeSet<String>,
    by_dynasty: HashMap<String, DynastyTally>,
    /// Corpus indices of the documents mentioning this place.
    documents: Vec<usize>,
}

impl PlaceAccumulator {
    fn new(mention: &Mention) -> Self {
        PlaceAccumulator {
            geo_type: mention.geo_type,
            modern_name: mention.modern_name.clone(),
            tally: ScoreTally::default(),
            poets: BTreeSet::new(),
            by_dynasty: HashMap::new(),
            documents: Vec::new(),
        }
    }

    fn absorb(&mut self, other: PlaceAccumulator) {
        self.tally.absorb(other.tally);
        self.poets.extend(other.poets);
        for (dynasty, d) in other.by_dynasty {
            match self.by_dynasty.get_mut(&dynasty) {
                Some(mine) => {
                    mine.first_seen = mine.first_seen.min(d.first_seen);
                    mine.tally.absorb(d.tally);
                }
                None => {
                    self.by_dynasty.insert(dynasty, d);
                }
            }
        }
        self.documents.extend(other.documents);
    }

    fn dynasty_stats(&self) -> Vec<DynastyStat> {
        let mut entries: Vec<(&String, &DynastyTally)> = self.by_dynasty.iter().collect();
        entries.sort_by(|a, b| a.1.first_seen.cmp(&b.1.first_seen).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .map(|(dynasty, d)| DynastyStat {
                dynasty: dynasty.clone(),
                count: d.tally.count,
                avg_score: d.tally.average(),
                sentiment_distribution: d.tally.distribution.clone(),
            })
            .collect()
    }
}

/// The three per-place views handed to the exporter. All three are in the
/// same order (most frequent place first), so index `i` of each refers to
/// the same place.
#[derive(Debug, Default)]
pub struct AggregateViews {
    pub geo_stats: Vec<GeoStat>,
    pub sentiment_trend: Vec<SentimentTrend>,
    pub keyword_clouds: Vec<KeywordCloud>,
}

#[derive(Debug, Clone, Default)]
pub struct GeoAggregator {
    places: HashMap<String, PlaceAccumulator>,
}

impl GeoAggregator {
    /// Fold one document's mentions in. Each mention counts once, however
    /// many times its surface forms appear in the text.
    pub fn observe(
        &mut self,
        doc_index: usize,
        poem: &Poem,
        mentions: &[Mention],
        sentiment: &SentimentResult,
        exclusion: &ExclusionSet,
    ) {
        for mention in mentions {
            if exclusion.contains(&mention.canonical_name) {
                continue;
            }
            let acc = self
                .places
                .entry(mention.canonical_name.clone())
                .or_insert_with(|| PlaceAccumulator::new(mention));

            acc.tally.add(sentiment.label, sentiment.base_score);
            if !poem.author.is_empty() {
                acc.poets.insert(poem.author.clone());
            }
            acc.documents.push(doc_index);

            let dynasty = acc
                .by_dynasty
                .entry(poem.dynasty.clone())
                .or_insert_with(|| DynastyTally {
                    first_seen: doc_index,
                    tally: ScoreTally::default(),
                });
            dynasty.first_seen = dynasty.first_seen.min(doc_index);
            dynasty.tally.add(sentiment.label, sentiment.base_score);
        }
    }

    pub fn merge(mut self, other: GeoAggregator) -> GeoAggregator {
        for (name, acc) in other.places {
            match self.places.get_mut(&name) {
                Some(mine) => mine.absorb(acc),
                None => {
                    self.places.insert(name, acc);
                }
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Resolve coordinates, rank keywords and emit the three views.
    /// `corpus` must be the slice the document indices refer to.
    pub fn finish(
        self,
        corpus: &[Poem],
        coordinates: &CoordinateTable,
        ranker: &dyn KeywordRanker,
        exclusion: &ExclusionSet,
    ) -> AggregateViews {
        let mut places: Vec<(String, PlaceAccumulator)> = self
            .places
            .into_iter()
            .filter(|(name, _)| !exclusion.contains(name))
            .collect();
        places.sort_by(|a, b| {
            b.1.tally
                .count
                .cmp(&a.1.tally.count)
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut views = AggregateViews::default();
        for (name, mut acc) in places {
            let by_dynasty = acc.dynasty_stats();

            acc.documents.sort_unstable();
            acc.documents.dedup();
            let text_corpus = acc
                .documents
                .iter()
                .filter_map(|&i| corpus.get(i))
                .map(|p| p.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let keywords = if text_corpus.trim().is_empty() {
                Vec::new()
            } else {
                ranker
                    .rank(&text_corpus, KEYWORDS_PER_PLACE)
                    .unwrap_or_else(|e| {
                        warn!(place = %name, error = %e, "keyword ranking failed");
                        Vec::new()
                    })
            };

            views.geo_stats.push(GeoStat {
                name: name.clone(),
                geo_type: acc.geo_type,
                coordinate: coordinates.locate(&name, &acc.modern_name),
                modern_name: acc.modern_name,
                total_count: acc.tally.count,
                avg_sentiment_score: acc.tally.average(),
                sentiment_distribution: acc.tally.distribution,
                poets: acc.poets.into_iter().collect(),
                by_dynasty: by_dynasty.clone(),
            });
            views.sentiment_trend.push(SentimentTrend {
                name: name.clone(),
                data: by_dynasty,
            });
            views.keyword_clouds.push(KeywordCloud { name, keywords });
        }
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::sentiment::label_for;
    use poem_types::Keyword;

    struct NoKeywords;

    impl KeywordRanker for NoKeywords {
        fn rank(&self, _text: &str, _top_k: usize) -> Result<Vec<Keyword>> {
            Ok(Vec::new())
        }
    }

    struct EchoRanker;

    impl KeywordRanker for EchoRanker {
        fn rank(&self, text: &str, _top_k: usize) -> Result<Vec<Keyword>> {
            Ok(vec![Keyword {
                word: text.to_string(),
                weight: 1.0,
            }])
        }
    }

    struct BrokenRanker;

    impl KeywordRanker for BrokenRanker {
        fn rank(&self, _text: &str, _top_k: usize) -> Result<Vec<Keyword>> {
            Err(Error::service("keywords", "down"))
        }
    }

    fn poem(author: &str, dynasty: &str, content: &str) -> Poem {
        Poem {
            title: "题".into(),
            author: author.into(),
            content: content.into(),
            dynasty: dynasty.into(),
            source_path: None,
        }
    }

    fn mention(name: &str) -> Mention {
        Mention {
            canonical_name: name.into(),
            geo_type: GeoType::Unknown,
            modern_name: name.into(),
            surface_forms: BTreeSet::from([name.to_string()]),
        }
    }

    fn sentiment(score: f64) -> SentimentResult {
        SentimentResult {
            base_score: score,
            label: label_for(score),
            dimensions: BTreeMap::new(),
        }
    }

    fn corpus() -> Vec<(Poem, Vec<Mention>, SentimentResult)> {
        vec![
            (poem("李白", "唐", "长安一片月"), vec![mention("长安")], sentiment(0.8)),
            (
                poem("杜甫", "唐", "长安洞庭"),
                vec![mention("长安"), mention("洞庭湖")],
                sentiment(0.2),
            ),
            (poem("苏轼", "宋", "又到长安"), vec![mention("长安")], sentiment(0.5)),
            (poem("李白", "唐", "江山"), vec![mention("江山")], sentiment(0.5)),
        ]
    }

    fn aggregate(range: std::ops::Range<usize>) -> GeoAggregator {
        let exclusion = ExclusionSet::builtin();
        let mut agg = GeoAggregator::default();
        for (i, (p, m, s)) in corpus().into_iter().enumerate() {
            if range.contains(&i) {
                agg.observe(i, &p, &m, &s, &exclusion);
            }
        }
        agg
    }

    fn poems() -> Vec<Poem> {
        corpus().into_iter().map(|(p, _, _)| p).collect()
    }

    fn finish(agg: GeoAggregator) -> AggregateViews {
        agg.finish(
            &poems(),
            &CoordinateTable::builtin(),
            &NoKeywords,
            &ExclusionSet::builtin(),
        )
    }

    #[test]
    fn test_counts_and_conservation() {
        let views = finish(aggregate(0..4));
        assert_eq!(views.geo_stats.len(), 2, "江山 is excluded");
        let changan = &views.geo_stats[0];
        assert_eq!(changan.name, "长安");
        assert_eq!(changan.total_count, 3);
        assert_eq!(changan.poets, vec!["李白", "杜甫", "苏轼"]);
        assert!((changan.avg_sentiment_score.unwrap() - 0.5).abs() < 1e-9);
        assert!(changan.coordinate.is_some());

        for stat in &views.geo_stats {
            let by_dynasty: usize = stat.by_dynasty.iter().map(|d| d.count).sum();
            let by_label: usize = stat.sentiment_distribution.values().sum();
            assert_eq!(stat.total_count, by_dynasty, "{}", stat.name);
            assert_eq!(stat.total_count, by_label, "{}", stat.name);
        }
    }

    #[test]
    fn test_dynasty_breakdown_in_first_seen_order() {
        let views = finish(aggregate(0..4));
        let trend = &views.sentiment_trend[0];
        assert_eq!(trend.name, "长安");
        let dynasties: Vec<&str> = trend.data.iter().map(|d| d.dynasty.as_str()).collect();
        assert_eq!(dynasties, vec!["唐", "宋"]);
        assert_eq!(trend.data[0].count, 2);
        assert!((trend.data[0].avg_score.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(
            trend.data[0].sentiment_distribution.get(&SentimentLabel::Positive),
            Some(&1)
        );
    }

    #[test]
    fn test_merge_matches_sequential() {
        let whole = finish(aggregate(0..4));
        let ab = finish(aggregate(0..2).merge(aggregate(2..4)));
        let ba = finish(aggregate(2..4).merge(aggregate(0..2)));
        for merged in [ab, ba] {
            assert_eq!(merged.geo_stats.len(), whole.geo_stats.len());
            for (a, b) in merged.geo_stats.iter().zip(&whole.geo_stats) {
                assert_eq!(a.name, b.name);
                assert_eq!(a.total_count, b.total_count);
                assert_eq!(a.poets, b.poets);
                assert_eq!(a.sentiment_distribution, b.sentiment_distribution);
                assert_eq!(a.by_dynasty, b.by_dynasty);
            }
        }
    }

    #[test]
    fn test_keyword_corpus_joins_contents_in_corpus_order() {
        let agg = aggregate(2..4).merge(aggregate(0..2));
        let views = agg.finish(
            &poems(),
            &CoordinateTable::builtin(),
            &EchoRanker,
            &ExclusionSet::builtin(),
        );
        let cloud = &views.keyword_clouds[0];
        assert_eq!(cloud.name, "长安");
        assert_eq!(cloud.keywords[0].word, "长安一片月\n长安洞庭\n又到长安");
    }

    #[test]
    fn test_ranker_failure_gives_empty_cloud() {
        let views = aggregate(0..4).finish(
            &poems(),
            &CoordinateTable::builtin(),
            &BrokenRanker,
            &ExclusionSet::builtin(),
        );
        assert!(views.keyword_clouds.iter().all(|c| c.keywords.is_empty()));
        assert_eq!(views.geo_stats.len(), 2);
    }

    #[test]
    fn test_missing_coordinate_is_absent() {
        let exclusion = ExclusionSet::builtin();
        let mut agg = GeoAggregator::default();
        agg.observe(0, &poem("", "唐", "辋川"), &[mention("辋川")], &sentiment(0.5), &exclusion);
        let views = agg.finish(
            &[poem("", "唐", "辋川")],
            &CoordinateTable::builtin(),
            &NoKeywords,
            &exclusion,
        );
        assert!(views.geo_stats[0].coordinate.is_none());
        assert!(views.geo_stats[0].poets.is_empty(), "empty author is not a poet");
    }
}
