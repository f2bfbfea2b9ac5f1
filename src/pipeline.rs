//! Corpus-level driver: per-document extraction and scoring fan out over a
//! rayon pool, per-worker aggregates fold locally and are reduced with the
//! commutative merges of [`GeoAggregator`] and [`TrajectoryBuilder`].

use poem_types::Poem;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregate::{AggregateViews, GeoAggregator};
use crate::error::{Error, Result};
use crate::extract::{EntityExtractor, Mention};
use crate::resources::Resources;
use crate::sentiment::{SentimentResult, SentimentScorer};
use crate::services::{KeywordRanker, LocationTagger, PolarityScorer};
use crate::trajectory::{AuthorTrajectory, TrajectoryBuilder};

/// The external collaborators, borrowed for one run.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub tagger: &'a dyn LocationTagger,
    pub polarity: &'a dyn PolarityScorer,
    pub ranker: &'a dyn KeywordRanker,
}

#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub mentions: Vec<Mention>,
    pub sentiment: SentimentResult,
}

#[derive(Debug)]
pub struct Analysis {
    pub views: AggregateViews,
    pub trajectories: Vec<AuthorTrajectory>,
    pub poems_analyzed: usize,
    pub poems_skipped: usize,
}

/// Extract and score one poem. `None` when the poem has no content.
pub fn analyze_document(
    extractor: &EntityExtractor,
    scorer: &SentimentScorer,
    poem: &Poem,
) -> Option<DocumentAnalysis> {
    if poem.content.trim().is_empty() {
        return None;
    }
    let text = poem.full_text();
    Some(DocumentAnalysis {
        mentions: extractor.extract(&text),
        sentiment: scorer.score(&text),
    })
}

/// Per-worker partial state.
#[derive(Default)]
struct Partial {
    geo: GeoAggregator,
    paths: TrajectoryBuilder,
    analyzed: usize,
    skipped: usize,
}

impl Partial {
    fn merge(self, other: Partial) -> Partial {
        Partial {
            geo: self.geo.merge(other.geo),
            paths: self.paths.merge(other.paths),
            analyzed: self.analyzed + other.analyzed,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Run the whole corpus. Runs on the current rayon pool; wrap in
/// `ThreadPool::install` to bound parallelism.
pub fn analyze_corpus(poems: &[Poem], resources: &Resources, services: Services) -> Result<Analysis> {
    if poems.is_empty() {
        return Err(Error::no_data("the corpus contains no poems"));
    }

    let extractor = EntityExtractor::new(&resources.dictionary, &resources.exclusion, services.tagger);
    let scorer = SentimentScorer::new(services.polarity);
    let exclusion = &resources.exclusion;

    let partial = poems
        .par_iter()
        .enumerate()
        .fold(Partial::default, |mut acc, (i, poem)| {
            match analyze_document(&extractor, &scorer, poem) {
                Some(doc) => {
                    acc.geo.observe(i, poem, &doc.mentions, &doc.sentiment, exclusion);
                    acc.paths.observe(i, poem, &doc.mentions, exclusion);
                    acc.analyzed += 1;
                }
                None => {
                    warn!(index = i, title = %poem.title, "poem has no content, skipping");
                    acc.skipped += 1;
                }
            }
            acc
        })
        .reduce(Partial::default, Partial::merge);

    if partial.analyzed == 0 {
        return Err(Error::no_data("no poem in the corpus has any content"));
    }
    if partial.geo.is_empty() {
        warn!("no place mentions found in the corpus");
    }

    info!(
        analyzed = partial.analyzed,
        skipped = partial.skipped,
        places = partial.geo.len(),
        authors = partial.paths.len(),
        "corpus analyzed"
    );

    let views = partial.geo.finish(
        poems,
        &resources.coordinates,
        services.ranker,
        exclusion,
    );
    let trajectories = partial
        .paths
        .finish(&resources.coordinates, &resources.profiles, exclusion);

    for stat in views.geo_stats.iter().take(5) {
        info!(place = %stat.name, count = stat.total_count, "top place");
    }

    Ok(Analysis {
        views,
        trajectories,
        poems_analyzed: partial.analyzed,
        poems_skipped: partial.skipped,
    })
}
