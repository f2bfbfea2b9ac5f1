//! Per-document place extraction.
//!
//! Three independent layers each produce a partial [`MentionMap`]:
//! dictionary substring scan, suffix-pattern candidates and tagger `ns`
//! tokens. The maps are combined with [`merge`], then [`finalize`] drops
//! excluded and too-short names.

use std::collections::{BTreeMap, BTreeSet};

use poem_types::GeoType;
use tracing::warn;

use crate::dictionary::{GeoDictionary, Resolved};
use crate::pattern::PatternMatcher;
use crate::resources::ExclusionSet;
use crate::services::{LOCATION_TAG, LocationTagger};

/// One canonical place's occurrence in a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub canonical_name: String,
    pub geo_type: GeoType,
    pub modern_name: String,
    /// Every raw spelling seen for this place in the document.
    pub surface_forms: BTreeSet<String>,
}

/// Canonical name → mention, for one document.
pub type MentionMap = BTreeMap<String, Mention>;

/// Shortest canonical name kept after merging.
const MIN_NAME_CHARS: usize = 2;

/// Add one resolved hit under its canonical name.
pub fn record(map: &mut MentionMap, resolved: Resolved, surface: &str) {
    let entry = map
        .entry(resolved.canonical_name.clone())
        .or_insert_with(|| Mention {
            canonical_name: resolved.canonical_name,
            geo_type: resolved.geo_type,
            modern_name: resolved.modern_name,
            surface_forms: BTreeSet::new(),
        });
    entry.surface_forms.insert(surface.to_string());
}

/// Union two partial maps. Associative and commutative up to the
/// type/modern-name of a place, which both sides resolve identically.
pub fn merge(mut a: MentionMap, b: MentionMap) -> MentionMap {
    for (name, mention) in b {
        match a.get_mut(&name) {
            Some(existing) => existing.surface_forms.extend(mention.surface_forms),
            None => {
                a.insert(name, mention);
            }
        }
    }
    a
}

/// Layer 1: raw substring containment of every dictionary key.
pub fn dictionary_layer(dict: &GeoDictionary, text: &str) -> MentionMap {
    let mut map = MentionMap::new();
    for form in dict.surface_forms() {
        if text.contains(form) {
            record(&mut map, dict.resolve(form), form);
        }
    }
    map
}

/// Layer 2: suffix-pattern candidates.
pub fn pattern_layer(dict: &GeoDictionary, matcher: &PatternMatcher, text: &str) -> MentionMap {
    let mut map = MentionMap::new();
    for candidate in matcher.find_candidates(text) {
        record(&mut map, dict.resolve(&candidate), &candidate);
    }
    map
}

/// Layer 3: tokens the tagger labels as locations. A tagger failure only
/// empties this layer.
pub fn tagger_layer(dict: &GeoDictionary, tagger: &dyn LocationTagger, text: &str) -> MentionMap {
    let mut map = MentionMap::new();
    match tagger.tag(text) {
        Ok(tokens) => {
            for token in tokens.iter().filter(|t| t.tag == LOCATION_TAG) {
                record(&mut map, dict.resolve(&token.word), &token.word);
            }
        }
        Err(e) => warn!(error = %e, "location tagger failed, skipping tagger layer"),
    }
    map
}

/// Drop excluded and single-character names; sorted by canonical name.
pub fn finalize(map: MentionMap, exclusion: &ExclusionSet) -> Vec<Mention> {
    map.into_values()
        .filter(|m| !exclusion.contains(&m.canonical_name))
        .filter(|m| m.canonical_name.chars().count() >= MIN_NAME_CHARS)
        .filter(|m| !m.surface_forms.is_empty())
        .collect()
}

// ── Extractor ────────────────────────────────────────────────────────────

pub struct EntityExtractor<'a> {
    dictionary: &'a GeoDictionary,
    exclusion: &'a ExclusionSet,
    matcher: PatternMatcher,
    tagger: &'a dyn LocationTagger,
}

impl<'a> EntityExtractor<'a> {
    pub fn new(
        dictionary: &'a GeoDictionary,
        exclusion: &'a ExclusionSet,
        tagger: &'a dyn LocationTagger,
    ) -> Self {
        EntityExtractor {
            dictionary,
            exclusion,
            matcher: PatternMatcher::new(),
            tagger,
        }
    }

    /// Mentions in `text` (a document's title and content joined).
    /// Deterministic: same text and dictionary, same output.
    pub fn extract(&self, text: &str) -> Vec<Mention> {
        let by_dictionary = dictionary_layer(self.dictionary, text);
        let by_pattern = pattern_layer(self.dictionary, &self.matcher, text);
        let by_tagger = tagger_layer(self.dictionary, self.tagger, text);
        let merged = merge(merge(by_dictionary, by_pattern), by_tagger);
        finalize(merged, self.exclusion)
    }
}
