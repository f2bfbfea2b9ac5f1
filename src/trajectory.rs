//! Per-author place sequences in corpus order, merged with biographical
//! routes.

use std::collections::HashMap;

use poem_types::{Coordinate, GeoType, PlaceCount, Poem};

use crate::extract::Mention;
use crate::resources::{CoordinateTable, ExclusionSet, ProfileTable};

/// One place mention in an author's sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    /// Corpus index of the document it came from.
    pub doc_index: usize,
    pub place: String,
    pub surface_forms: Vec<String>,
    pub first_title: String,
    pub geo_type: GeoType,
    pub modern_name: String,
    pub coordinate: Option<Coordinate>,
}

/// A stop from the author's biographical record.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub period: Option<String>,
    pub place: String,
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone)]
pub struct AuthorTrajectory {
    pub author: String,
    pub birthplace: Option<String>,
    pub reference_route: Vec<RouteStop>,
    /// Place histogram, most frequent first, ties in first-seen order.
    pub frequency: Vec<PlaceCount>,
    pub occurrence_sequence: Vec<Occurrence>,
}

#[derive(Debug, Clone)]
struct Visit {
    doc_index: usize,
    title: String,
    mentions: Vec<Mention>,
}

/// Collects each author's mentions. Builders over disjoint corpus slices
/// merge by concatenation; [`TrajectoryBuilder::finish`] restores corpus
/// order by sorting on document index.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryBuilder {
    visits: HashMap<String, Vec<Visit>>,
}

impl TrajectoryBuilder {
    pub fn observe(
        &mut self,
        doc_index: usize,
        poem: &Poem,
        mentions: &[Mention],
        exclusion: &ExclusionSet,
    ) {
        if poem.author.is_empty() {
            return;
        }
        let kept: Vec<Mention> = mentions
            .iter()
            .filter(|m| !exclusion.contains(&m.canonical_name))
            .cloned()
            .collect();
        if kept.is_empty() {
            return;
        }
        self.visits
            .entry(poem.author.clone())
            .or_default()
            .push(Visit {
                doc_index,
                title: poem.title.clone(),
                mentions: kept,
            });
    }

    pub fn merge(mut self, other: TrajectoryBuilder) -> TrajectoryBuilder {
        for (author, visits) in other.visits {
            self.visits.entry(author).or_default().extend(visits);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// One trajectory per author, authors ordered by their first document.
    pub fn finish(
        self,
        coordinates: &CoordinateTable,
        profiles: &ProfileTable,
        exclusion: &ExclusionSet,
    ) -> Vec<AuthorTrajectory> {
        let mut authors: Vec<(String, Vec<Visit>)> = self.visits.into_iter().collect();
        for (_, visits) in authors.iter_mut() {
            visits.sort_by_key(|v| v.doc_index);
        }
        authors.sort_by_key(|(author, visits)| {
            let first = visits.first().map_or(usize::MAX, |v| v.doc_index);
            (first, author.clone())
        });

        authors
            .into_iter()
            .filter_map(|(author, visits)| {
                build_one(author, visits, coordinates, profiles, exclusion)
            })
            .collect()
    }
}

fn build_one(
    author: String,
    visits: Vec<Visit>,
    coordinates: &CoordinateTable,
    profiles: &ProfileTable,
    exclusion: &ExclusionSet,
) -> Option<AuthorTrajectory> {
    let occurrence_sequence: Vec<Occurrence> = visits
        .into_iter()
        .flat_map(|visit| {
            let Visit {
                doc_index,
                title,
                mentions,
            } = visit;
            mentions.into_iter().map(move |m| Occurrence {
                doc_index,
                coordinate: coordinates.locate(&m.canonical_name, &m.modern_name),
                surface_forms: m.surface_forms.into_iter().collect(),
                first_title: title.clone(),
                geo_type: m.geo_type,
                modern_name: m.modern_name,
                place: m.canonical_name,
            })
        })
        .filter(|o| !exclusion.contains(&o.place))
        .collect();

    if occurrence_sequence.is_empty() {
        return None;
    }

    let frequency = rank_places(&occurrence_sequence);

    let profile = profiles.get(&author);
    let reference_route = profile
        .map(|p| {
            p.route
                .iter()
                .filter(|w| !exclusion.contains(&w.place))
                .map(|w| RouteStop {
                    period: w.period.clone(),
                    place: w.place.clone(),
                    coordinate: coordinates.get(&w.place),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(AuthorTrajectory {
        birthplace: profile.and_then(|p| p.birthplace.clone()),
        author,
        reference_route,
        frequency,
        occurrence_sequence,
    })
}

/// Histogram of places, descending by count; equal counts keep the order in
/// which the places first appeared.
fn rank_places(sequence: &[Occurrence]) -> Vec<PlaceCount> {
    let mut counts: Vec<PlaceCount> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for occ in sequence {
        match slot.get(occ.place.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                slot.insert(occ.place.as_str(), counts.len());
                counts.push(PlaceCount {
                    place: occ.place.clone(),
                    count: 1,
                });
            }
        }
    }
    // Stable sort keeps first-seen order among ties.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
