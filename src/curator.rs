//! # Track Curator
//!
//! Turns [`MoodParameters`] into an ordered, duplicate-free list of tracks
//! with a single catalog search.
//!
//! ## Query Construction
//!
//! Genres first, then the mood adjectives, space separated. A term that
//! appears in both lists is kept once (at its first position) so no term
//! counts twice in the search.
//!
//! ```text
//! happy → "pop dance happy upbeat energetic"
//! fear  → "ambient atmospheric"
//! ```
//!
//! The curator never retries; a failed search is reported as
//! [`Curation::CatalogUnavailable`] and the session manager decides what to
//! do with an empty playlist.

use crate::error::CatalogUnavailable;
use crate::mood::TrackRef;
use crate::resolver::MoodParameters;
use crate::services::CatalogSearch;
use log::{debug, warn};
use std::collections::HashSet;

/// Outcome of one curation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Curation {
    Tracks(Vec<TrackRef>),
    CatalogUnavailable(CatalogUnavailable),
}

impl Curation {
    /// Curated tracks; empty when the catalog was unavailable.
    #[must_use]
    pub fn tracks(&self) -> &[TrackRef] {
        match self {
            Curation::Tracks(tracks) => tracks,
            Curation::CatalogUnavailable(_) => &[],
        }
    }

    #[must_use]
    pub fn into_tracks(self) -> Vec<TrackRef> {
        match self {
            Curation::Tracks(tracks) => tracks,
            Curation::CatalogUnavailable(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Curation::CatalogUnavailable(_))
    }
}

/// Build the catalog query for a parameter set.
#[must_use]
pub fn build_query(params: &MoodParameters) -> String {
    let mut seen = HashSet::new();
    params
        .genres
        .iter()
        .chain(params.descriptors)
        .filter(|term| seen.insert(**term))
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove repeated tracks, keeping first occurrences in order.
#[must_use]
pub fn dedup_tracks(tracks: Vec<TrackRef>) -> Vec<TrackRef> {
    let mut seen = HashSet::with_capacity(tracks.len());
    tracks
        .into_iter()
        .filter(|track| seen.insert(track.clone()))
        .collect()
}

/// Curates tracks from an injected catalog.
pub struct TrackCurator<'a> {
    catalog: &'a dyn CatalogSearch,
}

impl<'a> TrackCurator<'a> {
    pub fn new(catalog: &'a dyn CatalogSearch) -> Self {
        Self { catalog }
    }

    /// Search for at most `limit` tracks matching `params`.
    pub fn curate(&self, params: &MoodParameters, limit: usize) -> Curation {
        if limit == 0 {
            return Curation::Tracks(Vec::new());
        }

        let query = build_query(params);
        debug!("Searching catalog for '{query}' (limit {limit})");

        match self.catalog.search(&query, limit) {
            Ok(results) => {
                let found = results.len();
                let mut tracks = dedup_tracks(results);
                tracks.truncate(limit);
                debug!("Catalog returned {found} results, {} unique kept", tracks.len());
                Curation::Tracks(tracks)
            }
            Err(e) => {
                warn!("Track curation degraded: {e}");
                Curation::CatalogUnavailable(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::Mood;
    use crate::resolver::resolve;
    use std::sync::Mutex;

    struct FakeCatalog {
        results: Result<Vec<TrackRef>, CatalogUnavailable>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl FakeCatalog {
        fn returning(uris: &[&str]) -> Self {
            Self {
                results: Ok(uris.iter().map(|u| TrackRef::new(*u)).collect()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                results: Err(CatalogUnavailable("connection reset".into())),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl CatalogSearch for FakeCatalog {
        fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackRef>, CatalogUnavailable> {
            self.queries.lock().unwrap().push((query.to_string(), limit));
            self.results.clone()
        }
    }

    #[test]
    fn test_query_puts_genres_before_descriptors() {
        assert_eq!(build_query(&resolve(Mood::Happy)), "pop dance happy upbeat energetic");
        assert_eq!(build_query(&resolve(Mood::Sad)), "acoustic sad piano melancholic");
        assert_eq!(build_query(&resolve(Mood::Neutral)), "ambient chill calm relaxing");
    }

    #[test]
    fn test_query_drops_repeated_terms() {
        assert_eq!(build_query(&resolve(Mood::Fear)), "ambient atmospheric");
        assert_eq!(build_query(&resolve(Mood::Angry)), "rock metal intense aggressive");
    }

    #[test]
    fn test_duplicates_removed_first_occurrence_kept() {
        let catalog = FakeCatalog::returning(&[
            "spotify:track:a",
            "spotify:track:b",
            "spotify:track:a",
            "spotify:track:c",
            "spotify:track:b",
        ]);
        let curation = TrackCurator::new(&catalog).curate(&resolve(Mood::Happy), 10);
        let uris: Vec<&str> = curation.tracks().iter().map(TrackRef::uri).collect();
        assert_eq!(uris, ["spotify:track:a", "spotify:track:b", "spotify:track:c"]);
    }

    #[test]
    fn test_result_bounded_by_limit() {
        let catalog = FakeCatalog::returning(&["t1", "t2", "t3", "t4"]);
        let curation = TrackCurator::new(&catalog).curate(&resolve(Mood::Sad), 2);
        assert_eq!(curation.tracks().len(), 2);
        assert_eq!(catalog.queries.lock().unwrap()[0].1, 2);
    }

    #[test]
    fn test_zero_limit_skips_search() {
        let catalog = FakeCatalog::returning(&["t1"]);
        let curation = TrackCurator::new(&catalog).curate(&resolve(Mood::Sad), 0);
        assert!(curation.tracks().is_empty());
        assert!(catalog.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_catalog_failure_is_reported_not_raised() {
        let catalog = FakeCatalog::failing();
        let curation = TrackCurator::new(&catalog).curate(&resolve(Mood::Angry), 20);
        assert!(curation.is_unavailable());
        assert!(curation.tracks().is_empty());
        assert_eq!(catalog.queries.lock().unwrap().len(), 1);
    }
}
