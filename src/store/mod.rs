use std::collections::BTreeSet;

use anyhow::Result;

mod dataset;
mod wire;

pub use dataset::DatasetStore;

/// Bounds on which relationship facts a query includes. Defaults span the
/// full domain; an empty genre set means every genre.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphFilter {
    pub genres: BTreeSet<String>,
    pub popularity: (f64, f64),
    pub revenue: (i64, i64),
}

impl GraphFilter {
    pub const POPULARITY_FULL: (f64, f64) = (0.0, 100.0);
    pub const REVENUE_FULL: (i64, i64) = (0, 1_000_000_000);

    pub fn admits_movie(&self, movie: &MovieRow) -> bool {
        movie.popularity >= self.popularity.0
            && movie.popularity <= self.popularity.1
            && movie.revenue >= self.revenue.0
            && movie.revenue <= self.revenue.1
    }

    pub fn admits_genre(&self, genre: &str) -> bool {
        self.genres.is_empty() || self.genres.contains(genre)
    }
}

impl Default for GraphFilter {
    fn default() -> Self {
        Self {
            genres: BTreeSet::new(),
            popularity: Self::POPULARITY_FULL,
            revenue: Self::REVENUE_FULL,
        }
    }
}

/// One movie as the store reports it, with numeric fields already normalized.
#[derive(Clone, Debug)]
pub struct MovieRow {
    pub id: i64,
    pub title: String,
    pub popularity: f64,
    pub revenue: i64,
    pub budget: i64,
    pub vote_count: i64,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
    pub keywords: Vec<String>,
}

/// One (movie, acting, genre) relationship row, the unit the assembler
/// consumes. The movie row carries its director and keyword lists so the
/// assembler can emit those relationships without a second query.
#[derive(Clone, Debug)]
pub struct RelationRow {
    pub movie: MovieRow,
    pub actor: String,
    pub genre: String,
}

/// Store-client capability handed to the assembler per call. Implementations
/// are read-only and stateless across calls.
pub trait MovieStore {
    /// Relationship rows matching `filter`, at most `cap` of them.
    fn relation_rows(&self, filter: &GraphFilter, cap: usize) -> Result<Vec<RelationRow>>;

    /// Distinct genre names present in the store, sorted.
    fn genre_catalogue(&self) -> Result<Vec<String>>;
}
