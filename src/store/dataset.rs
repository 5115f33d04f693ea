use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::wire::WireMovie;
use super::{GraphFilter, MovieRow, MovieStore, RelationRow};

/// File-backed movie store: one JSON export of the backing graph database.
/// Loaded per fetch and dropped when the fetch completes.
pub struct DatasetStore {
    movies: Vec<MovieRow>,
}

impl DatasetStore {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset file {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// A missing or non-array `movies` key is an empty store; individual
    /// entries that fail to parse are skipped.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: Value = serde_json::from_str(raw).context("dataset file is not valid JSON")?;

        let movies = parsed
            .get("movies")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| WireMovie::deserialize(entry).ok())
                    .filter_map(WireMovie::into_row)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { movies })
    }

    #[cfg(test)]
    pub fn from_rows(movies: Vec<MovieRow>) -> Self {
        Self { movies }
    }
}

impl MovieStore for DatasetStore {
    fn relation_rows(&self, filter: &GraphFilter, cap: usize) -> Result<Vec<RelationRow>> {
        let mut rows = Vec::new();

        'movies: for movie in &self.movies {
            if !filter.admits_movie(movie) {
                continue;
            }

            for genre in &movie.genres {
                if !filter.admits_genre(genre) {
                    continue;
                }

                for actor in &movie.actors {
                    if rows.len() >= cap {
                        break 'movies;
                    }

                    rows.push(RelationRow {
                        movie: movie.clone(),
                        actor: actor.clone(),
                        genre: genre.clone(),
                    });
                }
            }
        }

        Ok(rows)
    }

    fn genre_catalogue(&self) -> Result<Vec<String>> {
        let genres = self
            .movies
            .iter()
            .flat_map(|movie| movie.genres.iter().cloned())
            .collect::<BTreeSet<_>>();

        Ok(genres.into_iter().collect())
    }
}
