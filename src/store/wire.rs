//! Wire types for the dataset export and the one place where the store's
//! split-precision integer encoding is normalized to native numbers.

use serde::Deserialize;

use super::MovieRow;

/// Integer as it arrives from the graph store export: either a plain JSON
/// number or a split-precision `{low, high}` object. The value ranges in this
/// dataset (ids, counts, revenue) fit the low-order component.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
pub enum WireInt {
    Split { low: i64, high: i64 },
    Plain(i64),
}

impl WireInt {
    pub fn value(self) -> i64 {
        match self {
            Self::Split { low, .. } => low,
            Self::Plain(value) => value,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct WireMovie {
    pub(super) id: WireInt,
    pub(super) title: String,
    pub(super) popularity: Option<f64>,
    pub(super) revenue: Option<WireInt>,
    #[serde(default)]
    pub(super) budget: Option<WireInt>,
    #[serde(default)]
    pub(super) vote_count: Option<WireInt>,
    #[serde(default)]
    pub(super) release_date: Option<String>,
    #[serde(default)]
    pub(super) genres: Vec<String>,
    #[serde(default)]
    pub(super) actors: Vec<String>,
    #[serde(default)]
    pub(super) directors: Vec<String>,
    #[serde(default)]
    pub(super) keywords: Vec<String>,
}

impl WireMovie {
    /// Rows missing popularity or revenue are excluded from query results,
    /// matching the store's `IS NOT NULL` bounds on both fields.
    pub(super) fn into_row(self) -> Option<MovieRow> {
        let popularity = self.popularity?;
        let revenue = self.revenue?.value();
        let year = self
            .release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse::<i32>().ok());

        Some(MovieRow {
            id: self.id.value(),
            title: self.title,
            popularity,
            revenue,
            budget: self.budget.map_or(0, WireInt::value),
            vote_count: self.vote_count.map_or(0, WireInt::value),
            year,
            genres: self.genres,
            actors: self.actors,
            directors: self.directors,
            keywords: self.keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_int_decodes_both_encodings() {
        let split: WireInt = serde_json::from_str(r#"{"low": 19995, "high": 0}"#).unwrap();
        assert_eq!(split.value(), 19995);

        let plain: WireInt = serde_json::from_str("42").unwrap();
        assert_eq!(plain.value(), 42);
    }

    #[test]
    fn wire_int_low_order_wins() {
        let split: WireInt = serde_json::from_str(r#"{"low": 7, "high": 3}"#).unwrap();
        assert_eq!(split.value(), 7);
    }

    #[test]
    fn movie_without_popularity_or_revenue_is_excluded() {
        let raw = r#"{"id": 1, "title": "Unreleased", "popularity": null, "revenue": 5}"#;
        let movie: WireMovie = serde_json::from_str(raw).unwrap();
        assert!(movie.into_row().is_none());

        let raw = r#"{"id": 1, "title": "Unreleased", "popularity": 3.5}"#;
        let movie: WireMovie = serde_json::from_str(raw).unwrap();
        assert!(movie.into_row().is_none());
    }

    #[test]
    fn movie_row_normalizes_fields() {
        let raw = r#"{
            "id": {"low": 19995, "high": 0},
            "title": "Avatar",
            "popularity": 150.44,
            "revenue": {"low": 2787965087, "high": 0},
            "budget": 237000000,
            "vote_count": {"low": 11800, "high": 0},
            "release_date": "2009-12-10",
            "genres": ["Action", "Science Fiction"],
            "actors": ["Sam Worthington"],
            "keywords": ["culture clash"]
        }"#;
        let movie: WireMovie = serde_json::from_str(raw).unwrap();
        let row = movie.into_row().unwrap();

        assert_eq!(row.id, 19995);
        assert_eq!(row.revenue, 2787965087);
        assert_eq!(row.budget, 237000000);
        assert_eq!(row.vote_count, 11800);
        assert_eq!(row.year, Some(2009));
        assert!(row.directors.is_empty());
    }

}
