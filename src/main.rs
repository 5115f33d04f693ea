mod app;
mod graph;
mod sim;
mod store;
mod util;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;

use app::ExplorerApp;
use store::GraphFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Movie graph dataset (JSON export of the backing store).
    #[arg(long, default_value = "data/movies.json")]
    data: PathBuf,

    /// Restrict the initial view to these genres (comma separated).
    #[arg(long, value_delimiter = ',')]
    genres: Vec<String>,

    #[arg(long)]
    pop_min: Option<f64>,

    #[arg(long)]
    pop_max: Option<f64>,

    #[arg(long)]
    rev_min: Option<i64>,

    #[arg(long)]
    rev_max: Option<i64>,

    /// Cap on relationship rows fetched per refresh.
    #[arg(long, default_value_t = 100)]
    row_cap: usize,
}

/// Missing or non-finite bounds fall back to the full domain.
fn initial_filter(args: &Args) -> GraphFilter {
    let defaults = GraphFilter::default();

    GraphFilter {
        genres: args.genres.iter().cloned().collect::<BTreeSet<_>>(),
        popularity: (
            args.pop_min
                .filter(|value| value.is_finite())
                .unwrap_or(defaults.popularity.0),
            args.pop_max
                .filter(|value| value.is_finite())
                .unwrap_or(defaults.popularity.1),
        ),
        revenue: (
            args.rev_min.unwrap_or(defaults.revenue.0),
            args.rev_max.unwrap_or(defaults.revenue.1),
        ),
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let filter = initial_filter(&args);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "cinegraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ExplorerApp::new(
                cc,
                args.data.clone(),
                filter.clone(),
                args.row_cap,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bounds_default_to_full_domain() {
        let args = Args {
            data: PathBuf::from("movies.json"),
            genres: Vec::new(),
            pop_min: None,
            pop_max: None,
            rev_min: None,
            rev_max: None,
            row_cap: 100,
        };

        let filter = initial_filter(&args);
        assert_eq!(filter, GraphFilter::default());
    }

    #[test]
    fn non_finite_bounds_are_ignored() {
        let args = Args {
            data: PathBuf::from("movies.json"),
            genres: vec!["Action".to_string()],
            pop_min: Some(f64::NAN),
            pop_max: Some(55.0),
            rev_min: Some(1_000_000),
            rev_max: None,
            row_cap: 100,
        };

        let filter = initial_filter(&args);
        assert_eq!(filter.popularity, (0.0, 55.0));
        assert_eq!(filter.revenue, (1_000_000, 1_000_000_000));
        assert!(filter.genres.contains("Action"));
    }
}
