use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::store::{GraphFilter, MovieStore, RelationRow};

use super::{GraphLink, GraphNode, LinkKind, NodeId, NodeKind, Snapshot};

/// Keywords per movie are bounded so one keyword-heavy movie cannot flood the
/// layout with leaf nodes.
const KEYWORDS_PER_MOVIE: usize = 4;

/// Translate a filter into a node/link snapshot: query the store for matching
/// relationship rows, upsert one node per distinct entity (first occurrence
/// wins), and append one link per relationship encountered. Director and
/// keyword relationships ride on the movie row and are emitted once per
/// distinct movie.
pub fn assemble_snapshot(
    store: &dyn MovieStore,
    filter: &GraphFilter,
    row_cap: usize,
) -> Result<Snapshot> {
    let rows = store.relation_rows(filter, row_cap)?;

    let mut builder = SnapshotBuilder::default();
    for row in &rows {
        builder.add_row(row);
    }

    Ok(builder.finish())
}

#[derive(Default)]
struct SnapshotBuilder {
    nodes: Vec<GraphNode>,
    index_by_id: HashMap<NodeId, usize>,
    links: Vec<GraphLink>,
    seen_links: HashSet<(NodeId, NodeId, LinkKind)>,
    expanded_movies: HashSet<i64>,
}

impl SnapshotBuilder {
    fn add_row(&mut self, row: &RelationRow) {
        let movie_id = NodeId::Movie(row.movie.id);
        self.upsert(movie_id.clone(), || NodeKind::Movie {
            title: row.movie.title.clone(),
            popularity: row.movie.popularity,
            revenue: row.movie.revenue,
            budget: row.movie.budget,
            vote_count: row.movie.vote_count,
            year: row.movie.year,
        });

        let actor_id = NodeId::Name(row.actor.clone());
        self.upsert(actor_id.clone(), || NodeKind::Actor {
            name: row.actor.clone(),
        });
        self.link(actor_id, movie_id.clone(), LinkKind::ActedIn);

        let genre_id = NodeId::Name(row.genre.clone());
        self.upsert(genre_id.clone(), || NodeKind::Genre {
            name: row.genre.clone(),
        });
        self.link(movie_id.clone(), genre_id, LinkKind::HasGenre);

        if self.expanded_movies.insert(row.movie.id) {
            for director in &row.movie.directors {
                let director_id = NodeId::Name(director.clone());
                self.upsert(director_id.clone(), || NodeKind::Director {
                    name: director.clone(),
                });
                self.link(director_id, movie_id.clone(), LinkKind::Directed);
            }

            for keyword in row.movie.keywords.iter().take(KEYWORDS_PER_MOVIE) {
                let keyword_id = NodeId::Name(keyword.clone());
                self.upsert(keyword_id.clone(), || NodeKind::Keyword {
                    name: keyword.clone(),
                });
                self.link(movie_id.clone(), keyword_id, LinkKind::HasKeyword);
            }
        }
    }

    fn upsert(&mut self, id: NodeId, kind: impl FnOnce() -> NodeKind) {
        if self.index_by_id.contains_key(&id) {
            return;
        }

        self.index_by_id.insert(id.clone(), self.nodes.len());
        self.nodes.push(GraphNode { id, kind: kind() });
    }

    fn link(&mut self, source: NodeId, target: NodeId, kind: LinkKind) {
        if !self
            .seen_links
            .insert((source.clone(), target.clone(), kind))
        {
            return;
        }

        self.links.push(GraphLink {
            source,
            target,
            kind,
        });
    }

    fn finish(mut self) -> Snapshot {
        // Links are built against upserted nodes, so this only ever drops
        // something if a builder bug let an endpoint through; keep the sweep
        // fail-soft either way.
        let index_by_id = &self.index_by_id;
        self.links.retain(|link| {
            index_by_id.contains_key(&link.source) && index_by_id.contains_key(&link.target)
        });

        Snapshot {
            nodes: self.nodes,
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use crate::store::{DatasetStore, MovieRow};

    use super::*;

    fn movie(
        id: i64,
        title: &str,
        popularity: f64,
        genres: &[&str],
        actors: &[&str],
        directors: &[&str],
        keywords: &[&str],
    ) -> MovieRow {
        MovieRow {
            id,
            title: title.to_string(),
            popularity,
            revenue: 400_000_000,
            budget: 90_000_000,
            vote_count: 2100,
            year: Some(2012),
            genres: genres.iter().map(|s| s.to_string()).collect(),
            actors: actors.iter().map(|s| s.to_string()).collect(),
            directors: directors.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn shared_cast_store() -> DatasetStore {
        DatasetStore::from_rows(vec![
            movie(
                1,
                "Storm Front",
                20.0,
                &["Action"],
                &["Ada Lee", "Ben Ray"],
                &["Pat Doe"],
                &["storm"],
            ),
            movie(
                2,
                "Storm Rising",
                40.0,
                &["Action"],
                &["Ada Lee"],
                &["Pat Doe"],
                &[],
            ),
        ])
    }

    #[test]
    fn node_ids_are_unique() {
        let store = shared_cast_store();
        let snapshot = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();

        let mut seen = HashSet::new();
        for node in &snapshot.nodes {
            assert!(seen.insert(node.id.clone()), "duplicate node {}", node.id);
        }

        // Ada Lee and Pat Doe appear via both movies but land once each.
        let ada = snapshot
            .nodes
            .iter()
            .filter(|n| n.id == NodeId::Name("Ada Lee".to_string()))
            .count();
        assert_eq!(ada, 1);
    }

    #[test]
    fn every_link_resolves_to_a_node() {
        let store = shared_cast_store();
        let snapshot = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();

        let ids = snapshot
            .nodes
            .iter()
            .map(|n| n.id.clone())
            .collect::<HashSet<_>>();
        for link in &snapshot.links {
            assert!(ids.contains(&link.source));
            assert!(ids.contains(&link.target));
        }
    }

    #[test]
    fn assembly_is_deterministic_across_calls() {
        let store = shared_cast_store();
        let first = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();
        let second = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();

        let ids = |snapshot: &Snapshot| {
            snapshot
                .nodes
                .iter()
                .map(|n| n.id.clone())
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.links.len(), second.links.len());
    }

    #[test]
    fn emits_supplemental_director_and_keyword_links_once() {
        let store = shared_cast_store();
        let snapshot = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();

        let directed = snapshot
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::Directed)
            .count();
        // Pat Doe directed both movies: one DIRECTED link per movie.
        assert_eq!(directed, 2);

        let keyword_links = snapshot
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::HasKeyword)
            .count();
        assert_eq!(keyword_links, 1);
    }

    #[test]
    fn repeated_rows_do_not_duplicate_links() {
        // Two genres x one actor produces two rows with the same acting pair.
        let store = DatasetStore::from_rows(vec![movie(
            7,
            "Two Worlds",
            30.0,
            &["Action", "Drama"],
            &["Ada Lee"],
            &[],
            &[],
        )]);
        let snapshot = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();

        let acted = snapshot
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::ActedIn)
            .count();
        assert_eq!(acted, 1);
    }

    #[test]
    fn empty_store_yields_empty_snapshot() {
        let store = DatasetStore::from_rows(Vec::new());
        let snapshot = assemble_snapshot(&store, &GraphFilter::default(), 100).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.links.is_empty());
    }

    #[test]
    fn filter_scenario_keeps_only_matching_movie_subgraph() {
        let store = DatasetStore::from_rows(vec![
            movie(
                1,
                "Hard Target",
                20.0,
                &["Action"],
                &["Ada Lee"],
                &["Pat Doe"],
                &[],
            ),
            movie(
                2,
                "Quiet Laughs",
                80.0,
                &["Comedy"],
                &["Cy Monroe"],
                &["Lou Chen"],
                &[],
            ),
        ]);
        let filter = GraphFilter {
            genres: BTreeSet::from(["Action".to_string()]),
            popularity: (10.0, 50.0),
            revenue: (0, 1_000_000_000),
        };

        let snapshot = assemble_snapshot(&store, &filter, 100).unwrap();

        let movies = snapshot
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Movie { .. }))
            .collect::<Vec<_>>();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, NodeId::Movie(1));
        assert!(
            !snapshot
                .nodes
                .iter()
                .any(|n| n.id == NodeId::Name("Cy Monroe".to_string()))
        );
        assert!(
            !snapshot
                .nodes
                .iter()
                .any(|n| n.id == NodeId::Name("Comedy".to_string()))
        );
    }
}
