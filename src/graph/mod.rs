use std::fmt;

use serde::{Serialize, Serializer};

mod assemble;

pub use assemble::assemble_snapshot;

/// Natural key of a node: the numeric movie id, or the bare name for people,
/// genres and keywords. Serializes untagged so the JSON contract carries a
/// number for movies and a string for everything else.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Movie(i64),
    Name(String),
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Movie(id) => serializer.serialize_i64(*id),
            Self::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Entity payload, tagged by the closed label set.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "label")]
pub enum NodeKind {
    Movie {
        title: String,
        popularity: f64,
        revenue: i64,
        budget: i64,
        vote_count: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        year: Option<i32>,
    },
    Actor {
        name: String,
    },
    Director {
        name: String,
    },
    Genre {
        name: String,
    },
    Keyword {
        name: String,
    },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Movie { .. } => "Movie",
            Self::Actor { .. } => "Actor",
            Self::Director { .. } => "Director",
            Self::Genre { .. } => "Genre",
            Self::Keyword { .. } => "Keyword",
        }
    }

    /// Circle radius in world units, also the collision footprint.
    pub fn base_radius(&self) -> f32 {
        match self {
            Self::Movie { .. } => 13.0,
            Self::Genre { .. } => 10.0,
            Self::Actor { .. } | Self::Director { .. } => 8.0,
            Self::Keyword { .. } => 5.5,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn display_name(&self) -> &str {
        match &self.kind {
            NodeKind::Movie { title, .. } => title,
            NodeKind::Actor { name }
            | NodeKind::Director { name }
            | NodeKind::Genre { name }
            | NodeKind::Keyword { name } => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LinkKind {
    #[serde(rename = "ACTED_IN")]
    ActedIn,
    #[serde(rename = "DIRECTED")]
    Directed,
    #[serde(rename = "HAS_GENRE")]
    HasGenre,
    #[serde(rename = "HAS_KEYWORD")]
    HasKeyword,
}

impl LinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ActedIn => "ACTED_IN",
            Self::Directed => "DIRECTED",
            Self::HasGenre => "HAS_GENRE",
            Self::HasKeyword => "HAS_KEYWORD",
        }
    }

    /// Attribute-ish relationships render dashed, credit relationships solid.
    pub fn dashed(self) -> bool {
        matches!(self, Self::HasGenre | Self::HasKeyword)
    }
}

/// Directed for bookkeeping, rendered undirected.
#[derive(Clone, Debug, Serialize)]
pub struct GraphLink {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// One complete node/link result set for a filter. Produced fresh on every
/// refresh, never patched in place.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Snapshot {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_node_serializes_to_contract_shape() {
        let node = GraphNode {
            id: NodeId::Movie(19995),
            kind: NodeKind::Movie {
                title: "Avatar".to_string(),
                popularity: 150.44,
                revenue: 2_787_965_087,
                budget: 237_000_000,
                vote_count: 11_800,
                year: Some(2009),
            },
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["id"], 19995);
        assert_eq!(value["label"], "Movie");
        assert_eq!(value["title"], "Avatar");
        assert!(value.get("name").is_none());
    }

    #[test]
    fn person_node_serializes_with_name_and_string_id() {
        let node = GraphNode {
            id: NodeId::Name("Sam Worthington".to_string()),
            kind: NodeKind::Actor {
                name: "Sam Worthington".to_string(),
            },
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["id"], "Sam Worthington");
        assert_eq!(value["label"], "Actor");
        assert_eq!(value["name"], "Sam Worthington");
    }

    #[test]
    fn link_serializes_kind_as_type() {
        let link = GraphLink {
            source: NodeId::Name("Sam Worthington".to_string()),
            target: NodeId::Movie(19995),
            kind: LinkKind::ActedIn,
        };

        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["type"], "ACTED_IN");
        assert_eq!(value["source"], "Sam Worthington");
        assert_eq!(value["target"], 19995);
    }

    #[test]
    fn radii_order_movie_above_keyword() {
        let movie = NodeKind::Movie {
            title: String::new(),
            popularity: 0.0,
            revenue: 0,
            budget: 0,
            vote_count: 0,
            year: None,
        };
        let keyword = NodeKind::Keyword {
            name: String::new(),
        };
        assert!(movie.base_radius() > keyword.base_radius());
    }
}
