use std::collections::HashSet;

/// Render-state emphasis around one node: the node itself, its direct
/// neighbors, and every incident link. Purely visual; the simulation never
/// sees this.
pub(super) struct HighlightState {
    pub(super) nodes: HashSet<usize>,
    pub(super) links: HashSet<usize>,
}

pub(super) fn neighborhood(
    adjacency: &[Vec<(usize, usize)>],
    center: usize,
) -> HighlightState {
    let mut nodes = HashSet::new();
    let mut links = HashSet::new();

    nodes.insert(center);
    if let Some(neighbors) = adjacency.get(center) {
        for &(node, link) in neighbors {
            nodes.insert(node);
            links.insert(link);
        }
    }

    HighlightState { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighborhood_collects_direct_neighbors_and_links() {
        // 0 -- 1 -- 2, links 0 and 1.
        let adjacency = vec![
            vec![(1, 0)],
            vec![(0, 0), (2, 1)],
            vec![(1, 1)],
        ];

        let state = neighborhood(&adjacency, 1);
        assert_eq!(state.nodes, HashSet::from([0, 1, 2]));
        assert_eq!(state.links, HashSet::from([0, 1]));

        let edge = neighborhood(&adjacency, 0);
        assert_eq!(edge.nodes, HashSet::from([0, 1]));
        assert_eq!(edge.links, HashSet::from([0]));
    }

    #[test]
    fn out_of_range_center_is_just_itself() {
        let state = neighborhood(&[], 5);
        assert_eq!(state.nodes, HashSet::from([5]));
        assert!(state.links.is_empty());
    }
}
