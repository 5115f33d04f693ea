use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Square region of simulation space.
#[derive(Clone, Copy)]
pub(super) struct Quad {
    pub(super) center: Vec2,
    pub(super) half: f32,
}

impl Quad {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max.x - min.x).max(max.y - min.y).max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half: (span * 0.5) + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half && (point.y - self.center.y).abs() <= self.half
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        ((point.x >= self.center.x) as usize) | (((point.y >= self.center.y) as usize) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half * 0.5;
        let dx = if quadrant & 1 == 0 { -quarter } else { quarter };
        let dy = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(dx, dy),
            half: quarter,
        }
    }

    pub(super) fn side(self) -> f32 {
        self.half * 2.0
    }

    /// Squared distance between the closest points of two quads, zero when
    /// they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half + other.half;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        (dx * dx) + (dy * dy)
    }
}

/// Barnes-Hut partition over the current node positions. Interior nodes keep
/// aggregate mass and center of mass; members live only in leaves.
pub(super) struct QuadTree {
    pub(super) quad: Quad,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<QuadTree>>; 4],
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let quad = Quad::enclosing(positions)?;
        let members = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::split(quad, members, positions, 0))
    }

    fn split(quad: Quad, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = members.len() as f32;
        let mut center_of_mass = Vec2::ZERO;
        for &member in &members {
            center_of_mass += positions[member];
        }
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            quad,
            center_of_mass,
            mass,
            members,
            children: std::array::from_fn(|_| None),
        };

        if depth >= MAX_DEPTH || node.members.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &member in &node.members {
            buckets[quad.quadrant_of(positions[member])].push(member);
        }

        // All members in one quadrant means further splitting cannot separate
        // them; stay a leaf.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::split(
                    quad.child(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        node.members.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }
}

/// Read-only cell description for the debug overlay.
pub struct OverlayCell {
    pub center: Vec2,
    pub half: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

pub(super) fn collect_overlay_cells(tree: &QuadTree, depth: usize, out: &mut Vec<OverlayCell>) {
    out.push(OverlayCell {
        center: tree.quad.center,
        half: tree.quad.half,
        depth,
        is_leaf: tree.is_leaf(),
    });

    for child in tree.children.iter().flatten() {
        collect_overlay_cells(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_on_empty_or_nonfinite_input_is_none() {
        assert!(QuadTree::build(&[]).is_none());
        assert!(QuadTree::build(&[vec2(f32::NAN, 0.0)]).is_none());
    }

    #[test]
    fn tree_mass_matches_point_count() {
        let points = (0..40)
            .map(|i| vec2((i % 8) as f32 * 10.0, (i / 8) as f32 * 10.0))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&points).unwrap();
        assert_eq!(tree.mass as usize, points.len());
        assert!(!tree.is_leaf());
    }

    #[test]
    fn coincident_points_stay_in_one_leaf() {
        let points = vec![vec2(5.0, 5.0); 30];
        let tree = QuadTree::build(&points).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.members.len(), 30);
    }

    #[test]
    fn gap_sq_is_zero_for_overlapping_quads() {
        let a = Quad {
            center: Vec2::ZERO,
            half: 10.0,
        };
        let b = Quad {
            center: vec2(5.0, 0.0),
            half: 10.0,
        };
        assert_eq!(a.gap_sq(b), 0.0);

        let far = Quad {
            center: vec2(100.0, 0.0),
            half: 10.0,
        };
        assert!(a.gap_sq(far) > 0.0);
    }
}
