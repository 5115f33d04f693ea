use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;
use super::{SimConfig, SimLink, SimNode};

/// Quad side / distance ratio under which a whole cell is treated as one
/// aggregate body.
const APPROXIMATION_RATIO: f32 = 0.75;

/// Floor under pair distances so near-coincident nodes cannot produce
/// unbounded forces.
const MIN_DISTANCE: f32 = 2.0;

/// Stable, non-zero separation direction for coincident points.
fn separation_direction(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Springs pulling linked pairs toward the configured separation, strength
/// scaled down for high-degree endpoints so hubs are not torn apart.
pub(super) fn accumulate_link_forces(
    nodes: &[SimNode],
    links: &[SimLink],
    config: &SimConfig,
    forces: &mut [Vec2],
) {
    for link in links {
        let delta = nodes[link.target].pos - nodes[link.source].pos;
        let distance = delta.length().max(MIN_DISTANCE);
        let direction = delta / distance;

        let displacement = distance - config.link_distance;
        let correction = direction * (displacement * link.strength * config.link_strength);

        forces[link.target] -= correction * link.bias;
        forces[link.source] += correction * (1.0 - link.bias);
    }
}

/// Barnes-Hut accumulation of the inverse-square pair repulsion acting on
/// `index`.
pub(super) fn accumulate_repulsion(
    tree: &QuadTree,
    index: usize,
    positions: &[Vec2],
    config: &SimConfig,
    force: &mut Vec2,
) {
    if tree.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if tree.is_leaf() {
        for &other in &tree.members {
            if other == index {
                continue;
            }

            let delta = point - positions[other];
            let raw_sq = delta.length_sq();
            let direction = if raw_sq > 0.0001 {
                delta / raw_sq.sqrt()
            } else {
                separation_direction(index, other)
            };
            let distance_sq = raw_sq.max(MIN_DISTANCE * MIN_DISTANCE);
            *force += direction * (config.repulsion_strength / distance_sq);
        }
        return;
    }

    let delta = point - tree.center_of_mass;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE * MIN_DISTANCE);
    let distance = distance_sq.sqrt();
    let can_approximate = !tree.quad.contains(point)
        && (tree.quad.side() / distance) < APPROXIMATION_RATIO
        && tree.mass > 1.0;

    if can_approximate {
        *force += (delta / distance) * (config.repulsion_strength * tree.mass / distance_sq);
        return;
    }

    for child in tree.children.iter().flatten() {
        accumulate_repulsion(child, index, positions, config, force);
    }
}

/// Pairwise overlap resolution between node circles, pruned by quad
/// separation. `same` marks a self-pairing traversal so each pair is visited
/// once.
pub(super) fn accumulate_collisions(
    tree_a: &QuadTree,
    tree_b: &QuadTree,
    same: bool,
    positions: &[Vec2],
    radii: &[f32],
    max_pair_reach_sq: f32,
    config: &SimConfig,
    forces: &mut [Vec2],
) {
    if tree_a.quad.gap_sq(tree_b.quad) > max_pair_reach_sq {
        return;
    }

    if tree_a.is_leaf() && tree_b.is_leaf() {
        if same {
            for (slot, &from) in tree_a.members.iter().enumerate() {
                for &to in &tree_a.members[slot + 1..] {
                    push_apart(from, to, positions, radii, config, forces);
                }
            }
        } else {
            for &from in &tree_a.members {
                for &to in &tree_b.members {
                    push_apart(from, to, positions, radii, config, forces);
                }
            }
        }
        return;
    }

    if same {
        for first in 0..4 {
            let Some(child_a) = tree_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collisions(
                child_a,
                child_a,
                true,
                positions,
                radii,
                max_pair_reach_sq,
                config,
                forces,
            );

            for second in (first + 1)..4 {
                if let Some(child_b) = tree_a.children[second].as_ref() {
                    accumulate_collisions(
                        child_a,
                        child_b,
                        false,
                        positions,
                        radii,
                        max_pair_reach_sq,
                        config,
                        forces,
                    );
                }
            }
        }
        return;
    }

    // Descend into the larger side first to keep the traversal balanced.
    let descend_a = if tree_a.is_leaf() {
        false
    } else if tree_b.is_leaf() {
        true
    } else {
        tree_a.quad.half >= tree_b.quad.half
    };

    if descend_a {
        for child in tree_a.children.iter().flatten() {
            accumulate_collisions(
                child,
                tree_b,
                false,
                positions,
                radii,
                max_pair_reach_sq,
                config,
                forces,
            );
        }
    } else {
        for child in tree_b.children.iter().flatten() {
            accumulate_collisions(
                tree_a,
                child,
                false,
                positions,
                radii,
                max_pair_reach_sq,
                config,
                forces,
            );
        }
    }
}

fn push_apart(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    config: &SimConfig,
    forces: &mut [Vec2],
) {
    let clearance = radii[from] + radii[to];
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    if distance_sq >= clearance * clearance {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        separation_direction(from, to)
    };

    let push = direction * ((clearance - distance) * config.collision_strength);
    forces[from] += push;
    forces[to] -= push;
}
