//! Iterative force layout over a node/link snapshot. The simulation owns the
//! node positions and velocities once constructed; the rendering layer reads
//! positions and requests pin changes, nothing else.

use std::collections::HashMap;
use std::f32::consts::TAU;

use anyhow::{Result, bail};
use eframe::egui::{Vec2, vec2};

use crate::graph::{GraphLink, GraphNode, NodeId};
use crate::util::stable_pair;

mod forces;
mod quadtree;

pub use quadtree::OverlayCell;

use forces::{accumulate_collisions, accumulate_link_forces, accumulate_repulsion};
use quadtree::{QuadTree, collect_overlay_cells};

const MAX_FORCE: f32 = 300.0;
const MAX_SPEED: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    /// Target separation for linked pairs, in world units.
    pub link_distance: f32,
    /// Scale on the degree-derived per-link spring strength.
    pub link_strength: f32,
    pub repulsion_strength: f32,
    pub center_strength: f32,
    pub collision_strength: f32,
    /// Fraction of velocity removed each tick.
    pub velocity_decay: f32,
    /// Alpha below which the simulation is considered converged.
    pub alpha_min: f32,
    /// Alpha restored when a drag perturbs a cooled layout.
    pub reheat_alpha: f32,
    /// Hard stop on ticks per run; the derived alpha decay crosses
    /// `alpha_min` on the same tick when starting from full temperature.
    pub max_ticks: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            link_distance: 80.0,
            link_strength: 1.0,
            repulsion_strength: 1100.0,
            center_strength: 0.05,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            reheat_alpha: 0.3,
            max_ticks: 300,
        }
    }
}

impl SimConfig {
    pub fn alpha_decay(&self) -> f32 {
        1.0 - self.alpha_min.powf(1.0 / self.max_ticks as f32)
    }
}

/// Layout state for one node. `pin` holds the node at a fixed coordinate
/// while the user drags it.
pub struct SimNode {
    pub id: NodeId,
    pub radius: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub pin: Option<Vec2>,
}

struct SimLink {
    source: usize,
    target: usize,
    /// `1 / min(degree)` of the endpoints, the usual hub-preserving scaling.
    strength: f32,
    /// Share of the correction taken by the target endpoint.
    bias: f32,
}

#[derive(Default)]
struct ForceScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index_by_id: HashMap<NodeId, usize>,
    config: SimConfig,
    bounds: Vec2,
    alpha: f32,
    ticks: usize,
    scratch: ForceScratch,
}

impl Simulation {
    /// Builds a seeded simulation. Fails if any link references a node id
    /// absent from `nodes`; the assembler filters those out, so receiving one
    /// here is a defect upstream.
    pub fn new(
        nodes: &[GraphNode],
        links: &[GraphLink],
        bounds: Vec2,
        config: SimConfig,
    ) -> Result<Self> {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let sim_nodes = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                index_by_id.insert(node.id.clone(), index);
                SimNode {
                    id: node.id.clone(),
                    radius: node.kind.base_radius(),
                    pos: Vec2::ZERO,
                    vel: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect::<Vec<_>>();

        let mut degrees = vec![0usize; sim_nodes.len()];
        let mut endpoints = Vec::with_capacity(links.len());
        for link in links {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                bail!(
                    "link {} -> {} references a node missing from the snapshot",
                    link.source,
                    link.target
                );
            };
            degrees[source] += 1;
            degrees[target] += 1;
            endpoints.push((source, target));
        }

        let sim_links = endpoints
            .into_iter()
            .map(|(source, target)| {
                let min_degree = degrees[source].min(degrees[target]).max(1);
                SimLink {
                    source,
                    target,
                    strength: 1.0 / min_degree as f32,
                    bias: degrees[source] as f32
                        / (degrees[source] + degrees[target]).max(1) as f32,
                }
            })
            .collect();

        let mut simulation = Self {
            nodes: sim_nodes,
            links: sim_links,
            index_by_id,
            config,
            bounds,
            alpha: 1.0,
            ticks: 0,
            scratch: ForceScratch::default(),
        };
        simulation.reseed();
        Ok(simulation)
    }

    /// Simulation with nothing in it; ticking is a no-op until a real
    /// snapshot arrives.
    pub fn empty(bounds: Vec2, config: SimConfig) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            index_by_id: HashMap::new(),
            config,
            bounds,
            alpha: 0.0,
            ticks: 0,
            scratch: ForceScratch::default(),
        }
    }

    /// Back to the Seeded state: deterministic ring placement with per-id
    /// jitter, zero velocity, full temperature. Pins are kept so an
    /// in-progress drag survives an instability reset.
    pub fn reseed(&mut self) {
        let count = self.nodes.len().max(1);
        let ring = ((count as f32).sqrt() * self.config.link_distance * 0.35)
            .min(self.bounds.min_elem().max(200.0) * 0.45);

        for index in 0..self.nodes.len() {
            let key = self.nodes[index].id.to_string();
            let (jx, jy) = stable_pair(&key);
            let angle = (index as f32 / count as f32) * TAU;

            let node = &mut self.nodes[index];
            node.pos = match node.pin {
                Some(pin) => pin,
                None => vec2(angle.cos(), angle.sin()) * ring + vec2(jx, jy) * (ring * 0.3),
            };
            node.vel = Vec2::ZERO;
        }

        self.alpha = 1.0;
        self.ticks = 0;
    }

    pub fn running(&self) -> bool {
        !self.nodes.is_empty()
            && self.alpha >= self.config.alpha_min
            && self.ticks < self.config.max_ticks
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Read-only coordinate snapshot.
    pub fn positions(&self) -> impl Iterator<Item = (&NodeId, Vec2)> + '_ {
        self.nodes.iter().map(|node| (&node.id, node.pos))
    }

    pub fn set_pinned(&mut self, id: &NodeId, pos: Vec2) {
        if let Some(&index) = self.index_by_id.get(id) {
            let node = &mut self.nodes[index];
            node.pin = Some(pos);
            node.pos = pos;
            node.vel = Vec2::ZERO;
        }
    }

    pub fn clear_pinned(&mut self, id: &NodeId) {
        if let Some(&index) = self.index_by_id.get(id) {
            self.nodes[index].pin = None;
        }
    }

    /// Restores enough temperature to resume ticking after a perturbation.
    pub fn reheat(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        self.ticks = 0;
    }

    /// Live-tunable force parameters; a change perturbs the layout, so the
    /// run restarts warm.
    pub fn set_config(&mut self, config: SimConfig) {
        if self.config != config {
            self.config = config;
            self.reheat();
        }
    }

    /// One integration step. Returns whether the caller should keep ticking.
    pub fn tick(&mut self) -> bool {
        if self.nodes.is_empty() {
            self.alpha = 0.0;
            return false;
        }
        if !self.running() {
            return false;
        }

        self.ticks += 1;
        self.alpha *= 1.0 - self.config.alpha_decay();

        let node_count = self.nodes.len();
        let scratch = &mut self.scratch;
        scratch.forces.resize(node_count, Vec2::ZERO);
        scratch.forces.fill(Vec2::ZERO);
        scratch.positions.clear();
        scratch.radii.clear();
        for node in &self.nodes {
            scratch.positions.push(node.pos);
            scratch.radii.push(node.radius);
        }

        accumulate_link_forces(&self.nodes, &self.links, &self.config, &mut scratch.forces);

        if node_count > 1
            && let Some(tree) = QuadTree::build(&scratch.positions)
        {
            for (index, force) in scratch.forces.iter_mut().enumerate() {
                accumulate_repulsion(&tree, index, &scratch.positions, &self.config, force);
            }

            let max_reach = scratch
                .radii
                .iter()
                .fold(0.0_f32, |acc, &radius| acc.max(radius))
                * 2.0;
            accumulate_collisions(
                &tree,
                &tree,
                true,
                &scratch.positions,
                &scratch.radii,
                max_reach * max_reach,
                &self.config,
                &mut scratch.forces,
            );
        }

        for (index, force) in scratch.forces.iter_mut().enumerate() {
            *force -= self.nodes[index].pos * self.config.center_strength;
        }

        let keep = 1.0 - self.config.velocity_decay;
        let mut unstable = false;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if let Some(pin) = node.pin {
                node.pos = pin;
                node.vel = Vec2::ZERO;
                continue;
            }

            let mut force = scratch.forces[index];
            let force_sq = force.length_sq();
            if force_sq > MAX_FORCE * MAX_FORCE {
                force *= MAX_FORCE / force_sq.sqrt();
            }

            let mut vel = (node.vel + force * self.alpha) * keep;
            let speed_sq = vel.length_sq();
            if speed_sq > MAX_SPEED * MAX_SPEED {
                vel *= MAX_SPEED / speed_sq.sqrt();
            }

            node.vel = vel;
            node.pos += vel;

            if !node.pos.x.is_finite() || !node.pos.y.is_finite() {
                unstable = true;
            }
        }

        if unstable {
            log::error!("force simulation produced a non-finite coordinate; reseeding layout");
            self.reseed();
        }

        self.running()
    }

    /// Current Barnes-Hut partition, for the debug overlay.
    pub fn overlay_cells(&self, out: &mut Vec<OverlayCell>) {
        out.clear();
        let positions = self.nodes.iter().map(|node| node.pos).collect::<Vec<_>>();
        if let Some(tree) = QuadTree::build(&positions) {
            collect_overlay_cells(&tree, 0, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{GraphLink, GraphNode, LinkKind, NodeKind};

    use super::*;

    fn person(name: &str) -> GraphNode {
        GraphNode {
            id: NodeId::Name(name.to_string()),
            kind: NodeKind::Actor {
                name: name.to_string(),
            },
        }
    }

    fn movie(id: i64, title: &str) -> GraphNode {
        GraphNode {
            id: NodeId::Movie(id),
            kind: NodeKind::Movie {
                title: title.to_string(),
                popularity: 10.0,
                revenue: 1_000_000,
                budget: 500_000,
                vote_count: 100,
                year: Some(2015),
            },
        }
    }

    fn acted_in(actor: &str, movie_id: i64) -> GraphLink {
        GraphLink {
            source: NodeId::Name(actor.to_string()),
            target: NodeId::Movie(movie_id),
            kind: LinkKind::ActedIn,
        }
    }

    fn star_graph(spokes: usize) -> (Vec<GraphNode>, Vec<GraphLink>) {
        let mut nodes = vec![movie(1, "Hub")];
        let mut links = Vec::new();
        for i in 0..spokes {
            let name = format!("Actor {i}");
            nodes.push(person(&name));
            links.push(acted_in(&name, 1));
        }
        (nodes, links)
    }

    fn bounds() -> Vec2 {
        vec2(1200.0, 800.0)
    }

    #[test]
    fn converges_within_the_tick_budget() {
        let (nodes, links) = star_graph(24);
        let config = SimConfig::default();
        let mut sim = Simulation::new(&nodes, &links, bounds(), config).unwrap();

        let mut steps = 0usize;
        while sim.tick() {
            steps += 1;
            assert!(steps <= config.max_ticks, "simulation failed to cool");
            for node in sim.nodes() {
                assert!(node.pos.x.is_finite() && node.pos.y.is_finite());
            }
        }

        assert!(!sim.running());
        assert!(sim.ticks() <= config.max_ticks);
    }

    #[test]
    fn seeding_is_deterministic() {
        let (nodes, links) = star_graph(10);
        let a = Simulation::new(&nodes, &links, bounds(), SimConfig::default()).unwrap();
        let b = Simulation::new(&nodes, &links, bounds(), SimConfig::default()).unwrap();

        for (left, right) in a.nodes().iter().zip(b.nodes()) {
            assert_eq!(left.pos, right.pos);
            assert_eq!(left.vel, Vec2::ZERO);
        }
    }

    #[test]
    fn pinned_node_is_held_exactly() {
        let (nodes, links) = star_graph(6);
        let mut sim = Simulation::new(&nodes, &links, bounds(), SimConfig::default()).unwrap();

        let id = NodeId::Name("Actor 0".to_string());
        let pin = vec2(321.0, -45.5);
        sim.set_pinned(&id, pin);
        sim.reheat();

        for _ in 0..40 {
            sim.tick();
            let index = sim.index_of(&id).unwrap();
            assert_eq!(sim.nodes()[index].pos, pin);
        }

        sim.clear_pinned(&id);
        sim.reheat();
        for _ in 0..20 {
            sim.tick();
        }
        let index = sim.index_of(&id).unwrap();
        assert_ne!(sim.nodes()[index].pos, pin, "released node should move");
    }

    #[test]
    fn reheat_restarts_a_cooled_run() {
        let (nodes, links) = star_graph(4);
        let mut sim = Simulation::new(&nodes, &links, bounds(), SimConfig::default()).unwrap();

        while sim.tick() {}
        assert!(!sim.running());

        sim.reheat();
        assert!(sim.running());
        assert!(sim.alpha() >= SimConfig::default().reheat_alpha - f32::EPSILON);
        assert!(sim.tick());
    }

    #[test]
    fn empty_graph_is_inert() {
        let mut sim = Simulation::new(&[], &[], bounds(), SimConfig::default()).unwrap();
        assert!(!sim.tick());
        assert_eq!(sim.positions().count(), 0);
        assert!(!sim.running());
    }

    #[test]
    fn isolated_nodes_are_tolerated() {
        let nodes = vec![person("Alone"), movie(9, "Island")];
        let mut sim = Simulation::new(&nodes, &[], bounds(), SimConfig::default()).unwrap();
        while sim.tick() {}
        for node in sim.nodes() {
            assert!(node.pos.x.is_finite() && node.pos.y.is_finite());
        }
    }

    #[test]
    fn dangling_link_is_rejected() {
        let nodes = vec![movie(1, "Hub")];
        let links = vec![acted_in("Ghost", 1)];
        assert!(Simulation::new(&nodes, &links, bounds(), SimConfig::default()).is_err());
    }

    #[test]
    fn alpha_decay_reaches_threshold_near_budget() {
        let config = SimConfig::default();
        let per_tick = 1.0 - config.alpha_decay();
        let mut alpha = 1.0_f32;
        for _ in 0..config.max_ticks {
            alpha *= per_tick;
        }
        // Derived decay lands on alpha_min at the budget, modulo float error.
        assert!(alpha <= config.alpha_min * 1.01);
        assert!(alpha >= config.alpha_min * 0.9);
    }
}
