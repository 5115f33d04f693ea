use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};

use crate::graph::{NodeId, Snapshot, assemble_snapshot};
use crate::sim::{OverlayCell, SimConfig, Simulation};
use crate::store::{DatasetStore, GraphFilter, MovieStore};

mod highlight;
mod interaction;
mod render_utils;
mod ui;
mod view;

use interaction::CenterAnim;

const DEFAULT_CANVAS: Vec2 = Vec2::new(1200.0, 800.0);

pub struct ExplorerApp {
    data_path: PathBuf,
    initial_filter: GraphFilter,
    initial_row_cap: usize,
    state: AppState,
    fetch: Option<InFlightFetch>,
    next_seq: u64,
    applied_seq: u64,
}

enum AppState {
    Loading { rx: Receiver<FetchResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct InFlightFetch {
    seq: u64,
    rx: Receiver<FetchResult>,
}

struct FetchResult {
    seq: u64,
    outcome: Result<FetchOutcome, String>,
}

struct FetchOutcome {
    snapshot: Snapshot,
    genres: Vec<String>,
}

struct ViewModel {
    snapshot: Snapshot,
    genre_catalogue: Vec<String>,
    filter: GraphFilter,
    row_cap: usize,
    filter_dirty: bool,
    fetch_error: Option<String>,

    sim: Simulation,
    sim_config: SimConfig,
    sim_revision: u64,

    index_by_id: HashMap<NodeId, usize>,
    /// (source index, target index, index into `snapshot.links`).
    link_endpoints: Vec<(usize, usize, usize)>,
    adjacency: Vec<Vec<(usize, usize)>>,

    pan: Vec2,
    zoom: f32,
    canvas_size: Vec2,
    selected: Option<NodeId>,
    dragged: Option<usize>,
    center_anim: Option<CenterAnim>,

    finder: String,
    finder_cache: Option<FinderCache>,
    show_quadtree_overlay: bool,

    scratch: ViewScratch,
    overlay_cells: Vec<OverlayCell>,

    visible_node_count: usize,
    visible_link_count: usize,
}

struct FinderCache {
    query: String,
    revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible: Vec<bool>,
    draw_order: Vec<usize>,
    draw_order_dirty: bool,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        data_path: PathBuf,
        filter: GraphFilter,
        row_cap: usize,
    ) -> Self {
        let rx = spawn_fetch(data_path.clone(), filter.clone(), row_cap, 1);
        Self {
            data_path,
            initial_filter: filter,
            initial_row_cap: row_cap,
            state: AppState::Loading { rx },
            fetch: None,
            next_seq: 1,
            applied_seq: 0,
        }
    }

    fn begin_refresh(&mut self, filter: GraphFilter, row_cap: usize) {
        self.next_seq += 1;
        // Replacing the receiver drops any fetch still in flight; its result
        // would fail the sequence check anyway.
        self.fetch = Some(InFlightFetch {
            seq: self.next_seq,
            rx: spawn_fetch(self.data_path.clone(), filter, row_cap, self.next_seq),
        });
    }
}

/// Runs one assembler call on a worker thread. The store client is opened
/// inside the closure and dropped when the snapshot has been built.
fn spawn_fetch(
    data_path: PathBuf,
    filter: GraphFilter,
    row_cap: usize,
    seq: u64,
) -> Receiver<FetchResult> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let outcome = fetch_snapshot(&data_path, &filter, row_cap).map_err(|e| format!("{e:#}"));
        let _ = tx.send(FetchResult { seq, outcome });
    });

    rx
}

fn fetch_snapshot(
    data_path: &Path,
    filter: &GraphFilter,
    row_cap: usize,
) -> anyhow::Result<FetchOutcome> {
    let store = DatasetStore::load(data_path)?;
    let snapshot = assemble_snapshot(&store, filter, row_cap)?;
    let genres = store.genre_catalogue()?;
    Ok(FetchOutcome { snapshot, genres })
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    self.applied_seq = self.applied_seq.max(result.seq);
                    transition = Some(match result.outcome {
                        Ok(outcome) => AppState::Ready(Box::new(ViewModel::new(
                            outcome,
                            self.initial_filter.clone(),
                            self.initial_row_cap,
                        ))),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading movie graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the movie graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });

                if retry {
                    let rx = spawn_fetch(
                        self.data_path.clone(),
                        self.initial_filter.clone(),
                        self.initial_row_cap,
                        self.next_seq + 1,
                    );
                    self.next_seq += 1;
                    transition = Some(AppState::Loading { rx });
                }
            }
            AppState::Ready(model) => {
                let mut refresh_requested = false;
                let is_loading = self.fetch.is_some();
                model.show(ctx, &self.data_path, &mut refresh_requested, is_loading);

                let filter = model.filter.clone();
                let row_cap = model.row_cap;

                if let Some(fetch) = self.fetch.take() {
                    match fetch.rx.try_recv() {
                        Ok(result) => {
                            if result.seq > self.applied_seq {
                                self.applied_seq = result.seq;
                                match result.outcome {
                                    Ok(outcome) => model.apply_fetch(outcome),
                                    Err(error) => model.fetch_error = Some(error),
                                }
                            } else {
                                log::warn!(
                                    "discarding out-of-order fetch result (seq {} <= {})",
                                    result.seq,
                                    self.applied_seq
                                );
                            }
                        }
                        Err(TryRecvError::Empty) => self.fetch = Some(fetch),
                        Err(TryRecvError::Disconnected) => {
                            model.fetch_error =
                                Some("background fetch worker disconnected".to_owned());
                        }
                    }
                }

                if refresh_requested {
                    self.begin_refresh(filter, row_cap);
                }
            }
        }

        if let Some(next_state) = transition {
            self.fetch = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn apply_fetch(&mut self, outcome: FetchOutcome) {
        self.fetch_error = None;
        self.genre_catalogue = outcome.genres;

        // A new snapshot fully replaces the prior one: the old simulation is
        // dropped and a fresh one is seeded from scratch.
        match Simulation::new(
            &outcome.snapshot.nodes,
            &outcome.snapshot.links,
            self.canvas_size,
            self.sim_config,
        ) {
            Ok(sim) => {
                self.sim = sim;
                self.snapshot = outcome.snapshot;
                self.rebuild_graph_structures();
            }
            Err(error) => {
                // Links into missing nodes mean the assembler is broken; keep
                // the last good snapshot on screen.
                log::error!("assembler produced an inconsistent snapshot: {error}");
                self.fetch_error = Some(error.to_string());
            }
        }
    }

    fn rebuild_graph_structures(&mut self) {
        self.sim_revision = self.sim_revision.wrapping_add(1);
        self.finder_cache = None;
        self.center_anim = None;
        self.dragged = None;
        self.scratch.draw_order_dirty = true;

        self.index_by_id = self
            .snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        self.link_endpoints.clear();
        self.adjacency = vec![Vec::new(); self.snapshot.nodes.len()];
        for (link_index, link) in self.snapshot.links.iter().enumerate() {
            let (Some(&source), Some(&target)) = (
                self.index_by_id.get(&link.source),
                self.index_by_id.get(&link.target),
            ) else {
                continue;
            };

            self.link_endpoints.push((source, target, link_index));
            self.adjacency[source].push((target, link_index));
            self.adjacency[target].push((source, link_index));
        }

        if let Some(selected) = &self.selected
            && !self.index_by_id.contains_key(selected)
        {
            self.selected = None;
        }
    }
}
