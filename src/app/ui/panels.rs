use std::path::Path;

use eframe::egui::{self, Align, Color32, Context, Layout, Vec2};

use crate::graph::Snapshot;
use crate::sim::{SimConfig, Simulation};
use crate::store::GraphFilter;

use super::super::{DEFAULT_CANVAS, FetchOutcome, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(outcome: FetchOutcome, filter: GraphFilter, row_cap: usize) -> Self {
        let sim_config = SimConfig::default();
        let (snapshot, sim) = match Simulation::new(
            &outcome.snapshot.nodes,
            &outcome.snapshot.links,
            DEFAULT_CANVAS,
            sim_config,
        ) {
            Ok(sim) => (outcome.snapshot, sim),
            Err(error) => {
                log::error!("assembler produced an inconsistent snapshot: {error}");
                (
                    Snapshot::default(),
                    Simulation::empty(DEFAULT_CANVAS, sim_config),
                )
            }
        };

        let mut model = Self {
            snapshot,
            genre_catalogue: outcome.genres,
            filter,
            row_cap,
            filter_dirty: false,
            fetch_error: None,
            sim,
            sim_config,
            sim_revision: 0,
            index_by_id: Default::default(),
            link_endpoints: Vec::new(),
            adjacency: Vec::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            canvas_size: DEFAULT_CANVAS,
            selected: None,
            dragged: None,
            center_anim: None,
            finder: String::new(),
            finder_cache: None,
            show_quadtree_overlay: false,
            scratch: ViewScratch::default(),
            overlay_cells: Vec::new(),
            visible_node_count: 0,
            visible_link_count: 0,
        };
        model.rebuild_graph_structures();
        model
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        data_path: &Path,
        refresh_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("cinegraph");
                    ui.separator();
                    ui.label(format!("dataset: {}", data_path.display()));
                    ui.label(format!("nodes: {}", self.snapshot.nodes.len()));
                    ui.label(format!("links: {}", self.snapshot.links.len()));
                    let refresh_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Refresh"));
                    if refresh_button.clicked() {
                        *refresh_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes / {} links",
                            self.visible_node_count, self.visible_link_count
                        ));
                        if self.sim.running() {
                            ui.label(format!(
                                "alpha {:.3} · tick {}",
                                self.sim.alpha(),
                                self.sim.ticks()
                            ));
                        }
                    });
                });
            });

        if self.fetch_error.is_some() {
            let mut clear_error = false;
            egui::TopBottomPanel::top("fetch_error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let error = self.fetch_error.as_deref().unwrap_or_default();
                    ui.colored_label(
                        Color32::from_rgb(240, 120, 110),
                        format!("Refresh failed: {error}"),
                    );
                    if ui.button("Retry").clicked() {
                        *refresh_requested = true;
                        clear_error = true;
                    }
                });
            });
            if clear_error {
                self.fetch_error = None;
            }
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Fetching graph snapshot...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });

        // Filter edits refetch through the assembler; at most one fetch runs
        // at a time and the dirty flag holds further edits until it lands.
        if self.filter_dirty && !is_loading {
            *refresh_requested = true;
            self.filter_dirty = false;
        }
    }
}
