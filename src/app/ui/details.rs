use eframe::egui::{self, RichText, Ui};

use crate::graph::NodeKind;
use crate::util::{ellipsize, format_usd};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node in the graph to inspect it.");
            return;
        };

        let Some(&index) = self.index_by_id.get(&selected_id) else {
            ui.label("The selected node is not in the current snapshot.");
            return;
        };

        let node = &self.snapshot.nodes[index];
        ui.label(RichText::new(node.display_name()).strong());
        ui.small(format!("{} · id {}", node.kind.label(), node.id));
        ui.add_space(6.0);

        match &node.kind {
            NodeKind::Movie {
                popularity,
                revenue,
                budget,
                vote_count,
                year,
                ..
            } => {
                if let Some(year) = year {
                    ui.label(format!("Released: {year}"));
                }
                ui.label(format!("Popularity: {popularity:.1}"));
                ui.label(format!("Revenue: {}", format_usd(*revenue)));
                ui.label(format!("Budget: {}", format_usd(*budget)));
                ui.label(format!("Votes: {vote_count}"));
            }
            NodeKind::Actor { .. } => {
                ui.label("Appears in the movies listed below.");
            }
            NodeKind::Director { .. } => {
                ui.label("Directed the movies listed below.");
            }
            NodeKind::Genre { .. } => {
                ui.label("Genre shared by the movies listed below.");
            }
            NodeKind::Keyword { .. } => {
                ui.label("Keyword tagged on the movies listed below.");
            }
        }

        ui.separator();
        ui.label(RichText::new("Connections").strong());

        let connections = self.adjacency.get(index).cloned().unwrap_or_default();
        if connections.is_empty() {
            ui.label("No connections in the current snapshot.");
            return;
        }

        let mut jump_to = None;
        egui::ScrollArea::vertical()
            .id_salt("connection_rows")
            .max_height(360.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, connections.len(), |ui, row_range| {
                for row in row_range {
                    let (neighbor, link_index) = connections[row];
                    let Some(neighbor_node) = self.snapshot.nodes.get(neighbor) else {
                        continue;
                    };
                    let Some(link) = self.snapshot.links.get(link_index) else {
                        continue;
                    };

                    ui.horizontal(|ui| {
                        let label = ellipsize(neighbor_node.display_name(), 26);
                        if ui.selectable_label(false, label).clicked() {
                            jump_to = Some(neighbor);
                        }
                        ui.small(link.kind.as_str());
                    });
                }
            });

        if let Some(neighbor) = jump_to {
            self.selected = Some(self.snapshot.nodes[neighbor].id.clone());
            self.begin_center_on(neighbor);
        }
    }
}
