use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::NodeKind;
use crate::sim::Simulation;
use crate::util::{ellipsize, format_usd};

use super::highlight::neighborhood;
use super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, kind_color, screen_radius,
    segment_visible, world_to_screen,
};
use super::{FinderCache, ViewModel, ViewScratch};

impl ViewModel {
    fn update_screen_space(
        rect: egui::Rect,
        pan: egui::Vec2,
        zoom: f32,
        sim: &Simulation,
        scratch: &mut ViewScratch,
    ) {
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in sim.nodes() {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.pos));
            scratch.screen_radii.push(screen_radius(node.radius, zoom));
        }

        scratch.visible.clear();
        scratch.visible.resize(sim.node_count(), false);
        for index in 0..sim.node_count() {
            scratch.visible[index] = circle_visible(
                rect,
                scratch.screen_positions[index],
                scratch.screen_radii[index],
            );
        }
    }

    /// Small nodes first so the larger category circles and their labels land
    /// on top.
    fn ensure_draw_order(sim: &Simulation, scratch: &mut ViewScratch) {
        if !scratch.draw_order_dirty && scratch.draw_order.len() == sim.node_count() {
            return;
        }

        scratch.draw_order.clear();
        scratch.draw_order.extend(0..sim.node_count());
        scratch
            .draw_order
            .sort_by(|a, b| sim.nodes()[*a].radius.total_cmp(&sim.nodes()[*b].radius));
        scratch.draw_order_dirty = false;
    }

    fn cached_finder_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.finder.trim().to_owned();
        if query.is_empty() {
            return None;
        }

        if let Some(cache) = &self.finder_cache
            && cache.revision == self.sim_revision
            && cache.query == query
        {
            return Some(Arc::clone(&cache.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .snapshot
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let name = node.display_name();
                matcher
                    .fuzzy_match(name, &query)
                    .or_else(|| {
                        matcher.fuzzy_match(&name.to_ascii_lowercase(), &query.to_ascii_lowercase())
                    })
                    .map(|_score| index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.finder_cache = Some(FinderCache {
            query,
            revision: self.sim_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        self.canvas_size = rect.size();

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);

        let dt = ui
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let animating = self.step_center_anim(dt);

        let sim_running = self.sim.running();
        if sim_running {
            self.sim.tick();
        }

        Self::update_screen_space(rect, self.pan, self.zoom, &self.sim, &mut self.scratch);
        Self::ensure_draw_order(&self.sim, &mut self.scratch);

        let hovered = Self::hovered_index(
            ui,
            &self.scratch.visible,
            &self.scratch.screen_positions,
            &self.scratch.screen_radii,
        );

        self.update_drag(rect, &response, hovered);

        if response.clicked_by(egui::PointerButton::Primary) {
            match hovered {
                Some(index) => {
                    self.selected = Some(self.sim.nodes()[index].id.clone());
                    self.begin_center_on(index);
                }
                None => self.selected = None,
            }
        }

        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        if sim_running || animating || self.dragged.is_some() {
            ui.ctx().request_repaint();
        }

        if self.snapshot.is_empty() {
            self.visible_node_count = 0;
            self.visible_link_count = 0;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes matched the current filters.",
                FontId::proportional(14.0),
                Color32::from_gray(180),
            );
            return;
        }

        let finder_matches = self.cached_finder_matches();
        let finder_active = finder_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let selected_index = self.selected.as_ref().and_then(|id| self.sim.index_of(id));
        let focus_index = hovered.or(selected_index);
        let highlight = focus_index.map(|index| neighborhood(&self.adjacency, index));
        let highlight_active = highlight.is_some();

        let zoom_sqrt = self.zoom.sqrt();
        let mut visible_links = 0usize;
        for &(source, target, link_index) in &self.link_endpoints {
            let start = self.scratch.screen_positions[source];
            let end = self.scratch.screen_positions[target];
            let either_visible = self.scratch.visible[source] || self.scratch.visible[target];
            if !either_visible && !segment_visible(rect, start, end, 2.5) {
                continue;
            }

            let emphasized = highlight
                .as_ref()
                .is_some_and(|state| state.links.contains(&link_index));
            let (width, color) = if emphasized {
                (
                    (2.4 * zoom_sqrt).clamp(1.2, 4.2),
                    Color32::from_rgb(241, 146, 94),
                )
            } else if highlight_active {
                (
                    (0.8 * zoom_sqrt).clamp(0.4, 2.0),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 110),
                )
            } else {
                (
                    (1.1 * zoom_sqrt).clamp(0.5, 3.0),
                    Color32::from_rgba_unmultiplied(122, 128, 136, 160),
                )
            };

            let stroke = Stroke::new(width, color);
            if self.snapshot.links[link_index].kind.dashed() {
                painter.extend(Shape::dashed_line(&[start, end], stroke, 6.0, 5.0));
            } else {
                painter.line_segment([start, end], stroke);
            }
            visible_links += 1;
        }
        self.visible_link_count = visible_links;

        let selected_ring = Color32::from_rgb(245, 206, 93);
        for &index in &self.scratch.draw_order {
            if !self.scratch.visible[index] {
                continue;
            }

            let node = &self.snapshot.nodes[index];
            let position = self.scratch.screen_positions[index];
            let radius = self.scratch.screen_radii[index];

            let is_selected = selected_index == Some(index);
            let is_hovered = hovered == Some(index);
            let in_highlight = highlight
                .as_ref()
                .is_some_and(|state| state.nodes.contains(&index));
            let is_match = finder_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base = kind_color(&node.kind);
            let color = if is_hovered {
                blend_color(base, Color32::WHITE, 0.35)
            } else if in_highlight {
                blend_color(base, Color32::from_rgb(246, 171, 98), 0.22)
            } else if is_match {
                blend_color(base, Color32::from_rgb(103, 196, 255), 0.55)
            } else if highlight_active {
                dim_color(base, 0.35)
            } else if finder_active {
                dim_color(base, 0.4)
            } else {
                base
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(
                position,
                radius,
                if is_selected {
                    Stroke::new(2.0, selected_ring)
                } else {
                    Stroke::new(1.0, Color32::from_rgba_unmultiplied(12, 14, 18, 200))
                },
            );
            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 4.0,
                    Stroke::new(1.4, Color32::from_rgba_unmultiplied(245, 206, 93, 120)),
                );
            }

            let labelled = is_selected
                || is_hovered
                || in_highlight
                || (is_match && self.zoom > 0.35)
                || radius > 14.0
                || self.zoom > 1.3;
            if labelled {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    ellipsize(node.display_name(), 28),
                    FontId::proportional(12.0),
                    Color32::from_gray(235),
                );
            }
        }
        self.visible_node_count = self
            .scratch
            .visible
            .iter()
            .filter(|visible| **visible)
            .count();

        if self.show_quadtree_overlay {
            let mut cells = std::mem::take(&mut self.overlay_cells);
            self.sim.overlay_cells(&mut cells);
            for cell in &cells {
                let min = cell.center - vec2(cell.half, cell.half);
                let max = cell.center + vec2(cell.half, cell.half);
                let corners = [
                    world_to_screen(rect, self.pan, self.zoom, vec2(min.x, min.y)),
                    world_to_screen(rect, self.pan, self.zoom, vec2(max.x, min.y)),
                    world_to_screen(rect, self.pan, self.zoom, vec2(max.x, max.y)),
                    world_to_screen(rect, self.pan, self.zoom, vec2(min.x, max.y)),
                ];

                let alpha = if cell.is_leaf { 110 } else { 55 };
                let width = (1.4_f32 - (cell.depth as f32 * 0.09)).clamp(0.45, 1.4);
                let stroke = Stroke::new(
                    width,
                    Color32::from_rgba_unmultiplied(106, 198, 255, alpha),
                );
                painter.line_segment([corners[0], corners[1]], stroke);
                painter.line_segment([corners[1], corners[2]], stroke);
                painter.line_segment([corners[2], corners[3]], stroke);
                painter.line_segment([corners[3], corners[0]], stroke);
            }
            self.overlay_cells = cells;
        }

        if let Some(index) = hovered {
            let node = &self.snapshot.nodes[index];
            let info = match &node.kind {
                NodeKind::Movie {
                    popularity,
                    revenue,
                    year,
                    ..
                } => {
                    let year_text = year.map(|y| format!("  |  {y}")).unwrap_or_default();
                    format!(
                        "Movie: {}  |  pop {popularity:.1}  |  revenue {}{year_text}",
                        node.display_name(),
                        format_usd(*revenue),
                    )
                }
                other => format!(
                    "{}: {}  |  {} connections",
                    other.label(),
                    node.display_name(),
                    self.adjacency[index].len(),
                ),
            };

            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                info,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
