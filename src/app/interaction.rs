use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::ViewModel;
use super::render_utils::screen_to_world;

pub(super) const MIN_ZOOM: f32 = 0.1;
pub(super) const MAX_ZOOM: f32 = 4.0;

const CENTER_ANIM_SECS: f32 = 0.35;

pub(super) fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Animated pan that brings a node's current position to the viewport
/// center while leaving the scale untouched.
pub(super) struct CenterAnim {
    node: usize,
    start_pan: Vec2,
    progress: f32,
}

impl ViewModel {
    pub(super) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = clamp_zoom(self.zoom * zoom_factor);
        // Keep the world point under the pointer fixed across the scale
        // change.
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(super) fn handle_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
            self.center_anim = None;
        }
    }

    /// Closest visible node under the pointer, by screen distance.
    pub(super) fn hovered_index(
        ui: &Ui,
        visible: &[bool],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;

        (0..screen_positions.len())
            .filter(|&index| visible.get(index).copied().unwrap_or(false))
            .filter_map(|index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index].max(4.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Primary-button drag moves a node: the pointer position is mapped back
    /// through the view transform and the node is pinned there while the
    /// simulation runs warm.
    pub(super) fn update_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(index) = hovered {
                self.dragged = Some(index);
                self.center_anim = None;
                self.sim.reheat();
            }
        }

        if let Some(index) = self.dragged {
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pointer) = response.interact_pointer_pos() {
                    let world = screen_to_world(rect, self.pan, self.zoom, pointer);
                    let id = self.sim.nodes()[index].id.clone();
                    self.sim.set_pinned(&id, world);
                }
            }

            if response.drag_stopped_by(egui::PointerButton::Primary) {
                let id = self.sim.nodes()[index].id.clone();
                self.sim.clear_pinned(&id);
                self.dragged = None;
            }
        }
    }

    /// Pan and zoom so the whole layout fits the canvas with a margin.
    pub(super) fn fit_view(&mut self) {
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (_id, pos) in self.sim.positions() {
            min = min.min(pos);
            max = max.max(pos);
        }
        if !min.x.is_finite() || !min.y.is_finite() {
            return;
        }

        let span = (max - min).max(Vec2::new(1.0, 1.0));
        let margin = 80.0;
        let available = (self.canvas_size - Vec2::new(margin, margin)).max(Vec2::new(100.0, 100.0));
        self.zoom = clamp_zoom((available.x / span.x).min(available.y / span.y));
        self.pan = -(min + max) * 0.5 * self.zoom;
        self.center_anim = None;
    }

    pub(super) fn begin_center_on(&mut self, index: usize) {
        if index >= self.sim.node_count() {
            return;
        }

        self.center_anim = Some(CenterAnim {
            node: index,
            start_pan: self.pan,
            progress: 0.0,
        });
    }

    /// Advances the click-to-center animation; returns whether it is still
    /// running.
    pub(super) fn step_center_anim(&mut self, dt: f32) -> bool {
        let Some(anim) = &mut self.center_anim else {
            return false;
        };

        let Some(node) = self.sim.nodes().get(anim.node) else {
            self.center_anim = None;
            return false;
        };

        anim.progress += dt / CENTER_ANIM_SECS;
        // The target chases the node's live position so centering stays
        // accurate while the layout is still moving.
        let target_pan = -node.pos * self.zoom;
        let eased = smoothstep(anim.progress);
        self.pan = anim.start_pan + (target_pan - anim.start_pan) * eased;

        if anim.progress >= 1.0 {
            self.pan = target_pan;
            self.center_anim = None;
            false
        } else {
            true
        }
    }
}
