use eframe::egui::{self, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Filters");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Find node")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the snapshot.");
        ui.text_edit_singleline(&mut self.finder);

        ui.separator();

        ui.label("Genres");
        let genres = self.genre_catalogue.clone();
        let mut filter_changed = false;
        ui.horizontal_wrapped(|ui| {
            let all_selected = self.filter.genres.is_empty();
            if ui
                .selectable_label(all_selected, "All")
                .on_hover_text("Clear the genre restriction.")
                .clicked()
                && !all_selected
            {
                self.filter.genres.clear();
                filter_changed = true;
            }

            for genre in &genres {
                let selected = self.filter.genres.contains(genre);
                if ui.selectable_label(selected, genre.as_str()).clicked() {
                    if selected {
                        self.filter.genres.remove(genre);
                    } else {
                        self.filter.genres.insert(genre.clone());
                    }
                    filter_changed = true;
                }
            }
        });

        ui.separator();

        let pop_min = ui.add(
            egui::Slider::new(&mut self.filter.popularity.0, 0.0..=100.0).text("Popularity min"),
        );
        if pop_min.changed() {
            self.filter.popularity.1 = self.filter.popularity.1.max(self.filter.popularity.0);
            filter_changed = true;
        }
        let pop_max = ui.add(
            egui::Slider::new(&mut self.filter.popularity.1, 0.0..=100.0).text("Popularity max"),
        );
        if pop_max.changed() {
            self.filter.popularity.0 = self.filter.popularity.0.min(self.filter.popularity.1);
            filter_changed = true;
        }

        let mut rev_min_m = self.filter.revenue.0 as f64 / 1e6;
        let rev_min = ui.add(
            egui::Slider::new(&mut rev_min_m, 0.0..=1000.0)
                .step_by(10.0)
                .text("Revenue min ($M)"),
        );
        if rev_min.changed() {
            self.filter.revenue.0 = (rev_min_m * 1e6) as i64;
            self.filter.revenue.1 = self.filter.revenue.1.max(self.filter.revenue.0);
            filter_changed = true;
        }
        let mut rev_max_m = self.filter.revenue.1 as f64 / 1e6;
        let rev_max = ui.add(
            egui::Slider::new(&mut rev_max_m, 0.0..=1000.0)
                .step_by(10.0)
                .text("Revenue max ($M)"),
        );
        if rev_max.changed() {
            self.filter.revenue.1 = (rev_max_m * 1e6) as i64;
            self.filter.revenue.0 = self.filter.revenue.0.min(self.filter.revenue.1);
            filter_changed = true;
        }

        let row_cap = ui
            .add(egui::Slider::new(&mut self.row_cap, 10..=500).text("Row cap"))
            .on_hover_text("Bound on relationship rows fetched per refresh.");
        filter_changed |= row_cap.changed();

        if filter_changed {
            self.filter_dirty = true;
        }

        ui.separator();

        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the repulsion partition over the graph canvas.");

        ui.horizontal(|ui| {
            if ui
                .button("Reset layout")
                .on_hover_text("Reseed node positions and restart the simulation.")
                .clicked()
            {
                self.sim.reseed();
            }

            if ui
                .button("Fit view")
                .on_hover_text("Pan and zoom so the whole graph is visible.")
                .clicked()
            {
                self.fit_view();
            }
        });

        ui.collapsing("Layout tuning", |ui| {
            let mut tuning_changed = false;

            tuning_changed |= ui
                .add(
                    egui::Slider::new(&mut self.sim_config.link_distance, 30.0..=200.0)
                        .text("Link distance"),
                )
                .on_hover_text("Target separation between linked nodes.")
                .changed();

            tuning_changed |= ui
                .add(
                    egui::Slider::new(&mut self.sim_config.repulsion_strength, 100.0..=4000.0)
                        .text("Repulsion"),
                )
                .on_hover_text("How strongly nodes push away from each other.")
                .changed();

            tuning_changed |= ui
                .add(
                    egui::Slider::new(&mut self.sim_config.collision_strength, 0.0..=2.0)
                        .text("Collision"),
                )
                .on_hover_text("Extra separation preventing circle overlap.")
                .changed();

            tuning_changed |= ui
                .add(
                    egui::Slider::new(&mut self.sim_config.velocity_decay, 0.1..=0.8)
                        .text("Velocity decay"),
                )
                .on_hover_text("Fraction of node velocity removed each tick.")
                .changed();

            tuning_changed |= ui
                .add(
                    egui::Slider::new(&mut self.sim_config.center_strength, 0.0..=0.2)
                        .text("Centering"),
                )
                .on_hover_text("Pull keeping the layout around the viewport center.")
                .changed();

            if tuning_changed {
                self.sim.set_config(self.sim_config);
            }
        });
    }
}
