//! Favorites panel: marks per profile and the favorites catalog.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, FUNNEL, HEART, TRASH};

use super::app::{App, DeleteTarget, MarkForm};
use super::components::{
    back_button, danger_action_button, panel_header, parse_optional_id, primary_button_with_icon, section, styled_button,
    styled_button_with_icon,
};

/// Show the favorites panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Favorites");

    let mut reload = false;

    ui.horizontal(|ui| {
        if primary_button_with_icon(ui, HEART, "Add Favorite").clicked() {
            app.mark_form = MarkForm {
                profile_id_input: app.mark_profile_input.clone(),
                is_open: true,
                ..Default::default()
            };
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            reload = true;
        }

        ui.add_space(20.0);

        ui.label("Profile ID:");
        ui.add(
            egui::TextEdit::singleline(&mut app.mark_profile_input)
                .desired_width(80.0)
                .hint_text("All"),
        );
        if styled_button_with_icon(ui, FUNNEL, "Filter").clicked() {
            reload = true;
        }
        if !app.mark_profile_input.is_empty() && styled_button(ui, "Clear").clicked() {
            app.mark_profile_input.clear();
            reload = true;
        }
    });

    if reload {
        app.load_marks();
        app.load_favorites();
    }

    ui.add_space(15.0);

    let column_width = (ui.available_width() - 30.0) / 2.0;

    ui.horizontal_top(|ui| {
        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, &format!("Favorite Marks ({})", app.marks.len()), |ui| {
                show_marks(app, ui);
            });
        });

        ui.add_space(20.0);

        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, &format!("Favorites Catalog ({})", app.favorites.len()), |ui| {
                show_catalog(app, ui);
            });
        });
    });

    if app.mark_form.is_open {
        show_form_dialog(app, ui.ctx());
    }

    go_back
}

fn show_marks(app: &mut App, ui: &mut Ui) {
    if app.marks.is_empty() {
        ui.label(RichText::new("No favorite marks").weak());
        return;
    }

    ScrollArea::vertical().id_salt("marks_scroll").show(ui, |ui| {
        egui::Grid::new("marks_grid")
            .num_columns(5)
            .striped(true)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.strong("Profile");
                ui.strong("Customer");
                ui.strong("Movie");
                ui.strong("Minutes");
                ui.strong("");
                ui.end_row();

                for mark in &app.marks {
                    ui.label(format!("{} (#{})", mark.profile_name, mark.profile_id));
                    ui.label(mark.customer_name());
                    ui.label(mark.movie_id.to_string());
                    ui.label(format!("{:.1}", mark.total_time_watched));
                    if danger_action_button(ui, TRASH, "Remove").clicked() {
                        app.delete_target = Some(DeleteTarget::Mark {
                            profile_id: mark.profile_id,
                            movie_id: mark.movie_id,
                        });
                        app.show_delete_confirm = true;
                    }
                    ui.end_row();
                }
            });
    });
}

fn show_catalog(app: &App, ui: &mut Ui) {
    if app.favorites.is_empty() {
        ui.label(RichText::new("No favorites").weak());
        return;
    }

    ScrollArea::vertical().id_salt("favorites_scroll").show(ui, |ui| {
        egui::Grid::new("favorites_grid")
            .num_columns(3)
            .striped(true)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.strong("Movie");
                ui.strong("Last Seen");
                ui.strong("Minutes Watched");
                ui.end_row();

                for favorite in &app.favorites {
                    ui.label(favorite.movie_id.to_string());
                    ui.label(favorite.last_seen.to_string());
                    ui.label(format!("{:.1}", favorite.total_time_watched));
                    ui.end_row();
                }
            });
    });
}

fn show_form_dialog(app: &mut App, ctx: &egui::Context) {
    let mut save = false;

    egui::Window::new("Add Favorite")
        .collapsible(false)
        .resizable(false)
        .default_width(380.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            let form = &mut app.mark_form;

            ui.add_space(10.0);

            egui::Grid::new("mark_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    ui.label("Profile ID:");
                    ui.add(egui::TextEdit::singleline(&mut form.profile_id_input).desired_width(100.0));
                    ui.end_row();

                    ui.label("Movie:");
                    egui::ComboBox::from_id_salt("mark_form_movie")
                        .width(160.0)
                        .selected_text(
                            form.movie_id
                                .map(|id| format!("Movie {}", id))
                                .unwrap_or_else(|| "Select...".to_string()),
                        )
                        .show_ui(ui, |ui| {
                            for favorite in &app.favorites {
                                ui.selectable_value(
                                    &mut form.movie_id,
                                    Some(favorite.movie_id),
                                    format!("Movie {}", favorite.movie_id),
                                );
                            }
                        });
                    ui.end_row();
                });

            ui.add_space(15.0);
            ui.separator();
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                if styled_button(ui, "Cancel").clicked() {
                    form.reset();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if primary_button_with_icon(ui, "", "Add").clicked() {
                        save = true;
                    }
                });
            });
        });

    if save {
        save_mark(app);
    }
}

fn save_mark(app: &mut App) {
    let profile_id = match parse_optional_id(&app.mark_form.profile_id_input, "Profile ID") {
        Ok(Some(id)) => id,
        Ok(None) => {
            app.error_message = Some("Profile ID is required".to_string());
            return;
        }
        Err(e) => {
            app.error_message = Some(e);
            return;
        }
    };
    let Some(movie_id) = app.mark_form.movie_id else {
        app.error_message = Some("Please select a movie".to_string());
        return;
    };

    app.add_mark(profile_id, movie_id);
}
