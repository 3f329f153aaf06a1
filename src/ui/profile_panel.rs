//! Profile management panel: filters, online toggle, details with statistics and reviews.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, FUNNEL, INFO, PENCIL, PLUS, POWER, TRASH};

use super::app::{App, DeleteTarget, ProfileForm};
use super::components::{
    action_button, back_button, colors, danger_action_button, panel_header, parse_optional_id,
    primary_button_with_icon, section, stat_card, styled_button, styled_button_with_icon,
};
use crate::models::profile::AccountStatus;

/// Show the profiles panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Profiles");

    let mut reload = false;

    ui.horizontal(|ui| {
        if primary_button_with_icon(ui, PLUS, "Add Profile").clicked() {
            app.profile_form = ProfileForm {
                is_open: true,
                ..Default::default()
            };
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            reload = true;
        }
    });

    ui.add_space(10.0);

    ui.horizontal(|ui| {
        ui.label("Search:");
        ui.add(
            egui::TextEdit::singleline(&mut app.profile_filter.search)
                .desired_width(180.0)
                .hint_text("Profile or customer name..."),
        );

        ui.add_space(10.0);

        ui.label("Customer ID:");
        ui.add(
            egui::TextEdit::singleline(&mut app.profile_customer_input)
                .desired_width(70.0)
                .hint_text("Any"),
        );

        ui.add_space(10.0);

        ui.label("Status:");
        egui::ComboBox::from_id_salt("profile_status_filter")
            .width(110.0)
            .selected_text(app.profile_filter.account_status.map(|s| s.as_str()).unwrap_or("All"))
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(app.profile_filter.account_status.is_none(), "All")
                    .clicked()
                {
                    app.profile_filter.account_status = None;
                }
                for status in AccountStatus::ALL {
                    if ui
                        .selectable_label(app.profile_filter.account_status == Some(status), status.as_str())
                        .clicked()
                    {
                        app.profile_filter.account_status = Some(status);
                    }
                }
            });

        ui.add_space(10.0);

        ui.label("Online:");
        for (value, label) in [(None, "All"), (Some(true), "Online"), (Some(false), "Offline")] {
            if ui.selectable_label(app.profile_filter.is_online == value, label).clicked() {
                app.profile_filter.is_online = value;
            }
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, FUNNEL, "Apply").clicked() {
            match parse_optional_id(&app.profile_customer_input, "Customer ID") {
                Ok(id) => {
                    app.profile_filter.customer_id = id;
                    reload = true;
                }
                Err(e) => app.error_message = Some(e),
            }
        }

        let filtered = !app.profile_filter.search.is_empty()
            || !app.profile_customer_input.is_empty()
            || app.profile_filter.account_status.is_some()
            || app.profile_filter.is_online.is_some();
        if filtered && styled_button(ui, "Clear").clicked() {
            app.profile_filter = Default::default();
            app.profile_customer_input.clear();
            reload = true;
        }
    });

    if reload {
        app.load_profiles();
    }

    ui.add_space(15.0);

    show_table(app, ui);

    if app.profile_form.is_open {
        show_form_dialog(app, ui.ctx());
    }

    if app.profile_details.is_some() {
        show_details_window(app, ui.ctx());
    }

    go_back
}

fn show_table(app: &mut App, ui: &mut Ui) {
    let summary = &app.profile_summary;
    ui.horizontal_wrapped(|ui| {
        stat_card(ui, "Profiles", &summary.total.to_string(), "All customers");
        stat_card(ui, "Online", &summary.online.to_string(), "Watching now");
        stat_card(ui, "Active", &summary.active.to_string(), "Account status");
        stat_card(ui, "Customers", &summary.unique_customers.to_string(), "With a profile");
    });

    ui.add_space(5.0);
    ui.label(RichText::new(format!("Showing {} profiles", app.profiles.len())).weak());

    ui.add_space(10.0);

    let mut toggle = None;
    let mut details = None;

    ScrollArea::vertical().id_salt("profiles_scroll").show(ui, |ui| {
        egui::Grid::new("profiles_grid")
            .num_columns(8)
            .striped(true)
            .min_col_width(60.0)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.strong("ID");
                ui.strong("Profile");
                ui.strong("Customer");
                ui.strong("Status");
                ui.strong("Online");
                ui.strong("Watch History");
                ui.strong("Picture");
                ui.strong("Actions");
                ui.end_row();

                for row in &app.profiles {
                    ui.label(row.profile_id.to_string());
                    ui.label(&row.profile_name);
                    ui.label(format!("{} (#{})", row.customer_name(), row.customer_id));

                    let status = row.status();
                    let status_color = match status {
                        AccountStatus::Active => colors::SUCCESS,
                        AccountStatus::Suspended => colors::ERROR,
                        AccountStatus::Trial => colors::INFO,
                        AccountStatus::Inactive => colors::NEUTRAL,
                    };
                    ui.colored_label(status_color, status.as_str());

                    if row.is_online {
                        ui.colored_label(colors::SUCCESS, "Online");
                    } else {
                        ui.colored_label(colors::NEUTRAL, "Offline");
                    }

                    ui.label(row.watch_history_id.to_string());
                    ui.label(RichText::new(&row.profile_picture).small().weak());

                    ui.horizontal(|ui| {
                        if action_button(ui, INFO, "Details").clicked() {
                            details = Some(row.clone());
                        }
                        ui.add_space(4.0);
                        if action_button(ui, POWER, "Toggle online").clicked() {
                            toggle = Some(row.profile_id);
                        }
                        ui.add_space(4.0);
                        if action_button(ui, PENCIL, "Edit").clicked() {
                            app.profile_form = ProfileForm::edit(row);
                        }
                        ui.add_space(4.0);
                        if danger_action_button(ui, TRASH, "Delete").clicked() {
                            app.delete_target = Some(DeleteTarget::Profile(row.profile_id, row.profile_name.clone()));
                            app.show_delete_confirm = true;
                        }
                    });

                    ui.end_row();
                }
            });
    });

    if let Some(id) = toggle {
        app.toggle_profile_online(id);
    }
    if let Some(row) = details {
        app.show_profile_details(row);
    }
}

fn show_form_dialog(app: &mut App, ctx: &egui::Context) {
    let form = &mut app.profile_form;
    let title = if form.is_editing { "Edit Profile" } else { "Add Profile" };
    let mut save = false;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            egui::Grid::new("profile_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    ui.label("Profile ID:");
                    ui.add_enabled(
                        !form.is_editing,
                        egui::TextEdit::singleline(&mut form.id_input)
                            .desired_width(100.0)
                            .hint_text("Auto"),
                    );
                    ui.end_row();

                    ui.label("Profile Name:");
                    ui.add(egui::TextEdit::singleline(&mut form.profile_name).desired_width(250.0));
                    ui.end_row();

                    ui.label("Picture:");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.profile_picture)
                            .desired_width(250.0)
                            .hint_text("avatar.png"),
                    );
                    ui.end_row();

                    ui.label("Customer ID:");
                    ui.add(egui::TextEdit::singleline(&mut form.customer_id_input).desired_width(100.0));
                    ui.end_row();

                    ui.label("Watch History ID:");
                    ui.vertical(|ui| {
                        ui.add(egui::TextEdit::singleline(&mut form.watch_history_id_input).desired_width(100.0));
                        if !form.is_editing {
                            ui.weak("Created automatically if it does not exist");
                        }
                    });
                    ui.end_row();

                    ui.label("Account Status:");
                    egui::ComboBox::from_id_salt("profile_form_status")
                        .width(150.0)
                        .selected_text(form.account_status.as_str())
                        .show_ui(ui, |ui| {
                            for status in AccountStatus::ALL {
                                ui.selectable_value(&mut form.account_status, status, status.as_str());
                            }
                        });
                    ui.end_row();

                    ui.label("Online:");
                    ui.checkbox(&mut form.is_online, "");
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
                    if primary_button_with_icon(ui, "", "Save").clicked() {
                        save = true;
                    }
                });
            });
        });

    if save {
        save_profile(app);
    }
}

fn save_profile(app: &mut App) {
    let form = &app.profile_form;

    match (form.id, form.is_editing) {
        (Some(id), true) => match form.to_update() {
            Ok(data) => app.update_profile(id, data),
            Err(e) => app.error_message = Some(e),
        },
        _ => match form.to_create() {
            Ok(data) => app.create_profile(data),
            Err(e) => app.error_message = Some(e),
        },
    }
}

fn show_details_window(app: &mut App, ctx: &egui::Context) {
    let Some(details) = &app.profile_details else {
        return;
    };
    let mut open = true;

    egui::Window::new(format!("Profile: {}", details.profile.profile_name))
        .id(egui::Id::new("profile_details"))
        .open(&mut open)
        .collapsible(false)
        .default_width(520.0)
        .show(ctx, |ui| {
            let profile = &details.profile;

            egui::Grid::new("profile_details_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Customer:");
                    ui.label(format!("{} (#{})", profile.customer_name(), profile.customer_id));
                    ui.end_row();

                    ui.label("Status:");
                    ui.label(profile.status().as_str());
                    ui.end_row();

                    ui.label("Watch History:");
                    ui.label(profile.watch_history_id.to_string());
                    ui.end_row();
                });

            ui.add_space(10.0);

            match &details.statistics {
                Some(stats) => {
                    ui.horizontal_wrapped(|ui| {
                        stat_card(ui, "Sessions", &stats.sessions.to_string(), "Watch records");
                        stat_card(ui, "Hours", &format!("{:.1}", stats.hours_watched), "Time watched");
                        stat_card(
                            ui,
                            "Reviews",
                            &stats.reviews.to_string(),
                            &stats
                                .average_rating
                                .map(|r| format!("Average {:.1}", r))
                                .unwrap_or_else(|| "No ratings".to_string()),
                        );
                        stat_card(ui, "Favorites", &stats.favorites.to_string(), "Marked titles");
                    });
                }
                None => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading statistics...");
                    });
                }
            }

            ui.add_space(10.0);

            section(ui, "Reviews", |ui| {
                if details.reviews.is_empty() {
                    ui.label(RichText::new("No reviews").weak());
                    return;
                }
                ScrollArea::vertical()
                    .id_salt("profile_reviews")
                    .max_height(220.0)
                    .show(ui, |ui| {
                        egui::Grid::new("profile_reviews_grid")
                            .num_columns(4)
                            .striped(true)
                            .spacing([12.0, 6.0])
                            .show(ui, |ui| {
                                ui.strong("Date");
                                ui.strong("Title");
                                ui.strong("Rating");
                                ui.strong("Comment");
                                ui.end_row();

                                for review in &details.reviews {
                                    ui.label(review.review_date.to_string());
                                    ui.label(
                                        review
                                            .title_name
                                            .clone()
                                            .unwrap_or_else(|| format!("Movie {}", review.movie_id)),
                                    );
                                    ui.label(format!("{}/5", review.rating));
                                    ui.label(&review.comment);
                                    ui.end_row();
                                }
                            });
                    });
            });
        });

    if !open {
        app.profile_details = None;
    }
}
