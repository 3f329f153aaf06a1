//! Watch history panel: filtered, paginated sessions with analytics for the selected range.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{
    ARROWS_CLOCKWISE, CARET_DOUBLE_LEFT, CARET_DOUBLE_RIGHT, CARET_LEFT, CARET_RIGHT, FUNNEL, MAGIC_WAND, PENCIL, PLUS,
    REPEAT, TRASH,
};

use super::app::{App, DeleteTarget, WatchHistoryForm, WatchInsights, today};
use super::components::{
    action_button, back_button, colors, danger_action_button, date_input, optional_date_input, panel_header,
    primary_button_with_icon, section, stat_card, styled_button, styled_button_with_icon,
};
use crate::models::watch_history::{CompletionBand, ViewingCategory, WatchHistoryFilter};

/// Show the watch history panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Watch History");

    let mut apply = false;
    let mut reload_page = false;

    ui.horizontal(|ui| {
        if primary_button_with_icon(ui, PLUS, "Add Record").clicked() {
            app.watch_form = WatchHistoryForm::create(today());
            if app.titles.is_empty() {
                app.load_titles();
            }
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            apply = true;
        }

        ui.add_space(20.0);

        for days in [7, 30, 90] {
            if styled_button(ui, &format!("Last {days} days")).clicked() {
                let search = app.watch_view.filter.search.clone();
                let category = app.watch_view.filter.category;
                let completion = app.watch_view.filter.completion;
                app.watch_view.filter = WatchHistoryFilter {
                    search,
                    category,
                    completion,
                    ..WatchHistoryFilter::last_days(today(), days)
                };
                app.watch_view.from_input = app.watch_view.filter.date_from.format("%Y-%m-%d").to_string();
                app.watch_view.to_input = app.watch_view.filter.date_to.format("%Y-%m-%d").to_string();
                apply = true;
            }
        }
    });

    ui.add_space(10.0);

    ui.horizontal(|ui| {
        let view = &mut app.watch_view;

        ui.label("Search:");
        ui.add(
            egui::TextEdit::singleline(&mut view.filter.search)
                .desired_width(180.0)
                .hint_text("Title, profile or customer..."),
        );

        ui.add_space(10.0);
        ui.label("From:");
        date_input(ui, &mut view.from_input, &mut view.filter.date_from);
        ui.label("To:");
        date_input(ui, &mut view.to_input, &mut view.filter.date_to);

        ui.add_space(10.0);
        ui.label("Category:");
        egui::ComboBox::from_id_salt("watch_category_filter")
            .width(100.0)
            .selected_text(view.filter.category.map(|c| c.as_str()).unwrap_or("All"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut view.filter.category, None, "All");
                for category in ViewingCategory::ALL {
                    ui.selectable_value(&mut view.filter.category, Some(category), category.as_str());
                }
            });

        ui.add_space(10.0);
        ui.label("Completion:");
        egui::ComboBox::from_id_salt("watch_completion_filter")
            .width(140.0)
            .selected_text(view.filter.completion.map(|b| b.label()).unwrap_or("All"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut view.filter.completion, None, "All");
                for band in CompletionBand::ALL {
                    ui.selectable_value(&mut view.filter.completion, Some(band), band.label());
                }
            });

        ui.add_space(10.0);
        if styled_button_with_icon(ui, FUNNEL, "Apply").clicked() {
            apply = true;
        }
    });

    if apply {
        let filter = &app.watch_view.filter;
        if filter.date_from > filter.date_to {
            app.error_message = Some("Start date must be on or before the end date".to_string());
        } else {
            app.watch_view.page = 0;
            app.load_watch_history();
            app.load_watch_insights();
        }
    }

    ui.add_space(15.0);

    ScrollArea::vertical().id_salt("watch_history_scroll").show(ui, |ui| {
        if let Some(insights) = app.watch_insights.clone() {
            show_insights(ui, &insights);
            ui.add_space(15.0);
        }

        if show_pagination(app, ui) {
            reload_page = true;
        }

        ui.add_space(10.0);

        show_table(app, ui);
    });

    if reload_page {
        app.load_watch_history();
    }

    if app.watch_form.is_open {
        show_form_dialog(app, ui.ctx());
    }

    go_back
}

fn show_insights(ui: &mut Ui, insights: &WatchInsights) {
    let analytics = &insights.analytics;

    ui.horizontal_wrapped(|ui| {
        stat_card(ui, "Sessions", &analytics.sessions.to_string(), "In selected range");
        stat_card(ui, "Hours Watched", &format!("{:.1}", analytics.total_hours), "Total viewing time");
        stat_card(
            ui,
            "Avg Duration",
            &format!("{:.1} min", analytics.avg_duration),
            "Per session",
        );
        stat_card(
            ui,
            "Avg Completion",
            &format!("{:.1}%", analytics.avg_completion),
            "Of content watched",
        );
    });

    ui.add_space(10.0);

    let column_width = (ui.available_width() - 40.0) / 3.0;

    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, "Top Content", |ui| {
                if analytics.top_content.is_empty() {
                    ui.label(RichText::new("No sessions").weak());
                    return;
                }
                egui::Grid::new("watch_top_content")
                    .num_columns(3)
                    .striped(true)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.strong("Title");
                        ui.strong("Views");
                        ui.strong("Avg min");
                        ui.end_row();
                        for top in &analytics.top_content {
                            ui.label(
                                top.title_name
                                    .clone()
                                    .unwrap_or_else(|| format!("Movie {}", top.movie_id)),
                            );
                            ui.label(top.view_count.to_string());
                            ui.label(top.avg_duration.map(|d| format!("{:.1}", d)).unwrap_or_default());
                            ui.end_row();
                        }
                    });
            });
        });

        ui.add_space(10.0);

        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, "Completion Distribution", |ui| {
                let total: u64 = insights.distribution.iter().map(|(_, n)| n).sum();
                for (bucket, count) in &insights.distribution {
                    let fraction = if total == 0 { 0.0 } else { *count as f32 / total as f32 };
                    ui.label(bucket.label());
                    ui.add(egui::ProgressBar::new(fraction).text(format!("{count}")));
                }
            });

            ui.add_space(10.0);

            section(ui, "Daily Hours", |ui| {
                if insights.daily_hours.is_empty() {
                    ui.label(RichText::new("No sessions").weak());
                    return;
                }
                let peak = insights.daily_hours.iter().map(|(_, h)| *h).fold(0.0, f64::max);
                ScrollArea::vertical()
                    .id_salt("watch_daily_hours")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for (day, hours) in &insights.daily_hours {
                            let fraction = if peak > 0.0 { (*hours / peak) as f32 } else { 0.0 };
                            ui.horizontal(|ui| {
                                ui.label(RichText::new(day.format("%m-%d").to_string()).monospace());
                                ui.add(egui::ProgressBar::new(fraction).text(format!("{:.1} h", hours)));
                            });
                        }
                    });
            });
        });

        ui.add_space(10.0);

        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, "Category Trends", |ui| {
                egui::Grid::new("watch_category_trends")
                    .num_columns(4)
                    .striped(true)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.strong("Category");
                        ui.strong("Views");
                        ui.strong("Avg min");
                        ui.strong("Avg %");
                        ui.end_row();
                        for trend in &insights.trends {
                            ui.label(trend.viewing_category.as_deref().unwrap_or("-"));
                            ui.label(trend.total_views.to_string());
                            ui.label(trend.avg_duration.map(|d| format!("{:.1}", d)).unwrap_or_default());
                            ui.label(trend.avg_completion.map(|c| format!("{:.1}", c)).unwrap_or_default());
                            ui.end_row();
                        }
                    });
            });
        });
    });
}

/// Page controls. Returns `true` when the page changed.
fn show_pagination(app: &mut App, ui: &mut Ui) -> bool {
    let page_size = app.config.ui.page_size;
    let view = &mut app.watch_view;
    let pages = view.total_pages(page_size);
    let before = view.page;

    ui.horizontal(|ui| {
        ui.add_enabled_ui(view.page > 0, |ui| {
            if ui.button(CARET_DOUBLE_LEFT).on_hover_text("First page").clicked() {
                view.page = 0;
            }
            if ui.button(CARET_LEFT).on_hover_text("Previous page").clicked() {
                view.page = view.page.saturating_sub(1);
            }
        });

        ui.label(format!("Page {} of {}", view.page + 1, pages.max(1)));

        ui.add_enabled_ui(view.page + 1 < pages, |ui| {
            if ui.button(CARET_RIGHT).on_hover_text("Next page").clicked() {
                view.page += 1;
            }
            if ui.button(CARET_DOUBLE_RIGHT).on_hover_text("Last page").clicked() {
                view.page = pages.saturating_sub(1);
            }
        });

        ui.add_space(10.0);
        ui.label(RichText::new(format!("{} records", view.total)).weak());
    });

    view.page != before
}

fn show_table(app: &mut App, ui: &mut Ui) {
    if app.watch_rows.is_empty() && !app.is_loading {
        ui.label(RichText::new("No watch history in this range").weak());
        return;
    }

    let mut rewatch = None;

    egui::Grid::new("watch_history_grid")
        .num_columns(9)
        .striped(true)
        .min_col_width(50.0)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.strong("ID");
            ui.strong("Date");
            ui.strong("Title");
            ui.strong("Profile");
            ui.strong("Customer");
            ui.strong("Minutes");
            ui.strong("Completion");
            ui.strong("Category");
            ui.strong("Actions");
            ui.end_row();

            for row in &app.watch_rows {
                ui.label(row.watch_history_id.to_string());
                ui.label(row.watch_date.to_string());
                ui.label(
                    row.title_name
                        .clone()
                        .unwrap_or_else(|| format!("Movie {}", row.movie_id)),
                );
                ui.label(row.profile_name.as_deref().unwrap_or("-"));
                ui.label(row.customer_name().unwrap_or_else(|| "-".to_string()));
                ui.label(format!("{:.1}", row.duration_watched));

                match row.completion_percentage {
                    Some(pct) => {
                        let color = if CompletionBand::Complete.contains(pct) {
                            colors::SUCCESS
                        } else if CompletionBand::Sample.contains(pct) {
                            colors::WARNING
                        } else {
                            ui.visuals().text_color()
                        };
                        ui.colored_label(color, format!("{:.1}%", pct));
                    }
                    None => {
                        ui.label("-");
                    }
                }

                ui.label(row.category().as_str());

                ui.horizontal(|ui| {
                    if action_button(ui, PENCIL, "Edit").clicked() {
                        app.watch_form = WatchHistoryForm::edit(row);
                    }
                    ui.add_space(4.0);
                    if action_button(ui, REPEAT, "Mark as rewatch").clicked() {
                        rewatch = Some(row.watch_history_id);
                    }
                    ui.add_space(4.0);
                    if danger_action_button(ui, TRASH, "Delete").clicked() {
                        app.delete_target = Some(DeleteTarget::WatchHistory(row.watch_history_id));
                        app.show_delete_confirm = true;
                    }
                });

                ui.end_row();
            }
        });

    if let Some(id) = rewatch {
        app.mark_rewatch(id);
    }
}

fn show_form_dialog(app: &mut App, ctx: &egui::Context) {
    let title = if app.watch_form.is_editing {
        "Edit Watch History"
    } else {
        "Add Watch History"
    };
    let mut save = false;
    let mut estimate = false;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            let form = &mut app.watch_form;
            let titles = &app.titles;

            ui.add_space(10.0);

            egui::Grid::new("watch_form_grid")
                .num_columns(2)
                .spacing([20.0, 10.0])
                .show(ui, |ui| {
                    ui.label("Record ID:");
                    ui.add_enabled(
                        !form.is_editing,
                        egui::TextEdit::singleline(&mut form.id_input)
                            .desired_width(100.0)
                            .hint_text("Auto"),
                    );
                    ui.end_row();

                    ui.label("Movie:");
                    ui.horizontal(|ui| {
                        ui.add(egui::TextEdit::singleline(&mut form.movie_id_input).desired_width(70.0));
                        let selected = form
                            .movie_id_input
                            .trim()
                            .parse::<i32>()
                            .ok()
                            .and_then(|id| titles.iter().find(|t| t.title_id == id))
                            .map(|t| t.title_name.as_str())
                            .unwrap_or("Pick title...");
                        egui::ComboBox::from_id_salt("watch_form_title")
                            .width(180.0)
                            .selected_text(selected)
                            .show_ui(ui, |ui| {
                                for t in titles {
                                    if ui.selectable_label(false, &t.title_name).clicked() {
                                        form.movie_id_input = t.title_id.to_string();
                                    }
                                }
                            });
                    });
                    ui.end_row();

                    ui.label("Watch Date:");
                    ui.vertical(|ui| {
                        optional_date_input(ui, &mut form.watch_date_input, &mut form.watch_date);
                    });
                    ui.end_row();

                    ui.label("Minutes Watched:");
                    ui.add(egui::TextEdit::singleline(&mut form.duration_input).desired_width(100.0));
                    ui.end_row();

                    ui.label("Completion %:");
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut form.completion_input)
                                .desired_width(100.0)
                                .hint_text("Optional"),
                        );
                        ui.add_enabled_ui(!form.estimating, |ui| {
                            if ui
                                .button(format!("{MAGIC_WAND} Estimate"))
                                .on_hover_text("Estimate from the title's running time")
                                .clicked()
                            {
                                estimate = true;
                            }
                        });
                        if form.estimating {
                            ui.spinner();
                        }
                    });
                    ui.end_row();

                    ui.label("Category:");
                    egui::ComboBox::from_id_salt("watch_form_category")
                        .width(150.0)
                        .selected_text(form.viewing_category.as_str())
                        .show_ui(ui, |ui| {
                            for category in ViewingCategory::ALL {
                                ui.selectable_value(&mut form.viewing_category, category, category.as_str());
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
                    if primary_button_with_icon(ui, "", "Save").clicked() {
                        save = true;
                    }
                });
            });
        });

    if estimate {
        app.suggest_completion();
    }
    if save {
        save_watch_history(app);
    }
}

fn save_watch_history(app: &mut App) {
    let form = &app.watch_form;

    match (form.id, form.is_editing) {
        (Some(id), true) => match form.to_update() {
            Ok(data) => app.update_watch_history(id, data),
            Err(e) => app.error_message = Some(e),
        },
        _ => match form.to_create() {
            Ok(data) => app.create_watch_history(data),
            Err(e) => app.error_message = Some(e),
        },
    }
}
