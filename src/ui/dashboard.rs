//! Dashboard panel with stats, navigation cards, recent viewing and activity log.

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{
    ARROWS_CLOCKWISE, CLOCK_COUNTER_CLOCKWISE, FUNCTION, HEART, MAGNIFYING_GLASS, USERS, USER_CIRCLE,
};

use super::app::{App, LogLevel, Panel};
use super::components::{colors, dashboard_card, section, stat_card, styled_button_with_icon};
use crate::models::DashboardStats;

/// Show the dashboard panel.
///
/// Returns `Some(panel)` if navigation is requested.
pub fn show(app: &mut App, ui: &mut Ui) -> Option<Panel> {
    let mut next_panel = None;

    ScrollArea::vertical().id_salt("dashboard_scroll").show(ui, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);

            ui.label(RichText::new("Streaming Admin").size(32.0).strong());
            ui.add_space(5.0);
            if let Some(session) = &app.session {
                ui.label(
                    RichText::new(format!("{} as {}", session.info.database, session.info.user))
                        .size(14.0)
                        .weak(),
                );
                ui.label(RichText::new(&session.info.version).small().weak());
            }

            ui.add_space(20.0);
        });

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!app.dashboard_loading, |ui| {
                if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
                    app.refresh_dashboard();
                }
            });
            if app.dashboard_loading {
                ui.spinner();
            }
            if let Some(updated) = app.dashboard_updated {
                ui.label(RichText::new(format!("Updated {}", updated.format("%H:%M:%S"))).weak());
            }
        });

        ui.add_space(10.0);

        match app.dashboard.clone() {
            Some(stats) => show_stats(ui, &stats),
            None => {
                ui.label(RichText::new("Statistics not loaded yet").weak());
            }
        }

        ui.add_space(20.0);

        // Navigation cards, two rows of three
        let available = ui.available_width();
        let per_row = 3.0;
        let spacing = 30.0;
        let total_spacing = spacing * (per_row - 1.0);
        let card_width = ((available - total_spacing) / per_row).clamp(150.0, 250.0);
        let card_size = egui::vec2(card_width, card_width * 0.6);
        let start_offset = ((available - card_width * per_row - total_spacing) / 2.0).max(0.0);

        let cards = [
            [
                ("Customers", "Accounts and subscriptions", USERS, Panel::Customers),
                ("Profiles", "Viewer profiles and reviews", USER_CIRCLE, Panel::Profiles),
                ("Watch History", "Sessions and analytics", CLOCK_COUNTER_CLOCKWISE, Panel::WatchHistory),
            ],
            [
                ("Favorites", "Favorite marks per profile", HEART, Panel::Favorites),
                ("Queries & Reports", "Predefined, reports, custom SQL", MAGNIFYING_GLASS, Panel::Queries),
                ("Functions", "Stored functions & procedures", FUNCTION, Panel::Routines),
            ],
        ];

        for row in cards {
            ui.horizontal(|ui| {
                ui.add_space(start_offset);
                for (i, (title, description, icon, panel)) in row.into_iter().enumerate() {
                    if i > 0 {
                        ui.add_space(spacing);
                    }
                    if dashboard_card(ui, title, description, icon, card_size).clicked() {
                        next_panel = Some(panel);
                    }
                }
            });
            ui.add_space(spacing / 2.0);
        }

        ui.add_space(10.0);

        // Two-column layout: Recent Viewing | Activity Log
        let column_width = (ui.available_width() - 40.0) / 2.0;

        ui.horizontal(|ui| {
            ui.add_space(10.0);

            ui.vertical(|ui| {
                ui.set_width(column_width);
                section(ui, "Recent Viewing (24h)", |ui| {
                    ui.set_min_width(column_width - 30.0);
                    show_recent_viewing(ui, app.dashboard.as_ref());
                });
            });

            ui.add_space(20.0);

            ui.vertical(|ui| {
                ui.set_width(column_width);
                section(ui, "Activity Log", |ui| {
                    ui.set_min_width(column_width - 30.0);
                    show_activity_log(ui, app);
                });
            });
        });
    });

    next_panel
}

fn show_stats(ui: &mut Ui, stats: &DashboardStats) {
    ui.horizontal_wrapped(|ui| {
        stat_card(ui, "Customers", &stats.customers.to_string(), "Registered accounts");
        stat_card(
            ui,
            "Active Profiles",
            &stats.active_profiles.to_string(),
            &format!("{} online now", stats.online_profiles),
        );
        stat_card(ui, "Content", &stats.total_content.to_string(), "Titles in catalog");
        stat_card(
            ui,
            "Sessions (24h)",
            &stats.sessions_last_24h.to_string(),
            &format!("{:.1} hours watched", stats.total_hours),
        );
        stat_card(
            ui,
            "Monthly Revenue",
            &format!("${:.2}", stats.monthly_revenue),
            "Payments this month",
        );
        stat_card(ui, "Average Rating", &format!("{:.2}", stats.average_rating), "Across all reviews");
        stat_card(
            ui,
            "Avg Completion",
            &format!("{:.1}%", stats.average_completion),
            "Of watched content",
        );
    });
}

fn show_recent_viewing(ui: &mut Ui, stats: Option<&DashboardStats>) {
    ScrollArea::vertical()
        .id_salt("recent_viewing")
        .max_height(200.0)
        .show(ui, |ui| match stats {
            Some(stats) if !stats.recent_activity.is_empty() => {
                for row in &stats.recent_activity {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(row.watch_date.format("%Y-%m-%d").to_string())
                                .small()
                                .color(Color32::DARK_GRAY),
                        );
                        ui.label(RichText::new(row.user()).strong());
                        ui.label(row.description());
                    });
                }
            }
            _ => {
                ui.label(RichText::new("No recent viewing").weak());
            }
        });
}

fn show_activity_log(ui: &mut Ui, app: &App) {
    ScrollArea::vertical()
        .id_salt("activity_log")
        .max_height(200.0)
        .show(ui, |ui| {
            if app.log_messages.is_empty() {
                ui.label(RichText::new("No recent activity").weak());
                return;
            }
            for entry in app.log_messages.iter().rev().take(20) {
                let color = match entry.level {
                    LogLevel::Info => Color32::GRAY,
                    LogLevel::Success => colors::SUCCESS,
                    LogLevel::Warning => colors::WARNING,
                    LogLevel::Error => colors::ERROR,
                };

                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(entry.timestamp.format("%H:%M:%S").to_string())
                            .small()
                            .color(Color32::DARK_GRAY),
                    );
                    ui.label(RichText::new(&entry.message).color(color));
                });
            }
        });
}
