//! Login screen: saved connections, connection fields and a status log.

use chrono::{DateTime, Local};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{PLUGS_CONNECTED, SIGN_IN, TRASH};

use super::app::App;
use super::components::{colors, danger_action_button, primary_button_with_icon, section, styled_button_with_icon};
use crate::config::DatabaseConfig;
use crate::profiles::ConnectionProfile;

/// Login form inputs and status.
#[derive(Debug, Clone, Default)]
pub struct LoginState {
    pub selected_profile: Option<String>,
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub save_connection: bool,
    pub status_log: Vec<(DateTime<Local>, String)>,
    pub testing: bool,
    pub connecting: bool,
}

impl LoginState {
    /// Pre-fill the fields from the configured database defaults.
    pub fn new(database: &DatabaseConfig, save_connection: bool) -> Self {
        Self {
            host: database.host.clone(),
            port: database.port.to_string(),
            database: database.name.clone(),
            user: database.username.clone(),
            password: database.password.clone(),
            save_connection,
            ..Default::default()
        }
    }

    /// Connection profile described by the fields.
    pub fn profile(&self) -> ConnectionProfile {
        ConnectionProfile {
            host: self.host.trim().to_string(),
            port: self.port.trim().to_string(),
            database: self.database.trim().to_string(),
            user: self.user.trim().to_string(),
        }
    }

    /// Build and validate the database settings from the form.
    pub fn database_config(&self) -> Result<DatabaseConfig, String> {
        self.profile()
            .to_database_config(&self.password)
            .map_err(|e| e.to_string())
    }

    /// Fill the fields from a saved profile. The password is left blank.
    pub fn apply_profile(&mut self, name: &str, profile: &ConnectionProfile) {
        self.selected_profile = Some(name.to_string());
        self.host = profile.host.clone();
        self.port = profile.port.clone();
        self.database = profile.database.clone();
        self.user = profile.user.clone();
        self.password.clear();
    }

    pub fn push_status(&mut self, message: impl Into<String>) {
        self.status_log.push((Local::now(), message.into()));
        if self.status_log.len() > 50 {
            self.status_log.remove(0);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.testing || self.connecting
    }
}

/// Show the login screen.
pub fn show(app: &mut App, ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(30.0);
        ui.label(RichText::new("Streaming Admin").size(32.0).strong());
        ui.add_space(5.0);
        ui.label(RichText::new("Connect to the streaming service database").size(14.0).weak());
        ui.add_space(25.0);
    });

    let width = ui.available_width().min(520.0);
    let offset = ((ui.available_width() - width) / 2.0).max(0.0);

    ui.horizontal(|ui| {
        ui.add_space(offset);
        ui.vertical(|ui| {
            ui.set_width(width);

            section(ui, "Connection", |ui| {
                ui.set_min_width(width - 30.0);
                show_saved_profiles(app, ui);
                ui.add_space(10.0);
                show_fields(app, ui);
            });

            ui.add_space(15.0);

            ui.horizontal(|ui| {
                let busy = app.login.is_busy();
                ui.add_enabled_ui(!busy, |ui| {
                    if styled_button_with_icon(ui, PLUGS_CONNECTED, "Test Connection").clicked() {
                        app.test_connection();
                    }
                    ui.add_space(10.0);
                    if primary_button_with_icon(ui, SIGN_IN, "Login").clicked() {
                        app.login();
                    }
                });
                if busy {
                    ui.spinner();
                }
            });

            ui.add_space(15.0);

            section(ui, "Status", |ui| {
                ui.set_min_width(width - 30.0);
                ScrollArea::vertical()
                    .id_salt("login_status")
                    .max_height(160.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if app.login.status_log.is_empty() {
                            ui.label(RichText::new("Ready").weak());
                        }
                        for (time, message) in &app.login.status_log {
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(time.format("%H:%M:%S").to_string())
                                        .small()
                                        .color(Color32::DARK_GRAY),
                                );
                                let color = if message.contains("failed") || message.starts_with("Invalid") {
                                    colors::ERROR
                                } else {
                                    ui.visuals().text_color()
                                };
                                ui.label(RichText::new(message).color(color));
                            });
                        }
                    });
            });
        });
    });
}

fn show_saved_profiles(app: &mut App, ui: &mut Ui) {
    let mut apply = None;
    let mut remove = None;

    ui.horizontal(|ui| {
        ui.label("Saved connection:");
        egui::ComboBox::from_id_salt("login_saved_profile")
            .width(220.0)
            .selected_text(app.login.selected_profile.as_deref().unwrap_or("(none)"))
            .show_ui(ui, |ui| {
                if app.connections.is_empty() {
                    ui.label(RichText::new("No saved connections").weak());
                }
                for name in app.connections.names() {
                    if ui
                        .selectable_label(app.login.selected_profile.as_deref() == Some(name), name)
                        .clicked()
                    {
                        apply = Some(name.to_string());
                    }
                }
            });

        if let Some(name) = app.login.selected_profile.clone()
            && danger_action_button(ui, TRASH, "Forget this connection").clicked()
        {
            remove = Some(name);
        }
    });

    if let Some(name) = apply
        && let Some(profile) = app.connections.get(&name).cloned()
    {
        app.login.apply_profile(&name, &profile);
        app.login.push_status(format!("Loaded saved connection '{}'", name));
    }

    if let Some(name) = remove {
        match app.connections.remove(&name) {
            Ok(_) => {
                app.login.selected_profile = None;
                app.login.push_status(format!("Removed saved connection '{}'", name));
            }
            Err(e) => app.login.push_status(format!("Could not remove '{}': {}", name, e)),
        }
    }
}

fn show_fields(app: &mut App, ui: &mut Ui) {
    let login = &mut app.login;
    let mut submit = false;

    egui::Grid::new("login_fields")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Host:");
            ui.add(egui::TextEdit::singleline(&mut login.host).desired_width(260.0));
            ui.end_row();

            ui.label("Port:");
            let port_valid = login.port.trim().parse::<u16>().is_ok_and(|p| p > 0);
            ui.add(
                egui::TextEdit::singleline(&mut login.port)
                    .desired_width(80.0)
                    .text_color(if port_valid { ui.visuals().text_color() } else { colors::ERROR }),
            );
            ui.end_row();

            ui.label("Database:");
            ui.add(egui::TextEdit::singleline(&mut login.database).desired_width(260.0));
            ui.end_row();

            ui.label("User:");
            ui.add(egui::TextEdit::singleline(&mut login.user).desired_width(260.0));
            ui.end_row();

            ui.label("Password:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut login.password)
                    .password(true)
                    .desired_width(260.0),
            );
            ui.end_row();

            ui.label("");
            ui.checkbox(&mut login.save_connection, "Save connection");
            ui.end_row();

            submit = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && !login.is_busy();
        });

    if submit {
        app.login();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_from_fields() {
        let mut state = LoginState::new(&DatabaseConfig::default(), true);
        state.host = " db.internal ".to_string();
        state.password = "secret".to_string();

        let config = state.database_config().unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5432);
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_database_config_rejects_bad_fields() {
        let mut state = LoginState::new(&DatabaseConfig::default(), false);
        state.port = "http".to_string();
        assert!(state.database_config().is_err());

        state.port = "5432".to_string();
        state.user.clear();
        assert!(state.database_config().is_err());
    }

    #[test]
    fn test_apply_profile_clears_password() {
        let mut state = LoginState {
            password: "old".to_string(),
            ..Default::default()
        };
        let profile = ConnectionProfile {
            host: "h".to_string(),
            port: "6543".to_string(),
            database: "d".to_string(),
            user: "u".to_string(),
        };
        state.apply_profile("prod", &profile);
        assert_eq!(state.selected_profile.as_deref(), Some("prod"));
        assert_eq!(state.port, "6543");
        assert!(state.password.is_empty());
        assert_eq!(state.profile(), profile);
    }

    #[test]
    fn test_status_log_is_bounded() {
        let mut state = LoginState::default();
        for i in 0..60 {
            state.push_status(format!("line {i}"));
        }
        assert_eq!(state.status_log.len(), 50);
        assert_eq!(state.status_log[0].1, "line 10");
    }
}
