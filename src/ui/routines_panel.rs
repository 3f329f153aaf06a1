//! Functions & procedures panel: catalog, parameter form, execution log and statistics.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{CODE, PLAY, TRASH};

use super::app::App;
use super::components::{
    back_button, colors, panel_header, primary_button_with_icon, section, stat_card, styled_button,
    styled_button_with_icon,
};
use crate::routines::{ExecutionLog, Routine, RoutineKind};

/// State of the routines panel.
#[derive(Default)]
pub struct RoutineState {
    pub selected: Option<&'static str>,
    /// Raw text for each parameter of the selected routine.
    pub inputs: Vec<String>,
    pub running: bool,
    pub result: Option<Result<String, String>>,
    pub show_sql: bool,
    pub log: ExecutionLog,
}

impl RoutineState {
    pub fn selected(&self) -> Option<&'static Routine> {
        self.selected.and_then(Routine::find)
    }

    /// Select a routine and reset the parameter inputs.
    pub fn select(&mut self, routine: &'static Routine) {
        self.selected = Some(routine.name);
        self.inputs = vec![String::new(); routine.params.len()];
        self.result = None;
    }
}

/// Show the routines panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Functions & Procedures");

    let column_width = (ui.available_width() - 30.0) / 3.0;
    let mut execute = false;

    ui.horizontal_top(|ui| {
        ui.vertical(|ui| {
            ui.set_width(column_width);
            show_catalog(&mut app.routines, ui);
        });

        ui.add_space(20.0);

        ui.vertical(|ui| {
            ui.set_width(column_width * 2.0);
            execute = show_form(&mut app.routines, ui);
        });
    });

    if execute {
        app.execute_routine();
    }

    ui.add_space(15.0);

    show_log(&mut app.routines, ui);

    if app.routines.show_sql {
        show_sql_window(&mut app.routines, ui.ctx());
    }

    go_back
}

fn show_catalog(state: &mut RoutineState, ui: &mut Ui) {
    for (caption, routines) in [
        ("Functions", Routine::functions().collect::<Vec<_>>()),
        ("Procedures", Routine::procedures().collect::<Vec<_>>()),
    ] {
        section(ui, caption, |ui| {
            for routine in routines {
                let selected = state.selected == Some(routine.name);
                if ui
                    .selectable_label(selected, routine.title)
                    .on_hover_text(routine.description)
                    .clicked()
                    && !selected
                {
                    state.select(routine);
                }
            }
        });
        ui.add_space(10.0);
    }
}

/// Parameter form for the selected routine. Returns `true` when Execute is clicked.
fn show_form(state: &mut RoutineState, ui: &mut Ui) -> bool {
    let Some(routine) = state.selected() else {
        ui.label(RichText::new("Select a function or procedure").weak());
        return false;
    };
    let mut execute = false;

    section(ui, routine.title, |ui| {
        ui.label(RichText::new(routine.description).weak());
        ui.label(RichText::new(routine.kind.label()).small());
        ui.add_space(10.0);

        if routine.params.is_empty() {
            ui.label("No parameters");
        } else {
            egui::Grid::new("routine_params")
                .num_columns(3)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    for (spec, input) in routine.params.iter().zip(state.inputs.iter_mut()) {
                        ui.label(format!("{}:", spec.label));
                        let valid = input.is_empty() || spec.kind.parse(input).is_ok();
                        ui.add(
                            egui::TextEdit::singleline(input)
                                .desired_width(180.0)
                                .text_color(if valid { ui.visuals().text_color() } else { colors::ERROR }),
                        );
                        ui.label(RichText::new(spec.kind.label()).small().weak());
                        ui.end_row();
                    }
                });
        }

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!state.running, |ui| {
                if primary_button_with_icon(ui, PLAY, "Execute").clicked() {
                    execute = true;
                }
            });
            if styled_button_with_icon(ui, CODE, "View SQL").clicked() {
                state.show_sql = true;
            }
            if styled_button(ui, "Clear").clicked() {
                state.inputs.iter_mut().for_each(String::clear);
                state.result = None;
            }
            if state.running {
                ui.spinner();
            }
        });

        if let Some(result) = &state.result {
            ui.add_space(10.0);
            match result {
                Ok(value) => {
                    ui.label(RichText::new("Result").strong());
                    ui.label(RichText::new(value).monospace().color(colors::SUCCESS));
                }
                Err(e) => {
                    ui.label(RichText::new("Error").strong());
                    ui.colored_label(colors::ERROR, e);
                }
            }
        }
    });

    execute
}

fn show_log(state: &mut RoutineState, ui: &mut Ui) {
    let stats = state.log.statistics();

    ui.horizontal(|ui| {
        stat_card(ui, "Executions", &state.log.len().to_string(), "This session");
        stat_card(
            ui,
            "Success Rate",
            &state
                .log
                .success_rate()
                .map(|r| format!("{:.0}%", r))
                .unwrap_or_else(|| "-".to_string()),
            "Of all calls",
        );
        stat_card(ui, "Routines Used", &stats.len().to_string(), "Distinct routines");
    });

    ui.add_space(10.0);

    let column_width = (ui.available_width() - 30.0) / 2.0;

    ui.horizontal_top(|ui| {
        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, "Execution Log", |ui| {
                if !state.log.is_empty() && styled_button_with_icon(ui, TRASH, "Clear Log").clicked() {
                    state.log.clear();
                }
                if state.log.is_empty() {
                    ui.label(RichText::new("Nothing executed yet").weak());
                    return;
                }
                ScrollArea::vertical()
                    .id_salt("routine_log")
                    .max_height(240.0)
                    .show(ui, |ui| {
                        egui::Grid::new("routine_log_grid")
                            .num_columns(5)
                            .striped(true)
                            .spacing([12.0, 6.0])
                            .show(ui, |ui| {
                                ui.strong("Time");
                                ui.strong("Routine");
                                ui.strong("Parameters");
                                ui.strong("ms");
                                ui.strong("Result");
                                ui.end_row();

                                for entry in state.log.iter() {
                                    ui.label(entry.executed_at.format("%H:%M:%S").to_string());
                                    ui.label(&entry.name);
                                    ui.label(entry.params.join(", "));
                                    ui.label(entry.elapsed_ms.to_string());
                                    match &entry.outcome {
                                        Ok(value) => ui.colored_label(colors::SUCCESS, value),
                                        Err(e) => ui.colored_label(colors::ERROR, e),
                                    };
                                    ui.end_row();
                                }
                            });
                    });
            });
        });

        ui.add_space(20.0);

        ui.vertical(|ui| {
            ui.set_width(column_width);
            section(ui, "Statistics", |ui| {
                if stats.is_empty() {
                    ui.label(RichText::new("No statistics yet").weak());
                    return;
                }
                egui::Grid::new("routine_stats_grid")
                    .num_columns(5)
                    .striped(true)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.strong("Type");
                        ui.strong("Routine");
                        ui.strong("Calls");
                        ui.strong("Failures");
                        ui.strong("Avg ms");
                        ui.end_row();

                        for ((kind, name), routine_stats) in &stats {
                            ui.label(match kind {
                                RoutineKind::Function => "fn",
                                RoutineKind::Procedure => "proc",
                            });
                            ui.label(name);
                            ui.label(routine_stats.calls.to_string());
                            ui.label(routine_stats.failures.to_string());
                            ui.label(format!("{:.1}", routine_stats.average_ms));
                            ui.end_row();
                        }
                    });
            });
        });
    });
}

fn show_sql_window(state: &mut RoutineState, ctx: &egui::Context) {
    let Some(routine) = state.selected() else {
        state.show_sql = false;
        return;
    };

    egui::Window::new(format!("SQL: {}", routine.name))
        .open(&mut state.show_sql)
        .collapsible(false)
        .default_width(480.0)
        .show(ctx, |ui| {
            let mut text = routine.signature();
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .code_editor()
                    .desired_width(f32::INFINITY)
                    .interactive(false),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::ROUTINES;

    #[test]
    fn test_select_resets_inputs() {
        let mut state = RoutineState::default();
        let routine = &ROUTINES[0];
        state.inputs = vec!["stale".to_string(); 5];
        state.result = Some(Ok("old".to_string()));

        state.select(routine);

        assert_eq!(state.selected().map(|r| r.name), Some(routine.name));
        assert_eq!(state.inputs.len(), routine.params.len());
        assert!(state.inputs.iter().all(String::is_empty));
        assert!(state.result.is_none());
    }

    #[test]
    fn test_nothing_selected() {
        let state = RoutineState::default();
        assert!(state.selected().is_none());
    }
}
