//! Queries & reports panel: predefined queries, date-ranged reports, custom SQL
//! and the shared results grid.

use std::path::PathBuf;

use chrono::{Datelike, Months, NaiveDate};
use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;
use egui_phosphor::regular::{CHART_BAR, CHECK_CIRCLE, CODE, FLOPPY_DISK, FOLDER_OPEN, PLAY, TRASH};

use super::app::App;
use super::components::{
    back_button, colors, date_input, panel_header, primary_button_with_icon, section, styled_button,
    styled_button_with_icon,
};
use super::files;
use crate::reports::{PREDEFINED_QUERIES, PredefinedQuery, QueryArgs, QueryHistory, ReportKind, ResultTable};

/// Tabs of the queries panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryTab {
    #[default]
    Predefined,
    Reports,
    Custom,
    History,
}

impl QueryTab {
    pub const ALL: [QueryTab; 4] = [Self::Predefined, Self::Reports, Self::Custom, Self::History];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Predefined => "Predefined Queries",
            Self::Reports => "Reports",
            Self::Custom => "Custom SQL",
            Self::History => "History",
        }
    }
}

/// State of the queries panel.
pub struct QueryState {
    pub tab: QueryTab,

    // Predefined
    pub selected: Option<&'static str>,
    pub args: QueryArgs,
    pub year_input: String,
    pub month_input: String,
    pub threshold_input: String,
    pub show_sql: bool,

    // Reports
    pub report_kind: ReportKind,
    pub report_from: NaiveDate,
    pub report_to: NaiveDate,
    pub report_from_input: String,
    pub report_to_input: String,

    // Custom SQL
    pub custom_sql: String,
    pub sql_file: Option<PathBuf>,
    pub validation: Option<Result<Vec<String>, String>>,

    // Results
    pub results: Option<ResultTable>,
    pub results_label: String,
    pub elapsed_ms: u128,
    pub running: bool,
    pub show_analysis: bool,
    pub history: QueryHistory,
}

impl QueryState {
    pub fn new(today: NaiveDate) -> Self {
        let args = QueryArgs::for_today(today);
        let report_from = today.with_day(1).unwrap_or(today) - Months::new(2);
        Self {
            tab: QueryTab::default(),
            selected: PREDEFINED_QUERIES.first().map(|q| q.id),
            year_input: args.year.to_string(),
            month_input: args.month.to_string(),
            threshold_input: format!("{:.0}", args.threshold),
            args,
            show_sql: false,
            report_kind: ReportKind::default(),
            report_from,
            report_to: today,
            report_from_input: report_from.format("%Y-%m-%d").to_string(),
            report_to_input: today.format("%Y-%m-%d").to_string(),
            custom_sql: String::new(),
            sql_file: None,
            validation: None,
            results: None,
            results_label: String::new(),
            elapsed_ms: 0,
            running: false,
            show_analysis: false,
            history: QueryHistory::default(),
        }
    }

    pub fn selected_query(&self) -> Option<&'static PredefinedQuery> {
        self.selected.and_then(PredefinedQuery::find)
    }

    /// Parse the year, month and threshold inputs into query arguments.
    pub fn query_args(&self) -> Result<QueryArgs, String> {
        let year: i32 = self
            .year_input
            .trim()
            .parse()
            .ok()
            .filter(|y| (1900..=2100).contains(y))
            .ok_or("Year must be between 1900 and 2100")?;
        let month: u32 = self
            .month_input
            .trim()
            .parse()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or("Month must be between 1 and 12")?;
        let threshold: f64 = self
            .threshold_input
            .trim()
            .parse()
            .ok()
            .filter(|t: &f64| t.is_finite() && *t >= 0.0)
            .ok_or("Threshold must be a non-negative number")?;
        Ok(QueryArgs {
            year,
            month,
            threshold,
            today: self.args.today,
        })
    }

    /// Store a finished query's rows and add it to the history.
    pub fn finish_rows(&mut self, label: String, table: ResultTable, elapsed_ms: u128) {
        self.history
            .record(label.clone(), elapsed_ms, Ok(format!("{} rows", table.row_count())));
        self.results_label = label;
        self.elapsed_ms = elapsed_ms;
        self.results = Some(table);
        self.show_analysis = false;
    }
}

/// Show the queries panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Queries & Reports");

    ui.horizontal(|ui| {
        for tab in QueryTab::ALL {
            if ui.selectable_label(app.queries.tab == tab, tab.name()).clicked() {
                app.queries.tab = tab;
            }
        }
        if app.queries.running {
            ui.add_space(10.0);
            ui.spinner();
            ui.label("Running...");
        }
    });

    ui.separator();
    ui.add_space(10.0);

    match app.queries.tab {
        QueryTab::Predefined => show_predefined(app, ui),
        QueryTab::Reports => show_reports(app, ui),
        QueryTab::Custom => show_custom(app, ui),
        QueryTab::History => show_history(app, ui),
    }

    if app.queries.tab != QueryTab::History {
        ui.add_space(15.0);
        show_results(app, ui);
    }

    if app.queries.show_analysis {
        show_analysis_window(app, ui.ctx());
    }

    go_back
}

fn show_predefined(app: &mut App, ui: &mut Ui) {
    let mut run = false;
    let state = &mut app.queries;

    ui.horizontal(|ui| {
        ui.label("Query:");
        egui::ComboBox::from_id_salt("predefined_query")
            .width(320.0)
            .selected_text(state.selected_query().map(|q| q.name).unwrap_or("Select..."))
            .show_ui(ui, |ui| {
                for query in PREDEFINED_QUERIES {
                    ui.selectable_value(&mut state.selected, Some(query.id), query.name);
                }
            });

        ui.add_space(10.0);

        ui.add_enabled_ui(!state.running && state.selected.is_some(), |ui| {
            if primary_button_with_icon(ui, PLAY, "Run").clicked() {
                run = true;
            }
        });

        ui.toggle_value(&mut state.show_sql, format!("{CODE} View SQL"));
    });

    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("Year:");
        ui.add(egui::TextEdit::singleline(&mut state.year_input).desired_width(60.0));
        ui.label("Month:");
        ui.add(egui::TextEdit::singleline(&mut state.month_input).desired_width(40.0));
        ui.label("Payment threshold:");
        ui.add(egui::TextEdit::singleline(&mut state.threshold_input).desired_width(70.0));
    });

    if let Some(query) = state.selected_query() {
        ui.add_space(8.0);
        ui.label(RichText::new(query.description).weak());

        if state.show_sql {
            ui.add_space(8.0);
            section(ui, "SQL", |ui| {
                let mut sql = query.sql.to_string();
                ui.add(
                    egui::TextEdit::multiline(&mut sql)
                        .code_editor()
                        .desired_width(f32::INFINITY)
                        .interactive(false),
                );
            });
        }
    }

    if run {
        app.run_predefined_query();
    }
}

fn show_reports(app: &mut App, ui: &mut Ui) {
    let mut run = false;
    let state = &mut app.queries;

    ui.horizontal(|ui| {
        ui.label("Report:");
        egui::ComboBox::from_id_salt("report_kind")
            .width(240.0)
            .selected_text(state.report_kind.name())
            .show_ui(ui, |ui| {
                for kind in ReportKind::ALL {
                    ui.selectable_value(&mut state.report_kind, kind, kind.name());
                }
            });
    });

    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("From:");
        date_input(ui, &mut state.report_from_input, &mut state.report_from);
        if ui
            .add(DatePickerButton::new(&mut state.report_from).id_salt("report_from_picker"))
            .changed()
        {
            state.report_from_input = state.report_from.format("%Y-%m-%d").to_string();
        }

        ui.add_space(10.0);

        ui.label("To:");
        date_input(ui, &mut state.report_to_input, &mut state.report_to);
        if ui
            .add(DatePickerButton::new(&mut state.report_to).id_salt("report_to_picker"))
            .changed()
        {
            state.report_to_input = state.report_to.format("%Y-%m-%d").to_string();
        }

        ui.add_space(10.0);

        let valid = state.report_from <= state.report_to;
        ui.add_enabled_ui(!state.running && valid, |ui| {
            if primary_button_with_icon(ui, PLAY, "Generate").clicked() {
                run = true;
            }
        });
        if !valid {
            ui.colored_label(colors::ERROR, "Start date is after end date");
        }
    });

    if run {
        app.run_report();
    }
}

fn show_custom(app: &mut App, ui: &mut Ui) {
    let mut run = false;
    let mut validate = false;

    ui.horizontal(|ui| {
        let state = &mut app.queries;
        ui.add_enabled_ui(!state.running, |ui| {
            if primary_button_with_icon(ui, PLAY, "Execute").clicked() {
                run = true;
            }
        });
        if styled_button_with_icon(ui, CHECK_CIRCLE, "Validate").clicked() {
            validate = true;
        }

        ui.add_space(20.0);

        if styled_button_with_icon(ui, FOLDER_OPEN, "Load").clicked()
            && let Some(path) = files::show_open_sql_dialog()
        {
            match std::fs::read_to_string(&path) {
                Ok(sql) => {
                    state.custom_sql = sql;
                    state.validation = None;
                    tracing::info!("Loaded SQL from {}", path.display());
                    state.sql_file = Some(path);
                }
                Err(e) => app.error_message = Some(format!("Could not read {}: {}", path.display(), e)),
            }
        }
        if styled_button_with_icon(ui, FLOPPY_DISK, "Save").clicked()
            && let Some(path) = files::show_save_sql_dialog(state.sql_file.as_deref())
        {
            match std::fs::write(&path, &state.custom_sql) {
                Ok(()) => {
                    tracing::info!("Saved SQL to {}", path.display());
                    state.sql_file = Some(path);
                }
                Err(e) => app.error_message = Some(format!("Could not write {}: {}", path.display(), e)),
            }
        }
        if styled_button(ui, "Clear").clicked() {
            state.custom_sql.clear();
            state.validation = None;
            state.sql_file = None;
        }

        if let Some(path) = &state.sql_file {
            ui.label(RichText::new(path.display().to_string()).small().weak());
        }
    });

    ui.add_space(8.0);

    ScrollArea::vertical()
        .id_salt("custom_sql_editor")
        .max_height(200.0)
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut app.queries.custom_sql)
                    .code_editor()
                    .desired_rows(8)
                    .desired_width(f32::INFINITY)
                    .hint_text("SELECT * FROM customer LIMIT 10"),
            );
        });

    ui.label(
        RichText::new("Queries return rows. Other statements run in a transaction and report affected rows.")
            .small()
            .weak(),
    );

    match &app.queries.validation {
        Some(Ok(plan)) => {
            ui.add_space(8.0);
            section(ui, "Query Plan", |ui| {
                ui.colored_label(colors::SUCCESS, "Query is valid");
                for line in plan {
                    ui.label(RichText::new(line).monospace().small());
                }
            });
        }
        Some(Err(e)) => {
            ui.add_space(8.0);
            ui.colored_label(colors::ERROR, e);
        }
        None => {}
    }

    if validate {
        app.validate_custom_sql();
    }
    if run {
        app.run_custom_sql();
    }
}

fn show_history(app: &mut App, ui: &mut Ui) {
    let history = &mut app.queries.history;

    ui.horizontal(|ui| {
        ui.label(format!("{} executions", history.len()));
        if !history.is_empty() && styled_button_with_icon(ui, TRASH, "Clear History").clicked() {
            history.clear();
        }
    });

    ui.add_space(10.0);

    if history.is_empty() {
        ui.label(RichText::new("No queries run yet").weak());
        return;
    }

    ScrollArea::vertical().id_salt("query_history").show(ui, |ui| {
        egui::Grid::new("query_history_grid")
            .num_columns(4)
            .striped(true)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.strong("Time");
                ui.strong("Query");
                ui.strong("Duration");
                ui.strong("Outcome");
                ui.end_row();

                for entry in history.iter() {
                    ui.label(entry.executed_at.format("%H:%M:%S").to_string());
                    ui.label(&entry.label);
                    ui.label(format!("{} ms", entry.elapsed_ms));
                    match &entry.outcome {
                        Ok(summary) => ui.colored_label(colors::SUCCESS, summary),
                        Err(e) => ui.colored_label(colors::ERROR, e),
                    };
                    ui.end_row();
                }
            });
    });
}

fn show_results(app: &mut App, ui: &mut Ui) {
    let state = &mut app.queries;
    let Some(table) = &state.results else {
        return;
    };

    ui.horizontal(|ui| {
        ui.label(RichText::new(&state.results_label).strong());
        ui.label(
            RichText::new(format!(
                "{} rows, {} columns, {} ms",
                table.row_count(),
                table.columns.len(),
                state.elapsed_ms
            ))
            .weak(),
        );
        if !table.is_empty() && styled_button_with_icon(ui, CHART_BAR, "Analyze").clicked() {
            state.show_analysis = true;
        }
    });

    ui.add_space(8.0);

    if table.is_empty() {
        ui.label(RichText::new("No rows returned").weak());
        return;
    }

    ScrollArea::both().id_salt("query_results").show(ui, |ui| {
        egui::Grid::new("query_results_grid")
            .num_columns(table.columns.len())
            .striped(true)
            .min_col_width(60.0)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                for column in &table.columns {
                    ui.strong(column);
                }
                ui.end_row();

                for row in &table.rows {
                    for cell in row {
                        if cell.is_null() {
                            ui.label(RichText::new("NULL").weak().italics());
                        } else {
                            ui.label(cell.to_string());
                        }
                    }
                    ui.end_row();
                }
            });
    });
}

fn show_analysis_window(app: &mut App, ctx: &egui::Context) {
    let state = &mut app.queries;
    let Some(table) = &state.results else {
        state.show_analysis = false;
        return;
    };
    let analysis = table.analyze();

    egui::Window::new("Result Analysis")
        .open(&mut state.show_analysis)
        .collapsible(false)
        .default_width(480.0)
        .show(ctx, |ui| {
            ui.label(format!(
                "{} rows, {} columns, {} null values",
                analysis.row_count,
                analysis.column_count,
                analysis.total_nulls()
            ));
            ui.add_space(10.0);

            egui::Grid::new("analysis_grid")
                .num_columns(5)
                .striped(true)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.strong("Column");
                    ui.strong("Nulls");
                    ui.strong("Min");
                    ui.strong("Max");
                    ui.strong("Average");
                    ui.end_row();

                    for column in &analysis.columns {
                        ui.label(&column.name);
                        ui.label(column.nulls.to_string());
                        match column.numeric {
                            Some(summary) => {
                                ui.label(format!("{:.2}", summary.min));
                                ui.label(format!("{:.2}", summary.max));
                                ui.label(format!("{:.2}", summary.avg));
                            }
                            None => {
                                ui.label("-");
                                ui.label("-");
                                ui.label("-");
                            }
                        }
                        ui.end_row();
                    }
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_new_state_defaults() {
        let state = QueryState::new(today());
        assert_eq!(state.report_from, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(state.report_to, today());
        assert!(state.selected_query().is_some());
        assert_eq!(state.query_args().unwrap(), QueryArgs::for_today(today()));
    }

    #[test]
    fn test_query_args_validation() {
        let mut state = QueryState::new(today());
        state.month_input = "13".to_string();
        assert!(state.query_args().is_err());

        state.month_input = "2".to_string();
        state.threshold_input = "-5".to_string();
        assert!(state.query_args().is_err());

        state.threshold_input = "150.5".to_string();
        state.year_input = "2023".to_string();
        let args = state.query_args().unwrap();
        assert_eq!((args.year, args.month, args.threshold), (2023, 2, 150.5));
    }

    #[test]
    fn test_finish_rows_records_history() {
        let mut state = QueryState::new(today());
        let table = ResultTable {
            columns: vec!["n".to_string()],
            rows: vec![vec![crate::reports::Cell::Int(1)]],
        };
        state.finish_rows("Count".to_string(), table, 12);

        assert_eq!(state.results.as_ref().map(|t| t.row_count()), Some(1));
        assert_eq!(state.history.len(), 1);
        let entry = state.history.iter().next().unwrap();
        assert_eq!(entry.outcome, Ok("1 rows".to_string()));
    }
}
