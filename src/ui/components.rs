//! Shared UI components.

use chrono::NaiveDate;
use eframe::egui::{self, Color32, CornerRadius, Margin, Response, RichText, Sense, StrokeKind, Ui};

/// Render a clickable dashboard card with dynamic size.
///
/// Returns the response which can be checked for `.clicked()`.
pub fn dashboard_card(ui: &mut Ui, title: &str, description: &str, icon: &str, size: egui::Vec2) -> Response {
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());

    if ui.is_rect_visible(rect) {
        let visuals = ui.style().interact(&response);

        // Scale factor based on width (200 is the reference size)
        let scale = size.x / 200.0;

        ui.painter().rect_filled(rect, 8.0, visuals.bg_fill);
        ui.painter()
            .rect_stroke(rect, 8.0, visuals.bg_stroke, StrokeKind::Outside);

        let icon_pos = egui::pos2(rect.center().x, rect.top() + size.y * 0.23);
        ui.painter().text(
            icon_pos,
            egui::Align2::CENTER_CENTER,
            icon,
            egui::FontId::proportional(36.0 * scale),
            visuals.text_color(),
        );

        let title_pos = egui::pos2(rect.center().x, rect.center().y + size.y * 0.07);
        ui.painter().text(
            title_pos,
            egui::Align2::CENTER_CENTER,
            title,
            egui::FontId::proportional(18.0 * scale),
            visuals.text_color(),
        );

        let desc_pos = egui::pos2(rect.center().x, rect.bottom() - size.y * 0.17);
        ui.painter().text(
            desc_pos,
            egui::Align2::CENTER_CENTER,
            description,
            egui::FontId::proportional(12.0 * scale),
            ui.visuals().weak_text_color(),
        );
    }

    response
}

/// Render a stat card with title, value, and subtitle.
pub fn stat_card(ui: &mut Ui, title: &str, value: &str, subtitle: &str) {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .outer_margin(Margin::same(5))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.set_min_width(150.0);

            ui.vertical(|ui| {
                ui.label(RichText::new(title).small());
                ui.label(RichText::new(value).heading().strong());
                ui.label(RichText::new(subtitle).small().weak());
            });
        });
}

/// Framed section with a bold caption.
pub fn section<R>(ui: &mut Ui, caption: &str, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.label(RichText::new(caption).strong());
            ui.add_space(10.0);
            add_contents(ui)
        })
        .inner
}

/// Status indicator colors.
pub mod colors {
    use super::Color32;

    pub const SUCCESS: Color32 = Color32::from_rgb(100, 200, 100);
    pub const ERROR: Color32 = Color32::from_rgb(255, 100, 100);
    pub const WARNING: Color32 = Color32::from_rgb(255, 200, 100);
    pub const NEUTRAL: Color32 = Color32::from_rgb(150, 150, 150);
    pub const INFO: Color32 = Color32::from_rgb(100, 150, 230);
    pub const PRIMARY: Color32 = Color32::from_rgb(68, 114, 196);
}

/// Render a back button that returns true when clicked.
pub fn back_button(ui: &mut Ui) -> bool {
    ui.button(RichText::new("< Back to Dashboard").size(14.0)).clicked()
}

/// Render a panel header with title.
pub fn panel_header(ui: &mut Ui, title: &str) {
    ui.heading(RichText::new(title).size(24.0));
    ui.add_space(10.0);
    ui.separator();
    ui.add_space(20.0);
}

pub fn styled_button(ui: &mut Ui, text: &str) -> Response {
    ui.add(egui::Button::new(RichText::new(text).size(14.0)).min_size(egui::vec2(80.0, 28.0)))
}

pub fn styled_button_with_icon(ui: &mut Ui, icon: &str, text: &str) -> Response {
    styled_button(ui, &format!("{icon} {text}"))
}

/// Filled button for the main action of a toolbar or dialog.
pub fn primary_button_with_icon(ui: &mut Ui, icon: &str, text: &str) -> Response {
    let label = if icon.is_empty() {
        text.to_string()
    } else {
        format!("{icon} {text}")
    };
    ui.add(
        egui::Button::new(RichText::new(label).size(14.0).color(Color32::WHITE))
            .fill(colors::PRIMARY)
            .min_size(egui::vec2(80.0, 28.0)),
    )
}

/// Small icon button for table rows.
pub fn action_button(ui: &mut Ui, icon: &str, tooltip: &str) -> Response {
    ui.small_button(icon).on_hover_text(tooltip)
}

pub fn danger_action_button(ui: &mut Ui, icon: &str, tooltip: &str) -> Response {
    ui.small_button(RichText::new(icon).color(colors::ERROR))
        .on_hover_text(tooltip)
}

/// Parse date from multiple formats: "2000-1-1", "2000/1/1", "2000 1 1", "2000.1.1"
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = input
        .trim()
        .split(['-', '/', ' ', '.'])
        .filter(|s| !s.is_empty())
        .collect();

    if parts.len() != 3 {
        return None;
    }

    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Text field for a date. Invalid input is shown in red and leaves `date` untouched;
/// on focus loss the text is normalized to `YYYY-MM-DD` or reset to the last valid date.
pub fn date_input(ui: &mut Ui, input: &mut String, date: &mut NaiveDate) -> Response {
    let valid = parse_flexible_date(input).is_some();
    let response = ui.add(
        egui::TextEdit::singleline(input)
            .desired_width(100.0)
            .hint_text("YYYY-MM-DD")
            .text_color(if valid { ui.visuals().text_color() } else { colors::ERROR }),
    );

    if response.changed()
        && let Some(parsed) = parse_flexible_date(input)
    {
        *date = parsed;
    }
    if response.lost_focus() {
        *input = date.format("%Y-%m-%d").to_string();
    }

    response
}

/// Text field for an optional date. Empty input clears the value.
pub fn optional_date_input(ui: &mut Ui, input: &mut String, date: &mut Option<NaiveDate>) -> Response {
    let valid = input.trim().is_empty() || parse_flexible_date(input).is_some();
    let response = ui.add(
        egui::TextEdit::singleline(input)
            .desired_width(120.0)
            .hint_text("YYYY-MM-DD")
            .text_color(if valid { ui.visuals().text_color() } else { colors::ERROR }),
    );

    if response.changed() {
        *date = parse_flexible_date(input);
    }
    if !valid {
        ui.colored_label(colors::ERROR, "Invalid date format");
    }

    response
}

/// Parse an optional integer field. Blank input yields `Ok(None)`.
pub fn parse_optional_id(input: &str, field: &str) -> Result<Option<i32>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    input
        .parse::<i32>()
        .map(Some)
        .map_err(|_| format!("{field} must be a whole number"))
}

/// Parse a required number field.
pub fn parse_number(input: &str, field: &str) -> Result<f64, String> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{field} must be a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flexible_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7);
        assert_eq!(parse_flexible_date("2024-03-07"), expected);
        assert_eq!(parse_flexible_date("2024/3/7"), expected);
        assert_eq!(parse_flexible_date(" 2024.3.7 "), expected);
        assert_eq!(parse_flexible_date("2024 3 7"), expected);
        assert_eq!(parse_flexible_date("2024-02-30"), None);
        assert_eq!(parse_flexible_date("07-03"), None);
    }

    #[test]
    fn test_parse_optional_id() {
        assert_eq!(parse_optional_id("  ", "ID"), Ok(None));
        assert_eq!(parse_optional_id("42", "ID"), Ok(Some(42)));
        assert!(parse_optional_id("4.2", "ID").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("12.5", "Duration"), Ok(12.5));
        assert!(parse_number("abc", "Duration").is_err());
        assert!(parse_number("inf", "Duration").is_err());
    }
}
