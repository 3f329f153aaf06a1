//! Customer management panel with search, view/edit form and cascading delete.

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_phosphor::regular::{ARROWS_CLOCKWISE, EYE, MAGNIFYING_GLASS, PENCIL, PLUS, TRASH};

use super::app::{App, CustomerForm, DeleteTarget, today};
use super::components::{
    action_button, back_button, danger_action_button, optional_date_input, panel_header, primary_button_with_icon,
    styled_button, styled_button_with_icon,
};
use crate::models::customer::{PAYMENT_STATUSES, SUBSCRIPTION_TYPES};

/// Show the customers panel.
///
/// Returns `true` if the back button was clicked.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    let go_back = back_button(ui);

    panel_header(ui, "Customers");

    let mut reload = false;

    ui.horizontal(|ui| {
        if primary_button_with_icon(ui, PLUS, "Add Customer").clicked() {
            app.customer_form = CustomerForm::create(today());
        }

        ui.add_space(10.0);

        if styled_button_with_icon(ui, ARROWS_CLOCKWISE, "Refresh").clicked() {
            reload = true;
        }

        ui.add_space(20.0);

        ui.label("Search:");
        let response = ui.add(
            egui::TextEdit::singleline(&mut app.customer_search)
                .desired_width(220.0)
                .hint_text("ID or name..."),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            reload = true;
        }
        if styled_button_with_icon(ui, MAGNIFYING_GLASS, "Search").clicked() {
            reload = true;
        }

        if !app.customer_search.is_empty() {
            ui.add_space(10.0);
            if styled_button(ui, "Clear").clicked() {
                app.customer_search.clear();
                reload = true;
            }
        }
    });

    if reload {
        app.load_customers();
    }

    ui.add_space(15.0);

    show_table(app, ui);

    if app.customer_form.is_open {
        show_form_dialog(app, ui.ctx());
    }

    go_back
}

fn show_table(app: &mut App, ui: &mut Ui) {
    ui.label(format!(
        "Showing {} of {} customers",
        app.customers.len(),
        app.customer_total
    ));

    ui.add_space(10.0);

    if app.customers.is_empty() && !app.is_loading {
        ui.label(RichText::new("No customers found").weak());
        return;
    }

    ScrollArea::vertical().id_salt("customers_scroll").show(ui, |ui| {
        egui::Grid::new("customers_grid")
            .num_columns(8)
            .striped(true)
            .min_col_width(60.0)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.strong("ID");
                ui.strong("Name");
                ui.strong("Date of Birth");
                ui.strong("Customer Since");
                ui.strong("Subscription");
                ui.strong("Payment");
                ui.strong("Last Login");
                ui.strong("Actions");
                ui.end_row();

                for customer in &app.customers {
                    ui.label(customer.customer_id.to_string());
                    ui.label(customer.full_name());
                    ui.label(customer.date_of_birth.to_string());
                    ui.label(customer.customer_since.to_string());
                    ui.label(customer.subscription_type.as_deref().unwrap_or("-"));
                    ui.label(customer.payment_status.as_deref().unwrap_or("-"));
                    ui.label(
                        customer
                            .last_login_date
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "Never".to_string()),
                    );

                    ui.horizontal(|ui| {
                        if action_button(ui, EYE, "View").clicked() {
                            app.customer_form = CustomerForm::edit(customer, true);
                        }
                        ui.add_space(4.0);
                        if action_button(ui, PENCIL, "Edit").clicked() {
                            app.customer_form = CustomerForm::edit(customer, false);
                        }
                        ui.add_space(4.0);
                        if danger_action_button(ui, TRASH, "Delete").clicked() {
                            app.delete_target = Some(DeleteTarget::Customer(customer.customer_id, customer.full_name()));
                            app.show_delete_confirm = true;
                        }
                    });

                    ui.end_row();
                }
            });
    });
}

fn option_combo(ui: &mut Ui, id: &str, value: &mut Option<String>, choices: &[&str]) {
    egui::ComboBox::from_id_salt(id)
        .width(180.0)
        .selected_text(value.as_deref().unwrap_or("None"))
        .show_ui(ui, |ui| {
            if ui.selectable_label(value.is_none(), "None").clicked() {
                *value = None;
            }
            for choice in choices {
                if ui
                    .selectable_label(value.as_deref() == Some(*choice), *choice)
                    .clicked()
                {
                    *value = Some(choice.to_string());
                }
            }
        });
}

fn show_form_dialog(app: &mut App, ctx: &egui::Context) {
    let form = &mut app.customer_form;
    let title = match (form.read_only, form.is_editing) {
        (true, _) => "Customer Details",
        (false, true) => "Edit Customer",
        (false, false) => "Add Customer",
    };
    let mut save = false;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(450.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(10.0);

            ui.add_enabled_ui(!form.read_only, |ui| {
                egui::Grid::new("customer_form_grid")
                    .num_columns(2)
                    .spacing([20.0, 10.0])
                    .show(ui, |ui| {
                        ui.label("Customer ID:");
                        ui.add_enabled(
                            !form.is_editing,
                            egui::TextEdit::singleline(&mut form.id_input)
                                .desired_width(100.0)
                                .hint_text("Auto"),
                        );
                        ui.end_row();

                        ui.label("First Name:");
                        ui.add(egui::TextEdit::singleline(&mut form.first_name).desired_width(250.0));
                        ui.end_row();

                        ui.label("Last Name:");
                        ui.add(egui::TextEdit::singleline(&mut form.last_name).desired_width(250.0));
                        ui.end_row();

                        ui.label("Date of Birth:");
                        ui.vertical(|ui| {
                            optional_date_input(ui, &mut form.date_of_birth_input, &mut form.date_of_birth);
                        });
                        ui.end_row();

                        ui.label("Customer Since:");
                        ui.vertical(|ui| {
                            optional_date_input(ui, &mut form.customer_since_input, &mut form.customer_since);
                        });
                        ui.end_row();

                        ui.label("Subscription:");
                        option_combo(ui, "customer_form_subscription", &mut form.subscription_type, SUBSCRIPTION_TYPES);
                        ui.end_row();

                        ui.label("Payment Status:");
                        option_combo(ui, "customer_form_payment", &mut form.payment_status, PAYMENT_STATUSES);
                        ui.end_row();
                    });
            });

            ui.add_space(15.0);
            ui.separator();
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                if styled_button(ui, if form.read_only { "Close" } else { "Cancel" }).clicked() {
                    form.reset();
                }

                if form.read_only {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if primary_button_with_icon(ui, PENCIL, "Edit").clicked() {
                            form.read_only = false;
                        }
                    });
                } else {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if primary_button_with_icon(ui, "", "Save").clicked() {
                            save = true;
                        }
                    });
                }
            });
        });

    if save {
        save_customer(app);
    }
}

fn save_customer(app: &mut App) {
    let form = &app.customer_form;

    if form.first_name.trim().is_empty() || form.last_name.trim().is_empty() {
        app.error_message = Some("First and last name are required".to_string());
        return;
    }

    match (form.id, form.is_editing) {
        (Some(id), true) => match form.to_update() {
            Ok(data) => app.update_customer(id, data),
            Err(e) => app.error_message = Some(e),
        },
        _ => match form.to_create() {
            Ok(data) => app.create_customer(data),
            Err(e) => app.error_message = Some(e),
        },
    }
}
