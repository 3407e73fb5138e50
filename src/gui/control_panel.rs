//! Control Panel Widget
//! Left side panel with the data source, dataset settings and run controls.

use crate::config::Preset;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Settings chosen in the panel for the next run.
#[derive(Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub preset: Preset,
    pub top_n: usize,
    /// Comma separated years; blank means every year present.
    pub years_text: String,
    pub render_pngs: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            csv_path: None,
            preset: Preset::default(),
            top_n: 10,
            years_text: String::new(),
            render_pngs: false,
        }
    }
}

impl UserSettings {
    /// Parse `years_text`, e.g. `"2020, 2021"`.
    pub fn years(&self) -> Result<Vec<i32>, String> {
        self.years_text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i32>().map_err(|_| format!("Not a year: {}", s)))
            .collect()
    }
}

/// Left side control panel with file selection and processing controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub progress: f32,
    pub status: String,
    pub running: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            progress: 0.0,
            status: "Ready".to_string(),
            running: false,
        }
    }
}

impl ControlPanel {
    pub fn new(preset: Preset, top_n: usize, years: &[i32]) -> Self {
        let mut panel = Self::default();
        panel.settings.preset = preset;
        panel.settings.top_n = top_n;
        panel.settings.years_text = years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        panel
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📈 Trendify")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Yearly trend reports")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Dataset Section =====
        ui.label(RichText::new("🔧 Dataset").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 90.0;
        let field_width = 170.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Preset:"));
            ComboBox::from_id_salt("preset")
                .width(field_width)
                .selected_text(self.settings.preset.to_string())
                .show_ui(ui, |ui| {
                    for preset in [Preset::Crime, Preset::Crowdfunding] {
                        ui.selectable_value(&mut self.settings.preset, preset, preset.to_string());
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Years:"));
            ui.add_sized(
                [field_width, 20.0],
                egui::TextEdit::singleline(&mut self.settings.years_text).hint_text("all"),
            );
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Top N:"));
            ui.add(egui::DragValue::new(&mut self.settings.top_n).range(1..=50));
        });

        ui.add_space(5.0);
        ui.checkbox(&mut self.settings.render_pngs, "Also write PNG charts");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            let enabled = self.settings.csv_path.is_some() && !self.running;
            ui.add_enabled_ui(enabled, |ui| {
                let button = egui::Button::new(RichText::new("▶ Build Reports").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Run;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.running),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_years_parsing() {
        let mut settings = UserSettings::default();
        assert_eq!(settings.years(), Ok(vec![]));

        settings.years_text = " 2020, 2021 ,".to_string();
        assert_eq!(settings.years(), Ok(vec![2020, 2021]));

        settings.years_text = "2020, twenty".to_string();
        assert!(settings.years().is_err());
    }

    #[test]
    fn test_new_prefills_years() {
        let panel = ControlPanel::new(Preset::Crowdfunding, 5, &[2017, 2018]);
        assert_eq!(panel.settings.years_text, "2017, 2018");
        assert_eq!(panel.settings.preset, Preset::Crowdfunding);
        assert_eq!(panel.settings.top_n, 5);
    }
}
