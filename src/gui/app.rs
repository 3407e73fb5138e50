//! Trendify desktop viewer
//! Main window with control panel and report viewer.

use crate::charts::StaticChartRenderer;
use crate::config::Config;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::pipeline::{Pipeline, PipelineOutput};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;

/// Messages from the background run.
enum RunResult {
    Progress(f32, String),
    Complete {
        output: PipelineOutput,
        label_column: String,
    },
    Error(String),
}

/// Main application window.
pub struct TrendifyApp {
    config: Config,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    run_rx: Option<Receiver<RunResult>>,
}

impl TrendifyApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config, csv: Option<PathBuf>) -> Self {
        let mut control_panel = ControlPanel::new(
            config.dataset.preset,
            config.general.top_n,
            &config.dataset.years,
        );
        control_panel.settings.csv_path = csv;
        Self {
            config,
            control_panel,
            chart_viewer: ChartViewer::new(),
            run_rx: None,
        }
    }

    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.chart_viewer.clear();
            self.control_panel.settings.csv_path = Some(path);
            self.control_panel.set_progress(0.0, "Ready");
        }
    }

    /// Start a pipeline run in a background thread.
    fn start_run(&mut self) {
        let settings = self.control_panel.settings.clone();
        let Some(path) = settings.csv_path.clone() else {
            self.control_panel.set_progress(0.0, "Error: no file selected");
            return;
        };
        let years = match settings.years() {
            Ok(years) => years,
            Err(e) => {
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
                return;
            }
        };

        let mut dataset = self.config.dataset.clone();
        dataset.preset = settings.preset;
        dataset.years = years;
        let pipeline = Pipeline::new(dataset.resolve(), settings.top_n);
        let chart_dir = settings
            .render_pngs
            .then(|| PathBuf::from(&self.config.general.output_dir));

        let (tx, rx) = channel();
        self.run_rx = Some(rx);
        self.control_panel.running = true;
        self.control_panel.set_progress(5.0, "Loading CSV file...");

        thread::spawn(move || {
            Self::run_pipeline(tx, pipeline, path, chart_dir);
        });
    }

    /// Called from the background thread.
    fn run_pipeline(
        tx: Sender<RunResult>,
        pipeline: Pipeline,
        path: PathBuf,
        chart_dir: Option<PathBuf>,
    ) {
        let _ = tx.send(RunResult::Progress(
            10.0,
            "Cleaning and building reports...".to_string(),
        ));

        let output = match pipeline.run(&path) {
            Ok(output) => output,
            Err(e) => {
                let _ = tx.send(RunResult::Error(e.to_string()));
                return;
            }
        };

        let label_column = pipeline.profile().label_column.clone();
        if let Some(dir) = chart_dir {
            let _ = tx.send(RunResult::Progress(70.0, "Rendering charts...".to_string()));
            StaticChartRenderer::render_output(&output, &label_column, &dir);
        }

        let _ = tx.send(RunResult::Complete {
            output,
            label_column,
        });
    }

    fn check_run_results(&mut self) {
        let Some(rx) = self.run_rx.take() else {
            return;
        };
        if drain_run_results(&rx, &mut self.control_panel, &mut self.chart_viewer) {
            self.run_rx = Some(rx);
        }
    }
}

/// Apply pending messages to the panels. Returns whether the receiver is
/// still needed.
fn drain_run_results(
    rx: &Receiver<RunResult>,
    control_panel: &mut ControlPanel,
    chart_viewer: &mut ChartViewer,
) -> bool {
    loop {
        match rx.try_recv() {
            Ok(RunResult::Progress(progress, status)) => {
                control_panel.set_progress(progress, &status);
            }
            Ok(RunResult::Complete {
                output,
                label_column,
            }) => {
                let years = output.reports.len();
                let failed = output.reports.values().filter(|r| r.is_err()).count();
                chart_viewer.set_output(output, &label_column);
                let status = if failed == 0 {
                    format!("Complete! {} year reports", years)
                } else {
                    format!("Complete! {} year reports, {} failed", years, failed)
                };
                control_panel.set_progress(100.0, &status);
                control_panel.running = false;
                return false;
            }
            Ok(RunResult::Error(error)) => {
                control_panel.set_progress(0.0, &format!("Error: {}", error));
                control_panel.running = false;
                return false;
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => {
                // Worker exited without a final message (panic).
                control_panel.set_progress(0.0, "Error: background run stopped unexpectedly");
                control_panel.running = false;
                return false;
            }
        }
    }
}

impl eframe::App for TrendifyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_run_results();

        if self.control_panel.running {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::Run => {
                            if !self.control_panel.running {
                                self.start_run();
                            }
                        }
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_panic_stops_running() {
        let (tx, rx) = channel::<RunResult>();
        let worker = thread::spawn(move || {
            let _ = tx.send(RunResult::Progress(10.0, "Working".to_string()));
            panic!("worker failed");
        });
        assert!(worker.join().is_err());

        let mut panel = ControlPanel::default();
        panel.running = true;
        let mut viewer = ChartViewer::new();

        assert!(!drain_run_results(&rx, &mut panel, &mut viewer));
        assert!(!panel.running);
        assert!(panel.status.starts_with("Error"));
    }

    #[test]
    fn test_pending_run_keeps_receiver() {
        let (tx, rx) = channel::<RunResult>();
        tx.send(RunResult::Progress(40.0, "Halfway".to_string())).unwrap();

        let mut panel = ControlPanel::default();
        panel.running = true;
        let mut viewer = ChartViewer::new();

        assert!(drain_run_results(&rx, &mut panel, &mut viewer));
        assert!(panel.running);
        assert_eq!(panel.status, "Halfway");
        drop(tx);
    }
}
