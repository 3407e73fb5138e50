//! GUI module - Desktop report viewer

mod app;
mod chart_viewer;
mod control_panel;

pub use app::TrendifyApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
