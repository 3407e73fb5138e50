//! Charts module - PNG rendering and interactive plots

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, ALL_COLOR, LABELLED_COLOR};
pub use renderer::StaticChartRenderer;
