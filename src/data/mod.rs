//! Data module - CSV loading, cleaning, filtering and labelling

mod classifier;
mod dataset;
mod derive;
mod filter;
mod loader;
mod normalizer;

pub use classifier::{Classifier, Label};
pub use dataset::{Dataset, DatasetError};
pub use derive::{add_calendar_columns, month_name, weekday_name, MONTHS, WEEKDAYS};
pub use filter::{DateRange, FilterCounts, FilterError, RowFilter};
pub use loader::{select_columns, DataLoader, LoaderError};
pub use normalizer::{normalize_name, Normalizer, NormalizerError};
