//! Training metrics reporting.
//!
//! - [`ConsoleLogger`]: Tabular console output
//! - [`CsvLogger`]: CSV file logging for analysis
//! - [`MultiLogger`]: Combine multiple loggers

pub mod logger;

pub use logger::{
    ConsoleLogger, CsvLogger, MetricsLogger, MultiLogger, TrainingSnapshot,
};
