//! Per-batch training loggers.
//!
//! Provides console, CSV and fan-out backends for [`TrainingSnapshot`]s.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Metrics reported once per completed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSnapshot {
    /// Environment steps taken so far (the scheduler's iteration counter).
    pub iteration: usize,
    /// Number of batches consumed by the learner.
    pub batches: usize,
    /// Episodes that terminated inside this batch.
    pub episodes: usize,
    /// Mean return of those episodes.
    pub mean_return: f32,
    /// Mean length of those episodes.
    pub mean_length: f32,
    pub policy_loss: f32,
    pub value_loss: f32,
    /// Learning rate used for this update.
    pub learning_rate: f64,
    /// Seconds since training started.
    pub elapsed_secs: f32,
}

impl TrainingSnapshot {
    /// Create a new training snapshot.
    pub fn new(iteration: usize, batches: usize, episodes: usize, mean_return: f32) -> Self {
        Self {
            iteration,
            batches,
            episodes,
            mean_return,
            mean_length: 0.0,
            policy_loss: 0.0,
            value_loss: 0.0,
            learning_rate: 0.0,
            elapsed_secs: 0.0,
        }
    }

    /// Set mean episode length.
    pub fn with_mean_length(mut self, mean_length: f32) -> Self {
        self.mean_length = mean_length;
        self
    }

    /// Set loss values.
    pub fn with_losses(mut self, policy_loss: f32, value_loss: f32) -> Self {
        self.policy_loss = policy_loss;
        self.value_loss = value_loss;
        self
    }

    /// Set learning rate.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set wall-clock time.
    pub fn with_elapsed(mut self, secs: f32) -> Self {
        self.elapsed_secs = secs;
        self
    }

    /// Environment steps per second.
    pub fn steps_per_sec(&self) -> f32 {
        if self.elapsed_secs > 0.0 {
            self.iteration as f32 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

/// Logger trait for different logging backends.
pub trait MetricsLogger {
    /// Log a training snapshot.
    fn log(&mut self, snapshot: &TrainingSnapshot);

    /// Flush any buffered output.
    fn flush(&mut self);
}

/// Tabular console output, one line per logged batch.
pub struct ConsoleLogger {
    log_interval: usize,
    last_logged_batch: Option<usize>,
    show_header: bool,
}

impl ConsoleLogger {
    /// Create a new console logger.
    ///
    /// # Arguments
    ///
    /// * `log_interval` - Batches between log lines (0 is treated as 1)
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
            last_logged_batch: None,
            show_header: true,
        }
    }

    fn should_log(&self, batches: usize) -> bool {
        match self.last_logged_batch {
            None => true,
            Some(last) => batches >= last + self.log_interval,
        }
    }

    fn print_header(&self) {
        println!(
            "{:>10} {:>8} {:>8} {:>12} {:>10} {:>10} {:>10} {:>8}",
            "Iteration", "Time", "Episodes", "MeanReturn", "MeanLen", "Policy", "Value", "SPS"
        );
        println!("{}", "-".repeat(84));
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        if !self.should_log(snapshot.batches) {
            return;
        }

        if self.show_header {
            self.print_header();
            self.show_header = false;
        }

        println!(
            "{:>10} {:>8.1} {:>8} {:>12.2} {:>10.2} {:>10.4} {:>10.4} {:>8.0}",
            snapshot.iteration,
            snapshot.elapsed_secs,
            snapshot.episodes,
            snapshot.mean_return,
            snapshot.mean_length,
            snapshot.policy_loss,
            snapshot.value_loss,
            snapshot.steps_per_sec()
        );

        self.last_logged_batch = Some(snapshot.batches);
    }

    fn flush(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

/// CSV file logger for analysis.
pub struct CsvLogger {
    writer: BufWriter<File>,
}

impl CsvLogger {
    pub const HEADER: &'static str =
        "iteration,batches,episodes,mean_return,mean_length,policy_loss,value_loss,learning_rate,elapsed_secs";

    /// Create the file at `path` and write the header row.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", Self::HEADER)?;

        Ok(Self { writer })
    }
}

impl MetricsLogger for CsvLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        if let Err(err) = writeln!(
            self.writer,
            "{},{},{},{:.4},{:.2},{:.6},{:.6},{:.8},{:.2}",
            snapshot.iteration,
            snapshot.batches,
            snapshot.episodes,
            snapshot.mean_return,
            snapshot.mean_length,
            snapshot.policy_loss,
            snapshot.value_loss,
            snapshot.learning_rate,
            snapshot.elapsed_secs,
        ) {
            tracing::error!("failed to write metrics row: {}", err);
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::error!("failed to flush metrics file: {}", err);
        }
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Writes every snapshot to several backends.
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Box<dyn MetricsLogger>>,
}

impl MultiLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a logger.
    pub fn add<L: MetricsLogger + 'static>(mut self, logger: L) -> Self {
        self.loggers.push(Box::new(logger));
        self
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl MetricsLogger for MultiLogger {
    fn log(&mut self, snapshot: &TrainingSnapshot) {
        for logger in &mut self.loggers {
            logger.log(snapshot);
        }
    }

    fn flush(&mut self) {
        for logger in &mut self.loggers {
            logger.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(batches: usize) -> TrainingSnapshot {
        TrainingSnapshot::new(batches * 100, batches, 4, 21.5)
            .with_mean_length(25.0)
            .with_losses(0.5, 0.3)
            .with_learning_rate(1e-2)
            .with_elapsed(2.0)
    }

    #[test]
    fn test_training_snapshot() {
        let s = snapshot(3);
        assert_eq!(s.iteration, 300);
        assert_eq!(s.batches, 3);
        assert_eq!(s.episodes, 4);
        assert!((s.mean_return - 21.5).abs() < 1e-6);
        assert!((s.mean_length - 25.0).abs() < 1e-6);
        assert!((s.policy_loss - 0.5).abs() < 1e-6);
        assert!((s.steps_per_sec() - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_steps_per_sec_without_elapsed_time() {
        let s = TrainingSnapshot::new(100, 1, 1, 1.0);
        assert_eq!(s.steps_per_sec(), 0.0);
    }

    #[test]
    fn test_console_logger_respects_interval() {
        let mut logger = ConsoleLogger::new(2);
        assert!(logger.should_log(1));
        logger.log(&snapshot(1));
        assert!(!logger.should_log(2));
        assert!(logger.should_log(3));
    }

    #[test]
    fn test_csv_logger_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        {
            let mut logger = CsvLogger::new(&path).unwrap();
            logger.log(&snapshot(1));
            logger.log(&snapshot(2));
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CsvLogger::HEADER);
        assert!(lines[1].starts_with("100,1,4,21.5000,25.00,"));
        assert!(lines[2].starts_with("200,2,"));
    }

    #[test]
    fn test_multi_logger_fans_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multi.csv");
        let mut multi = MultiLogger::new()
            .add(ConsoleLogger::new(1))
            .add(CsvLogger::new(&path).unwrap());
        assert_eq!(multi.len(), 2);

        multi.log(&snapshot(1));
        multi.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
