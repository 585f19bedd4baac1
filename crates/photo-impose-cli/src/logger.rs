use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;

/// Writes timestamped log lines to stderr
#[derive(Clone, Copy)]
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    /// Warnings only by default, one more level per `-v`
    pub fn from_verbosity(verbose: u8) -> Self {
        let level = match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        Self { level }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(self.level);
        Ok(())
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record.level(), record.target(), &record.args().to_string());
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_line(level: Level, target: &str, message: &str) -> String {
    format!(
        "{} {:<5} {}: {}",
        Local::now().format("%H:%M:%S%.3f"),
        level,
        target,
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(StderrLogger::from_verbosity(0).level(), LevelFilter::Warn);
        assert_eq!(StderrLogger::from_verbosity(1).level(), LevelFilter::Info);
        assert_eq!(StderrLogger::from_verbosity(2).level(), LevelFilter::Debug);
        assert_eq!(StderrLogger::from_verbosity(9).level(), LevelFilter::Trace);
    }

    #[test]
    fn line_has_level_and_target() {
        let line = format_line(Level::Info, "photo_impose::queue", "queued");
        assert!(line.ends_with("INFO  photo_impose::queue: queued"));
    }
}
