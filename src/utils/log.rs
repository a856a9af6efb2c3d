use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct MRLogger;

static LOGGER: MRLogger = MRLogger;

impl Log for MRLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "[Error]".bright_red(),
            Level::Warn => "[Warn]".yellow(),
            Level::Info => "[Info]".bright_blue(),
            Level::Debug => "[Debug]".normal(),
            Level::Trace => "[Trace]".dimmed(),
        };
        eprintln!("{} {}", tag, record.args());
    }

    fn flush(&self) {}
}

pub fn verbosity_to_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the stderr logger. A second call only adjusts the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_to_level(0), LevelFilter::Warn);
        assert_eq!(verbosity_to_level(2), LevelFilter::Debug);
        assert_eq!(verbosity_to_level(9), LevelFilter::Trace);
    }
}
