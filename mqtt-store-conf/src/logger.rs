use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use slog::{o, Drain};

use crate::logging::{Log, To};
pub use slog::Logger;

/// Routes records of the `log` facade, which the store crates log through, into `logger`.
pub fn logger_init(logger: Logger, level: slog::Level) -> Result<()> {
    log::set_boxed_logger(Box::new(LoggerEx(logger))).map_err(|e| anyhow!("logger init failed, {e}"))?;
    log::set_max_level(slog_log_to_level(level).to_level_filter());
    Ok(())
}

struct LoggerEx(Logger);

impl log::Log for LoggerEx {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, r: &log::Record) {
        let level = log_to_slog_level(r.metadata().level());
        let args = r.args();
        let target = r.target();
        let location = &record_as_location(r);
        let s = slog::RecordStatic { location, level, tag: target };

        self.0.log(&slog::Record::new(&s, args, slog::b!()))
    }

    fn flush(&self) {}
}

fn log_to_slog_level(level: log::Level) -> slog::Level {
    match level {
        log::Level::Trace => slog::Level::Trace,
        log::Level::Debug => slog::Level::Debug,
        log::Level::Info => slog::Level::Info,
        log::Level::Warn => slog::Level::Warning,
        log::Level::Error => slog::Level::Error,
    }
}

fn slog_log_to_level(level: slog::Level) -> log::Level {
    match level {
        slog::Level::Trace => log::Level::Trace,
        slog::Level::Debug => log::Level::Debug,
        slog::Level::Info => log::Level::Info,
        slog::Level::Warning => log::Level::Warn,
        slog::Level::Error => log::Level::Error,
        slog::Level::Critical => log::Level::Error,
    }
}

fn record_as_location(r: &log::Record) -> slog::RecordLocation {
    let module = r.module_path_static().unwrap_or("<unknown>");
    let file = r.file_static().unwrap_or("<unknown>");
    let line = r.line().unwrap_or_default();

    slog::RecordLocation { file, line, column: 0, function: "", module }
}

/// Builds the root logger: terminal-style formatting, level filtering, asynchronous output to the
/// console and/or the log file depending on `log.to`.
pub fn config_logger(log: &Log) -> Result<Logger> {
    let decorator = slog_term::PlainSyncDecorator::new(WriteFilter::new(log)?);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    let drain = drain.filter_level(log.level).fuse();

    let drain = slog_async::Async::new(drain)
        .chan_size(4096 * 4)
        .overflow_strategy(slog_async::OverflowStrategy::DropAndReport)
        .build()
        .fuse();

    Ok(Logger::root(drain, o!()))
}

struct WriteFilter {
    to: To,
    file: Option<File>,
    console: Stdout,
}

impl WriteFilter {
    fn new(log: &Log) -> Result<Self> {
        let file = if log.to.file() {
            let path = log.path().ok_or_else(|| anyhow!("log.to is {:?} but log.file is empty", log.to))?;
            Some(open_file(&path)?)
        } else {
            None
        };
        Ok(Self { to: log.to, file, console: io::stdout() })
    }
}

impl io::Write for WriteFilter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.to.console() {
            self.console.write_all(buf)?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.to.console() {
            self.console.flush()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("logger file config error, filename: {}, {:?}", path.display(), e))
}
