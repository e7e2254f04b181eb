//! Logger setup.
//!
//! Installs a [`fern`] dispatcher behind the `log` facade that writes timestamped lines to
//! stderr.

use log::{Level, LevelFilter};

fn format_line(time: &str, level: Level, target: &str, message: &std::fmt::Arguments) -> String {
    format!("[{time} {level:<5} {target}] {message}")
}

/// Installs the global logger. Fails if a logger was already installed.
pub fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let time = chrono::Local::now().format("%H:%M:%S").to_string();
            out.finish(format_args!(
                "{}",
                format_line(&time, record.level(), record.target(), message)
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    log::debug!("Logging initialised at {level}");
    Ok(())
}
