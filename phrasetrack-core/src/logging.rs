use std::fs::File;
use std::path::PathBuf;

use simplelog::{Config, LevelFilter, WriteLogger};

/// Log file location: `<config_dir>/phrasetrack/phrasetrack.log`.
pub fn log_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phrasetrack")
        .join("phrasetrack.log")
}

/// Route the `log` facade to a file. Debug when verbose, warnings otherwise.
///
/// Falls back to the temp dir when the config dir is not writable. Returns
/// the path in use, or `None` if no log file could be opened or a logger
/// was already installed.
pub fn init_logging(verbose: bool) -> Option<PathBuf> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let primary = log_path();
    if let Some(parent) = primary.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let fallback = std::env::temp_dir().join("phrasetrack.log");

    let (path, file) = match File::create(&primary) {
        Ok(file) => (primary, file),
        Err(_) => match File::create(&fallback) {
            Ok(file) => (fallback, file),
            Err(e) => {
                eprintln!("phrasetrack: cannot create log file: {}", e);
                return None;
            }
        },
    };

    if WriteLogger::init(level, Config::default(), file).is_err() {
        return None;
    }
    log::info!("phrasetrack starting (log level: {:?})", level);
    Some(path)
}
