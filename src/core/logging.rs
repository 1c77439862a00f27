// src/core/logging.rs

use crate::core::config_store::ConfigStore;
use crate::core::{detector, paths};
use crate::models::LoggingConfig;
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Maps configuration level names, including the `WARNING`/`CRITICAL` spellings.
pub fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "WARNING" => Some(LevelFilter::Warn),
        "CRITICAL" | "FATAL" => Some(LevelFilter::Error),
        "NOTSET" => Some(LevelFilter::Trace),
        other => other.parse().ok(),
    }
}

/// Shifts `file` to `file.1`, `file.1` to `file.2`, and so on once it reached `max_bytes`.
/// The oldest backup beyond `backup_count` is dropped.
pub fn rotate(file: &Path, max_bytes: u64, backup_count: u32) -> io::Result<()> {
    let size = match fs::metadata(file) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if max_bytes == 0 || size < max_bytes {
        return Ok(());
    }
    if backup_count == 0 {
        return fs::remove_file(file);
    }

    let backup = |n: u32| -> PathBuf {
        let mut name = file.as_os_str().to_os_string();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    };
    let oldest = backup(backup_count);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..backup_count).rev() {
        let from = backup(n);
        if from.exists() {
            fs::rename(&from, backup(n + 1))?;
        }
    }
    fs::rename(file, backup(1))
}

fn project_logging(project_root: &Path) -> Option<LoggingConfig> {
    if !detector::is_project_directory(project_root) {
        return None;
    }
    ConfigStore::open(project_root).ok().map(|store| store.logging())
}

/// The stricter of the global level and the level of the active handler.
fn effective_level(config: Option<&LoggingConfig>) -> LevelFilter {
    let Some(cfg) = config else {
        return LevelFilter::Warn;
    };
    let global = parse_level(&cfg.level).unwrap_or(LevelFilter::Info);
    let handler = if cfg.file.enabled {
        &cfg.file.level
    } else if cfg.console.enabled {
        &cfg.console.level
    } else {
        return LevelFilter::Off;
    };
    parse_level(handler).map_or(global, |level| level.min(global))
}

/// Sets up `env_logger` for the process. `RUST_LOG` wins over the project configuration;
/// outside a project only warnings and errors are shown.
pub fn init(project_root: &Path) {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_secs();
    let config = project_logging(project_root);

    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder.filter_level(effective_level(config.as_ref()));
    }

    if let Some(cfg) = config.filter(|cfg| cfg.file.enabled) {
        let path = paths::app_cache_dir(project_root).join(&cfg.file.filename);
        match open_log_file(&path, cfg.file.max_bytes, cfg.file.backup_count) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Could not open log file '{}': {}", path.display(), e),
        }
    }

    // A second initialisation (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}

fn open_log_file(path: &Path, max_bytes: u64, backup_count: u32) -> io::Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    rotate(path, max_bytes, backup_count)?;
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_accept_both_spellings() {
        assert_eq!(parse_level("INFO"), Some(LevelFilter::Info));
        assert_eq!(parse_level("warning"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("Warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("CRITICAL"), Some(LevelFilter::Error));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn handler_level_cannot_exceed_the_global_one() {
        let mut cfg = LoggingConfig::default();
        cfg.level = "WARNING".to_string();
        cfg.console.level = "DEBUG".to_string();
        assert_eq!(effective_level(Some(&cfg)), LevelFilter::Warn);

        cfg.file.enabled = true;
        cfg.level = "DEBUG".to_string();
        cfg.file.level = "ERROR".to_string();
        assert_eq!(effective_level(Some(&cfg)), LevelFilter::Error);

        assert_eq!(effective_level(None), LevelFilter::Warn);
    }

    #[test]
    fn small_files_are_not_rotated() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = tmp.path().join("cicd.log");
        fs::write(&log, "short").expect("write");

        rotate(&log, 1024, 3).expect("rotate");

        assert!(log.exists());
        assert!(!tmp.path().join("cicd.log.1").exists());
    }

    #[test]
    fn full_files_shift_backups() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = tmp.path().join("cicd.log");
        fs::write(&log, "current").expect("write");
        fs::write(tmp.path().join("cicd.log.1"), "previous").expect("write");
        fs::write(tmp.path().join("cicd.log.2"), "oldest").expect("write");

        rotate(&log, 4, 2).expect("rotate");

        assert!(!log.exists());
        let first = fs::read_to_string(tmp.path().join("cicd.log.1")).expect("read");
        let second = fs::read_to_string(tmp.path().join("cicd.log.2")).expect("read");
        assert_eq!(first, "current");
        assert_eq!(second, "previous");
        assert!(!tmp.path().join("cicd.log.3").exists());
    }

    #[test]
    fn zero_backups_truncate() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let log = tmp.path().join("cicd.log");
        fs::write(&log, "0123456789").expect("write");

        rotate(&log, 4, 0).expect("rotate");

        assert!(!log.exists());
    }
}
