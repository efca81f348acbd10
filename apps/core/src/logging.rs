use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;

const LOG_FILE_NAME: &str = "leetjump.log";
const ARCHIVE_PREFIX: &str = "leetjump-";
const MAX_LOG_BYTES: u64 = 1_000_000;
const MAX_ARCHIVES: usize = 5;

static LOGGER_INSTALLED: OnceLock<()> = OnceLock::new();
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("log file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logger already set: {0}")]
    SetLogger(#[from] log::SetLoggerError),
}

pub fn logs_dir(cfg: &Config) -> PathBuf {
    cfg.catalog_db_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::config::stable_app_data_dir)
        .join("logs")
}

/// Later calls are no-ops.
pub fn init(cfg: &Config, verbose: bool) -> Result<(), LoggingError> {
    if LOGGER_INSTALLED.get().is_some() {
        return Ok(());
    }

    let log_dir = logs_dir(cfg);
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);
    rotate_if_needed(&log_path, &log_dir)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] [{}] {}",
                now_secs(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(cfg.log_level_filter())
        .chain(fern::log_file(&log_path)?);
    if verbose {
        dispatch = dispatch.chain(std::io::stderr());
    }
    dispatch.apply()?;

    let _ = LOGGER_INSTALLED.set(());
    install_panic_hook();
    log::info!("logging to {}", log_path.display());
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn rotate_if_needed(log_path: &Path, log_dir: &Path) -> Result<(), std::io::Error> {
    let meta = match fs::metadata(log_path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if meta.len() < MAX_LOG_BYTES {
        return Ok(());
    }

    let archived = log_dir.join(format!("{ARCHIVE_PREFIX}{}.log", now_secs()));
    fs::rename(log_path, archived)?;
    prune_old_archives(log_dir)?;
    Ok(())
}

fn prune_old_archives(log_dir: &Path) -> Result<(), std::io::Error> {
    let mut archives = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".log"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    archives.sort();
    while archives.len() > MAX_ARCHIVES {
        let oldest = archives.remove(0);
        let _ = fs::remove_file(oldest);
    }
    Ok(())
}

fn install_panic_hook() {
    let _ = PANIC_HOOK_INSTALLED.get_or_init(|| {
        let prior = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = panic_info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload unavailable".to_string());
            log::error!("panic at {location}: {payload}");
            prior(panic_info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{logs_dir, prune_old_archives, rotate_if_needed, MAX_ARCHIVES, MAX_LOG_BYTES};
    use crate::config::Config;

    fn unique_dir(label: &str) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("leetjump-{label}-{unique}"))
    }

    #[test]
    fn logs_dir_sits_next_to_catalog() {
        let mut cfg = Config::default();
        cfg.catalog_db_path = std::env::temp_dir().join("leetjump").join("catalog.sqlite3");
        let dir = logs_dir(&cfg);
        assert!(dir.ends_with("leetjump/logs"));
    }

    #[test]
    fn oversized_log_is_archived() {
        let dir = unique_dir("rotate");
        std::fs::create_dir_all(&dir).unwrap();
        let log_path = dir.join("leetjump.log");
        std::fs::write(&log_path, vec![b'x'; MAX_LOG_BYTES as usize]).unwrap();

        rotate_if_needed(&log_path, &dir).unwrap();

        assert!(!log_path.exists());
        let archived = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(archived, 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn prunes_archives_beyond_limit() {
        let dir = unique_dir("prune");
        std::fs::create_dir_all(&dir).unwrap();
        for stamp in 0..(MAX_ARCHIVES + 3) {
            std::fs::write(dir.join(format!("leetjump-{stamp:04}.log")), b"old").unwrap();
        }

        prune_old_archives(&dir).unwrap();

        let remaining = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(remaining, MAX_ARCHIVES);
        assert!(!dir.join("leetjump-0000.log").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
