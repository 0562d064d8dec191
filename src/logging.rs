//! File logging. The terminal belongs to the UI, so log records go to
//! `<cache dir>/tabula/tabula.log`.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Default log file location for `app_name`.
pub fn log_path(app_name: &str) -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| eyre!("Could not determine cache directory"))?
        .join(app_name);
    Ok(dir.join(format!("{}.log", app_name)))
}

/// Install the global logger writing to `path`. Does nothing for `Off`.
pub fn init_at(path: &Path, level: LevelFilter) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path)
        .map_err(|e| eyre!("Failed to create log file at {}: {}", path.display(), e))?;
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    WriteLogger::init(level, config, file).map_err(|e| eyre!("Failed to initialize logger: {}", e))
}

/// Install the logger at the default location and return its path.
pub fn init(app_name: &str, level: LevelFilter) -> Result<PathBuf> {
    let path = log_path(app_name)?;
    init_at(&path, level)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_under_app_dir() {
        if let Ok(path) = log_path("tabula") {
            assert!(path.ends_with("tabula/tabula.log"));
        }
    }

    #[test]
    fn test_off_creates_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sub").join("x.log");
        init_at(&path, LevelFilter::Off).unwrap();
        assert!(!path.exists());
    }
}
