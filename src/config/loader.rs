use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::GrammarOpsConfig;
use crate::core::{Error, Result};

/// Config file names searched in the project root, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".grammarops.config.json",
    ".grammarops.learned.json",
    "grammar-ops.json",
];

/// A parsed configuration and the file it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: GrammarOpsConfig,
    /// `None` when built-in defaults are in use
    pub source: Option<PathBuf>,
}

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse a JSON configuration document
pub fn parse_config(contents: &str, path: &Path) -> Result<GrammarOpsConfig> {
    serde_json::from_str(contents).map_err(|e| {
        Error::configuration_in(
            format!("failed to parse {}: {}", path.display(), e),
            path,
        )
    })
}

/// Read and parse one config file. A missing file is `Ok(None)`.
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Result<Option<GrammarOpsConfig>> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return Ok(None);
        }
    };

    let config = parse_config(&contents, config_path)?;
    log::debug!("Loaded config from {}", config_path.display());
    Ok(Some(config))
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Directory config discovery starts from: the path itself, or the parent
/// of a single-file target
pub(crate) fn project_root(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        path.to_path_buf()
    }
}

/// Load the configuration for a run.
///
/// An explicit path must exist and parse. Otherwise the first of
/// [`CONFIG_FILE_NAMES`] found in the project root is used, falling back
/// to built-in defaults.
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let contents = read_config_file(path).map_err(|e| {
            Error::configuration_in(
                format!("cannot read config file {}: {}", path.display(), e),
                path,
            )
        })?;
        return Ok(LoadedConfig {
            config: parse_config(&contents, path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let root = project_root(root);
    for name in CONFIG_FILE_NAMES {
        let candidate = root.join(name);
        if let Some(config) = try_load_config_from_path(&candidate)? {
            log::info!("Using configuration {}", candidate.display());
            return Ok(LoadedConfig {
                config,
                source: Some(candidate),
            });
        }
    }

    log::debug!(
        "No config found in {}. Using default config.",
        root.display()
    );
    Ok(LoadedConfig::default())
}
