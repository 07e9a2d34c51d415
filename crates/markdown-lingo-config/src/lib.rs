use markdown_lingo_engine::{Policy, Translations};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Rendering policy plus the translation table applied to prose.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub policy: Policy,
    /// A TOML file of `"source" = "replacement"` pairs, merged under the
    /// inline table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations_path: Option<PathBuf>,
    pub translations: BTreeMap<String, String>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = read(config_path)?;
        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde, then anchor relative paths at the
        // config file's directory
        config.translations_path = config.translations_path.map(|path| {
            let path = Self::expand_path(&path).unwrap_or(path);
            match config_path.parent() {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            }
        });

        log::debug!(
            "loaded config from {} ({} inline translations)",
            config_path.display(),
            config.translations.len()
        );
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-lingo");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// The effective translation table: the file at `translations_path`
    /// overlaid with the inline entries.
    pub fn translations(&self) -> Result<Translations, ConfigError> {
        let mut translations = match &self.translations_path {
            Some(path) => load_translations(path)?,
            None => Translations::new(),
        };
        translations.extend(
            self.translations
                .iter()
                .map(|(source, replacement)| (source.clone(), replacement.clone())),
        );
        Ok(translations)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Reads a translation file: a flat TOML table of source text to replacement.
pub fn load_translations<P: AsRef<Path>>(path: P) -> Result<Translations, ConfigError> {
    let path = path.as_ref();
    let content = read(path)?;
    let entries: BTreeMap<String, String> =
        toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: path.to_path_buf(),
            source,
        })?;
    log::debug!("loaded {} translations from {}", entries.len(), path.display());
    Ok(entries.into_iter().collect())
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigReadError {
        config_path: path.to_path_buf(),
        source,
    })
}
