//! Typed, sectioned key/value store persisted as an INI file.
//!
//! Each option holds a tagged payload (see [`shared::config::ConfigValue`]).
//! Reads never fail: absent or malformed entries fall back to the caller's
//! default. Writes stay in memory until [`ConfigStore::save`], except for the
//! removal operations which persist immediately.

use crate::ini::{self, IniDocument, ParseError};
use shared::config::ConfigValue;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Sectioned config store bound to one file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    section: String,
    doc: IniDocument,
}

impl ConfigStore {
    /// Load the store from `path`. A missing file gives an empty store.
    pub fn open(path: impl Into<PathBuf>, section: impl Into<String>) -> Result<Self, ConfigError> {
        let path = path.into();
        let doc = match fs::read_to_string(&path) {
            Ok(text) => IniDocument::parse(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {:?}, starting empty", path);
                IniDocument::new()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        Ok(Self {
            path,
            section: section.into(),
            doc: normalize_keys(doc),
        })
    }

    /// Like [`ConfigStore::open`], but an unreadable file degrades to an empty store.
    ///
    /// A file that cannot be parsed is first moved aside to `<file>.bak`, so
    /// the next [`ConfigStore::save`] does not destroy the user's edits.
    pub fn open_or_empty(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        let path = path.into();
        let section = section.into();
        match Self::open(&path, section.clone()) {
            Ok(store) => store,
            Err(e) => {
                warn!("{}; using empty config", e);
                if matches!(e, ConfigError::Parse { .. }) {
                    let backup = backup_path(&path);
                    match fs::rename(&path, &backup) {
                        Ok(()) => warn!("Moved unreadable config to {:?}", backup),
                        Err(e) => warn!("Failed to back up {:?}: {}", path, e),
                    }
                }
                Self {
                    path,
                    section,
                    doc: IniDocument::new(),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active section name.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Switch the active section. Nothing is created until a value is set.
    pub fn set_section(&mut self, section: impl Into<String>) {
        self.section = section.into();
    }

    pub fn sections(&self) -> Vec<&str> {
        self.doc.sections().iter().map(|s| s.name()).collect()
    }

    /// Option names in the active section.
    pub fn options(&self) -> Vec<&str> {
        self.doc
            .section(&self.section)
            .map(|s| s.keys().collect())
            .unwrap_or_default()
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.raw(option).is_some()
    }

    /// Decoded value, or `None` if absent or malformed.
    pub fn get(&self, option: &str) -> Option<ConfigValue> {
        let raw = self.raw(option)?;
        let value = ConfigValue::from_payload(raw);
        if value.is_none() {
            debug!(
                "Ignoring malformed payload for [{}] {}: {}",
                self.section, option, raw
            );
        }
        value
    }

    pub fn get_or(&self, option: &str, fallback: ConfigValue) -> ConfigValue {
        self.get(option).unwrap_or(fallback)
    }

    pub fn get_i64(&self, option: &str, fallback: i64) -> i64 {
        self.get(option)
            .and_then(|v| v.as_i64())
            .unwrap_or(fallback)
    }

    pub fn get_f64(&self, option: &str, fallback: f64) -> f64 {
        self.get(option)
            .and_then(|v| v.as_f64())
            .unwrap_or(fallback)
    }

    pub fn get_bool(&self, option: &str, fallback: bool) -> bool {
        self.get(option)
            .and_then(|v| v.as_bool())
            .unwrap_or(fallback)
    }

    pub fn get_string(&self, option: &str, fallback: &str) -> String {
        match self.get(option) {
            Some(ConfigValue::Str(s)) => s,
            _ => fallback.to_string(),
        }
    }

    pub fn get_json(&self, option: &str, fallback: serde_json::Value) -> serde_json::Value {
        match self.get(option) {
            Some(ConfigValue::Json(v)) => v,
            _ => fallback,
        }
    }

    /// Store a value in the active section (memory only).
    ///
    /// Names are trimmed and lower-cased. A name that cannot be written back
    /// as an INI option (empty, or containing `=`, `:` or a line break) or an
    /// unusable section name is skipped with a warning; returns whether the
    /// value was stored.
    pub fn set(&mut self, option: &str, value: impl Into<ConfigValue>) -> bool {
        let key = option_key(option);
        if !ini::is_valid_key(&key) {
            warn!("Refusing to store option {:?} in [{}]", option, self.section);
            return false;
        }
        if !ini::is_valid_section_name(&self.section) {
            warn!("Refusing to store {:?} in section {:?}", option, self.section);
            return false;
        }
        let payload = value.into().to_payload();
        self.doc.section_or_insert(&self.section).set(key, payload);
        true
    }

    /// Write the full table to disk, replacing the previous file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let io_err = |source: io::Error| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = self.path.with_extension("ini.tmp");
        fs::write(&tmp, self.doc.render()).map_err(io_err)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            // rename can refuse to replace an existing file on some platforms
            warn!("Failed to move {:?} into place: {}", tmp, e);
            let _ = fs::remove_file(&tmp);
            fs::write(&self.path, self.doc.render()).map_err(io_err)?;
        }
        debug!("Saved config to {:?}", self.path);
        Ok(())
    }

    /// Drop the active section and persist. Returns `false` if it did not exist.
    pub fn remove_section(&mut self) -> Result<bool, ConfigError> {
        if !self.doc.remove_section(&self.section) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Drop one option from the active section and persist. Returns `false` if absent.
    pub fn remove_option(&mut self, option: &str) -> Result<bool, ConfigError> {
        let key = option_key(option);
        let removed = match self.doc.section_mut(&self.section) {
            Some(section) => section.remove(&key),
            None => false,
        };
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    fn raw(&self, option: &str) -> Option<&str> {
        self.doc.section(&self.section)?.get(&option_key(option))
    }
}

/// Option names are case-insensitive and surrounding whitespace is ignored.
fn option_key(option: &str) -> String {
    option.trim().to_lowercase()
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn normalize_keys(doc: IniDocument) -> IniDocument {
    let mut out = IniDocument::new();
    for section in doc.sections() {
        let target = out.section_or_insert(section.name());
        for (key, value) in section.entries() {
            target.set(option_key(key), value.clone());
        }
    }
    out
}
