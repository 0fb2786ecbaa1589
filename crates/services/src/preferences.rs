//! Loading and saving the user's settings through the [`ConfigStore`].
//!
//! Values typed into the settings form arrive as text. They are parsed first and
//! only written when valid, so a half-typed number never reaches the config file.

use crate::config_store::{ConfigError, ConfigStore};
use shared::settings::{BrowserPreferences, GenerationSettings, SettingField};

const LAST_FOLDER: &str = "last_folder";
const USE_EXTENSIONS: &str = "use_extensions";
const ONLY_NON_EMPTY_FOLDERS: &str = "only_non_empty_folders";

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("{} expects a number, got {input:?}", .field.label())]
    InvalidNumber { field: SettingField, input: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn load_browser(store: &ConfigStore) -> BrowserPreferences {
    let last_folder = store.get_string(LAST_FOLDER, "");
    BrowserPreferences {
        last_folder: (!last_folder.is_empty()).then_some(last_folder),
        use_extensions: store.get_bool(USE_EXTENSIONS, false),
        only_non_empty_folders: store.get_bool(ONLY_NON_EMPTY_FOLDERS, false),
    }
}

/// Write all browser preferences to the active section and save.
pub fn store_browser(store: &mut ConfigStore, prefs: &BrowserPreferences) -> Result<(), ConfigError> {
    if let Some(folder) = &prefs.last_folder {
        store.set(LAST_FOLDER, folder.as_str());
    }
    store.set(USE_EXTENSIONS, prefs.use_extensions);
    store.set(ONLY_NON_EMPTY_FOLDERS, prefs.only_non_empty_folders);
    store.save()
}

pub fn load_generation(store: &ConfigStore) -> GenerationSettings {
    let defaults = GenerationSettings::default();
    GenerationSettings {
        model: store.get_string(SettingField::Model.key(), &defaults.model),
        temperature: store.get_f64(SettingField::Temperature.key(), defaults.temperature),
        candidate_count: store.get_i64(SettingField::CandidateCount.key(), defaults.candidate_count),
        top_k: store.get_i64(SettingField::TopK.key(), defaults.top_k),
        top_p: store.get_f64(SettingField::TopP.key(), defaults.top_p),
    }
}

/// Parse `input` for one field, update `settings`, then set and save it.
///
/// Invalid input leaves both `settings` and the store untouched.
pub fn apply_generation_field(
    store: &mut ConfigStore,
    settings: &mut GenerationSettings,
    field: SettingField,
    input: &str,
) -> Result<(), PreferenceError> {
    let invalid = || PreferenceError::InvalidNumber {
        field,
        input: input.to_string(),
    };
    let text = input.trim();

    match field {
        SettingField::Model => {
            settings.model = text.to_string();
            store.set(field.key(), text);
        }
        SettingField::Temperature => {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            settings.temperature = value;
            store.set(field.key(), value);
        }
        SettingField::TopP => {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            settings.top_p = value;
            store.set(field.key(), value);
        }
        SettingField::CandidateCount => {
            let value: i64 = text.parse().map_err(|_| invalid())?;
            settings.candidate_count = value;
            store.set(field.key(), value);
        }
        SettingField::TopK => {
            let value: i64 = text.parse().map_err(|_| invalid())?;
            settings.top_k = value;
            store.set(field.key(), value);
        }
    }

    store.save()?;
    Ok(())
}
