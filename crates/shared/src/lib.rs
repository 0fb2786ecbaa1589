pub mod config;

pub mod settings {
    use serde::{Deserialize, Serialize};

    /// Config file used when the caller does not pick one.
    pub const DEFAULT_CONFIG_FILE: &str = "app_config.ini";
    /// Section holding the user's preferences.
    pub const DEFAULT_SECTION: &str = "UserPreferences";

    /// Filter flags and last opened folder of the file browser.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BrowserPreferences {
        pub last_folder: Option<String>,
        /// Only show source files (see the extension allow-list)
        pub use_extensions: bool,
        /// Hide folders without any qualifying file below them
        pub only_non_empty_folders: bool,
    }

    /// Generation parameters chosen in the API settings form.
    ///
    /// The API key is entered per session and never persisted.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GenerationSettings {
        pub model: String,
        pub temperature: f64,
        pub candidate_count: i64,
        pub top_k: i64,
        pub top_p: f64,
    }

    impl Default for GenerationSettings {
        fn default() -> Self {
            Self {
                model: String::new(),
                temperature: 1.0,
                candidate_count: 1,
                top_k: 40,
                top_p: 0.95,
            }
        }
    }

    /// One editable field of [`GenerationSettings`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum SettingField {
        Model,
        Temperature,
        CandidateCount,
        TopK,
        TopP,
    }

    impl SettingField {
        /// Option name in the config file.
        pub fn key(self) -> &'static str {
            match self {
                SettingField::Model => "model",
                SettingField::Temperature => "temperature",
                SettingField::CandidateCount => "candidate_count",
                SettingField::TopK => "top_k",
                SettingField::TopP => "top_p",
            }
        }

        pub fn label(self) -> &'static str {
            match self {
                SettingField::Model => "Model",
                SettingField::Temperature => "Temperature",
                SettingField::CandidateCount => "Candidate Count",
                SettingField::TopK => "Top K",
                SettingField::TopP => "Top P",
            }
        }
    }
}
