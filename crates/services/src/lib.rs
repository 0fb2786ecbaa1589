//! Services - persistence, file browsing and logging for the code analyzer
//!
//! This crate provides:
//! - A typed, sectioned config store saved as an INI file
//! - A filtered, checkable directory tree for picking source files
//! - A queue-backed session log written by a background thread
//! - Loading and validated saving of user preferences

pub mod config_store;
pub mod file_tree;
pub mod ini;
pub mod log_sink;
pub mod preferences;

pub use config_store::{ConfigError, ConfigStore};
pub use file_tree::{
    FileTree, FileTreeBuilder, NodeId, NodeKind, TreeError, TreeNode, TreeOptions,
    ACCESS_DENIED_LABEL, SOURCE_EXTENSIONS,
};
pub use log_sink::{LogHandle, LogSink};
pub use preferences::PreferenceError;
