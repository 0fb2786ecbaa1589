use serde_json::json;
use services::{ConfigError, ConfigStore};
use shared::config::ConfigValue;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SECTION: &str = "UserPreferences";

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("app_config.ini")
}

#[test]
fn every_kind_survives_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();

    let structured = json!({"recent": ["/a", "/b"], "depth": 3, "nested": {"ok": true}});
    store.set("count", 10);
    store.set("negative", -7i64);
    store.set("ratio", 0.95);
    store.set("whole_float", 1.0);
    store.set("enabled", true);
    store.set("disabled", false);
    store.set("name", "gemini-1.5-flash");
    store.set("empty", "");
    store.set("layout", ConfigValue::Json(structured.clone()));
    store.save().unwrap();

    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert_eq!(reloaded.get("count"), Some(ConfigValue::Int(10)));
    assert_eq!(reloaded.get("negative"), Some(ConfigValue::Int(-7)));
    assert_eq!(reloaded.get("ratio"), Some(ConfigValue::Float(0.95)));
    assert_eq!(reloaded.get("whole_float"), Some(ConfigValue::Float(1.0)));
    assert_eq!(reloaded.get("enabled"), Some(ConfigValue::Bool(true)));
    assert_eq!(reloaded.get("disabled"), Some(ConfigValue::Bool(false)));
    assert_eq!(
        reloaded.get("name"),
        Some(ConfigValue::Str("gemini-1.5-flash".into()))
    );
    assert_eq!(reloaded.get("empty"), Some(ConfigValue::Str(String::new())));
    assert_eq!(reloaded.get_json("layout", json!(null)), structured);
}

#[test]
fn fallback_for_absent_option_and_section() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("present", 1);

    assert_eq!(store.get_or("missing", ConfigValue::Int(5)), ConfigValue::Int(5));
    assert_eq!(store.get_i64("missing", 5), 5);

    store.set_section("Nowhere");
    assert_eq!(store.get_i64("present", 9), 9);
    assert_eq!(store.get_string("present", "fallback"), "fallback");
}

#[test]
fn fallback_for_corrupted_payloads() {
    let dir = TempDir::new().unwrap();
    fs::write(
        config_path(&dir),
        "[UserPreferences]\n\
         not_json = hello\n\
         unknown_kind = {\"type\": \"tuple\", \"value\": \"1\"}\n\
         bad_int = {\"type\": \"int\", \"value\": \"ten\"}\n\
         no_type = {\"value\": \"1\"}\n\
         bad_json = {\"type\": \"json\", \"value\": \"[1, 2\"}\n",
    )
    .unwrap();

    let store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    for option in ["not_json", "unknown_kind", "bad_int", "no_type", "bad_json"] {
        assert_eq!(
            store.get_or(option, ConfigValue::Str("fallback".into())),
            ConfigValue::Str("fallback".into()),
            "option {}",
            option
        );
    }
}

#[test]
fn reads_files_written_with_spaced_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        config_path(&dir),
        "[UserPreferences]\n\
         use_extensions = {\"type\": \"bool\", \"value\": \"True\"}\n\
         top_p = {\"type\": \"float\", \"value\": \"0.95\"}\n\
         last_folder = {\"type\": \"str\", \"value\": \"C:/Users/dev/project\"}\n\n",
    )
    .unwrap();

    let store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert!(store.get_bool("use_extensions", false));
    assert_eq!(store.get_f64("top_p", 0.0), 0.95);
    assert_eq!(store.get_string("last_folder", ""), "C:/Users/dev/project");
}

#[test]
fn boolean_decodes_only_the_true_token() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("flag", true);
    store.save().unwrap();
    assert!(ConfigStore::open(config_path(&dir), SECTION)
        .unwrap()
        .get_bool("flag", false));

    let text = fs::read_to_string(config_path(&dir)).unwrap();
    fs::write(config_path(&dir), text.replace("True", "False")).unwrap();
    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert_eq!(reloaded.get("flag"), Some(ConfigValue::Bool(false)));

    fs::write(config_path(&dir), text.replace("True", "yes")).unwrap();
    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert!(!reloaded.get_bool("flag", true));
}

#[test]
fn save_writes_a_full_snapshot_each_time() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("a", 1);
    store.save().unwrap();
    store.set("a", 2);
    store.save().unwrap();
    store.save().unwrap();

    let text = fs::read_to_string(config_path(&dir)).unwrap();
    assert_eq!(text.matches("[UserPreferences]").count(), 1);
    assert_eq!(text.matches("a = ").count(), 1);
    assert_eq!(
        ConfigStore::open(config_path(&dir), SECTION)
            .unwrap()
            .get_i64("a", 0),
        2
    );
}

#[test]
fn sections_are_independent() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("shared_name", "prefs");
    store.set_section("Api");
    store.set("shared_name", "api");
    store.save().unwrap();

    let mut reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert_eq!(reloaded.sections(), vec![SECTION, "Api"]);
    assert_eq!(reloaded.get_string("shared_name", ""), "prefs");
    reloaded.set_section("Api");
    assert_eq!(reloaded.get_string("shared_name", ""), "api");
}

#[test]
fn remove_section_persists_immediately() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("keep", 1);
    store.set_section("Scratch");
    store.set("drop", 2);
    store.save().unwrap();

    assert!(store.remove_section().unwrap());
    assert!(!store.remove_section().unwrap());

    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert_eq!(reloaded.sections(), vec![SECTION]);
    assert_eq!(reloaded.get_i64("keep", 0), 1);
}

#[test]
fn remove_section_on_missing_section_does_not_create_file() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert!(!store.remove_section().unwrap());
    assert!(!config_path(&dir).exists());
}

#[test]
fn remove_option_persists_immediately() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("a", 1);
    store.set("b", 2);
    store.save().unwrap();

    assert!(store.remove_option("A").unwrap());
    assert!(!store.remove_option("a").unwrap());

    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert!(!reloaded.has_option("a"));
    assert_eq!(reloaded.get_i64("b", 0), 2);
}

#[test]
fn unreadable_path_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    // A directory where the file should be
    let result = ConfigStore::open(dir.path(), SECTION);
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn odd_option_names_never_corrupt_their_neighbours() {
    let dir = TempDir::new().unwrap();
    let mut store = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    store.set("keep", 1);
    assert!(!store.set("", 2));
    store.set("a", 1);
    assert!(store.set(" b", 2));
    store.save().unwrap();

    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert_eq!(reloaded.get_i64("keep", -1), 1);
    assert_eq!(reloaded.get_i64("a", -1), 1);
    assert_eq!(reloaded.get_i64("b", -1), 2);
    assert_eq!(reloaded.options(), vec!["keep", "a", "b"]);
}

#[test]
fn unparsable_file_is_backed_up_before_the_next_save() {
    let dir = TempDir::new().unwrap();
    let original = "[UserPreferences]\nhand edited without separator\n";
    fs::write(config_path(&dir), original).unwrap();

    let mut store = ConfigStore::open_or_empty(config_path(&dir), SECTION);
    store.set("use_extensions", true);
    store.save().unwrap();

    let backup = dir.path().join("app_config.ini.bak");
    assert_eq!(fs::read_to_string(backup).unwrap(), original);
    let reloaded = ConfigStore::open(config_path(&dir), SECTION).unwrap();
    assert!(reloaded.get_bool("use_extensions", false));
}
