//! Code Analyzer shell
//!
//! Opens a folder in the filtered file tree, prints it with its check boxes and
//! remembers the folder and filter flags between runs.

use anyhow::{bail, Context, Result};
use services::{preferences, ConfigStore, FileTreeBuilder, LogSink, TreeOptions};
use shared::settings::{DEFAULT_CONFIG_FILE, DEFAULT_SECTION};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: code_analyzer [FOLDER] [options]

Options:
  --sources-only     only list .c, .cpp, .h and .hpp files
  --all-files        list every file
  --non-empty        hide folders without a listed file below them
  --all-folders      show every folder
  --check PATH       select PATH (relative to FOLDER); may be repeated
  --config FILE      use FILE instead of the default config
  -h, --help         show this help";

#[derive(Debug, Default, PartialEq)]
struct Args {
    folder: Option<String>,
    use_extensions: Option<bool>,
    only_non_empty_folders: Option<bool>,
    check: Vec<String>,
    config: Option<PathBuf>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "--sources-only" => parsed.use_extensions = Some(true),
            "--all-files" => parsed.use_extensions = Some(false),
            "--non-empty" => parsed.only_non_empty_folders = Some(true),
            "--all-folders" => parsed.only_non_empty_folders = Some(false),
            "--check" => {
                let path = iter.next().context("--check needs a path")?;
                parsed.check.push(path.clone());
            }
            "--config" => {
                let path = iter.next().context("--config needs a file")?;
                parsed.config = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => bail!("Unknown option {}\n\n{}", other, USAGE),
            other => {
                if parsed.folder.is_some() {
                    bail!("Only one folder can be opened at a time");
                }
                parsed.folder = Some(other.to_string());
            }
        }
    }
    Ok(parsed)
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com.local", "Code Analyzer", "CodeAnalyzer")
}

fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().join(DEFAULT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn log_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut store = ConfigStore::open_or_empty(&config_path, DEFAULT_SECTION);
    let sink = LogSink::start(log_dir())?;
    let log = sink.handle();

    let mut prefs = preferences::load_browser(&store);
    if let Some(enabled) = args.use_extensions {
        prefs.use_extensions = enabled;
    }
    if let Some(enabled) = args.only_non_empty_folders {
        prefs.only_non_empty_folders = enabled;
    }

    let folder = match args.folder.clone().or_else(|| prefs.last_folder.clone()) {
        Some(folder) => folder,
        None => bail!("No folder given and none remembered\n\n{}", USAGE),
    };

    let mut builder = FileTreeBuilder::new(TreeOptions {
        use_extensions: prefs.use_extensions,
        only_non_empty_folders: prefs.only_non_empty_folders,
        ..TreeOptions::default()
    });
    builder
        .build(&folder)
        .with_context(|| format!("Failed to open {}", folder))?;

    prefs.last_folder = Some(folder.clone());
    if let Err(e) = preferences::store_browser(&mut store, &prefs) {
        tracing::warn!("Could not save preferences: {}", e);
    }

    if let Some(tree) = builder.tree_mut() {
        for rel in &args.check {
            match tree.find(rel) {
                Some(id) => tree.check_recursive(id, true),
                None => tracing::warn!("{} is not shown in the tree", rel),
            }
        }

        print!("{}", tree.render());

        let selected = tree.collect_checked_files();
        if !selected.is_empty() {
            println!("\nSelected files:");
            for path in &selected {
                println!("  {}", path);
            }
        }

        log.log(format!(
            "Opened {} ({} nodes, {} selected)",
            folder,
            tree.node_count(),
            selected.len()
        ));
        log.log(format!("Selected files: {:?}", selected));
    }
    log.log(format!(
        "Generation settings: {:?}",
        preferences::load_generation(&store)
    ));

    sink.shutdown();
    Ok(())
}
