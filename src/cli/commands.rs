use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::adapters::{Adapter, Platform, PlatformAdapter};
use crate::clipboard::{CopyTarget, SystemClipboard, copy_message};
use crate::config::{EngineConfig, Settings};
use crate::identity::Identity;
use crate::indexer::{RescanOutcome, rescan};
use crate::models::{AttachmentKind, Message, Role};
use crate::runtime::script::{ReplayReport, load_script};
use crate::search::search_index;
use crate::session::Session;
use crate::title::Provider;
use crate::tree::{load_snapshot, parse_location};
use crate::utils::{format_path_with_tilde, get_config_path, sanitize_for_terminal};

/// Environment variable holding the log filter (`warn` when unset).
pub const LOG_ENV: &str = "TURN_NAVIGATOR_LOG";

#[derive(Parser)]
#[command(name = "turn-navigator")]
#[command(version)]
#[command(about = "Index and navigate conversation turns in chat page snapshots", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub engine: EngineFlags,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Per-invocation overrides for the engine configuration.
#[derive(Args, Debug, Default)]
pub struct EngineFlags {
    /// Quiet window before a rescan, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub quiet_ms: Option<u64>,

    /// Delay after a conversation switch before re-indexing, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub settle_ms: Option<u64>,
}

impl EngineFlags {
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(ms) = self.quiet_ms {
            config.quiet_window = Duration::from_millis(ms);
        }
        if let Some(ms) = self.settle_ms {
            config.settle_delay = Duration::from_millis(ms);
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one rescan over a snapshot and print the index
    Index {
        snapshot: PathBuf,
        /// Override the snapshot's url (selects the platform adapter)
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show statistics about a snapshot's index
    Stats { snapshot: PathBuf },
    /// Search a snapshot's index with `filters | fuzzy`
    Search {
        snapshot: PathBuf,
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Copy an entry's text to the system clipboard
    Copy {
        snapshot: PathBuf,
        identity: String,
        /// Copy the full text instead of the preview
        #[arg(long)]
        full: bool,
    },
    /// Drive the engine through a scripted session
    Replay {
        script: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Index every *.json snapshot under a directory
    Batch {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the current settings
    Show,
    /// Store the API key used for title generation
    SetKey { key: String },
    /// Select the title provider
    SetProvider { provider: Provider },
    /// Switch between the light and dark theme
    Theme { mode: ThemeMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let Some(command) = &cli.command else {
        println!("Use --help for usage information");
        return Ok(());
    };

    if let Commands::Config { action } = command {
        return run_config(action);
    }

    let settings = Settings::load(&get_config_path()?)?;
    let config = cli.engine.apply(settings.engine());

    match command {
        Commands::Index { snapshot, url, json } => show_index(snapshot, url.as_deref(), *json, &config),
        Commands::Stats { snapshot } => show_stats(snapshot, &config),
        Commands::Search { snapshot, query, json } => run_search(snapshot, query, *json, &config),
        Commands::Copy { snapshot, identity, full } => run_copy(snapshot, identity, *full, &config),
        Commands::Replay { script, json } => run_replay(script, *json, config),
        Commands::Batch { dir, json } => run_batch(dir, *json, &config),
        Commands::Config { .. } => Ok(()),
    }
}

/// A snapshot indexed once.
pub struct IndexedSnapshot {
    pub platform: Platform,
    pub conversation: String,
    pub session: Session,
    pub outcome: RescanOutcome,
}

/// Loads a snapshot and runs one rescan over it.
pub fn index_snapshot(path: &Path, url: Option<&str>, config: &EngineConfig) -> Result<IndexedSnapshot> {
    let mut doc = load_snapshot(path)?;
    if let Some(url) = url {
        doc.set_location(parse_location(url)?);
    }
    let adapter = Adapter::for_location(doc.location())
        .ok_or_else(|| anyhow!("Unsupported host in '{}'", doc.location()))?;
    let platform = adapter.platform();
    let conversation = adapter.conversation_id(doc.location());

    let mut session = Session::new(platform);
    let outcome = rescan(&adapter, &doc, &mut session, config);
    if outcome == RescanOutcome::ContainerUnresolved {
        warn!(path = %path.display(), %platform, "no message container in snapshot");
    }
    Ok(IndexedSnapshot { platform, conversation, session, outcome })
}

fn format_entry(message: &Message) -> String {
    let serial = message.serial.map_or_else(|| "-".to_string(), |n| n.to_string());
    let attachment = match message.attachment {
        AttachmentKind::None => String::new(),
        kind => format!("[{}] ", kind),
    };
    format!(
        "{:>3}  {:<9}  {}{}  ({})",
        serial,
        message.role,
        attachment,
        sanitize_for_terminal(&message.preview),
        sanitize_for_terminal(message.identity.as_str())
    )
}

fn print_entries<'a>(entries: impl IntoIterator<Item = &'a Message>) {
    for message in entries {
        println!("{}", format_entry(message));
    }
}

fn show_index(path: &Path, url: Option<&str>, json: bool, config: &EngineConfig) -> Result<()> {
    let indexed = index_snapshot(path, url, config)?;
    let index = indexed.session.index();
    if json {
        println!("{}", serde_json::to_string_pretty(index.as_slice())?);
    } else {
        print_entries(index);
        eprintln!(
            "{} entries ({}, {})",
            index.len(),
            indexed.platform,
            sanitize_for_terminal(&indexed.conversation)
        );
    }
    Ok(())
}

fn show_stats(path: &Path, config: &EngineConfig) -> Result<()> {
    let indexed = index_snapshot(path, None, config)?;
    let index = indexed.session.index();

    println!("Conversation Statistics");
    println!("=======================");
    println!("Platform: {}", indexed.platform);
    println!("Conversation: {}", sanitize_for_terminal(&indexed.conversation));
    println!("Total entries: {}", index.len());
    println!("  User prompts: {}", index.count_role(Role::User));
    println!("  Assistant replies: {}", index.count_role(Role::Assistant));
    let attachments: Vec<_> = AttachmentKind::ALL
        .into_iter()
        .filter(|kind| kind.is_some())
        .map(|kind| (kind, index.count_attachment(kind)))
        .filter(|(_, count)| *count > 0)
        .collect();
    if !attachments.is_empty() {
        println!("Attachments:");
        for (kind, count) in attachments {
            println!("  {}: {}", kind, count);
        }
    }
    println!();
    println!("Snapshot: {}", format_path_with_tilde(path));
    println!("Indexed at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}

fn run_search(path: &Path, query: &str, json: bool, config: &EngineConfig) -> Result<()> {
    let indexed = index_snapshot(path, None, config)?;
    let hits = search_index(indexed.session.index().as_slice(), query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        print_entries(hits.iter().map(|hit| hit.message));
        eprintln!("{} of {} entries matched", hits.len(), indexed.session.index().len());
    }
    Ok(())
}

fn run_copy(path: &Path, identity: &str, full: bool, config: &EngineConfig) -> Result<()> {
    let indexed = index_snapshot(path, None, config)?;
    let message = indexed
        .session
        .index()
        .get(&Identity::new(identity))
        .ok_or_else(|| anyhow!("No entry with identity '{}'", identity))?;
    let target = if full { CopyTarget::FullText } else { CopyTarget::Preview };
    let mut clipboard = SystemClipboard::new()?;
    let copied = copy_message(message, target, &mut clipboard)?;
    eprintln!("Copied {} bytes to clipboard", copied.len());
    Ok(())
}

fn run_replay(path: &Path, json: bool, config: EngineConfig) -> Result<()> {
    let script = load_script(path)?;
    let report = script.replay(config).with_context(|| format!("Replay failed: {}", path.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ReplayReport) {
    for frame in &report.frames {
        println!("[{:>6}ms] {} entries", frame.at_ms, frame.entries.len());
        for message in &frame.entries {
            println!("    {}", format_entry(message));
        }
    }
    let stats = report.stats;
    eprintln!(
        "{} rescans: {} accepted, {} retained, {} unresolved; {} resets",
        stats.rescans, stats.accepted, stats.retained, stats.unresolved, stats.resets
    );
}

#[derive(Debug, Serialize)]
struct BatchResult {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<Platform>,
    entries: usize,
    user: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn collect_snapshot_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn run_batch(dir: &Path, json: bool, config: &EngineConfig) -> Result<()> {
    let paths = collect_snapshot_paths(dir)?;
    debug!(count = paths.len(), dir = %dir.display(), "batch indexing");

    let results: Vec<BatchResult> = paths
        .par_iter()
        .map(|path| match index_snapshot(path, None, config) {
            Ok(indexed) => BatchResult {
                path: path.clone(),
                platform: Some(indexed.platform),
                entries: indexed.session.index().len(),
                user: indexed.session.index().count_role(Role::User),
                error: None,
            },
            Err(e) => BatchResult {
                path: path.clone(),
                platform: None,
                entries: 0,
                user: 0,
                error: Some(format!("{:#}", e)),
            },
        })
        .collect();

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            let shown = format_path_with_tilde(&result.path);
            match (&result.error, result.platform) {
                (Some(error), _) => println!("{}  error: {}", shown, sanitize_for_terminal(error)),
                (None, Some(platform)) => {
                    println!("{}  {}  {} entries ({} prompts)", shown, platform, result.entries, result.user)
                }
                (None, None) => println!("{}  {} entries", shown, result.entries),
            }
        }
    }
    eprintln!("Indexed {} snapshots ({} failed)", results.len() - failed, failed);
    Ok(())
}

fn run_config(action: &ConfigCommand) -> Result<()> {
    let path = get_config_path()?;
    let mut settings = Settings::load(&path)?;

    match action {
        ConfigCommand::Show => {
            println!("Provider: {}", settings.provider);
            println!("API key: {}", settings.masked_key().unwrap_or_else(|| "(not set)".to_string()));
            println!("Theme: {}", if settings.dark_mode { "dark" } else { "light" });
            println!("Settings file: {}", format_path_with_tilde(&path));
            return Ok(());
        }
        ConfigCommand::SetKey { key } => {
            let key = key.trim();
            if !settings.provider.accepts_key(key) {
                bail!("Not a valid {} API key", settings.provider);
            }
            settings.api_key = Some(key.to_string());
        }
        ConfigCommand::SetProvider { provider } => settings.provider = *provider,
        ConfigCommand::Theme { mode } => settings.dark_mode = *mode == ThemeMode::Dark,
    }

    settings.save(&path)?;
    println!("Saved {}", format_path_with_tilde(&path));
    Ok(())
}
