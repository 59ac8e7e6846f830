pub mod models;
pub mod services;
pub mod api;

use anyhow::{bail, Context};
use api::{analyze_document, preprocess_file, InMemoryReportCache};
use services::config_store::{
    ConfigStore, PROVIDER_GEMINI, PROVIDER_GOOGLE_SEARCH, PROVIDER_GPTZERO, PROVIDER_OPENAI,
};
use services::detection::Analyzer;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "textguard_";
const LOG_FILES_KEPT: usize = 30;

const USAGE: &str = "Usage:
  textguard <file.pdf|file.txt|file.md> [--out <json_path>] [--config <dir>]
  textguard --text \"<text>\" [--name <label>] [--out <json_path>] [--config <dir>]
  textguard set-key <openai|gemini|gptzero|google_search> <key> [--config <dir>]

Notes:
  - API keys are read from the environment first (OPENAI_API_KEY, GEMINI_API_KEY, GPTZERO_API_KEY,
    GOOGLE_SEARCH_API_KEY, GOOGLE_SEARCH_ENGINE_ID), then from the config file.
  - TEXTGUARD_DISABLE_FILE_LOG=1 keeps logs on stderr only.";

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("1") | Ok("true") | Ok("TRUE"))
}

/// Initialize logging: stderr console plus one timestamped file per session.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env_flag("TEXTGUARD_DISABLE_FILE_LOG") {
        init_console_only_logging(env_filter);
        return;
    }

    let logs_dir = match std::env::var("TEXTGUARD_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => get_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("{}{}.log", LOG_FILE_PREFIX, timestamp);

    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // stdout carries the JSON report
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    info!("Log file: {}/{}", logs_dir.display(), log_filename);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    cleanup_old_logs(&logs_dir, LOG_FILES_KEPT);
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn get_logs_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(data_dir) => data_dir.join("textguard").join("logs"),
        None => PathBuf::from("logs"),
    }
}

fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len().saturating_sub(keep);
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String], value_flags: &[&str]) -> Option<String> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if value_flags.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if !arg.starts_with("--") {
            return Some(arg.clone());
        }
    }
    None
}

fn config_store(args: &[String]) -> anyhow::Result<ConfigStore> {
    let dir = match parse_arg_value(args, "--config") {
        Some(dir) => PathBuf::from(dir),
        None => ConfigStore::default_config_dir().context("no config directory on this platform")?,
    };
    Ok(ConfigStore::new(dir))
}

fn set_key(args: &[String]) -> anyhow::Result<()> {
    let (Some(provider), Some(key)) = (args.get(1), args.get(2)) else {
        bail!("{}", USAGE);
    };
    let known = [PROVIDER_OPENAI, PROVIDER_GEMINI, PROVIDER_GPTZERO, PROVIDER_GOOGLE_SEARCH];
    if !known.contains(&provider.as_str()) {
        bail!("unknown provider '{}', expected one of {}", provider, known.join(", "));
    }

    let store = config_store(args)?;
    store.set_api_key(provider, key)?;
    eprintln!("Stored {} key in {}", provider, store.config_file().display());
    Ok(())
}

/// Command-line entry point.
pub async fn run() -> anyhow::Result<()> {
    let started = Instant::now();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    init_logging();

    if args[0] == "set-key" {
        return set_key(&args);
    }

    let store = config_store(&args)?;
    let config = store
        .load()
        .with_context(|| format!("loading {}", store.config_file().display()))?;

    let (text, filename) = match parse_arg_value(&args, "--text") {
        Some(text) => (text, parse_arg_value(&args, "--name")),
        None => {
            let Some(path) = positional(&args, &["--out", "--config", "--name", "--text"]) else {
                bail!("{}", USAGE);
            };
            let bytes = fs::read(&path).with_context(|| format!("reading {}", path))?;
            let file_name = Path::new(&path)
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());
            (preprocess_file(&file_name, &bytes)?, Some(file_name))
        }
    };

    let analyzer = Analyzer::from_config(&config)?;
    let cache = InMemoryReportCache::new();
    let report = analyze_document(
        &analyzer,
        &cache,
        &text,
        filename.as_deref(),
        config.analysis.min_words,
    )
    .await?;

    let json = serde_json::to_string_pretty(&report)?;
    match parse_arg_value(&args, "--out") {
        Some(out) => {
            fs::write(&out, &json).with_context(|| format!("writing {}", out))?;
            eprintln!("Report written to {}", out);
        }
        None => println!("{}", json),
    }

    info!(elapsed_ms = started.elapsed().as_millis(), "analysis.done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_arg_value() {
        let a = args(&["essay.txt", "--out", "report.json"]);
        assert_eq!(parse_arg_value(&a, "--out").as_deref(), Some("report.json"));
        assert_eq!(parse_arg_value(&a, "--config"), None);
        assert_eq!(parse_arg_value(&args(&["--out"]), "--out"), None);
    }

    #[test]
    fn test_positional_skips_flag_values() {
        let flags = ["--out", "--config"];
        let a = args(&["--config", "/tmp/cfg", "essay.pdf", "--out", "r.json"]);
        assert_eq!(positional(&a, &flags).as_deref(), Some("essay.pdf"));
        assert_eq!(positional(&args(&["--out", "r.json"]), &flags), None);
    }

    #[test]
    fn test_cleanup_old_logs_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("{}{}.log", LOG_FILE_PREFIX, i)), "x").unwrap();
        }
        fs::write(dir.path().join("other.log"), "x").unwrap();

        cleanup_old_logs(dir.path(), 3);

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining.len(), 4);
        assert!(remaining.contains(&"other.log".to_string()));
    }
}
