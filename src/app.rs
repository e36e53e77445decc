use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile, PagerConfig, PagerOptions};
use crate::feed::FeedClient;
use crate::output::{self, OutputFormat};
use crate::pager::{InitOutcome, Pager};
use crate::render::{HtmlView, PagerView};
use crate::store::{FileStore, KeyValueStore, MemoryStore};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label.bold(), value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn mode_label(config: &PagerConfig) -> String {
    if let Some(query) = config.query() {
        return format!("search \"{query}\"");
    }
    if let Some(label) = config.label() {
        return format!("label {label}");
    }
    "all posts".to_string()
}

#[derive(Clone, Debug)]
struct RunConfig {
    page_url: url::Url,
    options: PagerOptions,
    attributes: HashMap<String, String>,
    entries: Option<usize>,
    pager_links: Vec<String>,
    jump: Option<usize>,
    cache_path: Option<PathBuf>,
    format: OutputFormat,
    timeout: u64,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let raw_url = args
        .url
        .or(cfg.url)
        .ok_or_else(|| "a page URL is required (--url)".to_string())?;
    let page_url = url::Url::parse(raw_url.trim()).map_err(|e| format!("invalid URL '{raw_url}': {e}"))?;
    if !matches!(page_url.scheme(), "http" | "https") {
        return Err(format!("invalid URL '{raw_url}': expected http or https"));
    }

    let max_results = args.max_results.or(cfg.max_results);
    if max_results == Some(0) {
        return Err("invalid max_results, expected positive integer".to_string());
    }
    let total_visible_numbers = args.total_visible_numbers.or(cfg.total_visible_numbers);
    if total_visible_numbers == Some(0) {
        return Err("invalid total_visible_numbers, expected positive integer".to_string());
    }

    let options = PagerOptions {
        max_results,
        total_visible_numbers,
        by_date: args.by_date.or(cfg.by_date),
        label: args.label.or(cfg.label),
        query: args.query.or(cfg.query),
        number_class: cfg.number_class,
        dots_class: cfg.dots_class,
        active_class: cfg.active_class,
        check_for_updates: Some(args.check_for_updates || cfg.check_for_updates.unwrap_or(false)),
        enable_interactive_ellipsis: Some(
            args.interactive_ellipsis || cfg.interactive_ellipsis.unwrap_or(false),
        ),
        ..PagerOptions::default()
    };

    let mut attributes: HashMap<String, String> = HashMap::new();
    for raw in args.attributes.iter() {
        let (key, value) = validation::parse_attribute(raw)?;
        attributes.insert(key, value);
    }

    let no_cache = args.no_cache || cfg.no_cache.unwrap_or(false);
    let cache_path = if no_cache {
        None
    } else {
        args.cache
            .or(cfg.cache)
            .map(|p| config::expand_tilde(&p))
            .or_else(config::default_cache_path)
    };

    let format_raw = args.format.or(cfg.format).unwrap_or_else(|| "html".to_string());
    let format = OutputFormat::parse(&format_raw)
        .ok_or_else(|| format!("invalid format '{format_raw}', expected html or json"))?;

    Ok(RunConfig {
        page_url,
        options,
        attributes,
        entries: args.entries.or(cfg.entries),
        pager_links: args.pager_links,
        jump: args.jump,
        cache_path,
        format,
        timeout: args.timeout.or(cfg.timeout).unwrap_or(10),
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose,
    })
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn summarize_outcome(outcome: &InitOutcome) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if outcome.rendered_from_cache {
        parts.push("cache");
    }
    if outcome.fetched_snapshot {
        parts.push("snapshot");
    }
    if outcome.fetched_post_dates {
        parts.push("post dates");
    }
    if parts.is_empty() {
        "nothing".to_string()
    } else {
        parts.join(" + ")
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let config = PagerConfig::resolve(&run.options, &run.page_url, &run.attributes);
    let view = HtmlView::new(run.entries).with_pager_links(run.pager_links.clone());
    let page_size = view
        .pager_link_max_results()
        .or_else(|| config.page_size(run.entries))
        .ok_or_else(|| {
            "page size unknown: pass --max-results, --entries, --pager-link, or a URL with max-results".to_string()
        })?;

    format_kv_line("URL", run.page_url.as_str());
    format_kv_line("Mode", &mode_label(&config));
    format_kv_line("Page size", &page_size.to_string());
    format_kv_line("Visible", &config.total_visible_numbers.to_string());
    format_kv_line("Updates", format_bool(config.check_for_updates));
    format_kv_line(
        "Cache",
        &run.cache_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "memory".to_string()),
    );

    let feed = FeedClient::new(&config.home_url, run.timeout).map_err(|e| e.to_string())?;
    let store: Box<dyn KeyValueStore> = match run.cache_path.as_ref() {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let mut pager = Pager::new(config, feed, store, view);

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("fetching feed");
    pb.enable_steady_tick(Duration::from_millis(100));
    let result = pager.init().await;
    pb.finish_and_clear();

    let init_error = match result {
        Ok(outcome) => {
            format_kv_line("Source", &summarize_outcome(&outcome));
            None
        }
        Err(e) => Some(format!("pager initialization failed: {e}")),
    };

    if let Some(target) = run.jump {
        if !pager.jump(target) {
            warn!("nothing rendered yet, ignoring jump to page {target}");
        }
    }

    let view = pager.view();
    if view.is_removed() {
        format_kv_line("Pager", &"removed, all posts fit on one page".yellow().to_string());
    } else {
        if let Some(page) = pager.current_page() {
            format_kv_line("Page", &page.to_string());
        }
        let bytes = output::render(run.format, &view.numbers);
        std::io::stdout()
            .write_all(&bytes)
            .map_err(|e| format!("failed to write output: {e}"))?;
    }

    match init_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_logging(run.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
