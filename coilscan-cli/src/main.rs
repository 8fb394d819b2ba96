//! CoilScan CLI — screen the market for coiled-spring breakout setups.
//!
//! Commands:
//! - `scan`: run the concurrent scanner over the universe or tagged symbols
//! - `universe`: list or count the scannable equity universe
//! - `tags add|list|prompt`: manage report tags that narrow the candidate list

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use coilscan_core::data::{
    CircuitBreaker, FileRegistry, SeriesFetcher, SyntheticFetcher, Universe, YahooFetcher,
};
use coilscan_core::domain::Board;
use coilscan_core::screening::{ScanHit, ScreeningCriteria};
use coilscan_core::tags::{build_tagging_prompt, ReplyTagger, ReportTagger, TagStore, TaggedReport};
use coilscan_runner::{
    render_table, select_candidates, CandidateMode, CsvSink, JsonSink, LogObserver, ResultSink,
    ScanConfig, ScanObserver, ScanReport, Scanner, SortKey, StdoutObserver,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "coilscan",
    about = "CoilScan: moving-average convergence breakout screener"
)]
struct Cli {
    /// Debug-level logging (overrides RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Convergence and volume contraction only.
    Base,
    /// Tighter limits plus bias band and trend confirmation.
    Stable,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
    Both,
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Scan configuration TOML. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Registry TOML of `[[listings]]` rows.
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Tag store JSON (used by tagged candidate modes).
    #[arg(long)]
    tags: Option<PathBuf>,

    /// Candidate mode: universe, tagged, tagged_or_universe.
    #[arg(long)]
    mode: Option<CandidateMode>,

    /// Start from a criteria preset instead of the config's criteria.
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Maximum MA5/MA10/MA20 spread, in percent.
    #[arg(long)]
    convergence: Option<f64>,

    /// Maximum latest-volume / 20-day-average ratio.
    #[arg(long)]
    volume_ratio: Option<f64>,

    /// Minimum latest volume in round lots.
    #[arg(long)]
    min_lots: Option<f64>,

    /// Enable the long-term bias band.
    #[arg(long, default_value_t = false)]
    bias_filter: bool,

    #[arg(long, allow_hyphen_values = true)]
    bias_min: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    bias_max: Option<f64>,

    /// Require the last close above MA60.
    #[arg(long, default_value_t = false)]
    above_ma60: bool,

    /// Require MA60 higher than five bars earlier.
    #[arg(long, default_value_t = false)]
    ma60_rising: bool,

    /// Worker pool size (1-64).
    #[arg(long)]
    workers: Option<usize>,

    /// Use deterministic synthetic series instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Table order: convergence, volume, bias, symbol.
    #[arg(long, default_value = "convergence")]
    sort: SortKey,

    /// Write results to this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan candidates for MA convergence with contracting volume.
    Scan(ScanArgs),
    /// List or count the scannable equity universe.
    Universe {
        /// Registry TOML of `[[listings]]` rows.
        #[arg(long)]
        registry: PathBuf,

        /// Only print counts per board.
        #[arg(long, default_value_t = false)]
        count: bool,

        /// Restrict to one board: twse or tpex.
        #[arg(long)]
        board: Option<String>,
    },
    /// Report tag store commands.
    Tags {
        #[command(subcommand)]
        action: TagsAction,
    },
}

#[derive(Subcommand)]
enum TagsAction {
    /// Parse a structured tagger reply and store it.
    Add {
        /// File containing the tagger's reply.
        reply: PathBuf,

        /// Report identifier. Defaults to the reply file's stem.
        #[arg(long)]
        report: Option<String>,

        #[arg(long, default_value = "tags.json")]
        store: PathBuf,
    },
    /// Show stored reports and their featured symbols.
    List {
        #[arg(long, default_value = "tags.json")]
        store: PathBuf,

        /// Only symbols from reports carrying this theme.
        #[arg(long)]
        theme: Option<String>,
    },
    /// Print the tagging prompt for a report's extracted text.
    Prompt {
        /// Plain-text report file.
        text: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Universe {
            registry,
            count,
            board,
        } => run_universe(&registry, count, board.as_deref()),
        Commands::Tags { action } => match action {
            TagsAction::Add {
                reply,
                report,
                store,
            } => run_tags_add(&reply, report, &store),
            TagsAction::List { store, theme } => run_tags_list(&store, theme.as_deref()),
            TagsAction::Prompt { text } => run_tags_prompt(&text),
        },
    }
}

/// Merge the config file with command-line overrides.
fn resolve_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("loading scan config {}", path.display()))?,
        None => ScanConfig::default(),
    };

    if let Some(path) = &args.registry {
        config.registry = Some(path.clone());
    }
    if let Some(path) = &args.tags {
        config.tags = Some(path.clone());
    }
    if let Some(mode) = args.mode {
        config.scanner.candidate_mode = mode;
    }
    if let Some(workers) = args.workers {
        config.scanner.workers = workers;
    }

    match args.preset {
        Some(Preset::Base) => config.criteria = ScreeningCriteria::base(),
        Some(Preset::Stable) => config.criteria = ScreeningCriteria::stable(),
        None => {}
    }

    let criteria = &mut config.criteria;
    if let Some(v) = args.convergence {
        criteria.convergence_limit_pct = v;
    }
    if let Some(v) = args.volume_ratio {
        criteria.volume_ratio_limit = v;
    }
    if let Some(v) = args.min_lots {
        criteria.min_volume_lots = v;
    }
    if let Some(v) = args.bias_min {
        criteria.bias_range.min = v;
    }
    if let Some(v) = args.bias_max {
        criteria.bias_range.max = v;
    }
    criteria.use_bias_filter |= args.bias_filter;
    criteria.require_close_above_ma60 |= args.above_ma60;
    criteria.require_ma60_rising |= args.ma60_rising;

    config.validate()?;
    Ok(config)
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    let Some(registry_path) = config.registry.as_deref() else {
        bail!("no registry given: pass --registry or set `registry` in the scan config");
    };
    let universe = Universe::load(&FileRegistry::new(registry_path));

    let tagged = match config.tags.as_deref() {
        Some(path) => TagStore::load_or_empty(path).symbols(),
        None => Default::default(),
    };
    let candidates = select_candidates(&universe, &tagged, config.scanner.candidate_mode);
    println!(
        "Universe: {} listings, {} candidates ({} mode)",
        universe.len(),
        candidates.len(),
        config.scanner.candidate_mode
    );

    let fetcher: Arc<dyn SeriesFetcher> = if args.synthetic {
        Arc::new(SyntheticFetcher::new())
    } else {
        Arc::new(YahooFetcher::new(
            Arc::new(CircuitBreaker::default_provider()),
            config.fetch.retry_policy(),
            config.fetch.timeout(),
        )?)
    };

    let scanner = Scanner::new(fetcher, config.scanner.scanner_config());
    // Piped output gets progress through the log instead of stdout.
    let observer: Box<dyn ScanObserver> = if std::io::stdout().is_terminal() {
        Box::new(StdoutObserver)
    } else {
        Box::new(LogObserver)
    };
    let results = scanner.scan(&candidates, &config.criteria, observer.as_ref())?;

    if args.synthetic {
        println!("NOTE: SYNTHETIC DATA, not market prices");
    }
    if results.is_empty() {
        println!("No matches.");
    } else {
        let rows: Vec<ScanHit> = results.sorted_by(args.sort).into_iter().cloned().collect();
        println!();
        print!("{}", render_table(&rows));
    }

    if let Some(dir) = &args.output_dir {
        let fingerprint = config.fingerprint()?;
        tracing::debug!(%fingerprint, "scan configuration fingerprint");
        let report = ScanReport::new(
            &results,
            &config.criteria,
            Local::now().date_naive(),
            fingerprint,
            args.synthetic,
        );
        let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
        if matches!(args.format, ExportFormat::Csv | ExportFormat::Both) {
            sinks.push(Box::new(CsvSink::new(dir)));
        }
        if matches!(args.format, ExportFormat::Json | ExportFormat::Both) {
            sinks.push(Box::new(JsonSink::new(dir)));
        }
        for sink in &sinks {
            let path = sink.write(&report)?;
            println!("Results saved to: {}", path.display());
        }
    }

    Ok(())
}

fn parse_board(name: &str) -> Result<Board> {
    match name.to_lowercase().as_str() {
        "twse" | "tw" | "listed" => Ok(Board::Twse),
        "tpex" | "two" | "otc" => Ok(Board::Tpex),
        _ => bail!("unknown board '{name}'. Valid: twse, tpex"),
    }
}

fn run_universe(registry: &Path, count: bool, board: Option<&str>) -> Result<()> {
    let universe = Universe::load(&FileRegistry::new(registry));
    let board = board.map(parse_board).transpose()?;

    if count {
        let twse = universe.on_board(Board::Twse).count();
        let tpex = universe.on_board(Board::Tpex).count();
        println!("TWSE: {twse}");
        println!("TPEx: {tpex}");
        println!("Total: {}", universe.len());
        return Ok(());
    }

    println!("{:<6} {:<6} {}", "Code", "Board", "Name");
    println!("{}", "-".repeat(30));
    for listing in universe.listings() {
        if board.is_some_and(|b| b != listing.board) {
            continue;
        }
        println!("{:<6} {:<6} {}", listing.code, listing.board, listing.name);
    }
    Ok(())
}

fn run_tags_add(reply: &Path, report: Option<String>, store_path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(reply)
        .with_context(|| format!("reading tagger reply {}", reply.display()))?;
    let tags = ReplyTagger.tag(&text)?;

    let report = report.unwrap_or_else(|| {
        reply
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| reply.display().to_string())
    });

    let mut store = if store_path.exists() {
        TagStore::load(store_path)?
    } else {
        TagStore::default()
    };

    let symbols: Vec<String> = tags.symbols().map(String::from).collect();
    store.upsert(TaggedReport {
        report: report.clone(),
        tagged_on: Local::now().date_naive(),
        tags,
    });
    store.save(store_path)?;

    println!("Tagged '{report}': {} featured symbols", symbols.len());
    if !symbols.is_empty() {
        println!("  {}", symbols.join(" "));
    }
    Ok(())
}

fn run_tags_list(store_path: &Path, theme: Option<&str>) -> Result<()> {
    let store = TagStore::load(store_path)
        .with_context(|| format!("loading tag store {}", store_path.display()))?;

    if let Some(theme) = theme {
        let symbols: Vec<String> = store.symbols_for_theme(theme).into_iter().collect();
        println!("{theme}: {}", symbols.join(" "));
        return Ok(());
    }

    if store.is_empty() {
        println!("Tag store is empty: {}", store_path.display());
        return Ok(());
    }

    for entry in &store.reports {
        let sentiment = entry
            .tags
            .sentiment
            .map(|s| format!("{s:?}"))
            .unwrap_or_else(|| "-".into());
        println!("{} {} [{}] {}", entry.tagged_on, entry.report, sentiment, entry.tags.headline);
        if !entry.tags.themes.is_empty() {
            println!("  themes:  {}", entry.tags.themes.join("、"));
        }
        let symbols: Vec<&str> = entry.tags.symbols().collect();
        if !symbols.is_empty() {
            println!("  symbols: {}", symbols.join(" "));
        }
    }
    println!("\n{} distinct symbols", store.symbols().len());
    Ok(())
}

fn run_tags_prompt(text: &Path) -> Result<()> {
    let content = std::fs::read_to_string(text)
        .with_context(|| format!("reading report text {}", text.display()))?;
    println!("{}", build_tagging_prompt(&content));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn scan_args(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["coilscan", "scan"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Scan(args) => args,
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn preset_then_overrides() {
        let args = scan_args(&[
            "--registry",
            "registry.toml",
            "--preset",
            "stable",
            "--convergence",
            "1.2",
            "--bias-min",
            "-3",
            "--workers",
            "4",
            "--mode",
            "tagged",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.criteria.convergence_limit_pct, 1.2);
        assert_eq!(config.criteria.volume_ratio_limit, 0.8);
        assert_eq!(config.criteria.bias_range.min, -3.0);
        assert!(config.criteria.require_ma60_rising);
        assert_eq!(config.scanner.workers, 4);
        assert_eq!(config.scanner.candidate_mode, CandidateMode::Tagged);
        assert_eq!(config.registry.as_deref(), Some(Path::new("registry.toml")));
    }

    #[test]
    fn toggles_only_enable() {
        let args = scan_args(&["--above-ma60"]);
        let config = resolve_config(&args).unwrap();
        assert!(config.criteria.require_close_above_ma60);
        assert!(!config.criteria.require_ma60_rising);
        assert!(!config.criteria.use_bias_filter);
    }

    #[test]
    fn out_of_range_workers_rejected() {
        let args = scan_args(&["--workers", "0"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn board_names() {
        assert_eq!(parse_board("TWSE").unwrap(), Board::Twse);
        assert_eq!(parse_board("otc").unwrap(), Board::Tpex);
        assert!(parse_board("nasdaq").is_err());
    }
}
