use anyhow::Result;
use clap::{Parser, Subcommand};
use courtcase_core::{
    CaseQuery, CaseStore, DocumentFetcher, Error, DEFAULT_BASE_URL, SUPPORTED_CASE_TYPES,
};
use courtcase_local::{FsCaseStore, PdfDownloader, Pipeline};
use serde_json::{json, Value};
use std::io::Read;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

mod envelope;

use envelope::{error_envelope, failure_hint, ok_envelope};

#[derive(Parser, Debug)]
#[command(name = "courtcase")]
#[command(about = "Court case-status extraction and lookup history", long_about = None)]
struct Cli {
    /// Directory holding the lookup history.
    #[arg(long, global = true, env = "COURTCASE_STORE_DIR")]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract case status from a saved result page (json).
    ///
    /// With a case reference the lookup is also recorded in the history store.
    Extract(ExtractCmd),
    /// List recent lookups, newest first (json).
    History(HistoryCmd),
    /// Show one lookup with its extracted case data (json).
    Show(ShowCmd),
    /// Aggregate counts over the history store (json).
    Stats(StatsCmd),
    /// Delete lookups older than N days (json).
    Cleanup(CleanupCmd),
    /// Download a case document after checking it is a PDF (json).
    Download(DownloadCmd),
    /// List case types the portal search form accepts (json).
    CaseTypes,
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct ExtractCmd {
    /// Result page to read; `-` reads stdin.
    #[arg(long, default_value = "-")]
    html: String,
    /// Base URL relative document links resolve against.
    #[arg(long, env = "COURTCASE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Case type, or a compound `TYPE/NUMBER/YEAR` reference.
    #[arg(long)]
    case_type: Option<String>,
    #[arg(long)]
    case_number: Option<String>,
    #[arg(long)]
    year: Option<String>,
}

#[derive(clap::Args, Debug)]
struct HistoryCmd {
    #[arg(long, default_value_t = 50)]
    limit: usize,
}

#[derive(clap::Args, Debug)]
struct ShowCmd {
    id: u64,
}

#[derive(clap::Args, Debug)]
struct StatsCmd {
    /// Override "now" for the 24h activity window (epoch seconds).
    #[arg(long)]
    now_epoch_s: Option<u64>,
}

#[derive(clap::Args, Debug)]
struct CleanupCmd {
    #[arg(long, default_value_t = 30)]
    days: u64,
    /// Override "now" for the age cutoff (epoch seconds).
    #[arg(long)]
    now_epoch_s: Option<u64>,
}

#[derive(clap::Args, Debug)]
struct DownloadCmd {
    url: String,
    /// Directory for the saved file (default: system temp dir).
    #[arg(long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    max_bytes: Option<u64>,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn now_epoch_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("courtcase")
}

fn open_store(dir: Option<PathBuf>) -> Result<FsCaseStore> {
    Ok(FsCaseStore::open(dir.unwrap_or_else(default_store_dir))?)
}

/// Sets variables from a `KEY=VALUE` file named by `COURTCASE_ENV_FILE`.
/// Variables already present in the process environment win.
fn load_env_file() {
    let Ok(p) = std::env::var("COURTCASE_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("COURTCASE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_html(src: &str) -> Result<String> {
    if src == "-" {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        return Ok(s);
    }
    std::fs::read_to_string(src).map_err(|e| anyhow::anyhow!("read {src}: {e}"))
}

fn query_from_args(args: &ExtractCmd) -> Result<Option<CaseQuery>> {
    match &args.case_type {
        Some(ty) => Ok(Some(CaseQuery::parse(
            ty,
            args.case_number.as_deref().unwrap_or_default(),
            args.year.as_deref().unwrap_or_default(),
        )?)),
        None if args.case_number.is_some() || args.year.is_some() => Err(Error::InvalidQuery(
            "missing required field: case_type".to_string(),
        )
        .into()),
        None => Ok(None),
    }
}

fn run_extract(args: ExtractCmd, store_dir: Option<PathBuf>) -> Result<Value> {
    let pipeline = Pipeline::from_base_url(&args.base_url)?;
    let query = query_from_args(&args)?;
    let html = read_html(&args.html)?;

    let (outcome, query_id) = match query {
        Some(q) => {
            let store = open_store(store_dir)?;
            let report = courtcase_local::lookup(&store, &pipeline, &q, &html)?;
            (report.outcome, Some(report.query_id))
        }
        None => (pipeline.extract_html(&html), None),
    };

    let mut v = json!({
        "ok": outcome.is_success(),
        "data": outcome,
    });
    if let Some(m) = v.as_object_mut() {
        if let Some(id) = query_id {
            m.insert("query_id".to_string(), json!(id));
        }
        if let Some(h) = failure_hint(&outcome) {
            m.insert("hint".to_string(), json!(h));
        }
    }
    envelope::add_envelope_fields(&mut v, "extract");
    Ok(v)
}

fn run_history(args: HistoryCmd, store_dir: Option<PathBuf>) -> Result<Value> {
    let store = open_store(store_dir)?;
    let rows = store.recent_queries(args.limit)?;
    Ok(ok_envelope(
        "history",
        json!({ "count": rows.len(), "queries": rows }),
    ))
}

fn run_show(args: ShowCmd, store_dir: Option<PathBuf>) -> Result<Value> {
    let store = open_store(store_dir)?;
    let details = store
        .get_query(args.id)?
        .ok_or_else(|| Error::NotFound(format!("query {}", args.id)))?;
    Ok(ok_envelope("show", serde_json::to_value(details)?))
}

fn run_stats(args: StatsCmd, store_dir: Option<PathBuf>) -> Result<Value> {
    let store = open_store(store_dir)?;
    let stats = store.statistics(args.now_epoch_s.unwrap_or_else(now_epoch_s))?;
    Ok(ok_envelope("stats", serde_json::to_value(stats)?))
}

fn run_cleanup(args: CleanupCmd, store_dir: Option<PathBuf>) -> Result<Value> {
    let store = open_store(store_dir)?;
    let now = args.now_epoch_s.unwrap_or_else(now_epoch_s);
    let report = store.cleanup_older_than(args.days, now)?;
    Ok(ok_envelope("cleanup", serde_json::to_value(report)?))
}

async fn run_download(args: DownloadCmd) -> Result<Value> {
    let mut dl = PdfDownloader::new()?;
    if let Some(n) = args.max_bytes {
        dl = dl.with_max_bytes(n);
    }
    if let Some(d) = args.out_dir {
        dl = dl.with_output_dir(d);
    }
    let doc = dl.download(&args.url).await?;
    Ok(ok_envelope("download", serde_json::to_value(doc)?))
}

enum Output {
    Json(Value),
    Text(String),
}

async fn run(cli: Cli) -> (&'static str, Result<Output>) {
    let store_dir = cli.store_dir;
    let (kind, r) = match cli.command {
        Commands::Extract(args) => ("extract", run_extract(args, store_dir)),
        Commands::History(args) => ("history", run_history(args, store_dir)),
        Commands::Show(args) => ("show", run_show(args, store_dir)),
        Commands::Stats(args) => ("stats", run_stats(args, store_dir)),
        Commands::Cleanup(args) => ("cleanup", run_cleanup(args, store_dir)),
        Commands::Download(args) => ("download", run_download(args).await),
        Commands::CaseTypes => (
            "case_types",
            Ok(ok_envelope(
                "case_types",
                json!({ "case_types": SUPPORTED_CASE_TYPES }),
            )),
        ),
        Commands::Version(args) => {
            if args.output.eq_ignore_ascii_case("text") {
                let text = format!("courtcase {}", env!("CARGO_PKG_VERSION"));
                return ("version", Ok(Output::Text(text)));
            }
            let mut v = json!({
                "name": "courtcase",
                "version": env!("CARGO_PKG_VERSION"),
            });
            envelope::add_envelope_fields(&mut v, "version");
            ("version", Ok(v))
        }
    };
    (kind, r.map(Output::Json))
}

#[tokio::main]
async fn main() {
    load_env_file();
    init_tracing();

    let cli = Cli::parse();
    let (kind, result) = run(cli).await;
    match result {
        Ok(Output::Json(v)) => println!("{v}"),
        Ok(Output::Text(t)) => println!("{t}"),
        Err(e) => {
            tracing::error!(kind, error = %format!("{e:#}"), "command failed");
            println!("{}", error_envelope(kind, &e));
            std::process::exit(1);
        }
    }
}
