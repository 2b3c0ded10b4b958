//! SignalCast CLI: run the signal pipeline and inspect its stages.
//!
//! Commands:
//! - `run`: fetch, ask the oracle, and push one notification per symbol
//! - `snapshot`: print the market snapshot the oracle would see
//! - `normalize`: normalize a saved oracle response and print the decision

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use signalcast_core::config::{
    NotifyKind, OracleKind, PipelineConfig, ProviderKind, Secrets, PUSHPLUS_TOKEN_VAR,
};
use signalcast_core::data::{BinanceProvider, CsvProvider, DataProvider};
use signalcast_core::decision::{self, DecisionSchema};
use signalcast_core::notify::{LogNotifier, Notifier, PushPlusNotifier};
use signalcast_core::oracle::{DecisionOracle, GeminiOracle, ReplayOracle};
use signalcast_core::pipeline::{self, SignalReport};
use signalcast_core::{risk, snapshot};

#[derive(Parser)]
#[command(
    name = "signalcast",
    about = "SignalCast CLI: indicator snapshot to LLM trade signal to push notification"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for each configured symbol.
    Run {
        /// Path to a TOML config file. Missing file means defaults.
        #[arg(long, default_value = "signalcast.toml")]
        config: PathBuf,

        /// Symbols to run (e.g., BTC/USDT ETH/USDT). Overrides the config.
        #[arg(long = "symbol")]
        symbols: Vec<String>,

        /// Read bars from a CSV file instead of the configured provider.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Replay a saved oracle response instead of calling the model.
        #[arg(long)]
        response: Option<PathBuf>,

        /// Log the notification instead of sending it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print the market snapshot for one symbol.
    Snapshot {
        /// Path to a TOML config file.
        #[arg(long, default_value = "signalcast.toml")]
        config: PathBuf,

        #[arg(long, default_value = "BTC/USDT")]
        symbol: String,

        /// Read bars from a CSV file instead of the configured provider.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print JSON instead of the prompt text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Normalize a raw oracle response (file path or `-` for stdin).
    Normalize {
        input: String,

        #[arg(long, value_enum, default_value_t = SchemaArg::Directional)]
        schema: SchemaArg,

        /// Scored schema: confidence at or above this maps to LONG.
        #[arg(long, default_value_t = 75)]
        long_threshold: u8,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaArg {
    Directional,
    Scored,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Run {
            config,
            symbols,
            csv,
            response,
            dry_run,
        } => run_pipeline_cmd(&config, symbols, csv, response, dry_run),
        Commands::Snapshot {
            config,
            symbol,
            csv,
            json,
        } => run_snapshot_cmd(&config, &symbol, csv, json),
        Commands::Normalize {
            input,
            schema,
            long_threshold,
        } => run_normalize_cmd(&input, schema, long_threshold),
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: &Path, csv: Option<PathBuf>) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    if let Some(csv) = csv {
        config.provider.kind = ProviderKind::Csv;
        config.provider.csv_path = Some(csv);
    }
    Ok(config)
}

fn build_provider(config: &PipelineConfig) -> Result<Box<dyn DataProvider>> {
    let settings = &config.provider;
    Ok(match settings.kind {
        ProviderKind::Binance => Box::new(BinanceProvider::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?),
        ProviderKind::Csv => {
            let Some(path) = settings.csv_path.clone() else {
                bail!("provider.kind = \"csv\" requires a CSV path");
            };
            Box::new(CsvProvider::new(path))
        }
    })
}

fn build_oracle(
    config: &PipelineConfig,
    secrets: &Secrets,
    response: Option<PathBuf>,
) -> Result<Box<dyn DecisionOracle>> {
    let settings = &config.oracle;
    let replay_path = response.or_else(|| match settings.kind {
        OracleKind::Replay => settings.replay_path.clone(),
        OracleKind::Gemini => None,
    });
    if let Some(path) = replay_path {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading oracle response {}", path.display()))?;
        return Ok(Box::new(ReplayOracle::new(text)));
    }

    let key = secrets.require_gemini_key()?;
    Ok(Box::new(GeminiOracle::new(
        settings.base_url.clone(),
        settings.model.clone(),
        key,
        Duration::from_secs(settings.timeout_secs),
    )?))
}

fn build_notifier(
    config: &PipelineConfig,
    secrets: &Secrets,
    dry_run: bool,
) -> Result<Box<dyn Notifier>> {
    if dry_run || config.notify.kind == NotifyKind::Log {
        return Ok(Box::new(LogNotifier));
    }
    match secrets.pushplus_token.as_deref() {
        Some(token) => Ok(Box::new(PushPlusNotifier::new(
            config.notify.endpoint.clone(),
            token,
            Duration::from_secs(config.notify.timeout_secs),
        )?)),
        None => {
            warn!("{PUSHPLUS_TOKEN_VAR} not set; logging notifications instead of sending");
            Ok(Box::new(LogNotifier))
        }
    }
}

fn run_pipeline_cmd(
    config_path: &Path,
    symbols: Vec<String>,
    csv: Option<PathBuf>,
    response: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let mut config = load_config(config_path, csv)?;
    if !symbols.is_empty() {
        config.pipeline.symbols = symbols;
    }
    config.validate()?;

    let secrets = Secrets::from_env();
    let provider = build_provider(&config)?;
    let oracle = build_oracle(&config, &secrets, response)?;
    let notifier = build_notifier(&config, &secrets, dry_run)?;

    info!(
        symbols = ?config.pipeline.symbols,
        schema = config.schema().name(),
        provider = provider.name(),
        oracle = oracle.name(),
        notifier = notifier.name(),
        "starting run"
    );

    let results: Vec<(&String, Result<SignalReport, pipeline::PipelineError>)> = config
        .pipeline
        .symbols
        .par_iter()
        .map(|symbol| {
            let result = pipeline::run(
                symbol,
                provider.as_ref(),
                oracle.as_ref(),
                notifier.as_ref(),
                &config,
            );
            (symbol, result)
        })
        .collect();

    let mut failures = 0;
    for (symbol, result) in &results {
        match result {
            Ok(report) => print_summary(report),
            Err(e) => {
                error!(%symbol, error = %e, "run failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} symbol(s) failed", results.len());
    }
    Ok(())
}

fn print_summary(report: &SignalReport) {
    let d = &report.decision;
    println!("=== {} ===", report.symbol);
    println!("{}", report.payload.title);
    println!(
        "  Signal: {}  Confidence: {}/100",
        d.signal(),
        d.confidence()
    );
    if d.is_directional() {
        println!(
            "  Entry: {:.2}  TP: {:.2}  SL: {:.2}",
            d.entry_price(),
            d.tp_price(),
            d.sl_price()
        );
    }
    if let Some(ratio) = report.metrics.and_then(|m| m.ratio) {
        println!("  Risk/reward: 1:{ratio:.1}");
    }
    println!("  Reason: {}", d.reason());
    println!(
        "  Delivered: {}  Dataset: {}",
        if report.delivered { "yes" } else { "no" },
        &report.dataset_hash[..16.min(report.dataset_hash.len())]
    );
}

fn run_snapshot_cmd(config_path: &Path, symbol: &str, csv: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(config_path, csv)?;
    config.validate()?;
    let provider = build_provider(&config)?;

    let series = provider.fetch(symbol, &config.pipeline.timeframe, config.pipeline.limit)?;
    let snap = snapshot::build(symbol, &series)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    } else {
        print!("{}", snap.render());
    }
    Ok(())
}

fn run_normalize_cmd(input: &str, schema: SchemaArg, long_threshold: u8) -> Result<()> {
    if !(1..=100).contains(&long_threshold) {
        bail!("--long-threshold must be within 1..=100");
    }
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))?
    };

    let schema = match schema {
        SchemaArg::Directional => DecisionSchema::Directional,
        SchemaArg::Scored => DecisionSchema::Scored { long_threshold },
    };
    let decision = decision::normalize_text(&raw, schema);
    let metrics = risk::compute(&decision);

    let out = serde_json::json!({
        "decision": decision,
        "risk": metrics,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
