//! retention-runner: headless runner for the account retention-ratio pipeline.
//!
//! Usage:
//!   retention-runner --events data/sample_events.csv
//!   retention-runner --events events.jsonl --engine both --json --out report.json
//!   retention-runner --generate --seed 12345 --db run.db --engine sql

use anyhow::{bail, Context, Result};
use retention_core::{
    engine::{reports_agree, EngineKind},
    generator::generate_events,
    ingest::load_events,
    ActivityEvent, RetentionConfig, RetentionEngine, RetentionReport, RetentionStore,
};
use std::env;

/// Which engine(s) a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineChoice {
    One(EngineKind),
    Both,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let events_path = arg_value(&args, "--events");
    let generate = args.iter().any(|a| a == "--generate");
    let seed = parse_arg(&args, "--seed", 42u64);
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let as_json = args.iter().any(|a| a == "--json");
    let out_path = arg_value(&args, "--out");
    let engine_choice = match arg_value(&args, "--engine").unwrap_or("memory") {
        "both" => EngineChoice::Both,
        other => EngineChoice::One(other.parse()?),
    };

    let mut config = RetentionConfig::load_or_default(data_dir)?;
    config.generator.accounts = parse_arg(&args, "--accounts", config.generator.accounts);
    config.generator.users_per_account =
        parse_arg(&args, "--users", config.generator.users_per_account);

    let events: Vec<ActivityEvent> = match (events_path, generate) {
        (Some(_), true) => bail!("--events and --generate are mutually exclusive"),
        (Some(path), false) => {
            load_events(path).with_context(|| format!("failed to load events from {path}"))?
        }
        (None, true) => generate_events(&config.generator, seed),
        (None, false) => bail!("one of --events <path|-> or --generate is required (see --help)"),
    };

    let store = RetentionStore::open(db)?;
    store.migrate()?;
    // A file database may already hold events from an earlier run.
    store.clear_events()?;
    store.insert_events(&events)?;

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    let version = env!("CARGO_PKG_VERSION");
    store.insert_run(&run_id, config.baseline_month, config.comparison_month, version)?;

    let engine = RetentionEngine::new(config);
    let report = match engine_choice {
        EngineChoice::One(kind) => engine.run_with(kind, run_id.clone(), &events, &store)?,
        EngineChoice::Both => {
            let memory = engine.run(run_id.clone(), &events)?;
            let sql = engine.run_sql(run_id.clone(), &store)?;
            if let Err(diff) = reports_agree(&memory, &sql) {
                bail!("memory and sql engines disagree: {diff}");
            }
            log::info!("memory and sql engines agree on {} rows", memory.ratios.len());
            memory
        }
    };
    store.save_report(&report, version)?;

    emit(&report, as_json, out_path)?;
    Ok(())
}

fn emit(report: &RetentionReport, as_json: bool, out_path: Option<&str>) -> Result<()> {
    let rendered = if as_json {
        report.to_json()?
    } else {
        summary(report)
    };
    match out_path {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("cannot write {path}"))?;
            log::info!("report written to {path}");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn summary(report: &RetentionReport) -> String {
    let mut out = String::new();
    out.push_str("=== RETENTION RUN ===\n");
    out.push_str(&format!("  run_id:      {}\n", report.run_id));
    out.push_str(&format!("  engine:      {}\n", report.engine));
    out.push_str(&format!("  events:      {}\n", report.event_count));
    out.push_str(&format!("  baseline:    {}\n", report.baseline_month));
    out.push_str(&format!("  comparison:  {}\n", report.comparison_month));
    out.push_str(&format!("  accounts:    {}\n\n", report.ratios.len()));
    out.push_str(&report.render_table());
    out
}

fn print_usage() {
    println!("retention-runner — per-account retention ratio between two months");
    println!();
    println!("  --events <path|->     CSV (.csv) or JSON Lines (.jsonl/.ndjson); '-' reads CSV from stdin");
    println!("  --generate            use a synthetic event log instead of --events");
    println!("  --seed <u64>          generator seed (default 42)");
    println!("  --accounts <n>        generator account count");
    println!("  --users <n>           generator users per account");
    println!("  --db <path>           SQLite database (default :memory:)");
    println!("  --data-dir <dir>      directory holding retention.json (default ./data)");
    println!("  --engine <kind>       memory | sql | both (default memory)");
    println!("  --json                print the report as JSON");
    println!("  --out <path>          write the report to a file instead of stdout");
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// An unparsable value falls back to `default` with a warning.
fn parse_arg<T: std::str::FromStr + Copy + std::fmt::Display>(
    args: &[String],
    flag: &str,
    default: T,
) -> T {
    match arg_value(args, flag) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring {flag} '{raw}': not a valid value, using {default}");
            default
        }),
    }
}
