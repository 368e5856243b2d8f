//! atrisk-runner: headless front end for stop-level risk attribution.
//!
//! Usage:
//!   atrisk-runner process --workbook input.json [--keys 3] [--out-dir data]
//!   atrisk-runner process --stops node.csv --predictions predictions.csv --keys 2
//!   atrisk-runner overlap --stops node.csv --predictions predictions.csv
//!   atrisk-runner generate --seed 42 --out data/sample_input.json
//!
//! Common flags:
//!   --config FILE   attribution config (JSON); overrides --keys
//!   --strict        abort on the first unusable row instead of skipping it
//!   --out FILE      output path (.csv, or .json for a workbook)
//!   --out-dir DIR   directory for a timestamped output file (default ./data)

use anyhow::{bail, Context, Result};
use atrisk_core::{
    attribute_risk,
    breakdown::render_breakdown,
    diagnostics::overlap,
    io::{csv::read_csv_file, report, workbook::Workbook},
    sample::{generate_sample, SampleSpec},
    summarize, AttributionConfig, Outcome, Table, ValuePolicy,
};
use chrono::Local;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    let outcome = match command {
        "process" => run_process(&args),
        "overlap" => run_overlap(&args),
        "generate" => run_generate(&args),
        _ => {
            print_usage();
            return if command == "help" { ExitCode::SUCCESS } else { ExitCode::from(2) };
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("atrisk-runner <process|overlap|generate> [flags]");
    println!("  process   mark at-risk stops and write the report");
    println!("  overlap   compare join-key values between the two inputs");
    println!("  generate  write a deterministic sample workbook");
}

/// Inputs resolved from the command line.
struct Inputs {
    stops: Table,
    predictions: Table,
    source: String,
}

fn load_config(args: &[String]) -> Result<AttributionConfig> {
    let mut config = match flag_value(args, "--config") {
        Some(path) => AttributionConfig::load(path)?,
        None => match flag_value(args, "--keys") {
            None | Some("3") => AttributionConfig::three_key(),
            Some("2") => AttributionConfig::two_key(),
            Some(n) => bail!("--keys must be 2 or 3, got {n}"),
        },
    };
    if has_flag(args, "--strict") {
        config.value_policy = ValuePolicy::Abort;
    }
    Ok(config)
}

/// Names the input files for reports, whether or not they can be read.
fn input_source(args: &[String]) -> String {
    match (
        flag_value(args, "--workbook"),
        flag_value(args, "--stops"),
        flag_value(args, "--predictions"),
    ) {
        (Some(path), _, _) => path.to_string(),
        (None, Some(stops), Some(predictions)) => format!("{stops} + {predictions}"),
        (None, stops, predictions) => stops.or(predictions).unwrap_or("").to_string(),
    }
}

fn load_inputs(args: &[String], config: &AttributionConfig) -> Result<Inputs> {
    let source = input_source(args);
    if let Some(path) = flag_value(args, "--workbook") {
        let book = Workbook::load(path).with_context(|| format!("reading workbook {path}"))?;
        return Ok(Inputs {
            stops: book.sheet(&config.sheets.stops)?.clone(),
            predictions: book.sheet(&config.sheets.predictions)?.clone(),
            source,
        });
    }
    match (flag_value(args, "--stops"), flag_value(args, "--predictions")) {
        (Some(stops), Some(predictions)) => Ok(Inputs {
            stops: read_csv_file(stops).with_context(|| format!("reading stops {stops}"))?,
            predictions: read_csv_file(predictions)
                .with_context(|| format!("reading predictions {predictions}"))?,
            source,
        }),
        _ => bail!("provide --workbook FILE, or both --stops FILE and --predictions FILE"),
    }
}

fn output_path(args: &[String]) -> PathBuf {
    if let Some(out) = flag_value(args, "--out") {
        return PathBuf::from(out);
    }
    let dir = flag_value(args, "--out-dir").unwrap_or("./data");
    Path::new(dir).join(report::output_file_name(Local::now().naive_local(), "csv"))
}

fn run_process(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let out = output_path(args);
    let inputs = match load_inputs(args, &config) {
        Ok(inputs) => inputs,
        Err(e) => {
            write_error_report(&out, &format!("{e:#}"), &input_source(args));
            return Err(e);
        }
    };

    println!("atrisk-runner: process");
    println!("  input:     {}", inputs.source);
    println!("  keys:      {}", config.keys.arity());
    println!("  policy:    {:?}", config.value_policy);
    println!("  output:    {}", out.display());
    println!();

    let attribution = match attribute_risk(&inputs.stops, &inputs.predictions, &config) {
        Ok(a) => a,
        Err(e) => {
            write_error_report(&out, &e.to_string(), &inputs.source);
            return Err(e).context("attribution failed");
        }
    };

    println!("=== RUN SUMMARY ===");
    for line in report::summary_lines(&attribution.diagnostics, attribution.outcome) {
        println!("{line}");
    }

    if attribution.outcome == Outcome::Marked {
        let breakdown = summarize(&attribution.table, &config.keys, &config.visit_sequence)?;
        println!();
        println!("=== AT-RISK STOPS PER TRIP ===");
        println!("{}", render_breakdown(&config.keys, &breakdown));
    }

    ensure_parent(&out)?;
    let table = report::report_table(&attribution)?;
    report::write_table(&out, &table).with_context(|| format!("writing {}", out.display()))?;
    println!();
    println!("Output saved to: {}", out.display());
    Ok(())
}

fn run_overlap(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let inputs = load_inputs(args, &config)?;
    let key_overlap = overlap(&inputs.stops, &inputs.predictions, &config)?;

    println!("=== KEY OVERLAP ===");
    println!("  stops:       {} rows", inputs.stops.len());
    println!("  predictions: {} rows", inputs.predictions.len());
    for line in report::overlap_lines(&key_overlap) {
        println!("{line}");
    }
    Ok(())
}

fn run_generate(args: &[String]) -> Result<()> {
    let seed = parse_arg(args, "--seed", 42u64);
    let out = PathBuf::from(flag_value(args, "--out").unwrap_or("./data/sample_input.json"));

    let book = generate_sample(seed, &SampleSpec::default(), Local::now().naive_local())?;
    ensure_parent(&out)?;
    book.save(&out)
        .with_context(|| format!("writing {}", out.display()))?;

    println!("Sample input written to: {}", out.display());
    for (name, sheet) in &book.sheets {
        println!("  {name}: {} rows", sheet.len());
    }
    Ok(())
}

/// Best effort: the run has already failed, a report that cannot be
/// written is only logged.
fn write_error_report(out: &Path, error: &str, source: &str) {
    let written = report::error_report(error, source, Local::now().naive_local())
        .map_err(anyhow::Error::from)
        .and_then(|table| {
            ensure_parent(out)?;
            report::write_table(out, &table)?;
            Ok(())
        });
    if let Err(e) = written {
        log::warn!("Could not write error report to {}: {e:#}", out.display());
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
