//! sim-runner: headless runner for the housing market simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --data-dir ./data --out results.bin
//!   sim-runner --seed 12345 --buy-scale 3.5 --hpa-years-to-check 2
//!   sim-runner --data-dir ./data --ipc-mode
//!
//! Every parameter override has a `--kebab-case` flag. Omitted overrides
//! keep the config default.

use anyhow::{Context, Result};
use housing_core::{
    config::SimConfig,
    headless,
    income::IncomeTable,
    overrides::ParamOverrides,
    results::{payload_or_sentinel, ResultMatrix},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Run {
        seed: u64,
        #[serde(default)]
        overrides: ParamOverrides,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct RunReply<'a> {
    seed: u64,
    recorded_steps: usize,
    series: Vec<NamedSeries<'a>>,
}

#[derive(serde::Serialize)]
struct NamedSeries<'a> {
    name: &'static str,
    values: &'a [f64],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");
    let out = args
        .windows(2)
        .find(|w| w[0] == "--out")
        .map(|w| w[1].as_str());
    let overrides = parse_overrides(&args)?;

    let config = SimConfig::load(data_dir)
        .with_context(|| format!("loading config from {data_dir}"))?;
    let table = IncomeTable::load(
        &config.income_table_path(data_dir),
        config.income.rows_per_age_group,
    )
    .context("loading income table")?;

    if ipc_mode {
        return run_ipc_loop(&config, &table);
    }

    println!("Housing market sim-runner");
    println!("  seed:      {seed}");
    println!("  data_dir:  {data_dir}");
    println!("  n_steps:   {}", config.run.n_steps);
    println!("  n_sims:    {}", config.run.n_sims);
    println!();

    let matrix = headless::simulate(config, table, seed, &overrides)?;
    let payload = payload_or_sentinel(matrix.encode());
    if let Some(path) = out {
        std::fs::write(path, &payload).with_context(|| format!("writing {path}"))?;
        println!("Wrote {} bytes to {path}", payload.len());
    }
    print_summary(&matrix);
    Ok(())
}

fn run_ipc_loop(config: &SimConfig, table: &IncomeTable) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Run { seed, overrides } => {
                match headless::simulate(config.clone(), table.clone(), seed, &overrides) {
                    Ok(matrix) => {
                        let reply = build_reply(seed, &matrix);
                        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
                    }
                    Err(e) => {
                        log::error!("Run failed: {e}");
                        let err_json = serde_json::json!({ "error": e.to_string() });
                        writeln!(stdout, "{}", err_json)?;
                    }
                }
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_reply(seed: u64, matrix: &ResultMatrix) -> RunReply<'_> {
    let series: Vec<NamedSeries<'_>> = matrix
        .named()
        .map(|(name, values)| NamedSeries { name, values })
        .collect();
    RunReply {
        seed,
        recorded_steps: series.first().map_or(0, |s| s.values.len()),
        series,
    }
}

fn print_summary(matrix: &ResultMatrix) {
    println!("── Final recorded tick ──────────────────────────");
    for (name, values) in matrix.named() {
        if let Some(last) = values.last() {
            println!("  {name:<24} {last:>16.3}");
        }
    }
}

/// `--buy-scale 3.5` style flags for every override name.
fn parse_overrides(args: &[String]) -> Result<ParamOverrides> {
    let mut overrides = ParamOverrides::default();
    for name in ParamOverrides::NAMES {
        let flag = format!("--{}", name.replace('_', "-"));
        if let Some(w) = args.windows(2).find(|w| w[0] == flag) {
            let value: f64 = w[1]
                .parse()
                .with_context(|| format!("invalid value for {flag}: {}", w[1]))?;
            overrides.set(name, value);
        }
    }
    Ok(overrides)
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
