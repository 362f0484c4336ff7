mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use smugglers_game::GenerationMode;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::split_csv;
use common::util::load_match_config;
use logic::{
    JsonFileStorage, LogicTester, MatchRecord, PlayStrategy, StrategyResult, resolve_seed_inputs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// One mission per round, sampled for winnability
    Single,
    /// A solo and a cooperative mission every round
    Dual,
}

impl PolicyArg {
    const fn mode(self) -> GenerationMode {
        match self {
            Self::Single => GenerationMode::SingleBestEffort,
            Self::Dual => GenerationMode::FixedDualSlot,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "smugglers-tester", version = "0.1.0")]
#[command(about = "Automated play and balance testing for Galaxy Smugglers")]
struct Args {
    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Strategy played by every other seat
    #[arg(long, default_value = "team-player")]
    opponents: String,

    /// Seeds to run (comma-separated integers or SB-/DS- share codes)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of matches per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Mission generation policy for numeric seeds
    #[arg(long, value_enum, default_value_t = PolicyArg::Single)]
    policy: PolicyArg,

    /// JSON match configuration replacing the policy's preset roster
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory to save every finished match report into
    #[arg(long)]
    save_reports: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let opponents = parse_strategy(&args.opponents)?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let base_config = args.config.as_deref().map(load_match_config).transpose()?;

    let tester = LogicTester::new(args.verbose, args.policy.mode(), opponents)
        .with_base_config(base_config)
        .with_report_storage(args.save_reports.clone().map(JsonFileStorage::new));

    println!("{}", "🚀 Running Strategy Matches".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::with_capacity(strategies.len());
    let mut records = Vec::new();
    for strategy in strategies {
        let (result, strategy_records) =
            tester.run_strategy(strategy, &seed_infos, args.iterations);
        results.push(result);
        records.extend(strategy_records);
    }

    write_reports(&args, &results, &records, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in PlayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🚀 Galaxy Smugglers Automated Tester".bright_cyan().bold());
    println!("{}", "====================================".cyan());
}

fn parse_strategy(token: &str) -> Result<PlayStrategy> {
    PlayStrategy::from_key(token).with_context(|| format!("Unknown strategy: {token}"))
}

fn expand_strategies(strategies_arg: &str) -> Result<Vec<PlayStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(strategies_arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(PlayStrategy::ALL);
        } else {
            strategies.push(parse_strategy(&token)?);
        }
    }
    let mut seen = Vec::with_capacity(strategies.len());
    strategies.retain(|strategy| {
        if seen.contains(strategy) {
            false
        } else {
            seen.push(*strategy);
            true
        }
    });
    if strategies.is_empty() {
        bail!("No strategies selected");
    }
    Ok(strategies)
}

fn write_reports(
    args: &Args,
    results: &[StrategyResult],
    records: &[MatchRecord],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        "csv" => logic::reports::generate_csv_report(&mut output_target, records)?,
        _ => {
            let duration = start_time.elapsed();
            logic::reports::generate_console_report(&mut output_target, results, duration)?;
        }
    }

    if args.report == "console" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
