// Market Scale-Up Runner
// Expands scenario files, projects run time from calibration timings and
// checks documents before they are loaded into the browser app.
//
// Usage:
//   scaleup expand study.json --policy interpolate --factor 3 -o study-x3.json
//   scaleup estimate --periods 50 -- _ 500 900 1300
//   scaleup check study.json

mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info};

use report::{ConfigurationReport, CurveSummary, ScaleUpReport};
use smrs_scaleup::scenario::{self, VisualThresholds};
use smrs_scaleup::{estimate, ExpansionFactor, ExpansionPolicy, PeriodTimers, Scenario};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "scaleup", version, about = "Scale market scenarios and estimate run time")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Multiply every configuration's population by an integer factor.
    Expand {
        file: PathBuf,
        #[arg(long, default_value = "interpolate")]
        policy: ExpansionPolicy,
        #[arg(long)]
        factor: f64,
        /// Write the expanded scenario here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Project total run time from per-period timings in milliseconds.
    /// Use `_` for a period with no sample (usually period 0).
    Estimate {
        #[arg(long)]
        periods: u64,
        #[arg(long, default_value_t = 1)]
        configurations: u32,
        #[arg(allow_hyphen_values = true)]
        timers: Vec<String>,
    },
    /// Validate a scenario document and print its scale-up report.
    Check { file: PathBuf },
}

fn parse_timer(s: &str) -> Result<Option<f64>, String> {
    match s {
        "_" | "-" | "" => Ok(None),
        v => v.parse::<f64>().map(Some).map_err(|e| format!("bad timer '{}': {}", v, e)),
    }
}

fn load(path: &Path) -> Result<Scenario, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    scenario::parse_scenario(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn build_report(s: &Scenario, policy: Option<ExpansionPolicy>, factor: Option<ExpansionFactor>) -> ScaleUpReport {
    let configs = scenario::runnable_configurations(s);
    let rows = scenario::population_table(s);
    ScaleUpReport {
        title: s.title.clone(),
        policy: policy.map(ExpansionPolicy::name),
        factor: factor.map(ExpansionFactor::get),
        periods: s.periods(),
        visual_size: s.periods().map(|p| VisualThresholds::default().classify(p)),
        configurations: configs
            .iter()
            .zip(rows)
            .map(|(c, population)| ConfigurationReport {
                population,
                buyer_values: c.buyer_values.as_deref().map(CurveSummary::from_curve),
                seller_costs: c.seller_costs.as_deref().map(CurveSummary::from_curve),
                book_limit: c.book_limit,
            })
            .collect(),
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Expand { file, policy, factor, out } => {
            let original = load(&file)?;
            let factor = ExpansionFactor::try_from(factor).map_err(|e| e.to_string())?;
            let expanded = scenario::expand_scenario(&original, policy, factor).map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&expanded).map_err(|e| e.to_string())?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &json).map_err(|e| format!("{}: {}", path.display(), e))?;
                    info!("wrote '{}' to {}", expanded.title, path.display());
                    let report = build_report(&expanded, Some(policy), Some(factor));
                    let summary = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
                    println!("{}", summary);
                }
                None => println!("{}", json),
            }
        }
        Command::Estimate { periods, configurations, timers } => {
            let samples = timers
                .iter()
                .map(|t| parse_timer(t))
                .collect::<Result<Vec<_>, _>>()?;
            let guess = estimate(&PeriodTimers::from(samples), periods, configurations);
            match guess.millis() {
                Some(ms) => println!("{} ({:.0} ms)", guess, ms),
                None => println!("{}", guess),
            }
        }
        Command::Check { file } => {
            let s = load(&file)?;
            let report = build_report(&s, None, None);
            let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let _ = env_logger::try_init_from_env(Env::default().default_filter_or("info"));
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timer_holes() {
        assert_eq!(parse_timer("_"), Ok(None));
        assert_eq!(parse_timer("500"), Ok(Some(500.0)));
        assert!(parse_timer("abc").is_err());
    }

    #[test]
    fn test_cli_parses_expand() {
        let cli = Cli::try_parse_from(["scaleup", "expand", "s.json", "--policy", "duplicate", "--factor", "2"]).unwrap();
        match cli.command {
            Command::Expand { policy, factor, .. } => {
                assert_eq!(policy, ExpansionPolicy::Duplicate);
                assert_eq!(factor, 2.0);
            }
            _ => panic!("expected expand"),
        }
    }

    #[test]
    fn test_report_summarizes_curves() {
        let s: Scenario = serde_json::from_str(
            r#"{"title":"t","common":{"periods":80},"configurations":[{"buyerValues":[9,7,5],"numberOfBuyers":3}]}"#,
        )
        .unwrap();
        let report = build_report(&s, None, None);
        assert_eq!(report.visual_size, Some(smrs_scaleup::VisualSize::Medium));
        let c = &report.configurations[0];
        assert_eq!(c.buyer_values.as_ref().unwrap().units, 3);
        assert!(c.buyer_values.as_ref().unwrap().non_increasing);
        assert_eq!(c.book_limit, Some(10.0));
    }
}
