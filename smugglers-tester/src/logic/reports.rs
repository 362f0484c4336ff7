use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::{MatchRecord, StrategyResult};

fn pass_counts(results: &[StrategyResult]) -> (usize, usize, f64) {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let rate = smugglers_game::numbers::ratio(passed, total) * 100.0;
    (total, passed, rate)
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[StrategyResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Strategy Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let (total, passed, success_rate) = pass_counts(results);
    writeln!(out, "Total strategies: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {success_rate:.1}%")?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        let stats = &result.stats;

        writeln!(out, "{} {}", status, result.strategy_name.bold())?;
        writeln!(
            out,
            "   Matches: {}/{} clean",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Win rate: {:.1}% | Mean rounds: {:.1} | Mean credits: {:.1}",
            stats.win_rate * 100.0,
            stats.mean_rounds,
            stats.mean_final_credits
        )?;
        writeln!(
            out,
            "   Convoy success: {:.1}% | Freeride share: {:.1}%",
            stats.convoy_success_rate * 100.0,
            stats.freeride_share * 100.0
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let best = results.iter().max_by(|a, b| {
        a.stats
            .win_rate
            .total_cmp(&b.stats.win_rate)
            .then(b.strategy_name.cmp(&a.strategy_name))
    });
    if let Some(best) = best {
        writeln!(out, "{}", "🏆 Top Strategy".bright_yellow().bold())?;
        writeln!(out, "{}", "===============".yellow())?;
        writeln!(
            out,
            "{} ({:.1}% wins over {} matches)",
            best.strategy_name.green(),
            best.stats.win_rate * 100.0,
            best.stats.matches
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(out: &mut W, results: &[StrategyResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(out: &mut W, results: &[StrategyResult]) -> Result<()> {
    writeln!(out, "# Galaxy Smugglers Strategy Results\n")?;

    let (total, passed, success_rate) = pass_counts(results);
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total strategies**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {success_rate:.1}%\n")?;

    writeln!(out, "## Outcomes\n")?;
    writeln!(
        out,
        "| Strategy | Matches | Win rate | Mean rounds | Convoy success | Freeride share |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for result in results {
        let stats = &result.stats;
        writeln!(
            out,
            "| {} | {} | {:.1}% | {:.1} | {:.1}% | {:.1}% |",
            result.strategy_name,
            stats.matches,
            stats.win_rate * 100.0,
            stats.mean_rounds,
            stats.convoy_success_rate * 100.0,
            stats.freeride_share * 100.0
        )?;
    }
    writeln!(out)?;

    for result in results.iter().filter(|r| !r.failures.is_empty()) {
        writeln!(out, "### ❌ {}\n", result.strategy_name)?;
        for failure in &result.failures {
            writeln!(out, "- {failure}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One row per match; the header comes from `MatchRecord`'s field names.
pub fn generate_csv_report<W: Write>(out: &mut W, records: &[MatchRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::StrategyStats;
    use smugglers_game::GenerationMode;

    fn sample_result(name: &str, passed: bool, win_rate: f64) -> StrategyResult {
        StrategyResult {
            strategy_name: name.to_string(),
            passed,
            iterations_run: 4,
            successful_iterations: if passed { 4 } else { 3 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["seed 9 broke".to_string()]
            },
            average_duration: Duration::from_millis(3),
            stats: StrategyStats {
                matches: 4,
                wins: 2,
                win_rate,
                mean_rounds: 12.5,
                mean_final_credits: 88.0,
                convoy_success_rate: 0.5,
                freeride_share: 0.25,
            },
        }
    }

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_names_the_top_strategy() {
        colored::control::set_override(false);
        let results = [
            sample_result("Cautious", true, 0.25),
            sample_result("Team Player", false, 0.75),
        ];
        let text = render(|out| generate_console_report(out, &results, Duration::from_secs(1)));
        assert!(text.contains("Strategy Results Summary"));
        assert!(text.contains("Win rate: 75.0%"));
        assert!(text.contains("Team Player (75.0% wins over 4 matches)"));
        assert!(text.contains("seed 9 broke"));
    }

    #[test]
    fn markdown_report_tabulates_each_strategy() {
        let results = [sample_result("Freerider", true, 0.0)];
        let text = render(|out| generate_markdown_report(out, &results));
        assert!(text.starts_with("# Galaxy Smugglers Strategy Results"));
        assert!(text.contains("| Freerider | 4 | 0.0% | 12.5 | 50.0% | 25.0% |"));
    }

    #[test]
    fn json_report_keeps_field_names() {
        let results = [sample_result("Gambler", true, 0.5)];
        let text = render(|out| generate_json_report(out, &results));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["strategy_name"], "Gambler");
        assert_eq!(value[0]["average_duration"], 3);
        assert_eq!(value[0]["stats"]["wins"], 2);
    }

    fn sample_record(strategy: &str) -> MatchRecord {
        MatchRecord {
            strategy: strategy.to_string(),
            policy: GenerationMode::SingleBestEffort,
            seed_code: "SB-NEBULA42".to_string(),
            seed: 42,
            rounds: 10,
            won: false,
            outcome: "round limit".to_string(),
            final_credits: 64,
            convoy_runs: 0,
            convoy_successes: 0,
            freerides: 0,
            decisions: 10,
        }
    }

    #[test]
    fn csv_report_quotes_fields_with_separators() {
        let record = sample_record("Bold, \"Solo\"");
        let text = render(|out| generate_csv_report(out, &[record]));
        let row = text.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "\"Bold, \"\"Solo\"\"\",single_best_effort,SB-NEBULA42,42,10,false,round limit,64,0,0,0,10"
        );

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let parsed: Vec<MatchRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].strategy, "Bold, \"Solo\"");
        assert_eq!(parsed[0].policy, GenerationMode::SingleBestEffort);
    }

    #[test]
    fn csv_report_writes_header_and_rows() {
        let record = sample_record("Bold Solo");
        let text = render(|out| generate_csv_report(out, &[record]));
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("strategy,policy,seed_code"));
        assert_eq!(
            lines.next().unwrap(),
            "Bold Solo,single_best_effort,SB-NEBULA42,42,10,false,round limit,64,0,0,0,10"
        );
    }
}
