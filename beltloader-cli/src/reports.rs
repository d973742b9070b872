use anyhow::Result;
use beltloader_data::{BuildOutput, VariantRegistry};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use crate::scenarios::ScenarioResult;

/// Everything one invocation produced.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<&'a BuildOutput>,
    #[serde(skip_serializing_if = "no_scenarios")]
    pub scenarios: &'a [ScenarioResult],
}

fn no_scenarios(results: &&[ScenarioResult]) -> bool {
    results.is_empty()
}

pub fn generate_json_report<W: Write + ?Sized>(writer: &mut W, report: &Report<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    report: &Report<'_>,
) -> Result<()> {
    if let Some(build) = report.build {
        write_build(writer, build)?;
    }
    if !report.scenarios.is_empty() {
        write_scenarios(writer, report.scenarios)?;
    }
    Ok(())
}

fn write_build<W: Write + ?Sized>(writer: &mut W, build: &BuildOutput) -> Result<()> {
    writeln!(writer, "{}", "📦 Loader Variants".bright_cyan().bold())?;
    writeln!(writer, "{}", "==================".cyan())?;
    let active: Vec<&str> = build.flags.active().map(|mode| mode.as_str()).collect();
    writeln!(writer, "Active modes: {}", active.join(", "))?;
    if let Some(scope) = &build.scope {
        writeln!(writer, "Scope: {scope}")?;
    }
    writeln!(writer, "Built: {}", build.len().to_string().green())?;
    writeln!(writer)?;

    for record in &build.records {
        writeln!(writer, "{} ({})", record.name.bold(), record.key)?;
        writeln!(
            writer,
            "   Speed: {}  Stack: {}  Subgroup: {}",
            record.speed, record.stack_size, record.subgroup
        )?;
        let ingredients: Vec<String> = record
            .ingredients
            .iter()
            .map(|ingredient| format!("{} x{}", ingredient.name, ingredient.amount))
            .collect();
        writeln!(writer, "   Ingredients: {}", ingredients.join(", "))?;
        if !record.prerequisites.is_empty() {
            writeln!(writer, "   Requires: {}", record.prerequisites.join(", "))?;
        }
        if let Some(from) = &record.upgrade_from {
            writeln!(writer, "   Upgrades from: {from}")?;
        }
        if let Some(next) = &record.next_upgrade {
            writeln!(writer, "   Next upgrade: {next}")?;
        }
        if let Some(energy) = &record.heating_energy {
            writeln!(writer, "   Heating: {energy}")?;
        }
        for (name, value) in &record.extras {
            writeln!(writer, "   {name}: {value}")?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn write_scenarios<W: Write + ?Sized>(writer: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(writer, "{}", "📊 Scenario Results".bright_cyan().bold())?;
    writeln!(writer, "{}", "===================".cyan())?;
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(writer, "Passed: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", (results.len() - passed).to_string().red())?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            writer,
            "{} {} ({:.2} ms)",
            status,
            result.scenario.bold(),
            result.duration_ms
        )?;
        if let Some(failure) = &result.failure {
            writeln!(writer, "     • {}", failure.red())?;
        }
    }
    Ok(())
}

/// Table of every registered variant and the predicate gating it.
pub fn write_variant_list<W: Write + ?Sized>(
    writer: &mut W,
    registry: &VariantRegistry,
) -> Result<()> {
    writeln!(writer, "Registered variants:")?;
    for spec in registry.iter() {
        let from = spec
            .upgrade_from()
            .map_or_else(String::new, |key| format!(" <- {key}"));
        writeln!(
            writer,
            "  {:25} {}{from}",
            spec.key().entity_name(),
            spec.predicate()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltloader_data::{Environment, RecordTables, builtin_registry, run};

    fn base_build() -> BuildOutput {
        let mut tables = RecordTables::bundled();
        run(builtin_registry(), &Environment::default(), &mut tables, None).unwrap()
    }

    #[test]
    fn console_report_lists_each_record() {
        colored::control::set_override(false);
        let build = base_build();
        let report = Report {
            build: Some(&build),
            scenarios: &[],
        };
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Active modes: base"));
        assert!(text.contains("fast-mdrn-loader (fast)"));
        assert!(text.contains("Next upgrade: express-mdrn-loader"));
        assert!(!text.contains("Scenario Results"));
    }

    #[test]
    fn json_report_skips_empty_sections() {
        let report = Report {
            build: None,
            scenarios: &[],
        };
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn variant_list_shows_predicates_and_predecessors() {
        let mut buf = Vec::new();
        write_variant_list(&mut buf, builtin_registry()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("mdrn-loader"));
        assert!(text.contains("stack-mdrn-loader"));
        assert!(text.contains("<- turbo"));
        assert!(text.contains("setting[kr-loaders]"));
    }
}
