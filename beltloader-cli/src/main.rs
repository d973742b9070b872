mod loader;
mod reports;
mod scenarios;
mod util;

use anyhow::{Context, Result};
use beltloader_data::{BuildOutput, BuildRequest, DataLoader, LoaderEngine, Settings};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use loader::FileLoader;
use reports::{Report, generate_console_report, generate_json_report, write_variant_list};
use scenarios::{Engine, ScenarioResult, get_scenario, list_scenarios};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "beltloader", version = "0.1.0")]
#[command(about = "Resolve belt loader variants for a set of active add-ons")]
struct Args {
    /// Active add-ons (comma-separated)
    #[arg(long, default_value = "")]
    add_ons: String,

    /// JSON file with add-on settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON record tables to build against (defaults to the bundled tables)
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Prefix for entity and belt names
    #[arg(long)]
    scope: Option<String>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// List every registered variant and exit
    #[arg(long)]
    list_variants: bool,

    /// Acceptance scenarios to run instead of a build (comma-separated, or `all`)
    #[arg(long)]
    scenarios: Option<String>,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if maybe_list_scenarios(&args)? || maybe_list_variants(&args)? {
        return Ok(());
    }

    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let loader = FileLoader::new(args.tables.clone());
    let request = build_request(&args, &loader)?;
    let engine = LoaderEngine::new(loader);

    let (build, results) = match &args.scenarios {
        Some(selection) => (None, run_scenarios(&engine, selection)),
        None => (Some(engine.build(&request)?), Vec::new()),
    };

    write_reports(&args, build.as_ref(), &results)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn maybe_list_variants(args: &Args) -> Result<bool> {
    if !args.list_variants {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_variant_list(output_target.writer(), beltloader_data::builtin_registry())?;
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏭 Beltloader".bright_cyan().bold());
    println!("{}", "=============".cyan());
}

fn build_request(args: &Args, loader: &FileLoader) -> Result<BuildRequest> {
    let settings = match &args.settings {
        Some(path) => loader
            .load_config::<Settings>(&path.to_string_lossy())
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::new(),
    };
    let mut request = BuildRequest::new()
        .with_add_ons(split_csv(&args.add_ons))
        .with_settings(settings);
    if let Some(scope) = &args.scope {
        request = request.with_scope(scope.clone());
    }
    Ok(request)
}

fn expand_scenarios(selection: &str) -> Vec<String> {
    let mut scenarios = split_csv(selection);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_scenarios(engine: &Engine<'_>, selection: &str) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for name in expand_scenarios(selection) {
        if let Some(scenario) = get_scenario(&name) {
            results.push(scenario.run(engine));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
        }
    }
    results
}

fn write_reports(
    args: &Args,
    build: Option<&BuildOutput>,
    results: &[ScenarioResult],
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let report = Report {
        build,
        scenarios: results,
    };

    match args.report.as_str() {
        "json" => generate_json_report(&mut output_target, &report)?,
        _ => {
            if build.is_none() && results.is_empty() {
                writeln!(&mut output_target, "Nothing to report.")?;
            } else {
                generate_console_report(&mut output_target, &report)?;
            }
        }
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
