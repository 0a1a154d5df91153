use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use school_timetabler::config::{SolverConfig, Strategy};
use school_timetabler::model::compiler::compile;
use school_timetabler::model::feasibility;
use school_timetabler::parser::{load_instance_from_dir, validate_instance};
use school_timetabler::report::{generate_json_summary, generate_reports, print_summary, OutputFormat, SolverReport};
use school_timetabler::solver::orchestrator;
use school_timetabler::types::Instance;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

#[derive(Parser)]
#[command(name = "school-timetabler")]
#[command(about = "School-timetable scheduling solver core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run with bundled sample data
    Demo {
        /// Strategy override: repair, tabu, alns, or cp
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Compile and solve an instance
    Solve {
        /// Directory containing the seven entity JSON files and config.toml
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory for report files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output, print a JSON summary only
        #[arg(short, long)]
        quiet: bool,

        /// Strategy override: repair, tabu, alns, or cp
        #[arg(long)]
        strategy: Option<String>,

        /// Wall-clock budget override, in seconds
        #[arg(long)]
        time_limit: Option<u64>,
    },

    /// Structurally validate an instance and run the feasibility pre-analyzer
    Validate {
        /// Directory containing the seven entity JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Show per-teacher load detail
        #[arg(short, long)]
        verbose: bool,
    },

    /// Solve and print a single report format to stdout
    Report {
        /// Directory containing the seven entity JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Output format: json, markdown, or text
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { strategy } => run_demo(strategy),
        Commands::Solve {
            data,
            output,
            format,
            quiet,
            strategy,
            time_limit,
        } => run_solve(&data, &output, &format, quiet, strategy, time_limit),
        Commands::Validate { data, verbose } => run_validate(&data, verbose),
        Commands::Report { data, format } => run_report(&data, &format),
    }
}

fn run_demo(strategy: Option<String>) -> Result<()> {
    println!("{}", "School Timetabler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("demos/sample");
    let output_path = PathBuf::from("output");

    if !demo_path.join("teachers.json").exists() {
        println!("{}", "Demo data not found, creating sample instance...".yellow());
        create_demo_data(&demo_path)?;
    }

    let mut instance = load_instance_from_dir(&demo_path).context("failed to load demo data")?;
    apply_strategy_override(&mut instance.config, strategy.as_deref())?;

    run_pipeline(
        &instance,
        &output_path,
        &[OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text],
        false,
    )
}

fn run_solve(
    data: &Path,
    output: &Path,
    format: &str,
    quiet: bool,
    strategy: Option<String>,
    time_limit: Option<u64>,
) -> Result<()> {
    let mut instance = load_instance_from_dir(data).context("failed to load input data")?;
    apply_strategy_override(&mut instance.config, strategy.as_deref())?;
    if let Some(seconds) = time_limit {
        instance.config.time_limit_seconds = seconds;
    }

    let formats = parse_formats(format);
    run_pipeline(&instance, output, &formats, quiet)
}

fn run_pipeline(instance: &Instance, output: &Path, formats: &[OutputFormat], quiet: bool) -> Result<()> {
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    progress.set_message("Validating instance...");
    progress.set_position(10);
    let validation = validate_instance(instance)?;
    if !validation.is_valid() {
        for error in &validation.errors {
            eprintln!("{} {}", "error:".red().bold(), error);
        }
        anyhow::bail!("instance failed structural validation");
    }
    if !quiet {
        for warning in &validation.warnings {
            println!("{} {}", "warning:".yellow(), warning);
        }
    }

    progress.set_message("Compiling model...");
    progress.set_position(30);
    let model = compile(instance).context("failed to compile instance")?;

    progress.set_message("Pre-analyzing feasibility...");
    progress.set_position(45);
    let feasibility_report = feasibility::analyze(&model);
    if !quiet {
        for warning in &feasibility_report.warnings {
            println!("{} {}", "warning:".yellow(), warning);
        }
        println!(
            "Compiled {} lesson unit(s) across {} teacher(s), {} classroom(s)",
            model.units.len(),
            model.teachers.len(),
            model.classrooms.len()
        );
        println!("\nSolving ({:?})...\n", instance.config.strategy);
    }
    if feasibility_report.overloaded {
        progress.finish_and_clear();
        for warning in &feasibility_report.warnings {
            eprintln!("{} {}", "error:".red().bold(), warning);
        }
        anyhow::bail!("feasibility pre-analysis found an overloaded teacher; refusing to start search");
    }

    progress.set_message(format!("Solving ({:?})...", instance.config.strategy));
    progress.set_position(55);
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &instance.config, &cancel)?;
    let report = SolverReport::new(&outcome, instance, &model, Utc::now());

    progress.set_message("Rendering report...");
    progress.set_position(90);
    if quiet {
        println!("{}", generate_json_summary(&report)?);
    } else {
        print_summary(&report);
    }

    generate_reports(&report, output, formats)?;
    progress.set_position(100);
    progress.finish_and_clear();
    if !quiet {
        println!("Reports written to: {}", output.display().to_string().green());
    }

    Ok(())
}

fn run_validate(data: &Path, verbose: bool) -> Result<()> {
    let instance = load_instance_from_dir(data).context("failed to load input data")?;

    let validation = validate_instance(&instance)?;
    if validation.is_valid() {
        println!("{}", "✓ Instance is structurally valid".green().bold());
    } else {
        println!("{}", "✗ Instance has structural errors".red().bold());
        for error in &validation.errors {
            println!("  - {}", error.red());
        }
    }
    for warning in &validation.warnings {
        println!("  ! {}", warning.yellow());
    }

    if !validation.is_valid() {
        return Ok(());
    }

    let model = compile(&instance).context("failed to compile instance")?;
    let feasibility_report = feasibility::analyze(&model);

    println!();
    if feasibility_report.overloaded {
        println!("{}", "✗ Feasibility pre-analysis found overloaded teacher(s)".red().bold());
    } else {
        println!("{}", "✓ Feasibility pre-analysis found no necessary-condition violations".green());
    }
    for warning in &feasibility_report.warnings {
        println!("  ! {}", warning.yellow());
    }

    if verbose {
        println!("\n{}", "Teacher load:".bold());
        for (idx, teacher) in model.teachers.iter().enumerate() {
            if let Some((demand, capacity)) = feasibility_report.teacher_load.get(&idx) {
                println!("  {}: {} sole-candidate hour(s) / {} available", teacher.id, demand, capacity);
            }
        }
        println!("\n{}", "Lesson units:".bold());
        println!("  total: {}", model.units.len());
    }

    Ok(())
}

fn run_report(data: &Path, format: &str) -> Result<()> {
    let instance = load_instance_from_dir(data).context("failed to load input data")?;
    let model = compile(&instance).context("failed to compile instance")?;
    let cancel = AtomicBool::new(false);
    let outcome = orchestrator::run(&model, &instance.config, &cancel)?;
    let report = SolverReport::new(&outcome, &instance, &model, Utc::now());

    let rendered = match format.to_lowercase().as_str() {
        "json" => generate_json_summary(&report)?,
        "markdown" | "md" => school_timetabler::report::generate_markdown_report(&report),
        _ => school_timetabler::report::generate_text_report(&report),
    };
    println!("{rendered}");
    Ok(())
}

fn apply_strategy_override(config: &mut SolverConfig, strategy: Option<&str>) -> Result<()> {
    let Some(strategy) = strategy else { return Ok(()) };
    config.strategy = match strategy.to_lowercase().as_str() {
        "repair" => Strategy::Repair,
        "tabu" => Strategy::Tabu,
        "alns" => Strategy::Alns,
        "cp" => Strategy::Cp,
        other => anyhow::bail!("unknown strategy '{other}', expected repair/tabu/alns/cp"),
    };
    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format.eq_ignore_ascii_case("all") {
        return vec![OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        })
        .collect()
}

/// A small bundled instance so `demo` works without any external data.
fn create_demo_data(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let teachers = serde_json::json!([
        {"id": "t-ada", "name": "Ada Lovelace", "branches": ["Matematik"], "levels": ["high"], "availability": [8191, 8191, 8191, 8191, 8191]},
        {"id": "t-grace", "name": "Grace Hopper", "branches": ["Fizik"], "levels": ["high"], "availability": [8191, 8191, 8191, 8191, 8191]},
        {"id": "t-alan", "name": "Alan Turing", "branches": ["Matematik", "Bilgisayar"], "levels": ["high", "middle"], "availability": [8191, 8191, 8191, 8191, 8191]}
    ]);
    std::fs::write(path.join("teachers.json"), serde_json::to_string_pretty(&teachers)?)?;

    let classrooms = serde_json::json!([
        {"id": "9a", "name": "9A", "level": "high"},
        {"id": "9b", "name": "9B", "level": "high"}
    ]);
    std::fs::write(path.join("classrooms.json"), serde_json::to_string_pretty(&classrooms)?)?;

    let subjects = serde_json::json!([
        {"id": "mat", "name": "Matematik", "weeklyHours": 5, "assignedClassIds": ["9a", "9b"], "requiredTeacherCount": 1},
        {"id": "fiz", "name": "Fizik", "weeklyHours": 4, "blockHours": 2, "assignedClassIds": ["9a", "9b"], "requiredTeacherCount": 1}
    ]);
    std::fs::write(path.join("subjects.json"), serde_json::to_string_pretty(&subjects)?)?;

    let locations: serde_json::Value = serde_json::json!([]);
    std::fs::write(path.join("locations.json"), serde_json::to_string_pretty(&locations)?)?;

    let time_grid = serde_json::json!({
        "middle": [6, 6, 6, 6, 6],
        "high": [7, 7, 7, 7, 6]
    });
    std::fs::write(path.join("time_grid.json"), serde_json::to_string_pretty(&time_grid)?)?;

    std::fs::write(
        path.join("config.toml"),
        "strategy = \"repair\"\ntimeLimitSeconds = 10\ndisableLns = false\n",
    )?;

    println!("{}", "Demo data created in demos/sample".green());
    Ok(())
}
