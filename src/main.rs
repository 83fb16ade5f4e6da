use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use loopos::flow::{LoopConfig, LoopGraph, RunReport};
use loopos::metrics::{calibration_report, compute_rbb, compute_tofu};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, LoopArgs, ScoreCommands};
use config::Config;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loopos")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("loopos.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run { prompt, loop_args, json } => handle_run_command(prompt, loop_args, *json, config),
        Commands::Steps { loop_args } => handle_steps_command(loop_args, config),
        Commands::Score { command, json } => handle_score_command(command, *json),
    }
}

fn resolve_loop_config(loop_args: &LoopArgs, config: &Config) -> Result<LoopConfig> {
    let loop_config = config.loop_config(loop_args.deep_mode(), loop_args.depth)?;
    info!(
        "Resolved loop config: deep_mode={}, loop_depth={}",
        loop_config.deep_mode(),
        loop_config.loop_depth()
    );
    Ok(loop_config)
}

fn handle_run_command(prompt: &str, loop_args: &LoopArgs, json: bool, config: &Config) -> Result<()> {
    let graph = LoopGraph::new(resolve_loop_config(loop_args, config)?);
    let report = graph.run_report(prompt).context("Failed to build run report")?;

    if json {
        println!("{}", report.to_json().context("Failed to serialize run report")?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let state = &report.state;
    println!("{} {}", "Steps:".cyan(), report.steps.join(" -> "));

    let fields = [
        ("generation", state.generation()),
        ("verification", state.verification()),
        ("critique", state.critique()),
        ("refinement", state.refinement()),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            println!("{}", format!("[{}]", name).green());
            println!("{}", value);
        }
    }

    match state.final_output() {
        Some(output) => {
            println!("{}", "[final_output]".green().bold());
            println!("{}", output);
        }
        None => {
            println!(
                "{}",
                "Warning: deep run stopped before refinement; no final output was produced".yellow()
            );
        }
    }
    println!("{} {}", "Fingerprint:".dimmed(), report.fingerprint);
}

fn handle_steps_command(loop_args: &LoopArgs, config: &Config) -> Result<()> {
    let loop_config = resolve_loop_config(loop_args, config)?;
    let graph = LoopGraph::new(loop_config);

    let mode = if loop_config.deep_mode() { "deep" } else { "shallow" };
    println!(
        "{} {} mode, loop_depth {}",
        "Plan:".cyan(),
        mode,
        loop_config.loop_depth()
    );
    for step in graph.selected_steps() {
        println!("  {}", step.kind());
    }
    if loop_config.deep_mode() && !loop_config.reaches_refinement() {
        println!("{}", "Warning: refinement never runs; final output will be empty".yellow());
    }
    Ok(())
}

fn print_score<T: Serialize + std::fmt::Debug>(score: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(score).context("Failed to serialize score")?);
    } else {
        println!("{:#?}", score);
    }
    Ok(())
}

fn handle_score_command(command: &ScoreCommands, json: bool) -> Result<()> {
    info!("Scoring: {:?}", command);
    match command {
        ScoreCommands::Ece {
            probabilities,
            labels,
            bins,
        } => {
            let report = calibration_report(probabilities, labels, *bins).context("ECE computation failed")?;
            if json {
                return print_score(&report, true);
            }
            println!("{} {:.6}", "ECE:".green(), report.ece);
            for bin in &report.bins {
                println!(
                    "  ({:.2}, {:.2}] n={} confidence={:.4} accuracy={:.4}",
                    bin.lower, bin.upper, bin.count, bin.avg_confidence, bin.avg_accuracy
                );
            }
            Ok(())
        }
        ScoreCommands::Rbb { text } => {
            let score = compute_rbb(text).context("RBB computation failed")?;
            print_score(&score, json)
        }
        ScoreCommands::Tofu { text, stopwords } => {
            let custom: Vec<&str> = stopwords.iter().map(String::as_str).collect();
            let score = compute_tofu(text, Some(custom.as_slice())).context("TOFU computation failed")?;
            print_score(&score, json)
        }
    }
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
