//! Command definition and dispatch

use crate::load::{
    read_batch, PolicyInputs, ASSERTIONS_ENV, DEFAULT_ASSERTIONS_FILE, DEFAULT_STEPS_FILE,
    STEPS_ENV,
};
use crate::output::{compile_summary, render_compile_text};
use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rulebook_compliance::{CompliancePipeline, PipelineOptions};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn rulebook_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("steps")
                .long("steps")
                .env(STEPS_ENV)
                .default_value(DEFAULT_STEPS_FILE)
                .value_parser(value_parser!(PathBuf))
                .help("Step rulebook, one template per line"),
        )
        .arg(
            Arg::new("assertions")
                .long("assertions")
                .env(ASSERTIONS_ENV)
                .default_value(DEFAULT_ASSERTIONS_FILE)
                .value_parser(value_parser!(PathBuf))
                .help("Assertion rulebook, one template per line"),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .value_parser(value_parser!(PathBuf))
                .help("Policy settings file (.yaml, .toml or .json)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
}

/// The `rulebook-lint` command tree
#[must_use]
pub fn build_command() -> Command {
    Command::new("rulebook-lint")
        .version(crate::VERSION)
        .about("Compile rulebooks and check generated Gherkin scenarios against them")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format on stderr"),
        )
        .subcommand(rulebook_args(
            Command::new("compile").about("Compile the rulebooks and print the policy"),
        ))
        .subcommand(
            rulebook_args(Command::new("check").about("Check a batch of scenario records"))
                .arg(
                    Arg::new("batch")
                        .long("batch")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of scenario records"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .help("Process scenarios one at a time"),
                )
                .arg(
                    Arg::new("skip-grammar")
                        .long("skip-grammar")
                        .action(ArgAction::SetTrue)
                        .help("Do not run the Gherkin grammar validator"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the batch with canonical text to this file"),
                ),
        )
}

/// Install the stderr subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = installed {
        eprintln!("tracing subscriber not installed: {e}");
    }
}

fn policy_inputs(args: &ArgMatches) -> PolicyInputs {
    let path = |id: &str, fallback: &str| {
        args.get_one::<PathBuf>(id)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(fallback))
    };
    PolicyInputs {
        steps: path("steps", DEFAULT_STEPS_FILE),
        assertions: path("assertions", DEFAULT_ASSERTIONS_FILE),
        settings: args.get_one::<PathBuf>("policy").cloned(),
    }
}

fn run_compile(args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let policy = policy_inputs(args).load()?;
    if args.get_flag("json") {
        let summary = serde_json::to_string_pretty(&compile_summary(&policy))?;
        writeln!(out, "{summary}")?;
    } else {
        write!(out, "{}", render_compile_text(&policy))?;
    }
    Ok(true)
}

fn run_check(args: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    let policy = policy_inputs(args).load()?;
    let Some(batch_path) = args.get_one::<PathBuf>("batch") else {
        bail!("--batch is required");
    };
    let mut records = read_batch(batch_path)?;

    let mut options = PipelineOptions::default().with_grammar(!args.get_flag("skip-grammar"));
    options.parallel = !args.get_flag("sequential");
    let report = CompliancePipeline::new(&policy)
        .with_options(options)
        .run(&mut records);

    if let Some(output) = args.get_one::<PathBuf>("output") {
        let canonical = serde_json::to_string_pretty(&records)?;
        fs::write(output, canonical)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!("Wrote canonical batch to {}", output.display());
    }

    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(out, "{}", report.render_text())?;
    }
    Ok(report.is_clean())
}

/// Run the selected subcommand, writing its output to `out`
///
/// Returns whether the run was clean: always `true` for `compile`, and
/// whether the report holds no issues for `check`.
///
/// # Errors
/// Unreadable settings or batch files, malformed JSON, and output failures
pub fn execute(matches: &ArgMatches, out: &mut dyn Write) -> Result<bool> {
    match matches.subcommand() {
        Some(("compile", args)) => run_compile(args, out),
        Some(("check", args)) => run_check(args, out),
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}
