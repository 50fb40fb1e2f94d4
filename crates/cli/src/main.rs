mod corpus;
mod render;

use std::collections::BTreeSet;
use std::fs;
use std::process;

use anyhow::{Context, Result};
use arcparse_config::{ConfigError, ParserConfig, load_config_from_str};
use arcparse_core::{Tree, replay_oracle};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::corpus::{parse_corpus, to_tree};
use crate::render::{Format, print_summary, render_error, render_json_error};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "ARCPARSE_LOG";

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "arcparse",
    version,
    about = "arcparse: check transition-system oracles and parser configs against gold corpora"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log more (-v info, -vv debug, -vvv trace). ARCPARSE_LOG overrides.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Replay the oracle over a JSON gold corpus and check every tree is
    /// rebuilt exactly. Exits 1 if any sentence is not reproduced.
    Oracle {
        file: String,
        /// Parser configuration JSON; defaults apply when omitted.
        #[arg(long)]
        config: Option<String>,
        /// Print each sentence's transition history.
        #[arg(long)]
        history: bool,
    },

    /// List the transition labels the oracle emits over a corpus, i.e. the
    /// label inventory a model needs.
    Labels {
        file: String,
        /// Parser configuration JSON (see `oracle --help`).
        #[arg(long)]
        config: Option<String>,
    },

    /// Validate a parser configuration file and print the effective config.
    CheckConfig { file: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Oracle {
            file,
            config,
            history,
        } => cmd_oracle(&file, config.as_deref(), history, format)?,
        Cmd::Labels { file, config } => cmd_labels(&file, config.as_deref(), format)?,
        Cmd::CheckConfig { file } => cmd_check_config(&file, format)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_oracle(file: &str, config_path: Option<&str>, history: bool, format: Format) -> Result<()> {
    let config = resolve_config(config_path, format)?;
    let trees = load_corpus(file, format)?;
    let sentences = trees.len();
    info!(sentences, file, "replaying oracle");

    let mut reports = Vec::with_capacity(trees.len());
    let (mut failed, mut truncated) = (0usize, 0usize);
    for (i, mut tree) in trees.into_iter().enumerate() {
        let sentence = i + 1;
        let replay = replay_oracle(&mut tree, &config);
        let ok = replay.reproduces_gold() && !replay.truncated;
        failed += usize::from(!ok);
        truncated += usize::from(replay.truncated);
        debug!(sentence, steps = replay.steps, ok, "replayed sentence");

        match format {
            Format::Json => {
                let mut report = serde_json::json!({
                    "sentence": sentence,
                    "tokens": tree.token_count(),
                    "steps": replay.steps,
                    "reproduced": replay.reproduces_gold(),
                    "truncated": replay.truncated,
                    "mismatches": replay.mismatches(),
                });
                if history {
                    report["history"] = serde_json::to_value(&replay.history)?;
                }
                reports.push(report);
            }
            Format::Pretty => {
                if history {
                    println!("# sentence {sentence}");
                    for record in &replay.history {
                        println!("{record}");
                    }
                }
                if !ok {
                    render_error(&format!(
                        "sentence {sentence}: oracle did not rebuild tokens {:?}{}",
                        replay.mismatches(),
                        if replay.truncated { " (step ceiling hit)" } else { "" }
                    ));
                }
            }
        }
    }

    let reproduced = sentences - failed;
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": failed == 0,
                "reproduced": reproduced,
                "failed": failed,
                "truncated": truncated,
                "sentences": reports,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => print_summary(reproduced, failed, truncated),
    }

    if failed > 0 {
        process::exit(1);
    }
    Ok(())
}

fn cmd_labels(file: &str, config_path: Option<&str>, format: Format) -> Result<()> {
    let config = resolve_config(config_path, format)?;
    let trees = load_corpus(file, format)?;

    let mut labels = BTreeSet::new();
    for mut tree in trees {
        let replay = replay_oracle(&mut tree, &config);
        labels.extend(replay.labels.iter().map(ToString::to_string));
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&labels)?),
        Format::Pretty => {
            for label in &labels {
                println!("{label}");
            }
            eprintln!("{} labels", labels.len());
        }
    }
    Ok(())
}

fn cmd_check_config(file: &str, format: Format) -> Result<()> {
    let source = fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;
    match load_config_from_str(&source) {
        Ok(config) => {
            match format {
                Format::Json => {
                    let out = serde_json::json!({ "ok": true, "config": config });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                Format::Pretty => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                    eprintln!("config ok");
                }
            }
            Ok(())
        }
        Err(err) => {
            report_config_error(&source, file, &err, format);
            process::exit(1);
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Load the config at `path`, or the defaults when no path is given.
/// Invalid files are reported and the process exits with code 1.
fn resolve_config(path: Option<&str>, format: Format) -> Result<ParserConfig> {
    let Some(path) = path else {
        return Ok(ParserConfig::default());
    };
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    match load_config_from_str(&source) {
        Ok(config) => Ok(config),
        Err(err) => {
            report_config_error(&source, path, &err, format);
            process::exit(1);
        }
    }
}

fn report_config_error(source: &str, file: &str, err: &ConfigError, format: Format) {
    match (format, err) {
        (Format::Json, ConfigError::InvalidJson(e)) => {
            let out = serde_json::json!({
                "ok": false,
                "file": file,
                "error": err.to_string(),
                "line": e.line(),
                "column": e.column(),
            });
            println!("{out:#}");
        }
        (Format::Json, _) => {
            let out = serde_json::json!({ "ok": false, "file": file, "error": err.to_string() });
            println!("{out:#}");
        }
        (Format::Pretty, ConfigError::InvalidJson(e)) => render_json_error(source, file, e),
        (Format::Pretty, _) => render_error(&format!("{file}: {err}")),
    }
}

/// Read and convert a gold corpus. Malformed JSON is rendered against the
/// source and the process exits with code 1.
fn load_corpus(path: &str, format: Format) -> Result<Vec<Tree>> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let sentences = match parse_corpus(&source) {
        Ok(sentences) => sentences,
        Err(e) => {
            match format {
                Format::Json => {
                    let out = serde_json::json!({
                        "ok": false,
                        "file": path,
                        "error": e.to_string(),
                        "line": e.line(),
                        "column": e.column(),
                    });
                    println!("{out:#}");
                }
                Format::Pretty => render_json_error(&source, path, &e),
            }
            process::exit(1);
        }
    };
    sentences
        .iter()
        .enumerate()
        .map(|(i, tokens)| to_tree(i + 1, tokens))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid gold corpus {path}"))
}
