// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
//! Binary entry point for pii-redactor.
//!
//! `redact` replaces PII with numbered placeholders and saves the mapping;
//! `reverse` restores text from that mapping.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pii_redactor::redactor::detector::{
    CommandEntitySource, FileEntitySource, PatternEntitySource,
};
use pii_redactor::redactor::mapping::{load_mapping, save_mapping};
use pii_redactor::redactor::redaction::{find_placeholders, fingerprint, redact};
use pii_redactor::redactor::reversal::reverse;
use pii_redactor::{EntitySource, RedactorConfig, RedactorError, Result};

const DEFAULT_MAPPING_FILE: &str = ".raycast-pii-mapping.json";

/// Reversible PII redaction with typed, numbered placeholders.
#[derive(Parser)]
#[command(name = "pii-redactor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Replace PII with placeholders and save the mapping.
    Redact {
        #[command(flatten)]
        io: IoArgs,

        /// Read entity spans from a JSON file instead of detecting them.
        #[arg(long, conflicts_with = "ner_command")]
        entities: Option<PathBuf>,

        /// External entity recognizer and its arguments, e.g.
        /// `--ner-command python -m my_ner`. Takes every following value,
        /// so pass it last.
        #[arg(long, num_args = 1.., allow_hyphen_values = true)]
        ner_command: Option<Vec<String>>,
    },

    /// Restore redacted text using a saved mapping.
    Reverse {
        #[command(flatten)]
        io: IoArgs,
    },
}

/// Input and output options shared by both commands.
#[derive(Args)]
struct IoArgs {
    /// Input text (read from stdin when omitted).
    #[arg(short, long)]
    input: Option<String>,

    /// Path to the mapping file (default: ~/.raycast-pii-mapping.json).
    #[arg(short, long, env = "PII_REDACTOR_MAPPING_FILE")]
    mapping_file: Option<PathBuf>,

    /// Output format.
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    output_format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(remediation) = e.remediation() {
                eprintln!("{remediation}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only the command output.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config.as_deref() {
        Some(path) => RedactorConfig::load_from_file(path)?,
        None => RedactorConfig::load_default()?,
    };

    match cli.command {
        Commands::Redact {
            io,
            entities,
            ner_command,
        } => cmd_redact(&config, io, entities, ner_command),
        Commands::Reverse { io } => cmd_reverse(&config, io),
    }
}

fn cmd_redact(
    config: &RedactorConfig,
    io: IoArgs,
    entities: Option<PathBuf>,
    ner_command: Option<Vec<String>>,
) -> Result<()> {
    let text = read_input(io.input, std::io::stdin())?;
    let mapping_path = mapping_path(io.mapping_file, config);
    let source = entity_source(config, entities, ner_command)?;

    let existing = find_placeholders(&text);
    if !existing.is_empty() {
        tracing::warn!(
            count = existing.len(),
            "input already contains placeholder-like tokens; reversing may rewrite them"
        );
    }

    let spans = source.detect(&text)?;
    let result = redact(&text, &spans, &config.allow_list());
    tracing::info!(
        input = %fingerprint(&text),
        detected = spans.len(),
        redacted = result.entity_count,
        "redacted input"
    );

    save_mapping(&mapping_path, &result.pii_mapping)?;

    match io.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => println!("{}", result.redacted_text),
    }
    Ok(())
}

fn cmd_reverse(config: &RedactorConfig, io: IoArgs) -> Result<()> {
    let text = read_input(io.input, std::io::stdin())?;
    let mapping_path = mapping_path(io.mapping_file, config);

    let mapping = load_mapping(&mapping_path)?;
    let restored = reverse(&text, &mapping);

    let unresolved = find_placeholders(&restored);
    if !unresolved.is_empty() {
        tracing::debug!(count = unresolved.len(), "placeholders without a mapping entry");
    }

    match io.output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "restored_text": restored.as_ref() })
        ),
        OutputFormat::Text => println!("{restored}"),
    }
    Ok(())
}

/// Text from `--input`, or stdin with surrounding whitespace trimmed.
///
/// An empty `--input` counts as absent.
fn read_input(input: Option<String>, mut stdin: impl Read) -> Result<String> {
    let text = match input.filter(|text| !text.is_empty()) {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            stdin
                .read_to_string(&mut buffer)
                .map_err(|source| RedactorError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            buffer.trim().to_string()
        }
    };

    if text.is_empty() {
        return Err(RedactorError::EmptyInput);
    }
    Ok(text)
}

/// `--mapping-file` / env, then config, then the home directory default.
fn mapping_path(flag: Option<PathBuf>, config: &RedactorConfig) -> PathBuf {
    flag.or_else(|| config.mapping_file.clone())
        .unwrap_or_else(default_mapping_path)
}

fn default_mapping_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(DEFAULT_MAPPING_FILE),
        |dirs| dirs.home_dir().join(DEFAULT_MAPPING_FILE),
    )
}

fn entity_source(
    config: &RedactorConfig,
    entities: Option<PathBuf>,
    ner_command: Option<Vec<String>>,
) -> Result<Box<dyn EntitySource>> {
    if let Some(path) = entities {
        return Ok(Box::new(FileEntitySource::new(path)));
    }

    let command_line = ner_command.or_else(|| config.ner_command.clone());

    match command_line {
        Some(command_line) => CommandEntitySource::from_command_line(&command_line)
            .map(|source| {
                Box::new(source.with_log_detections(config.log_detections))
                    as Box<dyn EntitySource>
            })
            .ok_or_else(|| {
                RedactorError::detection_unavailable(
                    "empty NER command",
                    "Pass the recognizer program to --ner-command",
                )
            }),
        None => Ok(Box::new(PatternEntitySource::new(config.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_mapping_path_precedence() {
        let config = RedactorConfig {
            mapping_file: Some(PathBuf::from("/etc/config-mapping.json")),
            ..Default::default()
        };

        assert_eq!(
            mapping_path(Some(PathBuf::from("flag.json")), &config),
            Path::new("flag.json")
        );
        assert_eq!(
            mapping_path(None, &config),
            Path::new("/etc/config-mapping.json")
        );
        assert!(mapping_path(None, &RedactorConfig::default()).ends_with(DEFAULT_MAPPING_FILE));
    }

    #[test]
    fn test_read_input_empty_argument_falls_back_to_stdin() {
        let text = read_input(Some(String::new()), "  from stdin \n".as_bytes()).unwrap();
        assert_eq!(text, "from stdin");

        let text = read_input(Some(" kept as is ".to_string()), "ignored".as_bytes()).unwrap();
        assert_eq!(text, " kept as is ");
    }

    #[test]
    fn test_read_input_rejects_empty_text() {
        let err = read_input(Some(String::new()), " \n".as_bytes()).unwrap_err();
        assert!(matches!(err, RedactorError::EmptyInput));

        let err = read_input(None, "".as_bytes()).unwrap_err();
        assert!(matches!(err, RedactorError::EmptyInput));
    }

    #[test]
    fn test_cli_parses_redact_options() {
        let cli = Cli::try_parse_from([
            "pii-redactor",
            "redact",
            "-i",
            "hello",
            "-f",
            "text",
            "--ner-command",
            "/opt/my models/ner",
            "-m",
            "en_core_web_sm",
        ])
        .unwrap();

        match cli.command {
            Commands::Redact {
                io, ner_command, ..
            } => {
                assert_eq!(io.input.as_deref(), Some("hello"));
                assert!(io.output_format == OutputFormat::Text);
                assert_eq!(
                    ner_command,
                    Some(vec![
                        "/opt/my models/ner".to_string(),
                        "-m".to_string(),
                        "en_core_web_sm".to_string(),
                    ])
                );
            }
            Commands::Reverse { .. } => panic!("expected redact"),
        }
    }
}
