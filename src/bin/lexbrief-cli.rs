//! LexBrief CLI - local summarization tool
//!
//! Usage:
//!   lexbrief-cli summarize <file> [--output <path>] [--model <name>]
//!   lexbrief-cli chunk <file>
//!   lexbrief-cli help | version

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use lexbrief::chunker::LegalChunker;
use lexbrief::ingest;
use lexbrief::{CaseSummarizer, PipelineConfig};

#[derive(Debug)]
enum Command {
    Summarize {
        file: PathBuf,
        output: Option<PathBuf>,
        model: Option<String>,
    },
    Chunk {
        file: PathBuf,
    },
    Help,
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    match parse_args(&args) {
        Ok(command) => match run_command(command).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "version" | "--version" | "-V" => Ok(Command::Version),

        "summarize" => {
            let file = args
                .get(2)
                .filter(|a| !a.starts_with('-'))
                .map(PathBuf::from)
                .ok_or("Missing input file. Use: summarize <file>")?;

            let mut output = None;
            let mut model = None;
            let mut i = 3;
            while i < args.len() {
                match args[i].as_str() {
                    "--output" | "-o" => {
                        output = Some(PathBuf::from(
                            args.get(i + 1).ok_or("Missing value for --output")?,
                        ));
                        i += 2;
                    }
                    "--model" | "-m" => {
                        model = Some(args.get(i + 1).ok_or("Missing value for --model")?.clone());
                        i += 2;
                    }
                    other => return Err(format!("Unknown option: {}", other)),
                }
            }

            Ok(Command::Summarize { file, output, model })
        }

        "chunk" => {
            let file = args
                .get(2)
                .map(PathBuf::from)
                .ok_or("Missing input file. Use: chunk <file>")?;
            Ok(Command::Chunk { file })
        }

        other => Err(format!("Unknown command: {}", other)),
    }
}

async fn run_command(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("lexbrief-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Summarize { file, output, model } => {
            let text = ingest::read_document(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut config = PipelineConfig::from_env();
            if let Some(model) = model {
                config.model = model;
            }

            let summarizer = CaseSummarizer::new(config)?;
            let summary = summarizer.summarize(&text).await;

            let report = render_report(&file, &summary)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &report)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Summary written to {}", path.display());
                }
                None => println!("{}", report),
            }

            Ok(())
        }
        Command::Chunk { file } => {
            let text = ingest::read_document(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let config = PipelineConfig::from_env();
            let chunker = LegalChunker::new(config.chunker_max_words, config.chunker_min_words);
            let chunks = chunker.chunk(&text);

            println!("{} chunks from {}", chunks.len(), file.display());
            for chunk in &chunks {
                let preview: String = chunk.text.chars().take(80).collect();
                println!(
                    "  {} [{}] {} palavras, {} .. {}\n    {}",
                    chunk.chunk_id,
                    chunk.probable_type,
                    chunk.word_count,
                    chunk.start_location,
                    chunk.end_location,
                    preview.replace('\n', " ")
                );
            }

            Ok(())
        }
    }
}

/// Wrap the pipeline JSON with run metadata for the written report.
fn render_report(file: &std::path::Path, summary: &str) -> anyhow::Result<String> {
    let summary_json: serde_json::Value =
        serde_json::from_str(summary).context("Pipeline returned invalid JSON")?;

    let report = serde_json::json!({
        "arquivo": file.display().to_string(),
        "gerado_em": chrono::Utc::now().to_rfc3339(),
        "resumo": summary_json,
    });

    Ok(serde_json::to_string_pretty(&report)?)
}

fn print_help() {
    println!(
        r#"lexbrief-cli - structured summaries for labor case files

USAGE:
    lexbrief-cli summarize <file> [--output <path>] [--model <name>]
    lexbrief-cli chunk <file>
    lexbrief-cli help
    lexbrief-cli version

COMMANDS:
    summarize   Run the full anti-hallucination pipeline over a PDF,
                DOCX or TXT case file and emit the structured summary
    chunk       Show how the file would be split into legal chunks
                (no model calls)

ENVIRONMENT:
    OPENAI_API_KEY              API key for the completion endpoint (required)
    LEXBRIEF_MODEL              Model name (default: gpt-4o-mini)
    LEXBRIEF_BASE_URL           Completion endpoint base URL
    LEXBRIEF_MAX_PARALLEL       Max simultaneous extraction requests
    LEXBRIEF_MAX_WORDS          Max words per chunk
    LEXBRIEF_MAX_REGENERATIONS  Max regeneration attempts per section
    RUST_LOG                    Log filter (default: info)"#
    );
}
