use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use synth_ai::llm::ollama::{OllamaClient, OllamaGenerator};
use synth_ai::render::render_final_response;
use synth_ai::retrieve::{Retriever, SearchClient};
use synth_ai::synthesize::{synthesize_answer, SynthesisConfig};
use synth_core::domain::RetrievalResult;
use synth_core::error::AppError;

const USAGE: &str = "Usage: synth \"<question>\" [--limit N] [--lang CODE] [--out FILE] \
[--dump-prompt] [--results-file FILE]";

const DEFAULT_LIMIT: u32 = 8;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "llama3.1";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    question: String,
    limit: u32,
    language: String,
    out: Option<PathBuf>,
    dump_prompt: bool,
    results_file: Option<PathBuf>,
}

/// Environment-derived configuration. Resolved once at startup and passed
/// down explicitly; nothing below the surface reads the environment.
#[derive(Debug, Clone)]
struct CliConfig {
    search_url: Option<String>,
    ollama_url: String,
    model: String,
}

fn load_env_config() -> CliConfig {
    CliConfig {
        search_url: env::var("SYNTH_SEARCH_URL").ok(),
        ollama_url: env::var("SYNTH_OLLAMA_URL")
            .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
        model: env::var("GENERATION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
    }
}

fn parse_args(args: Vec<String>) -> Result<CliArgs, AppError> {
    let mut question: Option<String> = None;
    let mut limit = DEFAULT_LIMIT;
    let mut language = "en".to_string();
    let mut out = None;
    let mut dump_prompt = false;
    let mut results_file = None;

    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--limit" => {
                let raw = it.next().ok_or_else(|| {
                    AppError::new("ARGS_INVALID", "--limit requires a value").with_details(USAGE)
                })?;
                limit = raw.parse().map_err(|_| {
                    AppError::new("ARGS_INVALID", "--limit must be a positive integer")
                        .with_details(format!("value={raw}"))
                })?;
            }
            "--lang" => {
                language = it.next().ok_or_else(|| {
                    AppError::new("ARGS_INVALID", "--lang requires a value").with_details(USAGE)
                })?;
            }
            "--out" => {
                let raw = it.next().ok_or_else(|| {
                    AppError::new("ARGS_INVALID", "--out requires a path").with_details(USAGE)
                })?;
                out = Some(PathBuf::from(raw));
            }
            "--dump-prompt" => dump_prompt = true,
            "--results-file" => {
                let raw = it.next().ok_or_else(|| {
                    AppError::new("ARGS_INVALID", "--results-file requires a path")
                        .with_details(USAGE)
                })?;
                results_file = Some(PathBuf::from(raw));
            }
            _ if arg.starts_with("--") => {
                return Err(AppError::new("ARGS_INVALID", "Unknown flag")
                    .with_details(format!("flag={arg}; {USAGE}")));
            }
            _ => {
                if question.is_some() {
                    return Err(AppError::new("ARGS_INVALID", "Multiple questions given")
                        .with_details(USAGE));
                }
                question = Some(arg);
            }
        }
    }

    let question = question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::new("ARGS_INVALID", "A question is required").with_details(USAGE))?;

    Ok(CliArgs {
        question,
        limit,
        language,
        out,
        dump_prompt,
        results_file,
    })
}

fn load_results_file(path: &PathBuf) -> Result<Vec<RetrievalResult>, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new("RESULTS_FILE_INVALID", "Failed to read results file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::new("RESULTS_FILE_INVALID", "Failed to decode results file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn fetch_results(args: &CliArgs, config: &CliConfig) -> Result<Vec<RetrievalResult>, AppError> {
    if let Some(path) = args.results_file.as_ref() {
        return load_results_file(path);
    }
    let url = config.search_url.as_deref().ok_or_else(|| {
        AppError::new(
            "SEARCH_URL_INVALID",
            "SYNTH_SEARCH_URL is not set (or pass --results-file)",
        )
    })?;
    let client = SearchClient::new(url)?;
    client.search(&args.question, args.limit)
}

fn run(args: Vec<String>) -> Result<(), AppError> {
    let args = parse_args(args)?;
    let config = load_env_config();

    let results = fetch_results(&args, &config)?;

    let client = OllamaClient::new(&config.ollama_url)?;
    let generator = OllamaGenerator::new(client);
    let synth_config = SynthesisConfig::new(config.model).with_language(args.language.clone());

    let result = synthesize_answer(&args.question, &results, &synth_config, &generator)?;

    for w in &result.warnings {
        match w.details.as_deref() {
            Some(d) => eprintln!("warning: [{}] {} ({d})", w.code, w.message),
            None => eprintln!("warning: [{}] {}", w.code, w.message),
        }
    }

    if args.dump_prompt {
        eprintln!("--- prompt (sha256 {}) ---", result.prompt.fingerprint);
        eprintln!("{}", result.prompt.text);
        eprintln!("--- end prompt ---");
    }

    let rendering = render_final_response(&result);
    match args.out.as_ref() {
        Some(path) => fs::write(path, rendering.as_bytes()).map_err(|e| {
            AppError::new("OUTPUT_WRITE_FAILED", "Failed to write output file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?,
        None => print!("{rendering}"),
    }

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.details.as_deref() {
                Some(d) => eprintln!("error: {e} ({d})"),
                None => eprintln!("error: {e}"),
            }
            ExitCode::FAILURE
        }
    }
}
