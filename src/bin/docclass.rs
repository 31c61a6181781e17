//! CLI binary for edgequake-docclass.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ClassifierConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docclass::{
    resolve_input, ClassifierConfig, DocumentClassifier, ExtractorRegistry, Pricing,
    TokenizerAdapter, DEFAULT_MODEL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Classify a local file
  docclass invoice.pdf

  # Classify a download, JSON output
  docclass --json https://example.com/files/statement.xlsx

  # Use a specific model and its prices ($ per 1K tokens)
  docclass --model gpt-4o-mini --input-rate 0.00015 --output-rate 0.0006 scan.png

  # Show the text the model would see (no API key needed)
  docclass --extract-only report.docx

  # Run the HTTP service
  API_TOKEN=change-me docclass --listen 0.0.0.0:5000

SUPPORTED FORMATS:
  pdf  docx  txt  csv  xlsx  xls  png  jpg  jpeg
  Images are read with tesseract, which must be installed separately.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  API_TOKEN               Bearer token required by --listen
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Name the type of a document with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docclass",
    version,
    about = "Name the type of a document (PDF, Office, CSV, image) with an LLM",
    long_about = "Extract the text of a document (local file or URL), fit it into the model's \
context window, and ask an LLM what kind of document it is. Prints the label, the cost of the \
call in microdollars, and the elapsed time. Supports OpenAI, Anthropic, Google Gemini, Azure \
OpenAI, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: Option<String>,

    /// LLM model ID (e.g. gpt-3.5-turbo, gpt-4o-mini). Also selects the tokenizer.
    #[arg(long, env = "EDGEQUAKE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Model context window in tokens.
    #[arg(long, env = "DOCCLASS_MAX_CONTEXT_TOKENS", default_value_t = 4096)]
    max_context_tokens: usize,

    /// Tokens kept back from the context window for framing and the answer.
    #[arg(long, env = "DOCCLASS_RESERVED_TOKENS", default_value_t = 200)]
    reserved_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCCLASS_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DOCCLASS_MAX_TOKENS", default_value_t = 150)]
    max_tokens: usize,

    /// USD per 1K input tokens.
    #[arg(long, env = "DOCCLASS_INPUT_RATE", default_value_t = 0.0005)]
    input_rate: f64,

    /// USD per 1K output tokens.
    #[arg(long, env = "DOCCLASS_OUTPUT_RATE", default_value_t = 0.0015)]
    output_rate: f64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOCCLASS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// tesseract executable used for images.
    #[arg(long, env = "DOCCLASS_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// tesseract language(s), e.g. eng, deu, eng+fra.
    #[arg(long, env = "DOCCLASS_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DOCCLASS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCCLASS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output the result as JSON.
    #[arg(long, env = "DOCCLASS_JSON")]
    json: bool,

    /// Print the extracted text and its token count, no LLM call.
    #[arg(long)]
    extract_only: bool,

    /// Serve the HTTP API on this address instead of classifying INPUT.
    #[cfg(feature = "server")]
    #[arg(long, value_name = "ADDR")]
    listen: Option<std::net::SocketAddr>,

    /// Bearer token for --listen.
    #[cfg(feature = "server")]
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCCLASS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCCLASS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;

    // ── Server mode ──────────────────────────────────────────────────────
    #[cfg(feature = "server")]
    if let Some(addr) = cli.listen {
        let token = cli
            .api_token
            .clone()
            .filter(|t| !t.is_empty())
            .context("Missing API_TOKEN: set it in the environment or pass --api-token")?;
        let classifier =
            DocumentClassifier::new(config).context("Failed to set up the classifier")?;
        eprintln!("{} listening on {}", green("●"), bold(&addr.to_string()));
        edgequake_docclass::server::serve(addr, std::sync::Arc::new(classifier), token)
            .await
            .context("HTTP server failed")?;
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .context("Missing INPUT: pass a file path or URL")?;
    let document = resolve_input(input, config.download_timeout_secs)
        .await
        .context("Failed to load input")?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let registry = ExtractorRegistry::new(&config.ocr);
        let text = tokio::task::spawn_blocking(move || {
            registry.extract_file(&document.filename, &document.bytes)
        })
        .await
        .context("Extraction task failed")?
        .context("Failed to extract text")?;
        let tokens = TokenizerAdapter::for_model(&config.model)?.count(&text);

        if cli.json {
            let value = serde_json::json!({ "text": text, "tokens": tokens });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).context("Failed to serialise output")?
            );
        } else {
            println!("{text}");
            if !cli.quiet {
                eprintln!("{}", dim(&format!("{} chars, {} tokens", text.chars().count(), tokens)));
            }
        }
        return Ok(());
    }

    // ── Classify ─────────────────────────────────────────────────────────
    let classifier = DocumentClassifier::new(config).context("Failed to set up the classifier")?;

    let spinner = (!cli.quiet && !cli.json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Classifying");
        bar.set_message(document.filename.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = classifier.classify(document).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match outcome {
        Ok(result) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("Failed to serialise output")?
                );
            } else {
                println!("{}", result.label);
                if !cli.quiet {
                    eprintln!(
                        "{} {}  {}",
                        green("✔"),
                        dim(&format!("{} µ$", result.cost_microdollars)),
                        dim(&format!("{:.2}s", result.elapsed_seconds)),
                    );
                }
            }
            Ok(())
        }
        Err(failure) => {
            if cli.json {
                let value = serde_json::json!({
                    "error": failure.error.to_string(),
                    "cost_in_microdollars": failure.cost_microdollars,
                    "time_in_seconds": failure.elapsed_seconds,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&value).context("Failed to serialise output")?
                );
            } else {
                eprintln!("{} {}", red("✘"), bold(&failure.error.to_string()));
            }
            std::process::exit(1);
        }
    }
}

/// Map CLI args to `ClassifierConfig`.
async fn build_config(cli: &Cli) -> Result<ClassifierConfig> {
    let mut builder = ClassifierConfig::builder()
        .model(cli.model.clone())
        .max_context_tokens(cli.max_context_tokens)
        .reserved_tokens(cli.reserved_tokens)
        .temperature(cli.temperature)
        .max_response_tokens(cli.max_tokens)
        .pricing(Pricing::new(cli.input_rate, cli.output_rate))
        .tesseract_cmd(cli.tesseract.clone())
        .ocr_language(cli.ocr_lang.clone())
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
