//! CLI binary for skrivsmart.
//!
//! A thin shim over the library crate: load a draft, run the requested
//! transforms in order, print the result and write the requested exports.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use skrivsmart::{
    resolve_upload, write_artifact, ExportFormat, Language, OperationKind, OperationResult,
    Session, SessionConfig, SessionObserver,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner shown while a transform is in flight, plus one log line per
/// finished transform.
struct CliObserver {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("skrivsmart");
        Arc::new(Self {
            bar,
            failures: AtomicUsize::new(0),
        })
    }
}

impl SessionObserver for CliObserver {
    fn on_operation_start(&self, kind: OperationKind) {
        self.bar.reset_elapsed();
        self.bar.set_message(format!("{kind}…"));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_operation_success(&self, kind: OperationKind) {
        self.bar.disable_steady_tick();
        self.bar.println(format!(
            "  {} {:<17} {}",
            green("✓"),
            kind.as_str(),
            dim(&format!("{:.1}s", self.bar.elapsed().as_secs_f64()))
        ));
        self.bar.set_message("");
    }

    fn on_operation_failure(&self, kind: OperationKind, error: &str) {
        self.bar.disable_steady_tick();
        self.failures.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<17} {}", red("✗"), kind.as_str(), red(&msg)));
        self.bar.set_message("");
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Suggestions for a draft, in Swedish (default)
  skrivsmart uppsats.docx --transform suggestions

  # Rewrite, then make shorter, export as PDF with comments
  skrivsmart draft.txt -t rewrite -t make-shorter -t suggestions --export pdf -o out/

  # Start from an idea only
  skrivsmart --idea "En drake som älskar glass" -t generate-intro -t continue-writing

  # Fact-check against a source
  skrivsmart report.pdf -t fact-check --source-url https://sv.wikipedia.org/wiki/Stockholm

  # Croatian suggestions, JSON snapshot on stdout
  skrivsmart --language hr -t suggestions --json story.txt > session.json

TRANSFORMS:
  suggestions       improvement suggestions + analysis score
  brainstorm        three ideas to keep writing
  fact-check        verify the text against --source-url
  generate-intro    intro paragraph from --idea, prepended to the text
  continue-writing  one or two paragraphs appended to the text
  rewrite           clearer rewrite, replaces the text
  make-longer       expanded text, replaces the text
  make-shorter      condensed text, replaces the text

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Writing assistant: transform and export drafts with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "skrivsmart",
    version,
    about = "Writing assistant: suggestions, rewrites and exports for .txt/.docx/.pdf drafts",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Draft to load: local .txt/.docx/.pdf path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Language for generated text and suggestions: sv, bs, hr, sr.
    #[arg(short, long, env = "SKRIVSMART_LANGUAGE", default_value = "sv")]
    language: Language,

    /// Transform to run; repeat to chain them in order.
    #[arg(short, long = "transform", value_enum)]
    transforms: Vec<TransformArg>,

    /// Source URL for fact-check.
    #[arg(long, env = "SKRIVSMART_SOURCE_URL")]
    source_url: Option<String>,

    /// Story idea for generate-intro.
    #[arg(long)]
    idea: Option<String>,

    /// Export format to write; repeat for several.
    #[arg(short, long = "export", value_enum)]
    exports: Vec<ExportArg>,

    /// Directory for exports.
    #[arg(short, long, env = "SKRIVSMART_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Base file name for exports.
    #[arg(long, env = "SKRIVSMART_EXPORT_NAME", default_value = "skrivsmart_dokument")]
    export_name: String,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SKRIVSMART_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per transform.
    #[arg(long, env = "SKRIVSMART_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Per-transform LLM call timeout in seconds (default: wait).
    #[arg(long, env = "SKRIVSMART_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SKRIVSMART_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output a JSON session snapshot instead of the text.
    #[arg(long, env = "SKRIVSMART_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "SKRIVSMART_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SKRIVSMART_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SKRIVSMART_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TransformArg {
    Suggestions,
    Brainstorm,
    FactCheck,
    GenerateIntro,
    ContinueWriting,
    Rewrite,
    MakeLonger,
    MakeShorter,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ExportArg {
    Txt,
    Docx,
    Pdf,
}

impl From<ExportArg> for ExportFormat {
    fn from(v: ExportArg) -> Self {
        match v {
            ExportArg::Txt => ExportFormat::PlainText,
            ExportArg::Docx => ExportFormat::Docx,
            ExportArg::Pdf => ExportFormat::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out of
    // its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.input.is_none() && cli.idea.is_none() {
        anyhow::bail!("Nothing to work on: give an input file/URL or --idea");
    }

    // ── Build session ────────────────────────────────────────────────────
    let observer = show_progress.then(CliObserver::new);
    let config = build_config(&cli, observer.clone())?;
    let session = Session::from_config(config).context("Failed to set up LLM provider")?;

    if let Some(ref input) = cli.input {
        let upload = resolve_upload(input, cli.download_timeout)
            .await
            .with_context(|| format!("Failed to read '{input}'"))?;
        session
            .load(upload)
            .await
            .with_context(|| format!("Failed to decode '{input}'"))?;
    }

    // ── Run transforms ───────────────────────────────────────────────────
    let mut failed = 0usize;
    for transform in &cli.transforms {
        let outcome = match transform {
            TransformArg::Suggestions => session.suggest().await,
            TransformArg::Brainstorm => session.brainstorm().await,
            TransformArg::FactCheck => {
                session
                    .fact_check(cli.source_url.clone().unwrap_or_default())
                    .await
            }
            TransformArg::GenerateIntro => {
                session
                    .generate_intro(cli.idea.clone().unwrap_or_default())
                    .await
            }
            TransformArg::ContinueWriting => session.continue_writing().await,
            TransformArg::Rewrite => session.rewrite().await,
            TransformArg::MakeLonger => session.make_longer().await,
            TransformArg::MakeShorter => session.make_shorter().await,
        };
        match outcome {
            Ok(result) => {
                if !cli.quiet && !cli.json {
                    print_panel(&result);
                }
            }
            Err(e) => {
                failed += 1;
                if observer.is_none() && !cli.quiet {
                    eprintln!("{} {}", red("✗"), e);
                }
            }
        }
        session.acknowledge();
    }

    // ── Output ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&session.snapshot())
            .context("Failed to serialise session")?;
        println!("{json}");
    } else {
        let text = session.text();
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    for export in &cli.exports {
        let artifact = session
            .export((*export).into())
            .await
            .with_context(|| format!("Failed to encode {export:?} export"))?;
        let path = write_artifact(&artifact, &cli.output_dir)
            .await
            .context("Failed to write export")?;
        if !cli.quiet {
            eprintln!(
                "{} {}  {}",
                green("✔"),
                bold(&path.display().to_string()),
                dim(&format!("{} bytes", artifact.bytes.len()))
            );
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} transform(s) failed");
    }
    Ok(())
}

/// Print a transform's panel (suggestions, ideas, verification) to stderr.
fn print_panel(result: &OperationResult) {
    match result {
        OperationResult::Suggestions { suggestions } => {
            eprintln!("{}", cyan(&bold("Suggestions")));
            for (i, s) in suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, s);
            }
        }
        OperationResult::Brainstorm { suggestions } => {
            eprintln!("{}", cyan(&bold("Ideas")));
            for s in suggestions {
                eprintln!("  • {s}");
            }
        }
        OperationResult::FactCheck {
            verification_result,
        } => {
            eprintln!("{}", cyan(&bold("Fact check")));
            eprintln!("  {verification_result}");
        }
        other if other.kind().mutates_text() => {
            eprintln!("{}", dim(&format!("{}: text updated", other.kind())));
        }
        _ => {}
    }
}

/// Map CLI args to `SessionConfig`.
fn build_config(cli: &Cli, observer: Option<Arc<CliObserver>>) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .language(cli.language)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout)
        .export_base_name(cli.export_name.clone());

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs as Arc<dyn SessionObserver>);
    }

    builder.build().context("Invalid configuration")
}
