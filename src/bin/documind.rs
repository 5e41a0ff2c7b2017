//! CLI binary for documind.
//!
//! A thin shim over the library crate: flags become a `DocuMindConfig`, one
//! `Session` is driven per invocation, and results go to stdout.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use documind::{
    ConfigError, DefaultSession, DocuMindConfig, Document, ExtractionProgressCallback,
    ImageReferenceStyle, PdfExtractor, PdfiumExtractor, ProgressCallback, SessionError, Summary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Extraction progress using indicatif ──────────────────────────────────────

/// Spinner while the PDF opens, then a page bar once the total is known.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self::with_bar(ProgressBar::new(0)))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Extracting");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

/// Extraction that fails part-way never reaches `on_extraction_complete`;
/// clear the bar so no spinner is left behind on stderr.
impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// A progress bar, unless `--quiet`. Create it only once there is a valid
/// document to extract.
fn progress_bar(quiet: bool) -> Option<ProgressCallback> {
    (!quiet).then(|| CliProgressCallback::new() as ProgressCallback)
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_message("");
    }

    fn on_page_extracted(&self, page_num: usize, _total_pages: usize, text_len: usize) {
        self.bar.set_message(dim(&format!("page {page_num}: {text_len} bytes of text")));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages extracted",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Dump page text (no endpoint needed)
  documind extract report.pdf
  documind extract report.pdf --json > report.json

  # Summarize in at most 50 words
  documind summarize report.pdf --word-limit 50

  # One question
  documind ask report.pdf "Who signed the contract?"

  # Interactive chat, one question per line, :quit to leave
  documind chat report.pdf

ENVIRONMENT VARIABLES:
  DOCUMIND_ENDPOINT       Full generateContent URL (wins over GEMINI_API_KEY)
  GEMINI_API_KEY          Key for the Gemini API when no endpoint is given
  DOCUMIND_MODEL          Gemini model (default: gemini-2.0-flash)
  DOCUMIND_TIMEOUT_SECS   Request timeout in seconds (default: none)
  PDFIUM_LIB_PATH         Path to libpdfium, or the directory holding it
  RUST_LOG                Overrides the log filter chosen by -v / -q
"#;

/// Ask questions about a PDF, or summarize it.
#[derive(Parser, Debug)]
#[command(
    name = "documind",
    version,
    about = "Ask questions about a PDF, or summarize it",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Full generateContent endpoint URL, including any key parameter.
    #[arg(long, global = true, env = "DOCUMIND_ENDPOINT", hide_env_values = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds. Default: wait indefinitely.
    #[arg(long, global = true, env = "DOCUMIND_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "DOCUMIND_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// How page images are referenced in the prompt.
    #[arg(long, global = true, value_enum, default_value = "data-uri")]
    image_refs: ImageRefsArg,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress everything except results and errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text extracted from each page.
    Extract {
        file: PathBuf,
        /// Emit the extracted content (page texts and image sizes) as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Summarize the document.
    Summarize {
        file: PathBuf,
        /// Maximum number of words in the summary. Default: 100.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        word_limit: Option<u32>,
    },
    /// Answer one question about the document.
    Ask { file: PathBuf, question: String },
    /// Read questions from stdin, one per line, until EOF or `:quit`.
    Chat { file: PathBuf },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ImageRefsArg {
    DataUri,
    Placeholder,
}

impl From<ImageRefsArg> for ImageReferenceStyle {
    fn from(v: ImageRefsArg) -> Self {
        match v {
            ImageRefsArg::DataUri => ImageReferenceStyle::DataUri,
            ImageRefsArg::Placeholder => ImageReferenceStyle::Placeholder,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers extraction feedback, so INFO logs stay off unless
    // asked for.
    let filter = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Extract { file, json } => run_extract(global, file, *json).await,
        Command::Summarize { file, word_limit } => {
            let document = load(file).await?;
            let config = build_config(global)?;
            let words = word_limit.unwrap_or(config.default_word_limit);
            let session = open_session(config, document, global.quiet).await?;
            run_summarize(&session, words).await
        }
        Command::Ask { file, question } => {
            let document = load(file).await?;
            let session = open_session(build_config(global)?, document, global.quiet).await?;
            let answer = session.ask(question.as_str()).await.context("Question failed")?;
            println!("{answer}");
            Ok(())
        }
        Command::Chat { file } => {
            let document = load(file).await?;
            let session = open_session(build_config(global)?, document, global.quiet).await?;
            run_chat(&session, global.quiet).await
        }
    }
}

/// `--endpoint` (or `DOCUMIND_ENDPOINT`) wins; otherwise the Gemini URL is
/// derived from the environment. Environment errors pass through as-is.
fn resolve_endpoint(
    explicit: Option<&str>,
    from_env: impl FnOnce() -> Result<DocuMindConfig, ConfigError>,
) -> Result<String> {
    match explicit {
        Some(url) => Ok(url.to_string()),
        None => Ok(from_env()?.endpoint),
    }
}

/// Map CLI args to `DocuMindConfig`.
fn build_config(global: &GlobalArgs) -> Result<DocuMindConfig> {
    let endpoint = resolve_endpoint(global.endpoint.as_deref(), DocuMindConfig::from_env)?;

    let mut builder = DocuMindConfig::builder()
        .endpoint(endpoint)
        .image_reference(global.image_refs.into());
    if let Some(secs) = global.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(pwd) = &global.password {
        builder = builder.password(pwd.clone());
    }
    builder.build().context("Invalid configuration")
}

async fn load(file: &Path) -> Result<Document> {
    let document = Document::from_path(file)
        .await
        .with_context(|| format!("Failed to open {}", file.display()))?;
    document.validate()?;
    Ok(document)
}

async fn open_session(
    mut config: DocuMindConfig,
    document: Document,
    quiet: bool,
) -> Result<DefaultSession> {
    config.progress_callback = progress_bar(quiet);
    let session = DefaultSession::from_config(&config).context("Failed to set up the backend")?;
    let filename = document.filename().to_string();
    session
        .upload(document)
        .await
        .with_context(|| format!("Failed to extract {filename}"))?;
    Ok(session)
}

async fn run_extract(global: &GlobalArgs, file: &Path, json: bool) -> Result<()> {
    let document = load(file).await?;

    let mut extractor = PdfiumExtractor::new();
    if let Some(pwd) = &global.password {
        extractor = extractor.with_password(pwd.clone());
    }
    if let Some(cb) = progress_bar(global.quiet) {
        extractor = extractor.with_progress(cb);
    }

    let content = extractor
        .extract(document)
        .await
        .with_context(|| format!("Failed to extract {}", file.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &content).context("Failed to serialise output")?;
        writeln!(out)?;
    } else {
        for (i, (text, image)) in content.page_texts().iter().zip(content.images()).enumerate() {
            if !global.quiet {
                writeln!(
                    out,
                    "{}",
                    cyan(&format!("── page {} ({}x{}) ──", i + 1, image.width, image.height))
                )?;
            }
            writeln!(out, "{text}")?;
        }
    }
    Ok(())
}

async fn run_summarize(session: &DefaultSession, word_limit: u32) -> Result<()> {
    match session.summarize(word_limit).await {
        Ok(summary) => {
            println!("{summary}");
            Ok(())
        }
        Err(e) => {
            if let Some(Summary::Failed(shown)) = session.summary() {
                eprintln!("{}", red(&shown));
            }
            Err(e).context("Summarization failed")
        }
    }
}

async fn run_chat(session: &DefaultSession, quiet: bool) -> Result<()> {
    if !quiet {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold("Ask a question about the document (:quit to exit)")
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !quiet {
            eprint!("{} ", cyan("?"));
            io::stderr().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let question = line.trim();
        if question == ":quit" {
            break;
        }

        match session.ask(question).await {
            Ok(_) => {}
            Err(SessionError::Dispatch(e)) if e.is_precondition() => {
                eprintln!("{}", red(&e.to_string()));
                continue;
            }
            Err(e) => eprintln!("{} {}", red("✘"), e),
        }

        // Print the newest exchange; the numbering reflects the whole transcript.
        let transcript = session.transcript();
        if let Some(entry) = transcript.last() {
            println!("{} {}", bold(&format!("Q{}:", transcript.len())), entry.question);
            let answer = if entry.failed {
                red(&entry.answer)
            } else {
                entry.answer.clone()
            };
            println!("{} {}\n", bold(&format!("A{}:", transcript.len())), answer);
        }
    }
    Ok(())
}
