//! CLI binary for proposal-pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReportConfig`, runs the funnel or the exporter and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use proposal_pdf::{
    compose_report, load_report_input, sample_report, submit_project, write_html,
    ComposedReport, ExportProgressCallback, HttpLeadStore, JsonlLeadStore, LeadStore, PdfExporter,
    ProgressCallback, ProjectSubmission, ReportConfig, ReportInput, ReportOrigin, SessionStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page being captured.
    page_start: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_export_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Composing report…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Exporting");
    }

    fn page_elapsed(&self) -> f64 {
        self.page_start
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rasterising {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.page_start.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, pixels: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>5.1} MP", pixels as f64 / 1_000_000.0)),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.abandon();
    }

    fn on_export_complete(&self, total_pages: usize, pdf_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages exported  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&format!("{} KiB", pdf_bytes / 1024)),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full funnel: validate, store the lead, analyse, write the session, export
  proposal analyze --name "Alex Morgan" --email alex@example.com \
      --country "United States" --category "Web & Software Development" \
      --description-file brief.txt --attachment requirements.pdf -o .

  # Export the report currently in the session (or the sample after 1s)
  proposal render -o proposals/

  # Export a saved {client, analysis} payload
  proposal render --input payload.json -o proposal.pdf

  # Browser preview of the same pages
  proposal html --input payload.json -o preview.html

  # Print the canned sample payload
  proposal sample > payload.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PROPOSAL_FONT           TTF/OTF used to paint pages (else system fonts are probed)
  PROPOSAL_SESSION_DIR    Session store directory
  PROPOSAL_LEADS          JSON lines file for captured leads
  PDFIUM_LIB_PATH         libpdfium used to read PDF attachments
"#;

/// Turn project descriptions into branded proposal PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "proposal",
    version,
    about = "Turn project descriptions into branded proposal PDFs",
    long_about = "Capture a project lead, generate an analysis with an LLM, and export it as a \
paginated A4 proposal PDF or a standalone HTML preview. Supports OpenAI, Anthropic, Google \
Gemini, Azure OpenAI, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Session store directory.
    #[arg(long, global = true, env = "PROPOSAL_SESSION_DIR")]
    session_dir: Option<PathBuf>,

    /// Font used to paint pages.
    #[arg(long, global = true, env = "PROPOSAL_FONT")]
    font: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PROPOSAL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PROPOSAL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PROPOSAL_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full funnel for one project.
    Analyze(AnalyzeArgs),
    /// Export a report as PDF.
    Render(RenderArgs),
    /// Write a report as standalone HTML.
    Html(RenderArgs),
    /// Print the sample {client, analysis} payload as JSON.
    Sample,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Project description (at least 500 characters and 50 words).
    #[arg(long, conflicts_with = "description_file")]
    description: Option<String>,

    /// Read the project description from this file.
    #[arg(long)]
    description_file: Option<PathBuf>,

    /// Service category, e.g. "Mobile App Development".
    #[arg(long)]
    category: Option<String>,

    /// Client country.
    #[arg(long)]
    country: String,

    /// Supporting document: local path or HTTP/HTTPS URL (pdf, doc, docx, txt, png, jpg).
    #[arg(long)]
    attachment: Option<String>,

    /// Contact name.
    #[arg(long)]
    name: String,

    /// Contact email.
    #[arg(long)]
    email: String,

    /// Contact phone / WhatsApp number.
    #[arg(long)]
    phone: Option<String>,

    /// JSON lines file leads are appended to.
    #[arg(long, env = "PROPOSAL_LEADS", default_value = "leads.jsonl")]
    leads: PathBuf,

    /// POST leads to this collection endpoint instead of the local file.
    #[arg(long, env = "PROPOSAL_LEAD_ENDPOINT")]
    lead_endpoint: Option<String>,

    /// Bearer token for --lead-endpoint.
    #[arg(long, env = "PROPOSAL_LEAD_API_KEY", hide_env_values = true)]
    lead_api_key: Option<String>,

    /// Also export the PDF to this file or directory.
    #[arg(short, long, env = "PROPOSAL_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (default: gpt-4o).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PROPOSAL_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "PROPOSAL_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PROPOSAL_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, env = "PROPOSAL_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PROPOSAL_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Attachment download timeout in seconds.
    #[arg(long, env = "PROPOSAL_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Characters of attachment text sent to the model.
    #[arg(long, env = "PROPOSAL_ATTACHMENT_CHARS", default_value_t = 20_000)]
    attachment_chars: usize,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// `{client, analysis}` JSON payload; defaults to the session.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output file or directory.
    #[arg(short, long, env = "PROPOSAL_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Lines of scope on the first project page.
    #[arg(long, env = "PROPOSAL_FIRST_PAGE_LINES", default_value_t = 15)]
    first_page_lines: usize,

    /// Lines of scope on each continuation page.
    #[arg(long, env = "PROPOSAL_CONTINUATION_LINES", default_value_t = 25)]
    continuation_lines: usize,

    /// Capture scale (device pixels per CSS pixel).
    #[arg(long, env = "PROPOSAL_PIXEL_RATIO", default_value_t = 2.0)]
    pixel_ratio: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is shown.
    let show_progress = !cli.quiet
        && !cli.no_progress
        && matches!(cli.command, Command::Render(_) | Command::Analyze(_));
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

    let session = SessionStore::new(
        cli.session_dir
            .clone()
            .unwrap_or_else(SessionStore::default_dir),
    );

    match &cli.command {
        Command::Sample => {
            let json = serde_json::to_string_pretty(&sample_report())
                .context("Failed to serialise sample")?;
            println!("{json}");
        }
        Command::Html(args) => {
            let config = render_config(&cli, args, None)?;
            let report = load_and_compose(args, &session, &config).await?;
            write_html(&report, &args.output)
                .await
                .context("Failed to write HTML")?;
            if !cli.quiet {
                eprintln!(
                    "{} {} pages  →  {}",
                    green("✔"),
                    report.page_count(),
                    bold(&args.output.display().to_string())
                );
            }
        }
        Command::Render(args) => {
            let progress = show_progress.then(|| {
                CliProgressCallback::new_dynamic() as Arc<dyn ExportProgressCallback>
            });
            let config = render_config(&cli, args, progress)?;
            let report = load_and_compose(args, &session, &config).await?;
            export(&cli, report, config, &args.output).await?;
        }
        Command::Analyze(args) => run_analyze(&cli, args, &session, show_progress).await?,
    }

    Ok(())
}

async fn run_analyze(
    cli: &Cli,
    args: &AnalyzeArgs,
    session: &SessionStore,
    show_progress: bool,
) -> Result<()> {
    let description = match (&args.description, &args.description_file) {
        (Some(d), _) => d.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read description from {:?}", path))?,
        (None, None) => anyhow::bail!("Provide --description or --description-file"),
    };

    let system_prompt = match &args.system_prompt {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        ),
        None => None,
    };

    let submission = ProjectSubmission {
        description,
        category: args.category.clone(),
        country: args.country.clone(),
        attachment: args.attachment.clone(),
        name: args.name.clone(),
        email: args.email.clone(),
        phone: args.phone.clone(),
    };

    let progress = (show_progress && args.output.is_some())
        .then(|| CliProgressCallback::new_dynamic() as Arc<dyn ExportProgressCallback>);

    let mut builder = ReportConfig::builder()
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .download_timeout_secs(args.download_timeout)
        .attachment_char_limit(args.attachment_chars);
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(provider) = &args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(font) = &cli.font {
        builder = builder.font_path(font);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let leads: Box<dyn LeadStore> = match &args.lead_endpoint {
        Some(endpoint) => Box::new(
            HttpLeadStore::new(endpoint, args.lead_api_key.clone(), args.api_timeout)
                .context("Failed to create lead store client")?,
        ),
        None => Box::new(JsonlLeadStore::new(&args.leads)),
    };

    if !cli.quiet {
        eprintln!("{} {}", cyan("◆"), bold("Analysing project…"));
    }
    let outcome = submit_project(&submission, leads.as_ref(), session, &config)
        .await
        .map_err(|e| {
            tracing::error!("{e}");
            anyhow::anyhow!(e.user_message())
        })
        .context("Analysis failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  lead {}  {}ms  →  session {}",
            green("✔"),
            outcome.lead_id.as_deref().unwrap_or("not stored"),
            outcome.duration_ms,
            bold(&session.dir().display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out  ({} retries)",
            dim(&outcome.input_tokens.to_string()),
            dim(&outcome.output_tokens.to_string()),
            outcome.retries,
        );
    }

    if let Some(output) = &args.output {
        let report = compose(&outcome.report, &config)?;
        export(cli, report, config, output).await?;
    }
    Ok(())
}

/// Map the render flags to `ReportConfig`.
fn render_config(
    cli: &Cli,
    args: &RenderArgs,
    progress: Option<ProgressCallback>,
) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .first_page_capacity(args.first_page_lines)
        .continuation_capacity(args.continuation_lines)
        .pixel_ratio(args.pixel_ratio);
    if let Some(font) = &cli.font {
        builder = builder.font_path(font);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

async fn load_and_compose(
    args: &RenderArgs,
    session: &SessionStore,
    config: &ReportConfig,
) -> Result<ComposedReport> {
    let input = match &args.input {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path))?;
            serde_json::from_str::<ReportInput>(&raw)
                .with_context(|| format!("{:?} is not a {{client, analysis}} payload", path))?
        }
        None => {
            let loaded = load_report_input(session, config).await;
            if loaded.origin == ReportOrigin::Sample {
                eprintln!("{} no session report found; using the sample", cyan("⚠"));
            }
            loaded.input
        }
    };
    compose(&input, config)
}

fn compose(input: &ReportInput, config: &ReportConfig) -> Result<ComposedReport> {
    let today = chrono::Local::now().date_naive();
    compose_report(&input.client, input.analysis.as_ref(), config, today)
        .context("Payload has no analysis; nothing to export")
}

async fn export(
    cli: &Cli,
    report: ComposedReport,
    config: ReportConfig,
    output: &std::path::Path,
) -> Result<()> {
    let exporter =
        PdfExporter::with_layout_rasterizer(config).context("Failed to load a font")?;
    let path = exporter
        .export_to_file(&report, output)
        .await
        .map_err(|e| {
            tracing::error!("{e}");
            anyhow::anyhow!(e.user_message())
        })
        .context("Export failed")?;
    if !cli.quiet {
        eprintln!(
            "{}  {} pages  →  {}",
            green("✔"),
            report.page_count(),
            bold(&path.display().to_string())
        );
    }
    Ok(())
}
