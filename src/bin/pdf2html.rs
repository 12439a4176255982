//! CLI binary for pdf2html.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2html::{
    convert, convert_to_file, inspect, ConversionConfig, ConversionProgressCallback, ImageMode,
    PageSelection, ProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
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
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }

    fn elapsed(&self, page_num: usize) -> String {
        let ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{ms}ms"))
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, html_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{html_len:>7} bytes")),
            self.elapsed(page_num),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            self.elapsed(page_num),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages converted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            let mark = if failed == total_pages {
                red("✘")
            } else {
                cyan("⚠")
            };
            eprintln!(
                "{} {}/{} pages converted  ({} failed)",
                mark,
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (stdout)
  pdf2html document.pdf

  # Convert to file
  pdf2html document.pdf -o document.html

  # First five pages, text only
  pdf2html --pages 1-5 --images ignore paper.pdf -o paper.html

  # Page divs only, for embedding in another page
  pdf2html --fragment report.pdf -o report-body.html

  # Inspect PDF metadata
  pdf2html --inspect-only document.pdf

  # JSON output with per-page results
  pdf2html --json --metadata document.pdf > output.json

ENVIRONMENT VARIABLES:
  PDF2HTML_PDFIUM_PATH    Path to libpdfium (file or directory)
  PDFIUM_LIB_PATH         Fallback path to libpdfium
  RUST_LOG                Override the log filter (e.g. pdf2html=debug)

  Every flag can also be set as PDF2HTML_<FLAG>, e.g. PDF2HTML_PAGES=1-3.

PDFIUM:
  The PDFium shared library is loaded at runtime. It is searched for in
  $PDF2HTML_PDFIUM_PATH, $PDFIUM_LIB_PATH, <cache dir>/pdf2html/, the
  working directory, then the system library path.
"#;

/// Convert PDF files to positioned HTML.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2html",
    version,
    about = "Convert PDF files to positioned HTML using PDFium",
    long_about = "Convert PDF documents to HTML. Each page becomes a fixed-size <div>; \
text is placed in absolutely positioned boxes at its original coordinates and images are \
embedded as base64 data URIs, so the output is a single self-contained file.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the PDF file.
    input: PathBuf,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long, env = "PDF2HTML_OUTPUT")]
    output: Option<PathBuf>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2HTML_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2HTML_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Image handling: embed (base64 data URIs) or ignore.
    #[arg(long, env = "PDF2HTML_IMAGES", value_enum, default_value = "embed")]
    images: ImagesArg,

    /// Emit only the page divs, without <html>/<head>/<body>.
    #[arg(long, env = "PDF2HTML_FRAGMENT")]
    fragment: bool,

    /// Add <meta> tags for author, subject, creator and producer.
    #[arg(long, env = "PDF2HTML_METADATA")]
    metadata: bool,

    /// Document <title>; defaults to the PDF title or the file name.
    #[arg(long, env = "PDF2HTML_TITLE")]
    title: Option<String>,

    /// Reject input files larger than this many MiB.
    #[arg(long, env = "PDF2HTML_MAX_SIZE_MB", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_size_mb: u64,

    /// Output structured JSON (ConversionOutput) instead of HTML.
    #[arg(long, env = "PDF2HTML_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long, env = "PDF2HTML_INSPECT_ONLY")]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2HTML_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ImagesArg {
    Embed,
    Ignore,
}

impl From<ImagesArg> for ImageMode {
    fn from(v: ImagesArg) -> Self {
        match v {
            ImagesArg::Embed => ImageMode::EmbedBase64,
            ImagesArg::Ignore => ImageMode::Ignore,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
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

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            let fields = [
                ("Title:       ", &meta.title),
                ("Author:      ", &meta.author),
                ("Subject:     ", &meta.subject),
                ("Creator:     ", &meta.creator),
                ("Producer:    ", &meta.producer),
                ("Created:     ", &meta.creation_date),
                ("Modified:    ", &meta.modification_date),
            ];
            for (label, value) in fields {
                if let Some(v) = value {
                    println!("{label} {v}");
                }
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = convert_to_file(&cli.input, output_path, &config)
            .await
            .with_context(|| format!("Conversion of {} failed", cli.input.display()))?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
            );
        }
        if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {}ms  →  {}",
                if stats.failed_pages == 0 { green("✔") } else { cyan("⚠") },
                stats.processed_pages,
                stats.processed_pages + stats.failed_pages,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
            if stats.processed_pages > 0 && stats.text_free_pages == stats.processed_pages {
                warn_scanned();
            }
        }
    } else {
        let output = convert(&cli.input, &config)
            .await
            .with_context(|| format!("Conversion of {} failed", cli.input.display()))?;

        if cli.json {
            println!("{}", output.to_json().context("Failed to serialise output")?);
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.html.as_bytes())
                .context("Failed to write to stdout")?;
            handle.flush().context("Failed to write to stdout")?;
        }

        if !cli.quiet && !show_progress && !cli.json {
            eprintln!(
                "Converted {}/{} pages in {}ms",
                output.stats.processed_pages,
                output.stats.processed_pages + output.stats.failed_pages,
                output.stats.total_duration_ms
            );
            if output.stats.failed_pages > 0 {
                eprintln!("  {} pages failed", output.stats.failed_pages);
            }
        }
        if !cli.quiet && output.is_scanned() {
            warn_scanned();
        }
    }

    Ok(())
}

fn warn_scanned() {
    eprintln!(
        "{} No page has a text layer; this looks like a scanned PDF. Run OCR first to get selectable text.",
        yellow("⚠"),
    );
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ConversionConfig::builder()
        .pages(pages)
        .image_mode(cli.images.into())
        .standalone(!cli.fragment)
        .include_metadata(cli.metadata)
        .max_input_bytes(cli.max_size_mb.saturating_mul(1024 * 1024));

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` (`all`, `5`, `3-15`, `1,3,5`) into a `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
        return Ok(PageSelection::All);
    }

    if let Some((first, last)) = s.split_once('-') {
        let (first, last) = (page_number(first)?, page_number(last)?);
        anyhow::ensure!(
            first <= last,
            "Invalid page range '{first}-{last}': start must be <= end"
        );
        return Ok(PageSelection::Range(first, last));
    }

    if s.contains(',') {
        let pages = s.split(',').map(page_number).collect::<Result<Vec<_>>>()?;
        return Ok(PageSelection::Set(pages));
    }

    page_number(s).map(PageSelection::Single)
}

/// One 1-based page number.
fn page_number(token: &str) -> Result<usize> {
    let token = token.trim();
    let page: usize = token
        .parse()
        .with_context(|| format!("Invalid page number: '{token}'"))?;
    anyhow::ensure!(page >= 1, "Pages are 1-indexed, minimum is 1 (got {page})");
    Ok(page)
}
