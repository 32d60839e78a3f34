//! CLI binary for gujconv.
//!
//! A thin shim over the library crate that maps CLI flags to `JobConfig`,
//! renders a progress bar, and writes the converted file.

use anyhow::{Context, Result};
use clap::Parser;
use gujconv::{
    convert_file, font_info, font_list, ConversionProgressCallback, JobConfig, ResumeMode,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar, one line per substituted or failed
/// chunk. Chunks arrive strictly in order, so no bookkeeping beyond counts.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_job_start
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>4}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Converting");
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_job_start(&self, total_chunks: usize) {
        self.bar.set_length(total_chunks as u64);
        self.bar.reset_eta();
    }

    fn on_chunk_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("chunk {}/{}", index + 1, total));
    }

    fn on_chunk_complete(&self, _index: usize, _total: usize, _text: &str, total_chars: usize) {
        self.bar.set_position(self.bar.position() + 1);
        self.bar
            .set_message(format!("{total_chars} chars converted"));
    }

    fn on_chunk_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = match error.char_indices().nth(79) {
            Some((byte, _)) => format!("{}\u{2026}", &error[..byte]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} chunk {:>4}/{:<4}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
    }

    fn on_job_complete(&self, total_chunks: usize, converted_count: usize) {
        self.bar.finish_and_clear();
        let fallbacks = self.errors.load(Ordering::SeqCst);
        if fallbacks == 0 {
            eprintln!(
                "{} {} chunks converted successfully",
                green("✔"),
                bold(&converted_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} chunks converted  ({} substituted with original text)",
                red("⚠"),
                bold(&converted_count.to_string()),
                total_chunks,
                red(&fallbacks.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a file with the default font (Shree-Guj-0768)
  gujconv input.txt -o output.txt

  # Pick a font; output name auto-generated (converted_<font>_<n>.txt)
  gujconv -f LmgArun input.txt

  # Gentler pacing for a service that has been rate-limiting you
  gujconv --min-delay 5 --max-delay 12 input.txt -o out.txt

  # Restart from chunk 0, discarding any previous checkpoint
  gujconv --fresh input.txt -o out.txt

  # List every supported font key
  gujconv --list-fonts

RESUMING:
  Progress is checkpointed to <output>.progress.json every few chunks and
  whenever a chunk fails. Re-running the same command resumes automatically;
  pass --fresh to start over. The checkpoint is removed once the output file
  is written.

PACING:
  The conversion service bans clients that send requests back-to-back.
  Every request waits a random delay between --min-delay and --max-delay
  seconds; retries double that wait each attempt. Slower is safer.
"#;

/// Convert Unicode Gujarati text files to legacy non-Unicode font encodings.
#[derive(Parser, Debug)]
#[command(
    name = "gujconv",
    version,
    about = "Convert Unicode Gujarati text to legacy font encodings",
    long_about = "Convert Unicode Gujarati text files into legacy non-Unicode glyph encodings \
(Shree, LMG, Terafont, EKLG, and friends) by driving the fontconverter.online service in \
paced, resumable chunks.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input text file (UTF-8 Gujarati Unicode).
    #[arg(required_unless_present = "list_fonts")]
    input: Option<PathBuf>,

    /// Output file. Auto-generated from the font name if omitted.
    #[arg(short, long, env = "GUJCONV_OUTPUT")]
    output: Option<PathBuf>,

    /// Font key (see --list-fonts).
    #[arg(short, long, env = "GUJCONV_FONT", default_value = "shree0768")]
    font: String,

    /// List all available fonts and exit.
    #[arg(short, long)]
    list_fonts: bool,

    /// Minimum seconds between requests.
    #[arg(long, env = "GUJCONV_MIN_DELAY", default_value_t = 2.0)]
    min_delay: f64,

    /// Maximum seconds between requests.
    #[arg(long, env = "GUJCONV_MAX_DELAY", default_value_t = 5.0)]
    max_delay: f64,

    /// Characters per chunk (service cap: 200).
    #[arg(long, env = "GUJCONV_CHUNK_SIZE", default_value_t = 200)]
    chunk_size: usize,

    /// Attempts per chunk before the job halts.
    #[arg(long, env = "GUJCONV_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Checkpoint every N completed chunks.
    #[arg(long, env = "GUJCONV_CHECKPOINT_INTERVAL", default_value_t = 5)]
    checkpoint_interval: usize,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "GUJCONV_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Ignore any existing checkpoint and restart from chunk 0.
    #[arg(long)]
    fresh: bool,

    /// Disable the progress bar.
    #[arg(long, env = "GUJCONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GUJCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GUJCONV_QUIET")]
    quiet: bool,
}

/// First available `converted_<font>_<n>.txt` that does not already exist.
fn next_output_filename(font_name: &str) -> PathBuf {
    let stem = font_name.to_lowercase().replace(' ', "_");
    let mut counter = 1;
    loop {
        let candidate = PathBuf::from(format!("converted_{stem}_{counter}.txt"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn print_font_list() {
    println!("\nAvailable Gujarati fonts:");
    println!("{}", "=".repeat(50));
    for (key, name) in font_list() {
        println!("  {:<20} {}", bold(key), name);
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    if cli.list_fonts {
        print_font_list();
        return Ok(());
    }

    // Validate the font before touching any file; unknown keys are fatal.
    let font = font_info(&cli.font).map_err(|e| anyhow::anyhow!("{e}"))?;

    let input = cli
        .input
        .clone()
        .context("input file is required unless --list-fonts is given")?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| next_output_filename(font.name));

    let mut builder = JobConfig::builder()
        .font(&cli.font)
        .delay_bounds(cli.min_delay, cli.max_delay)
        .chunk_size(cli.chunk_size)
        .max_retries(cli.max_retries)
        .checkpoint_interval(cli.checkpoint_interval)
        .request_timeout_secs(cli.timeout)
        .resume(if cli.fresh {
            ResumeMode::Fresh
        } else {
            ResumeMode::Resume
        });

    if show_progress {
        builder = builder.progress_callback(CliProgressCallback::new());
    }
    let config = builder.build().map_err(|e| anyhow::anyhow!("{e}"))?;

    if !cli.quiet {
        eprintln!("{} {}", bold("Font:"), font.name);
        eprintln!("{} {}", bold("Input:"), input.display());
        eprintln!("{} {}", bold("Output:"), output.display());
        eprintln!(
            "{} {}-{}s between requests",
            bold("Pacing:"),
            cli.min_delay,
            cli.max_delay
        );
    }

    let stats = convert_file(&input, &output, &config)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if !cli.quiet {
        eprintln!(
            "{} {} written  {}",
            green("✔"),
            output.display(),
            dim(&format!(
                "({} chars, {} chunks, {:.1}s)",
                stats.output_chars,
                stats.total_chunks,
                stats.total_duration_ms as f64 / 1000.0
            ))
        );
    }

    Ok(())
}
