//! unrtf CLI - RTF text extraction tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unrtf::batch::collect_inputs;
use unrtf::{
    derive_output_path, detect_format_from_bytes, summarize_structure, BatchEvent, BatchOptions,
    BatchRunner, CleanupPreset, DocumentStatus, JsonFormat, LineBreakMode, ParseOptions, Pipeline,
    RenderResult,
};

#[derive(Parser)]
#[command(name = "unrtf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract readable text from RTF documents", long_about = None)]
struct Cli {
    /// Input RTF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file or directory (default: <stem>_converted.md next to the input)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    extract: ExtractArgs,

    /// Suppress progress and status output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Extraction flags shared by every subcommand.
#[derive(Args, Clone, Default)]
struct ExtractArgs {
    /// Text cleanup preset
    #[arg(long, value_enum)]
    cleanup: Option<CleanupLevel>,

    /// Try Shift_JIS and EUC-JP before windows-1252
    #[arg(long)]
    japanese: bool,

    /// Encoding tried first (e.g. "shift_jis", "utf-8", "windows-1252")
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Line emitted for page breaks
    #[arg(long, value_name = "TEXT")]
    page_marker: Option<String>,

    /// Raw line-break handling
    #[arg(long, value_enum)]
    line_breaks: Option<LineBreaks>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an RTF file to a Markdown file
    Convert {
        /// Input RTF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file or directory
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Extract plain text
    Text {
        /// Input RTF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Extract text with the extraction report as JSON
    Json {
        /// Input RTF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Convert many files in parallel
    Batch {
        /// Input files or directories
        #[arg(value_name = "PATH", required = true)]
        inputs: Vec<PathBuf>,

        /// Write outputs here instead of next to each input
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value = "0")]
        jobs: usize,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Fail documents whose output already exists
        #[arg(long)]
        no_overwrite: bool,

        /// Extract without writing outputs
        #[arg(long)]
        dry_run: bool,

        /// Write the batch report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show document structure and extraction diagnostics
    Info {
        /// Input RTF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show which lines the noise filter keeps and drops
    Audit {
        /// Input RTF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show dropped lines only
        #[arg(long)]
        dropped: bool,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Whitespace normalization only, no noise filtering
    Minimal,
    /// Standard noise filtering (default)
    Standard,
    /// Also drop replacement characters and private-use glyphs
    Aggressive,
}

impl From<CleanupLevel> for CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => CleanupPreset::Minimal,
            CleanupLevel::Standard => CleanupPreset::Standard,
            CleanupLevel::Aggressive => CleanupPreset::Aggressive,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LineBreaks {
    /// Ignore raw line breaks in RTF, keep them in plain text
    Auto,
    /// Always ignore raw line breaks
    Ignore,
    /// Always keep raw line breaks
    Keep,
}

impl From<LineBreaks> for LineBreakMode {
    fn from(mode: LineBreaks) -> Self {
        match mode {
            LineBreaks::Auto => LineBreakMode::Auto,
            LineBreaks::Ignore => LineBreakMode::Ignore,
            LineBreaks::Keep => LineBreakMode::Keep,
        }
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let quiet = cli.quiet;

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            extract,
        }) => cmd_convert(&input, output.as_deref(), &extract, quiet),
        Some(Commands::Text {
            input,
            output,
            extract,
        }) => cmd_text(&input, output.as_deref(), &extract, quiet),
        Some(Commands::Json {
            input,
            output,
            compact,
            extract,
        }) => cmd_json(&input, output.as_deref(), compact, &extract, quiet),
        Some(Commands::Batch {
            inputs,
            output_dir,
            jobs,
            recursive,
            no_overwrite,
            dry_run,
            report,
            extract,
        }) => cmd_batch(
            &inputs,
            BatchArgs {
                output_dir,
                jobs,
                recursive,
                overwrite: !no_overwrite,
                dry_run,
                report,
            },
            &extract,
            quiet,
        ),
        Some(Commands::Info { input, extract }) => cmd_info(&input, &extract),
        Some(Commands::Audit {
            input,
            dropped,
            extract,
        }) => cmd_audit(&input, dropped, &extract),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &cli.extract, quiet)
            } else {
                println!("{}", "Usage: unrtf <FILE> [OUTPUT]".yellow());
                println!("       unrtf --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_options(args: &ExtractArgs) -> Result<ParseOptions, Box<dyn std::error::Error>> {
    let mut options = ParseOptions::new();
    if args.japanese {
        options = options.japanese();
    }
    if let Some(ref label) = args.encoding {
        options = options.with_encoding_label(label)?;
    }
    if let Some(level) = args.cleanup {
        options = options.with_cleanup_preset(level.into());
    }
    if let Some(ref marker) = args.page_marker {
        options = options.with_page_break_marker(marker.clone());
    }
    if let Some(mode) = args.line_breaks {
        options = options.with_line_breaks(mode.into());
    }
    Ok(options)
}

fn extract_file(input: &Path, args: &ExtractArgs) -> Result<RenderResult, Box<dyn std::error::Error>> {
    if !input.is_file() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    let pipeline = Pipeline::new(parse_options(args)?);
    Ok(pipeline.run_file(input)?)
}

fn write_or_print(output: Option<&Path>, content: &str, quiet: bool) -> CmdResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        if !quiet {
            println!("{} {}", "Saved to".green(), path.display());
        }
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: Option<&Path>, args: &ExtractArgs, quiet: bool) -> CmdResult {
    let output = match output {
        Some(path) if path.is_dir() => derive_output_path(input, Some(path)),
        Some(path) => path.to_path_buf(),
        None => derive_output_path(input, None),
    };

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}...", input.display()));

    let result = extract_file(input, args)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, &result.content)?;
    pb.finish_and_clear();

    if !quiet {
        let stats = result.stats();
        println!("{} {}", "Saved to".green(), output.display());
        println!(
            "  {} {} lines kept, {} dropped, {} words",
            "└─".dimmed(),
            stats.lines_kept,
            stats.lines_dropped,
            stats.word_count
        );
    }

    Ok(())
}

fn cmd_text(input: &Path, output: Option<&Path>, args: &ExtractArgs, quiet: bool) -> CmdResult {
    let result = extract_file(input, args)?;
    write_or_print(output, &result.content, quiet)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    args: &ExtractArgs,
    quiet: bool,
) -> CmdResult {
    let result = extract_file(input, args)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = unrtf::render::to_json(&result, format)?;
    write_or_print(output, &json, quiet)
}

struct BatchArgs {
    output_dir: Option<PathBuf>,
    jobs: usize,
    recursive: bool,
    overwrite: bool,
    dry_run: bool,
    report: Option<PathBuf>,
}

fn cmd_batch(paths: &[PathBuf], batch: BatchArgs, args: &ExtractArgs, quiet: bool) -> CmdResult {
    let inputs = collect_inputs(paths, batch.recursive)?;
    if inputs.is_empty() {
        return Err("No RTF files found".into());
    }

    if let Some(ref dir) = batch.output_dir {
        fs::create_dir_all(dir)?;
    }

    let (sender, receiver) = crossbeam_channel::unbounded();
    let mut options = BatchOptions::new()
        .with_jobs(batch.jobs)
        .with_overwrite(batch.overwrite)
        .with_parse_options(parse_options(args)?)
        .with_progress(sender);
    if let Some(dir) = batch.output_dir {
        options = options.with_output_dir(dir);
    }
    if batch.dry_run {
        options = options.dry_run();
    }
    let runner = BatchRunner::new(options);

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(inputs.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = std::thread::scope(|scope| {
        // The runner owns the only sender; the event loop ends when it is dropped.
        let handle = scope.spawn(move || runner.run(&inputs));

        for event in receiver.iter() {
            match event {
                BatchEvent::Started { input, .. } => {
                    pb.set_message(input.display().to_string());
                }
                BatchEvent::Finished { input, status, .. } => {
                    if status == DocumentStatus::Failed {
                        pb.println(format!("{} {}", "failed".red(), input.display()));
                    }
                    pb.inc(1);
                }
            }
        }

        handle.join()
    })
    .map_err(|_| "batch worker panicked")??;

    pb.finish_and_clear();

    if let Some(ref path) = batch.report {
        let json = unrtf::render::to_json(&report, JsonFormat::Pretty)?;
        fs::write(path, json)?;
    }

    if !quiet {
        println!("{}", "Batch Summary".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "Documents".bold(), report.total);
        println!("{}: {}", "Succeeded".bold(), report.succeeded.to_string().as_str().green());
        println!("{}: {}", "Failed".bold(), report.failed.to_string().as_str().red());
        if report.cancelled > 0 {
            println!("{}: {}", "Cancelled".bold(), report.cancelled);
        }
        for outcome in report.failures() {
            println!(
                "  {} {}: {}",
                "✗".red(),
                outcome.input.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        if let Some(ref path) = batch.report {
            println!("{} {}", "Report saved to".green(), path.display());
        }
    }

    if report.failed > 0 {
        return Err(format!("{} of {} documents failed", report.failed, report.total).into());
    }
    Ok(())
}

fn cmd_info(input: &Path, args: &ExtractArgs) -> CmdResult {
    if !input.is_file() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    let data = fs::read(input)?;
    let summary = summarize_structure(&data);
    let result = Pipeline::new(parse_options(args)?).run_bytes(&data);
    let report = &result.report;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    match detect_format_from_bytes(&data) {
        Ok(format) => {
            println!("{}: {}", "Format".bold(), format);
            if let Some(ref charset) = format.charset {
                println!("{}: {}", "Charset".bold(), charset);
            }
        }
        Err(_) => println!("{}: {}", "Format".bold(), "no RTF header".yellow()),
    }
    println!(
        "{}: {}{}",
        "Encoding".bold(),
        report.encoding,
        if report.lossy_decode { " (lossy)" } else { "" }
    );
    println!("{}: {} bytes", "Size".bold(), data.len());

    println!();
    println!("{}", "Structure".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let balance = if summary.is_balanced() {
        "balanced".green()
    } else {
        "unbalanced".red()
    };
    println!(
        "{}: {} open, {} close ({})",
        "Braces".bold(),
        summary.open_braces,
        summary.close_braces,
        balance
    );
    println!("{}: {}", "Max depth".bold(), summary.max_depth);
    println!("{}: {}", "Control words".bold(), summary.control_words);
    println!("{}: {}", "\\u escapes".bold(), summary.unicode_escapes);
    println!("{}: {}", "\\' escapes".bold(), summary.hex_escapes);
    for (kind, count) in &report.spans_by_kind {
        println!("  {} {}: {}", "├─".dimmed(), kind.label(), count);
    }
    if report.unclosed_groups > 0 {
        println!("{}: {}", "Unclosed groups".bold(), report.unclosed_groups);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let stats = &report.stats;
    println!(
        "{}: {} resolved, {} unresolved",
        "Escapes".bold(),
        stats.escapes_resolved,
        stats.escapes_unresolved
    );
    println!("{}: {}", "Bytes removed".bold(), stats.bytes_removed);
    println!(
        "{}: {} kept, {} dropped",
        "Lines".bold(),
        stats.lines_kept,
        stats.lines_dropped
    );
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);

    Ok(())
}

fn cmd_audit(input: &Path, dropped_only: bool, args: &ExtractArgs) -> CmdResult {
    let result = extract_file(input, args)?;
    let report = &result.report;

    for record in &report.lines {
        if record.is_kept() {
            if !dropped_only {
                println!("{} {}", "keep".green(), record.line);
            }
        } else {
            let rule = record.rule.unwrap_or("?");
            println!("{} {} {}", "drop".red(), format!("[{}]", rule).as_str().dimmed(), record.line);
        }
    }

    println!();
    println!("{}", "Dropped by rule".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    if report.dropped_by_rule.is_empty() {
        println!("{}", "nothing dropped".dimmed());
    }
    for (rule, count) in &report.dropped_by_rule {
        println!("{}: {}", rule.bold(), count);
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unrtf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("RTF text extraction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unrtf".dimmed());
    println!("License: MIT");
}
