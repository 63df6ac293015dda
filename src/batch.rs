//! Batch conversion of many documents.
//!
//! Documents run in parallel on a rayon pool. Each one is isolated: an I/O
//! error, an output collision or a panic fails that document only. Results
//! come back in input order; progress is streamed over a channel.

use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::parser::{ParseOptions, Pipeline};
use crate::render::ExtractionStats;

/// Suffix appended to the input stem to name the output file.
pub const OUTPUT_SUFFIX: &str = "_converted.md";

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker threads (0 = one per core)
    pub jobs: usize,

    /// Directory for outputs; next to each input when unset
    pub output_dir: Option<PathBuf>,

    /// Replace existing output files
    pub overwrite: bool,

    /// Write output files; when off only the report is produced
    pub write_outputs: bool,

    /// Extraction options shared by every document
    pub parse: ParseOptions,

    /// Set to stop before the next document starts
    pub cancel: Option<Arc<AtomicBool>>,

    /// Receives a [`BatchEvent`] per document start and finish
    pub progress: Option<Sender<BatchEvent>>,
}

impl BatchOptions {
    /// Create new batch options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Write outputs into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Allow or forbid replacing existing outputs.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Produce the report only.
    pub fn dry_run(mut self) -> Self {
        self.write_outputs = false;
        self
    }

    /// Set extraction options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Share a cancellation flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Stream progress events to `sender`.
    pub fn with_progress(mut self, sender: Sender<BatchEvent>) -> Self {
        self.progress = Some(sender);
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 0,
            output_dir: None,
            overwrite: true,
            write_outputs: true,
            parse: ParseOptions::default(),
            cancel: None,
            progress: None,
        }
    }
}

/// Final state of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Converted and written
    Succeeded,
    /// Failed; see the error
    Failed,
    /// Skipped because the batch was cancelled
    Cancelled,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Progress notification for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Work on a document began
    Started { index: usize, input: PathBuf },
    /// Work on a document ended
    Finished {
        index: usize,
        input: PathBuf,
        status: DocumentStatus,
    },
}

/// Record of one document in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    /// Position in the input list
    pub index: usize,
    /// Input path
    pub input: PathBuf,
    /// Output path, when one was planned
    pub output: Option<PathBuf>,
    /// Final state
    pub status: DocumentStatus,
    /// Error message for failed documents
    pub error: Option<String>,
    /// Extraction statistics for converted documents
    pub stats: Option<ExtractionStats>,
    /// Encoding the document was decoded with
    pub encoding: Option<String>,
    /// When work on the document began
    pub started_at: DateTime<Utc>,
    /// Wall time spent on the document
    pub duration_ms: u64,
}

impl DocumentOutcome {
    /// Whether the document converted.
    pub fn is_success(&self) -> bool {
        self.status == DocumentStatus::Succeeded
    }
}

/// Ordered results of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// When the batch began
    pub started_at: DateTime<Utc>,
    /// When the batch ended
    pub finished_at: DateTime<Utc>,
    /// Number of documents given
    pub total: usize,
    /// Documents converted
    pub succeeded: usize,
    /// Documents failed
    pub failed: usize,
    /// Documents skipped after cancellation
    pub cancelled: usize,
    /// One record per input, in input order
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    /// Whether every document converted.
    pub fn is_success(&self) -> bool {
        self.succeeded == self.total
    }

    /// Failed documents.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == DocumentStatus::Failed)
    }
}

/// Runs extraction over many documents.
pub struct BatchRunner {
    options: BatchOptions,
    pipeline: Pipeline,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl BatchRunner {
    /// Create a runner with the given options.
    pub fn new(options: BatchOptions) -> Self {
        let pipeline = Pipeline::new(options.parse.clone());
        Self {
            options,
            pipeline,
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
        }
    }

    /// Use a prepared pipeline instead of one built from the options.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Documents converted so far.
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Documents failed so far.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Convert every input. Per-document failures are recorded, not returned.
    ///
    /// Fails only when the worker pool or the output directory cannot be set up.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<BatchReport> {
        let started_at = Utc::now();
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.cancelled.store(0, Ordering::Relaxed);

        if self.options.write_outputs {
            if let Some(dir) = &self.options.output_dir {
                fs::create_dir_all(dir)?;
            }
        }

        let plan = plan_outputs(inputs, self.options.output_dir.as_deref());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
            .map_err(|e| Error::Internal(format!("Cannot start worker pool: {}", e)))?;

        log::info!(
            "Converting {} document(s) on {} thread(s)",
            inputs.len(),
            pool.current_num_threads()
        );

        let outcomes: Vec<DocumentOutcome> = pool.install(|| {
            inputs
                .par_iter()
                .zip(plan.into_par_iter())
                .enumerate()
                .map(|(index, (input, output))| self.process(index, input, output))
                .collect()
        });

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            total: inputs.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            outcomes,
        };

        log::info!(
            "Batch finished: {} succeeded, {} failed, {} cancelled",
            report.succeeded,
            report.failed,
            report.cancelled
        );

        Ok(report)
    }

    fn process(&self, index: usize, input: &Path, output: Result<PathBuf>) -> DocumentOutcome {
        let started_at = Utc::now();
        let clock = Instant::now();
        let planned = output.as_ref().ok().cloned().or_else(|| match &output {
            Err(Error::OutputCollision(path)) => Some(path.clone()),
            _ => None,
        });
        let mut outcome = DocumentOutcome {
            index,
            input: input.to_path_buf(),
            output: planned,
            status: DocumentStatus::Cancelled,
            error: None,
            stats: None,
            encoding: None,
            started_at,
            duration_ms: 0,
        };

        if self.is_cancelled() {
            self.cancelled.fetch_add(1, Ordering::Relaxed);
            outcome.error = Some(Error::Cancelled.to_string());
            self.notify(BatchEvent::Finished {
                index,
                input: outcome.input.clone(),
                status: DocumentStatus::Cancelled,
            });
            return outcome;
        }

        self.notify(BatchEvent::Started {
            index,
            input: outcome.input.clone(),
        });

        let result = output.and_then(|output| {
            panic::catch_unwind(AssertUnwindSafe(|| self.convert(input, &output)))
                .unwrap_or_else(|payload| Err(Error::Internal(panic_message(payload))))
        });

        match result {
            Ok((stats, encoding)) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                outcome.status = DocumentStatus::Succeeded;
                outcome.stats = Some(stats);
                outcome.encoding = Some(encoding);
                log::debug!("Converted {}", input.display());
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                outcome.status = DocumentStatus::Failed;
                log::warn!("Failed {}: {}", input.display(), e);
                outcome.error = Some(e.to_string());
            }
        }
        outcome.duration_ms = clock.elapsed().as_millis() as u64;

        self.notify(BatchEvent::Finished {
            index,
            input: outcome.input.clone(),
            status: outcome.status,
        });
        outcome
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<(ExtractionStats, String)> {
        let result = self.pipeline.run_file(input)?;

        if self.options.write_outputs {
            if !self.options.overwrite && output.exists() {
                return Err(Error::Other(format!(
                    "Output already exists: {}",
                    output.display()
                )));
            }
            fs::write(output, &result.content)?;
        }

        Ok((result.report.stats, result.report.encoding))
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn notify(&self, event: BatchEvent) {
        if let Some(sender) = &self.options.progress {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}

/// Convert `inputs` with `options`.
pub fn run_batch(inputs: &[PathBuf], options: BatchOptions) -> Result<BatchReport> {
    BatchRunner::new(options).run(inputs)
}

/// Output path for `input`: `<stem>_converted.md` in `output_dir` or next to the input.
pub fn derive_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = format!("{}{}", stem, OUTPUT_SUFFIX);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Output path per input. The first input claiming a path keeps it; later
/// claimants, and outputs that would overwrite an input, fail with a collision.
fn plan_outputs(inputs: &[PathBuf], output_dir: Option<&Path>) -> Vec<Result<PathBuf>> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let output = derive_output_path(input, output_dir);
            if inputs.contains(&output) || !claimed.insert(output.clone()) {
                return Err(Error::OutputCollision(output));
            }
            Ok(output)
        })
        .collect()
}

/// Expand directories into the RTF files they contain, sorted by path.
///
/// Files are passed through whatever their extension.
pub fn collect_inputs(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            collect_dir(path, recursive, &mut found)?;
            found.sort();
            inputs.extend(found);
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

fn collect_dir(dir: &Path, recursive: bool, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_dir(&path, recursive, found)?;
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("rtf"))
        {
            found.push(path);
        }
    }
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with unknown payload".to_string()
    }
}
