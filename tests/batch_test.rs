//! Integration tests for batch conversion.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use unrtf::batch::collect_inputs;
use unrtf::{
    run_batch, BatchEvent, BatchOptions, BatchRunner, DocumentStatus, LineRule, NoiseFilter,
    ParseOptions, Pipeline,
};

fn write_rtf(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

/// Rule that panics on a marker line.
struct PanickingRule;

impl LineRule for PanickingRule {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn is_noise(&self, line: &str) -> bool {
        if line.contains("explode") {
            panic!("rule exploded");
        }
        false
    }
}

#[test]
fn test_missing_input_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("a.rtf");
    let present = write_rtf(dir.path(), "b.rtf", "{\\rtf1 Second document body}");

    let report = run_batch(&[missing.clone(), present.clone()], BatchOptions::new()).unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 1);
    assert!(!report.is_success());

    let first = &report.outcomes[0];
    assert_eq!(first.input, missing);
    assert_eq!(first.status, DocumentStatus::Failed);
    assert!(first.error.as_deref().unwrap().contains("a.rtf"));

    let second = &report.outcomes[1];
    assert_eq!(second.status, DocumentStatus::Succeeded);
    let output = second.output.as_ref().unwrap();
    assert_eq!(output, &dir.path().join("b_converted.md"));
    assert_eq!(fs::read_to_string(output).unwrap(), "Second document body");
}

#[test]
fn test_outcomes_keep_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (0..12)
        .map(|i| {
            write_rtf(
                dir.path(),
                &format!("doc{:02}.rtf", i),
                &format!("{{\\rtf1 Document number {}}}", i),
            )
        })
        .collect();

    let report = run_batch(&inputs, BatchOptions::new().with_jobs(4)).unwrap();

    assert!(report.is_success());
    for (i, outcome) in report.outcomes.iter().enumerate() {
        assert_eq!(outcome.index, i);
        assert_eq!(outcome.input, inputs[i]);
        assert_eq!(outcome.encoding.as_deref(), Some("UTF-8"));
    }
}

#[test]
fn test_output_dir_collision_fails_later_document() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("one")).unwrap();
    fs::create_dir(dir.path().join("two")).unwrap();
    let first = write_rtf(&dir.path().join("one"), "same.rtf", "{\\rtf1 From folder one}");
    let second = write_rtf(&dir.path().join("two"), "same.rtf", "{\\rtf1 From folder two}");
    let out = dir.path().join("out");

    let report = run_batch(
        &[first, second],
        BatchOptions::new().with_output_dir(&out),
    )
    .unwrap();

    assert_eq!(report.outcomes[0].status, DocumentStatus::Succeeded);
    assert_eq!(report.outcomes[1].status, DocumentStatus::Failed);
    assert!(report.outcomes[1]
        .error
        .as_deref()
        .unwrap()
        .contains("same_converted.md"));
    assert_eq!(
        fs::read_to_string(out.join("same_converted.md")).unwrap(),
        "From folder one"
    );
}

#[test]
fn test_no_overwrite_fails_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_rtf(dir.path(), "memo.rtf", "{\\rtf1 Fresh memo text}");
    fs::write(dir.path().join("memo_converted.md"), "old").unwrap();

    let report = run_batch(&[input], BatchOptions::new().with_overwrite(false)).unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("memo_converted.md")).unwrap(),
        "old"
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_rtf(dir.path(), "memo.rtf", "{\\rtf1 Dry run text}");

    let report = run_batch(&[input], BatchOptions::new().dry_run()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcomes[0].stats.as_ref().unwrap().word_count, 3);
    assert!(!dir.path().join("memo_converted.md").exists());
}

#[test]
fn test_cancelled_batch_skips_documents() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_rtf(dir.path(), "a.rtf", "{\\rtf1 First}"),
        write_rtf(dir.path(), "b.rtf", "{\\rtf1 Second}"),
    ];

    let flag = Arc::new(AtomicBool::new(true));
    let report = run_batch(&inputs, BatchOptions::new().with_cancel_flag(flag)).unwrap();

    assert_eq!(report.cancelled, 2);
    assert_eq!(report.succeeded, 0);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == DocumentStatus::Cancelled));
    assert_eq!(
        report.outcomes[0].error.as_deref(),
        Some("Cancelled before processing")
    );
    assert!(!dir.path().join("a_converted.md").exists());
}

#[test]
fn test_progress_events() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_rtf(dir.path(), "a.rtf", "{\\rtf1 First}"),
        dir.path().join("missing.rtf"),
    ];

    let (sender, receiver) = crossbeam_channel::unbounded();
    let runner = BatchRunner::new(BatchOptions::new().with_progress(sender));
    runner.run(&inputs).unwrap();
    drop(runner);

    let events: Vec<BatchEvent> = receiver.iter().collect();
    let started = events
        .iter()
        .filter(|e| matches!(e, BatchEvent::Started { .. }))
        .count();
    let mut finished: Vec<(usize, DocumentStatus)> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Finished { index, status, .. } => Some((*index, *status)),
            _ => None,
        })
        .collect();
    finished.sort_by_key(|(index, _)| *index);

    assert_eq!(started, 2);
    assert_eq!(
        finished,
        vec![(0, DocumentStatus::Succeeded), (1, DocumentStatus::Failed)]
    );
}

#[test]
fn test_panicking_document_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = vec![
        write_rtf(dir.path(), "bad.rtf", "{\\rtf1 this line will explode}"),
        write_rtf(dir.path(), "good.rtf", "{\\rtf1 A calm document}"),
    ];

    let filter = NoiseFilter::default().with_rule_at(0, PanickingRule);
    let pipeline = Pipeline::new(ParseOptions::default()).with_filter(filter);
    let runner = BatchRunner::new(BatchOptions::new()).with_pipeline(pipeline);
    let report = runner.run(&inputs).unwrap();

    assert_eq!(report.outcomes[0].status, DocumentStatus::Failed);
    let error = report.outcomes[0].error.as_deref().unwrap();
    assert!(error.contains("rule exploded"));

    assert_eq!(report.outcomes[1].status, DocumentStatus::Succeeded);
    assert_eq!(
        fs::read_to_string(dir.path().join("good_converted.md")).unwrap(),
        "A calm document"
    );
    assert_eq!(runner.succeeded(), 1);
    assert_eq!(runner.failed(), 1);
}

#[test]
fn test_report_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_rtf(dir.path(), "a.rtf", "{\\rtf1 Report me}");

    let report = run_batch(&[input], BatchOptions::new().dry_run()).unwrap();
    let json = unrtf::render::to_json(&report, unrtf::JsonFormat::Compact).unwrap();

    assert!(json.contains("\"status\":\"succeeded\""));
    assert!(json.contains("\"total\":1"));
}

#[test]
fn test_collect_inputs_expands_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_rtf(dir.path(), "b.rtf", "{\\rtf1 b}");
    write_rtf(dir.path(), "a.RTF", "{\\rtf1 a}");
    write_rtf(dir.path(), "notes.txt", "skip");
    write_rtf(&nested, "c.rtf", "{\\rtf1 c}");

    let flat = collect_inputs(&[dir.path().to_path_buf()], false).unwrap();
    assert_eq!(flat, vec![dir.path().join("a.RTF"), dir.path().join("b.rtf")]);

    let deep = collect_inputs(&[dir.path().to_path_buf()], true).unwrap();
    assert_eq!(deep.len(), 3);
    assert!(deep.contains(&nested.join("c.rtf")));
}
