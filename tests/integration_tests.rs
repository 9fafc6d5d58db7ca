//! Integration tests for texpulse.
//!
//! The engine-level tests drive the public monitor API through full build
//! scenarios; the CLI tests drive the binary end to end.

use texpulse::classify::PageYield;
use texpulse::config::MonitorOptions;
use texpulse::errors::EngineError;
use texpulse::events::{ProgressEvent, ProgressSink};
use texpulse::ledger::StepKind;
use texpulse::monitor::BuildMonitor;

/// Sink that records every signal for later assertions.
#[derive(Default)]
struct Collect(Vec<ProgressEvent>);

impl ProgressSink for Collect {
    fn emit(&mut self, event: &ProgressEvent) {
        self.0.push(event.clone());
    }
}

fn monitor() -> BuildMonitor {
    BuildMonitor::new(&MonitorOptions::default())
}

// =============================================================================
// End-to-end engine scenarios
// =============================================================================

mod engine_scenarios {
    use super::*;

    /// Scenario A from the design notes: a pdfTeX banner opens a
    /// page-producing stage, page markers drive updates, and a repeated
    /// marker accumulates instead of duplicating.
    #[test]
    fn test_pdftex_stage_then_pages_then_reprocessed_page() {
        let mut m = monitor();
        let mut sink = Collect::default();
        let _rx = m.start().unwrap();

        m.append_output("This is pdfTeX, Version 3.14", &mut sink).unwrap();
        match &sink.0[0] {
            ProgressEvent::Reset { stage, name, pages, .. } => {
                assert_eq!((*stage, name.as_str()), (1, "pdfTeX"));
                assert_eq!(*pages, PageYield::Yes);
            }
            other => panic!("expected reset, got {other:?}"),
        }

        m.append_output("[1]", &mut sink).unwrap();
        let first_duration = match &sink.0[1] {
            ProgressEvent::Update { page, pages_total, unit_millis, .. } => {
                assert_eq!(*page, Some(1));
                assert!(pages_total.unwrap() >= 1);
                *unit_millis
            }
            other => panic!("expected update, got {other:?}"),
        };

        m.append_output("[1]", &mut sink).unwrap();
        let second_duration = match &sink.0[2] {
            ProgressEvent::Update { page, unit_millis, .. } => {
                assert_eq!(*page, Some(1));
                *unit_millis
            }
            other => panic!("expected update, got {other:?}"),
        };
        assert!(second_duration >= first_duration);

        let summary = m.end(&mut sink).unwrap();
        let stage = &summary.ledger.stages()[0];
        assert_eq!(stage.page_count(), 1, "page 1 must have exactly one entry");
        let page_entry = stage
            .entries
            .iter()
            .find(|e| e.kind == StepKind::Page(1))
            .unwrap();
        assert_eq!(page_entry.millis, second_duration);
    }

    /// Scenario B: a latexmk rule line naming a hardcoded tool emits no
    /// generic reset; the tool's own banner counts the stage.
    #[test]
    fn test_hardcoded_rule_name_owns_the_stage_transition() {
        let mut m = monitor();
        let mut sink = Collect::default();
        let _rx = m.start().unwrap();

        m.append_output("Latexmk: applying rule 'pdflatex'...", &mut sink)
            .unwrap();
        assert!(sink.0.is_empty(), "generic path must defer to the tool signature");

        m.append_output("This is pdfTeX, Version 3.14", &mut sink).unwrap();
        assert_eq!(sink.0.len(), 1);
        match &sink.0[0] {
            ProgressEvent::Reset { stage, name, .. } => {
                assert_eq!((*stage, name.as_str()), (1, "pdfTeX"));
            }
            other => panic!("expected reset, got {other:?}"),
        }
    }

    /// A full latexmk-style pipeline: pdfTeX, BibTeX, pdfTeX again. Stage
    /// keys stay distinct and ordered; the second pdfTeX stage starts its
    /// page timeline fresh.
    #[test]
    fn test_multi_stage_pipeline() {
        let mut m = monitor();
        let mut sink = Collect::default();
        let _rx = m.start().unwrap();

        m.append_output(
            "This is pdfTeX, Version 3.14\n[1]\n[2]\nThis is BibTeX, Version 0.99d\nDatabase file #1: refs.bib\nThis is pdfTeX, Version 3.14\n[1]\n[2]\n[3]",
            &mut sink,
        )
        .unwrap();
        let summary = m.end(&mut sink).unwrap();

        let keys: Vec<(u32, &str)> = summary
            .ledger
            .stages()
            .iter()
            .map(|s| (s.key.number, s.key.name.as_str()))
            .collect();
        assert_eq!(keys, vec![(1, "pdfTeX"), (2, "BibTeX"), (3, "pdfTeX")]);

        assert_eq!(summary.ledger.stages()[0].page_count(), 2);
        assert_eq!(summary.ledger.stages()[1].page_count(), 0);
        assert_eq!(summary.ledger.stages()[2].page_count(), 3);

        // Every stage timeline opens with a wait entry.
        for stage in summary.ledger.stages() {
            assert_eq!(stage.entries[0].kind, StepKind::Wait);
        }
    }

    #[test]
    fn test_estimate_is_monotonic_across_inference_and_authority() {
        let mut m = monitor();
        let mut sink = Collect::default();
        let _rx = m.start().unwrap();

        m.append_output("This is pdfTeX, Version 3.14\n[1]\n[2]", &mut sink)
            .unwrap();
        m.set_page_total(10);
        m.append_output("[3]", &mut sink).unwrap();

        let totals: Vec<u32> = sink
            .0
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Update { pages_total, .. } => *pages_total,
                _ => None,
            })
            .collect();
        assert_eq!(totals, vec![1, 2, 10]);
        assert!(totals.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_generic_stage_lazily_resolves_page_yield() {
        let mut m = monitor();
        let mut sink = Collect::default();
        let _rx = m.start().unwrap();

        m.append_output("Latexmk: applying rule 'sage'...", &mut sink)
            .unwrap();
        match &sink.0[0] {
            ProgressEvent::Reset { name, pages, .. } => {
                assert_eq!(name, "sage");
                assert_eq!(*pages, PageYield::Unknown);
            }
            other => panic!("expected reset, got {other:?}"),
        }

        // A page marker resolves the unknown flag to yes.
        m.append_output("[1]", &mut sink).unwrap();
        assert!(matches!(
            &sink.0[1],
            ProgressEvent::Update { page: Some(1), .. }
        ));
    }

    #[test]
    fn test_noise_lines_produce_no_signals() {
        let mut m = monitor();
        let mut sink = Collect::default();
        let _rx = m.start().unwrap();

        m.append_output(
            "(./main.tex\nLaTeX2e <2022-06-01>\nDocument Class: article\n! Undefined control sequence.",
            &mut sink,
        )
        .unwrap();
        assert!(sink.0.is_empty());

        let summary = m.end(&mut sink).unwrap();
        assert!(summary.ledger.is_empty());
    }
}

// =============================================================================
// Lifecycle properties
// =============================================================================

mod lifecycle {
    use super::*;
    use texpulse::events::NullSink;

    #[test]
    fn test_append_before_start_fails_loudly() {
        let mut m = monitor();
        let mut sink = NullSink;
        assert!(matches!(
            m.append_output("[1]", &mut sink),
            Err(EngineError::NotStarted)
        ));
    }

    #[test]
    fn test_second_start_is_rejected_until_end() {
        let mut m = monitor();
        let mut sink = NullSink;
        let _rx = m.start().unwrap();
        assert!(matches!(m.start(), Err(EngineError::AlreadyRunning)));
        m.end(&mut sink).unwrap();
        assert!(m.start().is_ok());
    }

    #[tokio::test]
    async fn test_end_resolves_completion_exactly_once() {
        let mut m = monitor();
        let mut sink = NullSink;
        let rx = m.start().unwrap();
        m.append_output("This is pdfTeX, Version 3.14\n[1]", &mut sink)
            .unwrap();
        let summary = m.end(&mut sink).unwrap();

        let awaited = rx.await.expect("completion channel must resolve");
        assert_eq!(awaited.session, summary.session);

        // The next session gets its own channel.
        let rx2 = m.start().unwrap();
        m.end(&mut sink).unwrap();
        assert!(rx2.await.is_ok());
    }

    #[test]
    fn test_disabled_monitor_satisfies_all_signatures() {
        let options = MonitorOptions {
            enabled: false,
            ..MonitorOptions::default()
        };
        let mut m = BuildMonitor::new(&options);
        let mut sink = Collect::default();

        let _rx = m.start().unwrap();
        m.append_output("This is pdfTeX, Version 3.14\n[1]", &mut sink)
            .unwrap();
        m.set_page_total(5);
        let summary = m.end(&mut sink).unwrap();

        assert!(sink.0.is_empty());
        assert_eq!(summary.total_millis, 0);
    }
}

// =============================================================================
// CLI end-to-end
// =============================================================================

mod cli {
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    fn texpulse() -> assert_cmd::Command {
        cargo_bin_cmd!("texpulse")
    }

    #[test]
    fn test_help() {
        texpulse().arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        texpulse().arg("--version").assert().success();
    }

    #[test]
    fn test_run_emits_json_signals() {
        texpulse()
            .args(["--json", "run", "--", "/bin/sh", "-c"])
            .arg("echo 'This is pdfTeX, Version 3.14'; echo '[1]'; echo '[2]'")
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""type":"reset""#))
            .stdout(predicate::str::contains(r#""type":"update""#))
            .stdout(predicate::str::contains(r#""type":"finished""#));
    }

    #[test]
    fn test_run_mirrors_child_exit_code() {
        texpulse()
            .args(["--json", "run", "--", "/bin/sh", "-c", "exit 3"])
            .assert()
            .code(3);
    }

    #[test]
    fn test_unknown_bar_style_fails_before_running() {
        texpulse()
            .args(["--bar-style", "zigzag", "run", "--", "/bin/true"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown progress bar style"));
    }
}
