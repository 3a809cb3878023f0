// tests/pipeline_on_demand.rs
mod common;

use common::*;
use knowledge_curator::error::ItemRefError;
use knowledge_curator::pipeline::{RunError, SUMMARY_FAILED, TRANSCRIPT_UNAVAILABLE};
use knowledge_curator::{RunMode, RunOutcome, RunState, SummaryBody};

const ON_DEMAND_TRACE: [RunState; 5] = [
    RunState::Idle,
    RunState::Enriching,
    RunState::Assembling,
    RunState::Delivering,
    RunState::Done,
];

fn on_demand(fetcher: FakeFetcher, summarizer: FakeSummarizer) -> Harness {
    // Keywords and sources are irrelevant on demand: nothing here would match.
    harness(
        FakeFeed::default().with("UC_A", vec![item("ZZZZZZZZZZ9", "Unrelated", 1)]),
        fetcher,
        summarizer,
        RecordingNotifier::default(),
        settings(&["UC_A"], &["no-such-keyword"]),
    )
}

#[tokio::test]
async fn single_video_gets_one_digest_with_its_title() {
    let h = on_demand(
        FakeFetcher::default()
            .text("dQw4w9WgXcQ", "never gonna give you up")
            .title("dQw4w9WgXcQ", "Lecture 7: Graphs"),
        FakeSummarizer::default(),
    );
    let link = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=30s";

    let report = h.curator.run(RunMode::OnDemand(link.into())).await.unwrap();

    assert_eq!(report.trace, ON_DEMAND_TRACE);
    assert_eq!(report.outcome, RunOutcome::Delivered);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].title, "Lecture 7: Graphs");
    assert_eq!(report.results[0].link, link);
    assert!(!report.results[0].is_placeholder());
    assert_eq!(h.fetcher.calls(), vec!["dQw4w9WgXcQ".to_string()]);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Notes for: Lecture 7: Graphs");
    assert!(sent[0].body.contains("<h2>Lecture 7: Graphs</h2>"));
    assert!(!sent[0].body.contains("Unrelated"));
}

#[tokio::test]
async fn unknown_title_and_missing_transcript_still_send_a_placeholder() {
    let h = on_demand(
        FakeFetcher::default().missing("dQw4w9WgXcQ"),
        FakeSummarizer::default(),
    );

    let report = h.curator.run_on_demand("dQw4w9WgXcQ").await.unwrap();

    let expected_title = "On-Demand Analysis for video ID: dQw4w9WgXcQ";
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].title, expected_title);
    assert_eq!(
        report.results[0].link,
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    );
    assert_eq!(
        report.results[0].body,
        SummaryBody::Placeholder(TRANSCRIPT_UNAVAILABLE.to_string())
    );
    assert_eq!(h.summarizer.calls(), 0);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, format!("Notes for: {expected_title}"));
}

#[tokio::test]
async fn summarizer_failure_yields_placeholder_not_error() {
    let h = on_demand(
        FakeFetcher::default()
            .text("dQw4w9WgXcQ", "words")
            .title("dQw4w9WgXcQ", "Flaky Talk"),
        FakeSummarizer::failing_for("Flaky Talk"),
    );

    let report = h.curator.run_on_demand("https://youtu.be/dQw4w9WgXcQ").await.unwrap();

    assert_eq!(
        report.results[0].body,
        SummaryBody::Placeholder(SUMMARY_FAILED.to_string())
    );
    assert_eq!(report.state(), RunState::Done);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn malformed_reference_fails_before_any_work() {
    let h = on_demand(FakeFetcher::default(), FakeSummarizer::default());

    let err = h
        .curator
        .run(RunMode::OnDemand("https://vimeo.com/42".into()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RunError::InvalidItemRef(ItemRefError::Unrecognized(_))
    ));

    let err = h.curator.run_on_demand("   ").await.unwrap_err();
    assert!(matches!(err, RunError::InvalidItemRef(ItemRefError::Empty)));

    assert!(h.fetcher.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
}
