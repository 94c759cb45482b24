//! Integration tests for the report pipeline against a scripted chat backend.

mod common;

use common::{
    ScriptedBackend, commit_feed, issue_record, sent_messages, test_config, text_response,
    textless_response,
};
use repo_pulse::error::{GeminiError, ReportError};
use repo_pulse::records::CommitRecord;
use repo_pulse::report::prompts::{INSTRUCTION_PROMPT, ISSUES_TRANSITION_PROMPT, final_prompt};
use repo_pulse::report::{
    EXTRACTION_FAILED_REPORT, NO_ACTIVITY_REPORT, NO_RESPONSE_REPORT, Phase, ReportKind,
    ReportRequest, generate_report_with_backend,
};
use tokio_util::sync::CancellationToken;

fn request(commit_feed: String) -> ReportRequest {
    ReportRequest {
        commit_feed,
        ..Default::default()
    }
}

// =============================================================================
// NO-ACTIVITY SHORT CIRCUIT
// =============================================================================

#[tokio::test]
async fn test_empty_feed_never_contacts_backend() {
    for raw in ["[]", "  []\n", "[ ]", "null"] {
        let backend = ScriptedBackend::new();
        let requests = backend.requests();

        let report = generate_report_with_backend(
            &test_config(100),
            request(raw.to_string()),
            backend,
            CancellationToken::new(),
        )
        .await
        .expect("Empty feed should not fail");

        assert_eq!(report.content, NO_ACTIVITY_REPORT, "feed {:?}", raw);
        assert_eq!(report.kind, ReportKind::NoActivity);
        assert!(requests.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_empty_feed_writes_placeholder_to_destination() {
    let dir = common::temp_test_dir();
    let path = dir.path().join("report.md");

    let report = generate_report_with_backend(
        &test_config(100),
        ReportRequest {
            commit_feed: "[]".to_string(),
            issues: Vec::new(),
            destination: Some(path.clone()),
        },
        ScriptedBackend::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), NO_ACTIVITY_REPORT);
    assert_eq!(report.path.as_deref(), Some(path.as_path()));
}

// =============================================================================
// CHUNKING
// =============================================================================

#[tokio::test]
async fn test_250_commits_in_chunks_of_100() {
    let (records, raw) = commit_feed(250);
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    generate_report_with_backend(
        &test_config(100),
        request(raw),
        backend,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let sent = sent_messages(&requests);
    assert_eq!(sent.len(), 5, "instruction + 3 chunks + final prompt");
    assert_eq!(sent[0], INSTRUCTION_PROMPT);
    assert_eq!(sent[4], final_prompt(false));
    assert!(!sent.iter().any(|m| m == ISSUES_TRANSITION_PROMPT));

    let sizes: Vec<usize> = sent[1..4]
        .iter()
        .map(|chunk| serde_json::from_str::<Vec<CommitRecord>>(chunk).unwrap().len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);

    // Concatenating the chunks gives back the original feed in order.
    let rebuilt: Vec<CommitRecord> = sent[1..4]
        .iter()
        .flat_map(|chunk| serde_json::from_str::<Vec<CommitRecord>>(chunk).unwrap())
        .collect();
    assert_eq!(rebuilt, records);
}

#[tokio::test]
async fn test_chunks_are_pretty_printed() {
    let (records, raw) = commit_feed(3);
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    generate_report_with_backend(&test_config(2), request(raw), backend, CancellationToken::new())
        .await
        .unwrap();

    let sent = sent_messages(&requests);
    assert_eq!(sent[1], serde_json::to_string_pretty(&records[0..2]).unwrap());
    assert_eq!(sent[2], serde_json::to_string_pretty(&records[2..3]).unwrap());
    assert!(sent[1].contains("\n  {\n    \"commit_date_time\""));
}

#[tokio::test]
async fn test_history_is_resent_every_turn() {
    let (_, raw) = commit_feed(2);
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    generate_report_with_backend(&test_config(1), request(raw), backend, CancellationToken::new())
        .await
        .unwrap();

    let lengths: Vec<usize> = requests.lock().unwrap().iter().map(|r| r.len()).collect();
    assert_eq!(lengths, vec![1, 3, 5, 7]);
}

#[tokio::test]
async fn test_extra_commit_fields_reach_the_model() {
    let raw = r#"[{
        "commit_date_time": "2025-06-02T09:30:00Z",
        "author_name": "Ada",
        "author_email": "ada@example.com",
        "commit_message": "Add parser",
        "modified_files": ["a.rs"],
        "hash": "abc123",
        "branch": "main"
    }]"#;
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    generate_report_with_backend(
        &test_config(10),
        request(raw.to_string()),
        backend,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let sent = sent_messages(&requests);
    assert!(sent[1].contains("\"hash\": \"abc123\""));
    assert!(sent[1].contains("\"branch\": \"main\""));
}

// =============================================================================
// ISSUE PHASE
// =============================================================================

#[tokio::test]
async fn test_issue_phase_between_commits_and_final_prompt() {
    let (_, raw) = commit_feed(2);
    let issues: Vec<_> = (0..3).map(issue_record).collect();
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    generate_report_with_backend(
        &test_config(2),
        ReportRequest {
            commit_feed: raw,
            issues: issues.clone(),
            destination: None,
        },
        backend,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let sent = sent_messages(&requests);
    assert_eq!(sent.len(), 6);
    assert_eq!(sent[2], ISSUES_TRANSITION_PROMPT);
    assert_eq!(sent[3], serde_json::to_string_pretty(&issues[0..2]).unwrap());
    assert_eq!(sent[4], serde_json::to_string_pretty(&issues[2..3]).unwrap());
    assert_eq!(sent[5], final_prompt(true));
    assert!(sent[5].contains("velocity"));
}

// =============================================================================
// FINAL RESPONSE HANDLING
// =============================================================================

#[tokio::test]
async fn test_only_final_response_becomes_report() {
    let (_, raw) = commit_feed(2);
    let backend = ScriptedBackend::new().with_replies(vec![
        Ok(Some(text_response("Understood."))),
        Ok(Some(text_response("# Premature report from chunk 1"))),
        Ok(Some(text_response("# Premature report from chunk 2"))),
        Ok(Some(text_response("# Weekly Project Status Report\n\nAll good.\n"))),
    ]);

    let report = generate_report_with_backend(
        &test_config(1),
        request(raw),
        backend,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.content, "# Weekly Project Status Report\n\nAll good.\n");
    assert_eq!(report.kind, ReportKind::Generated);
    assert!(!report.content.contains("Premature"));
}

#[tokio::test]
async fn test_absent_final_response_is_placeholder() {
    let (_, raw) = commit_feed(1);
    let backend = ScriptedBackend::new().with_replies(vec![
        Ok(Some(text_response("ok"))),
        Ok(Some(text_response("ok"))),
        Ok(None),
    ]);

    let report = generate_report_with_backend(&test_config(10), request(raw), backend, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.content, NO_RESPONSE_REPORT);
    assert_eq!(report.kind, ReportKind::NoResponse);
}

#[tokio::test]
async fn test_textless_final_response_is_extraction_placeholder() {
    let (_, raw) = commit_feed(1);
    let backend = ScriptedBackend::new().with_replies(vec![
        Ok(Some(text_response("ok"))),
        Ok(Some(text_response("ok"))),
        Ok(Some(textless_response())),
    ]);

    let report = generate_report_with_backend(&test_config(10), request(raw), backend, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.content, EXTRACTION_FAILED_REPORT);
    assert_eq!(report.kind, ReportKind::ExtractionFailed);
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_failure_mid_chunks_aborts_without_writing() {
    let dir = common::temp_test_dir();
    let path = dir.path().join("report.md");
    let (_, raw) = commit_feed(250);

    let backend = ScriptedBackend::new().with_replies(vec![
        Ok(Some(text_response("ok"))),
        Ok(Some(text_response("ok"))),
        Err(GeminiError::Api {
            status: 500,
            body: "internal".to_string(),
        }),
    ]);
    let requests = backend.requests();

    let err = generate_report_with_backend(
        &test_config(100),
        ReportRequest {
            commit_feed: raw,
            issues: Vec::new(),
            destination: Some(path.clone()),
        },
        backend,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Transmission {
            phase: Phase::CommitChunk { index: 2, total: 3 },
            ..
        }
    ));
    assert!(err.to_string().contains("commit chunk 2/3"));
    assert_eq!(requests.lock().unwrap().len(), 3, "no turns after the failure");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_failure_on_instruction() {
    let (_, raw) = commit_feed(1);
    let backend = ScriptedBackend::new().with_replies(vec![Err(GeminiError::Api {
        status: 403,
        body: "denied".to_string(),
    })]);

    let err = generate_report_with_backend(&test_config(10), request(raw), backend, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Transmission {
            phase: Phase::Instruction,
            ..
        }
    ));
}

#[tokio::test]
async fn test_malformed_feed_is_rejected_before_any_turn() {
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    let err = generate_report_with_backend(
        &test_config(10),
        request(r#"{"commits": []}"#.to_string()),
        backend,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::MalformedInput(_)));
    assert!(err.to_string().contains("git logs"));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_any_turn() {
    let (_, raw) = commit_feed(1);
    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    let err = generate_report_with_backend(&test_config(0), request(raw), backend, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::Config(_)));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unwritable_destination_is_write_error() {
    let dir = common::temp_test_dir();
    let (_, raw) = commit_feed(1);

    let err = generate_report_with_backend(
        &test_config(10),
        ReportRequest {
            commit_feed: raw,
            issues: Vec::new(),
            destination: Some(dir.path().to_path_buf()),
        },
        ScriptedBackend::new(),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::Write { .. }));
    assert!(dir.path().is_dir());
}

// =============================================================================
// CANCELLATION
// =============================================================================

#[tokio::test]
async fn test_cancelled_before_start() {
    let (_, raw) = commit_feed(1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let backend = ScriptedBackend::new();
    let requests = backend.requests();

    let err = generate_report_with_backend(&test_config(10), request(raw), backend, cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Cancelled {
            phase: Phase::Instruction
        }
    ));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_mid_run_stops_before_next_turn() {
    let dir = common::temp_test_dir();
    let path = dir.path().join("report.md");
    let (_, raw) = commit_feed(3);
    let cancel = CancellationToken::new();

    // Turn 2 is the first commit chunk.
    let backend = ScriptedBackend::new().cancel_during(2, cancel.clone());
    let requests = backend.requests();

    let err = generate_report_with_backend(
        &test_config(1),
        ReportRequest {
            commit_feed: raw,
            issues: Vec::new(),
            destination: Some(path.clone()),
        },
        backend,
        cancel,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Cancelled {
            phase: Phase::CommitChunk { index: 2, total: 3 }
        }
    ));
    assert_eq!(requests.lock().unwrap().len(), 2);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_cancelled_during_final_prompt_skips_finalizer() {
    let dir = common::temp_test_dir();
    let path = dir.path().join("report.md");
    let (_, raw) = commit_feed(1);
    let cancel = CancellationToken::new();

    // Turn 3 is the final prompt.
    let backend = ScriptedBackend::new().cancel_during(3, cancel.clone());

    let err = generate_report_with_backend(
        &test_config(10),
        ReportRequest {
            commit_feed: raw,
            issues: Vec::new(),
            destination: Some(path.clone()),
        },
        backend,
        cancel,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Cancelled {
            phase: Phase::Finalize
        }
    ));
    assert!(!path.exists());
}
