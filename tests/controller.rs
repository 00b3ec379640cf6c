use std::time::Duration;

use grantwatch::controller::{run_controller, UiCommand};
use grantwatch::engine::{ProgressEstimator, WatchRequest};
use grantwatch::model::{QueryStatus, WatchConfig, WatchEvent};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> WatchConfig {
    WatchConfig {
        base_url: base_url.to_string(),
        page_url: format!("{base_url}/grants"),
        poll_interval: Duration::from_millis(20),
        progress_interval: Duration::from_millis(10),
        progress_step: ProgressEstimator::DEFAULT_STEP,
        connect_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(5),
        user_agent: "grantwatch-test".to_string(),
    }
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<WatchEvent>) -> WatchEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within timeout")
        .expect("event channel open")
}

#[tokio::test]
async fn resume_after_completion_reuses_the_same_job() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/grants_by_text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queryId": 11})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/grants_query_status"))
        .and(body_partial_json(json!({"queryId": 11})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": [{"id": "a"}],
            "sampleFraction": 1.0,
            "queryText": "cancer research"
        })))
        .mount(&server)
        .await;

    let cfg = test_config(&server.uri());
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let controller = tokio::spawn({
        let cfg = cfg.clone();
        async move {
            run_controller(
                &cfg,
                Some(WatchRequest::Submit {
                    text: "cancer research".to_string(),
                }),
                evt_tx,
                cmd_rx,
            )
            .await
        }
    });

    // First run: fresh submission.
    loop {
        if let WatchEvent::WatchCompleted { outcome } = next_event(&mut evt_rx).await {
            assert_eq!(outcome.query_id, 11);
            assert_eq!(outcome.status, QueryStatus::Success);
            break;
        }
    }

    // Second run resumes the finished job; the creation endpoint must not be
    // called again (its expect(1) verifies on server drop).
    cmd_tx
        .send(UiCommand::Resume { query_id: 11 })
        .expect("controller alive");

    let mut resumed_created = false;
    loop {
        match next_event(&mut evt_rx).await {
            WatchEvent::JobCreated { query_id, resumed } => {
                assert_eq!(query_id, 11);
                assert!(resumed);
                resumed_created = true;
            }
            WatchEvent::WatchCompleted { outcome } => {
                assert_eq!(outcome.query_text, "cancer research");
                break;
            }
            _ => {}
        }
    }
    assert!(resumed_created);

    cmd_tx.send(UiCommand::Quit).expect("controller alive");
    controller.await.expect("join").expect("controller ok");
}

#[tokio::test]
async fn new_submission_supersedes_the_active_watch() {
    let server = MockServer::start().await;

    // Job 21 never finishes on its own.
    Mock::given(method("POST"))
        .and(path("/api/grants_query_status"))
        .and(body_partial_json(json!({"queryId": 21})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "in_progress",
            "sampleFraction": 1.0
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/grants_by_text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queryId": 22})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/grants_query_status"))
        .and(body_partial_json(json!({"queryId": 22})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": [{"id": "fresh"}],
            "sampleFraction": 1.0
        })))
        .mount(&server)
        .await;

    let cfg = test_config(&server.uri());
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let controller = tokio::spawn({
        let cfg = cfg.clone();
        async move {
            run_controller(
                &cfg,
                Some(WatchRequest::Resume { query_id: 21 }),
                evt_tx,
                cmd_rx,
            )
            .await
        }
    });

    // Wait until the stuck watch is actually polling before superseding it.
    loop {
        if let WatchEvent::StatusChanged { status } = next_event(&mut evt_rx).await {
            if status == QueryStatus::InProgress {
                break;
            }
        }
    }

    cmd_tx
        .send(UiCommand::Submit {
            text: "renewable energy".to_string(),
        })
        .expect("controller alive");

    // The old run must be observed finished before the new job appears.
    let mut old_run_finished = false;
    loop {
        match next_event(&mut evt_rx).await {
            WatchEvent::WatchCompleted { outcome } if outcome.query_id == 21 => {
                old_run_finished = true;
            }
            WatchEvent::JobCreated { query_id, resumed } => {
                assert!(old_run_finished, "restart must be serialized");
                assert_eq!(query_id, 22);
                assert!(!resumed);
                break;
            }
            _ => {}
        }
    }

    loop {
        if let WatchEvent::WatchCompleted { outcome } = next_event(&mut evt_rx).await {
            assert_eq!(outcome.query_id, 22);
            let ids: Vec<&str> = outcome
                .grants
                .as_deref()
                .unwrap()
                .iter()
                .map(|g| g.id.as_str())
                .collect();
            assert_eq!(ids, ["fresh"]);
            break;
        }
    }

    cmd_tx.send(UiCommand::Quit).expect("controller alive");
    controller.await.expect("join").expect("controller ok");
}
