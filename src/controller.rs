//! Watch lifecycle controller.
//!
//! Owns start/stop/restart orchestration for search-job watches and emits
//! events for presentation layers. At most one job is ever actively polled:
//! a new submit or resume cancels the running watch first and only starts
//! the replacement once the old run is observed to have finished, so a
//! superseded job's poll responses can never reach the new accumulator.

use crate::engine::{EngineControl, SearchEngine, WatchRequest};
use crate::model::{InfoEvent, SearchOutcome, WatchConfig, WatchEvent};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;

/// Commands emitted by UI layers to control the active watch.
#[derive(Debug, Clone)]
pub enum UiCommand {
    Submit { text: String },
    Resume { query_id: u64 },
    Cancel,
    Quit,
}

/// Internal handle for a running watch task.
struct RunCtx {
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<Result<SearchOutcome>>>,
}

/// Spawn a new watch run and return its control handle.
fn start_run(
    cfg: &WatchConfig,
    request: WatchRequest,
    event_tx: UnboundedSender<WatchEvent>,
) -> RunCtx {
    let (ctrl_tx, ctrl_rx) = tokio::sync::mpsc::unbounded_channel::<EngineControl>();
    let engine = SearchEngine::new(cfg.clone());
    let handle = tokio::spawn(async move { engine.run(request, event_tx, ctrl_rx).await });
    RunCtx {
        ctrl_tx,
        handle: Some(handle),
    }
}

/// Orchestrate watch runs based on UI commands and emit events back to
/// presentation layers.
pub async fn run_controller(
    cfg: &WatchConfig,
    initial: Option<WatchRequest>,
    event_tx: UnboundedSender<WatchEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx = initial.map(|req| start_run(cfg, req, event_tx.clone()));
    let mut pending_request: Option<WatchRequest> = None;
    let mut quit_pending = false;
    // Cancel watchdog: if a cancel takes too long, emit a status message to
    // keep UI feedback alive.
    let mut cancel_deadline: Option<tokio::time::Instant> = None;
    let mut watchdog = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit { text }) => {
                        request_run(
                            WatchRequest::Submit { text },
                            cfg,
                            &mut run_ctx,
                            &mut pending_request,
                            &mut cancel_deadline,
                            &event_tx,
                        );
                    }
                    Some(UiCommand::Resume { query_id }) => {
                        request_run(
                            WatchRequest::Resume { query_id },
                            cfg,
                            &mut run_ctx,
                            &mut pending_request,
                            &mut cancel_deadline,
                            &event_tx,
                        );
                    }
                    Some(UiCommand::Cancel) => {
                        pending_request = None;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            cancel_deadline = Some(
                                tokio::time::Instant::now() + Duration::from_secs(3),
                            );
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Quit waits for the current run to finish so we can
                        // cleanly finalize UI state.
                        quit_pending = true;
                        pending_request = None;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            cancel_deadline = Some(
                                tokio::time::Instant::now() + Duration::from_secs(3),
                            );
                        } else {
                            break;
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it
            // can be dropped if another select branch is chosen, and we'll
            // never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    if let Some(ctx) = &mut run_ctx {
                        ctx.handle.take();
                    }
                    match join_res {
                        Ok(Ok(outcome)) => {
                            let _ = event_tx.send(WatchEvent::WatchCompleted {
                                outcome: Box::new(outcome),
                            });
                        }
                        Ok(Err(e)) => {
                            let _ = event_tx.send(WatchEvent::WatchFailed {
                                message: format!("Search failed: {e:#}"),
                            });
                        }
                        Err(e) => {
                            let _ = event_tx.send(WatchEvent::WatchFailed {
                                message: format!("Watch task join failed: {e}"),
                            });
                        }
                    }
                    run_ctx = None;
                    cancel_deadline = None;
                    if quit_pending {
                        break;
                    }
                    if let Some(req) = pending_request.take() {
                        run_ctx = Some(start_run(cfg, req, event_tx.clone()));
                    }
                }
            }
            // If a cancel stalls (e.g., a poll in flight on a slow link),
            // keep the user informed.
            _ = watchdog.tick() => {
                if let Some(deadline) = cancel_deadline {
                    if tokio::time::Instant::now() >= deadline && run_ctx.is_some() {
                        let _ = event_tx.send(WatchEvent::Info(InfoEvent::Message(
                            "Still cancelling…".into(),
                        )));
                        cancel_deadline = None;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Start a watch, or schedule it behind a cancel of the active one.
fn request_run(
    request: WatchRequest,
    cfg: &WatchConfig,
    run_ctx: &mut Option<RunCtx>,
    pending_request: &mut Option<WatchRequest>,
    cancel_deadline: &mut Option<tokio::time::Instant>,
    event_tx: &UnboundedSender<WatchEvent>,
) {
    if let Some(ctx) = run_ctx {
        *pending_request = Some(request);
        let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
        let _ = event_tx.send(WatchEvent::Info(InfoEvent::Message("Cancelling…".into())));
        *cancel_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
    } else {
        *run_ctx = Some(start_run(cfg, request, event_tx.clone()));
    }
}
