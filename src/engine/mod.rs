//! Search-job watch engine.
//!
//! One `SearchEngine::run` owns exactly one job lifetime: it submits the
//! query (or adopts a resumed id), then drives the fixed-period poll loop and
//! the simulated progress ticker until the backend reports a terminal status,
//! a transport error occurs, or the run is cancelled.

mod accumulator;
mod progress;

pub use accumulator::ResultAccumulator;
pub use progress::ProgressEstimator;

use crate::backend::BackendClient;
use crate::model::{InfoEvent, QueryStatus, SearchOutcome, WatchConfig, WatchEvent};
use anyhow::{bail, Context, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Stop watching the current job. Does not abort an in-flight poll; its
    /// response is discarded instead.
    Cancel,
}

/// How a watch starts: a fresh submission, or adoption of an already-created
/// job id (page-reload / share-link resumption).
#[derive(Debug, Clone)]
pub enum WatchRequest {
    Submit { text: String },
    Resume { query_id: u64 },
}

pub struct SearchEngine {
    cfg: WatchConfig,
}

impl SearchEngine {
    pub fn new(cfg: WatchConfig) -> Self {
        Self { cfg }
    }

    pub async fn run(
        self,
        request: WatchRequest,
        event_tx: mpsc::UnboundedSender<WatchEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> Result<SearchOutcome> {
        let client = BackendClient::new(&self.cfg)?;

        let cancel = Arc::new(AtomicBool::new(false));

        // Control listener.
        let cancel2 = cancel.clone();
        let control_handle = tokio::spawn(async move {
            while let Some(msg) = control_rx.recv().await {
                match msg {
                    EngineControl::Cancel => {
                        cancel2.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            }
        });

        // Submitting. A resume adopts the id directly and never touches the
        // creation endpoint; the query text is recovered later from the
        // poll response's echo.
        let (query_id, resumed, mut query_text) = match request {
            WatchRequest::Submit { text } => {
                match client.submit_query(&text).await {
                    Ok(id) => (id, false, text),
                    Err(e) => {
                        control_handle.abort();
                        return Err(e).context("job creation failed");
                    }
                }
            }
            WatchRequest::Resume { query_id } => (query_id, true, String::new()),
        };

        let _ = event_tx.send(WatchEvent::JobCreated { query_id, resumed });

        let mut status = QueryStatus::Queued;
        let _ = event_tx.send(WatchEvent::StatusChanged { status });

        // One accumulator per job lifetime; its length is the poll cursor.
        let mut acc = ResultAccumulator::new();
        let mut progress = ProgressEstimator::new(self.cfg.progress_step);
        let mut sample_fraction = 1.0f64;

        // Both timers wait one full period before the first tick.
        let mut poll_timer = interval_at(
            Instant::now() + self.cfg.poll_interval,
            self.cfg.poll_interval,
        );
        let mut progress_timer = interval_at(
            Instant::now() + self.cfg.progress_interval,
            self.cfg.progress_interval,
        );

        while !cancel.load(Ordering::Relaxed) {
            tokio::select! {
                _ = poll_timer.tick() => {
                    let resp = client.poll_status(query_id, acc.len()).await;
                    // A cancel observed while the poll was in flight wins:
                    // the response must not touch state for a job that is no
                    // longer active.
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let resp = match resp {
                        Ok(r) => r,
                        Err(e) => {
                            control_handle.abort();
                            return Err(e).context("polling query status failed");
                        }
                    };

                    if let Some(echoed) = resp.query_text {
                        if !echoed.is_empty() && echoed != query_text {
                            query_text = echoed.clone();
                            let _ = event_tx.send(WatchEvent::QueryTextEchoed { text: echoed });
                        }
                    }

                    status = resp.status;
                    let _ = event_tx.send(WatchEvent::StatusChanged { status });

                    let success = status == QueryStatus::Success;
                    let streaming = !success && resp.results.is_some();
                    if success || streaming {
                        let page = resp.results.unwrap_or_default();
                        acc.append(page.clone());
                        sample_fraction = resp.sample_fraction;
                        let _ = event_tx.send(WatchEvent::PageReceived {
                            records: page,
                            total_seen: acc.len(),
                            sample_fraction,
                        });
                    }

                    match status {
                        QueryStatus::Success => break,
                        QueryStatus::TimedOut => {
                            let _ = event_tx.send(WatchEvent::Info(InfoEvent::TimedOutNotice));
                            break;
                        }
                        QueryStatus::Error => {
                            control_handle.abort();
                            bail!("backend reported query failure");
                        }
                        QueryStatus::Queued | QueryStatus::InProgress => {}
                    }
                }
                _ = progress_timer.tick() => {
                    let _ = event_tx.send(WatchEvent::ProgressTick {
                        percent: progress.advance(),
                    });
                }
            }
        }

        // Abort the control listener task before returning; dropping the
        // JoinHandle would leave it parked on recv() forever.
        control_handle.abort();

        Ok(SearchOutcome {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            query_id,
            query_text,
            status,
            grants: acc.into_grants(),
            sample_fraction,
        })
    }
}
