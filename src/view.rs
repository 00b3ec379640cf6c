//! Client-owned view of the active watch.
//!
//! `SearchView` is the interface the rest of a UI consumes: it folds the
//! engine's event stream into the displayed state (results, loading flag,
//! status label, sampling fraction, timeout notice).

use crate::model::{Grant, QueryStatus, WatchEvent};

#[derive(Debug, Clone)]
pub struct SearchView {
    /// `None` means "unknown/absent" (no job yet, or an explicitly empty
    /// result set); `Some(vec![])` means a job is running with nothing
    /// received so far.
    pub grants: Option<Vec<Grant>>,
    pub loading: bool,
    pub status_label: String,
    pub sampling_fraction: f64,
    pub timed_out: bool,
    pub query_text: String,
    pub progress_percent: f64,
}

impl Default for SearchView {
    fn default() -> Self {
        Self {
            grants: None,
            loading: false,
            status_label: String::new(),
            sampling_fraction: 1.0,
            timed_out: false,
            query_text: String::new(),
            progress_percent: 0.0,
        }
    }
}

impl SearchView {
    /// Fold one engine event into the view.
    pub fn apply(&mut self, event: &WatchEvent) {
        match event {
            WatchEvent::JobCreated { .. } => {
                self.grants = Some(Vec::new());
                self.loading = true;
                self.sampling_fraction = 1.0;
                self.timed_out = false;
                self.progress_percent = 0.0;
            }
            WatchEvent::StatusChanged { status } => {
                self.status_label = status.label().to_string();
                self.timed_out = *status == QueryStatus::TimedOut;
                if status.is_terminal() {
                    self.loading = false;
                }
            }
            WatchEvent::QueryTextEchoed { text } => {
                self.query_text = text.clone();
            }
            WatchEvent::PageReceived {
                records,
                total_seen,
                sample_fraction,
            } => {
                if *total_seen == 0 {
                    self.grants = None;
                } else {
                    self.grants
                        .get_or_insert_with(Vec::new)
                        .extend(records.iter().cloned());
                }
                self.sampling_fraction = *sample_fraction;
            }
            WatchEvent::ProgressTick { percent } => {
                if self.loading {
                    self.progress_percent = *percent;
                }
            }
            WatchEvent::Info(_) => {}
            WatchEvent::WatchFailed { .. } => {
                self.loading = false;
                self.sampling_fraction = 1.0;
                self.progress_percent = 0.0;
            }
            WatchEvent::WatchCompleted { .. } => {
                self.loading = false;
                self.progress_percent = 0.0;
            }
        }
    }

    /// Status text for display: uppercased, underscores as spaces.
    pub fn display_status(&self) -> String {
        self.status_label.to_uppercase().replace('_', " ")
    }

    /// Whether a loading spinner should show: a job is outstanding and
    /// nothing has been received yet.
    pub fn show_spinner(&self) -> bool {
        self.loading && self.grants.as_deref().is_some_and(<[Grant]>::is_empty)
    }
}
