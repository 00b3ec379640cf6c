use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub base_url: String,
    /// Page URL used as the base for shareable resume links.
    pub page_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    /// Percent added to the simulated progress estimate per progress tick.
    pub progress_step: f64,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Server-reported lifecycle status of a search job.
///
/// `Queued` is client-initial; the wire only ever carries the other variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Queued,
    InProgress,
    Success,
    TimedOut,
    Error,
}

impl QueryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueryStatus::Success | QueryStatus::TimedOut | QueryStatus::Error
        )
    }

    /// Label shown while this status is current. `in_progress` gets a
    /// distinct streaming label so users can tell it apart from queuing.
    pub fn label(self) -> &'static str {
        match self {
            QueryStatus::Queued => "queuing",
            QueryStatus::InProgress => "streaming results...",
            QueryStatus::Success => "success",
            QueryStatus::TimedOut => "timed_out",
            QueryStatus::Error => "error",
        }
    }
}

/// One grant record as returned by the backend. Only `id` is guaranteed;
/// the rest depends on what the data source carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub datasource: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub award_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub query_id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    pub query_id: u64,
    /// Count of records already held by the client; the backend returns
    /// only records past this cursor.
    pub start_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub status: QueryStatus,
    #[serde(default)]
    pub results: Option<Vec<Grant>>,
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,
    /// Echoed query text; present so a resumed session can recover the
    /// original wording without resubmitting.
    #[serde(default)]
    pub query_text: Option<String>,
}

fn default_sample_fraction() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WatchEvent {
    JobCreated {
        query_id: u64,
        resumed: bool,
    },
    StatusChanged {
        status: QueryStatus,
    },
    QueryTextEchoed {
        text: String,
    },
    PageReceived {
        records: Vec<Grant>,
        total_seen: usize,
        sample_fraction: f64,
    },
    ProgressTick {
        percent: f64,
    },
    Info(InfoEvent),
    /// Emitted by the controller when a run task returns an error. Restores
    /// the idle state on the view side.
    WatchFailed {
        message: String,
    },
    WatchCompleted {
        // Box to keep WatchEvent size small; SearchOutcome carries the full
        // result set.
        outcome: Box<SearchOutcome>,
    },
}

/// Structured info events emitted by the engine and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    /// Dismissible notice raised when the backend declares the job timed out.
    TimedOutNotice,
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::TimedOutNotice => "The query timed out. This can happen due to load or \
                 if the AI backends are busy. Queries can be sped up by limiting the search \
                 domain (such as including funding minimums or maximums or restricting to \
                 specific months)."
                .to_string(),
        }
    }
}

/// Final state of one watched job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub timestamp_utc: String,
    pub query_id: u64,
    pub query_text: String,
    pub status: QueryStatus,
    /// `None` when the backend signalled an empty result set, so "zero
    /// matches" stays distinguishable from "no results yet".
    pub grants: Option<Vec<Grant>>,
    pub sample_fraction: f64,
}
