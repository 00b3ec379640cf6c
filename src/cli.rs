use crate::controller::{run_controller, UiCommand};
use crate::engine::{ProgressEstimator, WatchRequest};
use crate::model::{SearchOutcome, WatchConfig, WatchEvent};
use crate::share;
use crate::summary;
use crate::view::SearchView;
use anyhow::{anyhow, bail, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "grantwatch",
    version,
    about = "Submit and watch asynchronous grant-search jobs"
)]
pub struct Cli {
    /// Free-text description of the grants to search for
    pub query: Option<String>,

    /// Resume an existing job by id instead of submitting a new query
    #[arg(long, conflicts_with = "query")]
    pub resume: Option<u64>,

    /// Resume from a share link carrying a queryId parameter
    #[arg(long, conflicts_with_all = ["query", "resume"])]
    pub url: Option<String>,

    /// Base URL of the grant-search backend
    #[arg(long, default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Page URL used when printing shareable resume links
    #[arg(long, default_value = "http://localhost:5000/grants")]
    pub page_url: String,

    /// Interval between status polls
    #[arg(long, default_value = "3s")]
    pub poll_interval: humantime::Duration,

    /// Interval between simulated progress ticks
    #[arg(long, default_value = "1s")]
    pub progress_interval: humantime::Duration,

    /// HTTP connect timeout
    #[arg(long, default_value = "10s")]
    pub connect_timeout: humantime::Duration,

    /// HTTP request timeout
    #[arg(long, default_value = "30s")]
    pub request_timeout: humantime::Duration,

    /// Print the final outcome as JSON and suppress streaming output
    #[arg(long)]
    pub json: bool,
}

/// Build a `WatchConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> WatchConfig {
    WatchConfig {
        base_url: args.base_url.clone(),
        page_url: args.page_url.clone(),
        poll_interval: Duration::from(args.poll_interval),
        progress_interval: Duration::from(args.progress_interval),
        progress_step: ProgressEstimator::DEFAULT_STEP,
        connect_timeout: Duration::from(args.connect_timeout),
        request_timeout: Duration::from(args.request_timeout),
        user_agent: format!("grantwatch/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Decide how the watch starts from the CLI arguments.
fn watch_request(args: &Cli) -> Result<WatchRequest> {
    if let Some(raw) = args.url.as_deref() {
        let query_id = share::query_id_from_url(raw)
            .ok_or_else(|| anyhow!("no usable queryId parameter in {raw}"))?;
        return Ok(WatchRequest::Resume { query_id });
    }
    if let Some(query_id) = args.resume {
        return Ok(WatchRequest::Resume { query_id });
    }
    match args.query.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(WatchRequest::Submit {
            text: text.to_string(),
        }),
        _ => bail!("provide a query, --resume <id>, or --url <share link>"),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let request = watch_request(&args)?;

    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<WatchEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let controller_cfg = cfg.clone();
    let controller_handle = tokio::spawn(async move {
        run_controller(&controller_cfg, Some(request), evt_tx, cmd_rx).await
    });

    // Ctrl-C cancels the active watch and shuts down cleanly.
    let signal_cmd_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_cmd_tx.send(UiCommand::Quit);
        }
    });

    let mut view = SearchView::default();
    let mut last_status = String::new();
    let mut final_outcome: Option<SearchOutcome> = None;
    let mut failure: Option<String> = None;

    while let Some(ev) = evt_rx.recv().await {
        view.apply(&ev);
        match ev {
            WatchEvent::JobCreated { query_id, resumed } => {
                if !args.json {
                    let verb = if resumed { "Resuming" } else { "Watching" };
                    let _ = out_tx.send(OutputLine::Stderr(format!("{verb} job {query_id}")));
                    if let Ok(link) = share::share_url(&cfg.page_url, query_id) {
                        let _ = out_tx.send(OutputLine::Stderr(format!("Resume link: {link}")));
                    }
                }
            }
            WatchEvent::StatusChanged { .. } => {
                if !args.json && view.status_label != last_status {
                    last_status = view.status_label.clone();
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "Status: {}",
                        view.display_status()
                    )));
                }
            }
            WatchEvent::QueryTextEchoed { text } => {
                if !args.json {
                    let _ = out_tx.send(OutputLine::Stderr(format!("Query: {text}")));
                }
            }
            WatchEvent::PageReceived { ref records, .. } => {
                if !args.json {
                    for grant in records {
                        let _ = out_tx.send(OutputLine::Stdout(summary::format_grant_line(grant)));
                    }
                }
            }
            WatchEvent::ProgressTick { percent } => {
                if !args.json && view.loading {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "[{percent:>3.0}%] {}",
                        view.display_status()
                    )));
                }
            }
            WatchEvent::Info(info) => {
                if !args.json {
                    let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
                }
            }
            WatchEvent::WatchFailed { message } => {
                failure = Some(message);
                let _ = cmd_tx.send(UiCommand::Quit);
            }
            WatchEvent::WatchCompleted { outcome } => {
                final_outcome = Some(*outcome);
                let _ = cmd_tx.send(UiCommand::Quit);
            }
        }
    }

    controller_handle.await??;

    if let Some(outcome) = final_outcome.as_ref() {
        if args.json {
            let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(outcome)?));
        } else {
            for line in summary::build_text_summary(outcome).lines {
                let _ = out_tx.send(OutputLine::Stdout(line));
            }
        }
    }

    drop(out_tx);
    let _ = out_handle.await;

    if let Some(message) = failure {
        bail!(message);
    }
    Ok(())
}
