use chrono::NaiveDate;
use leave_flow::workflows::leave::{NotificationError, NotificationSink, ReviewNotice};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Queues review notices for a background delivery task. `notify` never waits, so a
/// slow or stalled transport cannot hold up a review.
#[derive(Debug, Clone)]
pub(crate) struct OutboxNotifier {
    sender: mpsc::Sender<ReviewNotice>,
}

impl OutboxNotifier {
    /// Start the delivery task. It finishes once every notifier clone is dropped and
    /// reports how many notices it handled.
    pub(crate) fn spawn(capacity: usize) -> (Self, JoinHandle<usize>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(deliver(receiver));
        (Self { sender }, worker)
    }
}

impl NotificationSink for OutboxNotifier {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotificationError> {
        self.sender.try_send(notice).map_err(|error| match error {
            TrySendError::Full(_) => {
                NotificationError::Transport("notification outbox is full".to_string())
            }
            TrySendError::Closed(_) => {
                NotificationError::Transport("notification outbox is closed".to_string())
            }
        })
    }
}

async fn deliver(mut receiver: mpsc::Receiver<ReviewNotice>) -> usize {
    let mut delivered = 0;
    while let Some(notice) = receiver.recv().await {
        if notice.applicant_email.trim().is_empty() {
            debug!(leave_id = %notice.leave_id, "applicant has no e-mail address; notice skipped");
            continue;
        }
        info!(
            to = %notice.applicant_email,
            leave_id = %notice.leave_id,
            status = notice.status.label(),
            subject = %notice.subject(),
            "review notification sent"
        );
        debug!(body = %notice.body(), "review notification body");
        delivered += 1;
    }
    delivered
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
