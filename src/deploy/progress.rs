// ABOUTME: Progress narration over an unbounded channel.
// ABOUTME: Sending never blocks; the consumer ends once the reporter is dropped.

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use super::error::DeployStage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: DeployStage,
    pub message: String,
}

/// Sending half of the progress channel. Owned by one deployment.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    /// A reporter that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn report(&self, stage: DeployStage, message: impl Into<String>) {
        let Some(tx) = &self.tx else { return };
        // A consumer that went away is not the deployment's problem.
        let _ = tx.send(ProgressEvent {
            stage,
            message: message.into(),
        });
    }
}

pub fn progress_channel() -> (ProgressReporter, UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = unbounded_channel();
    (ProgressReporter { tx: Some(tx) }, rx)
}

/// Drain `rx` on a separate task, handing each event to `handle`.
///
/// Resolves with the number of events seen once every reporter is dropped.
pub fn spawn_progress_consumer<F>(
    mut rx: UnboundedReceiver<ProgressEvent>,
    mut handle: F,
) -> JoinHandle<usize>
where
    F: FnMut(&ProgressEvent) + Send + 'static,
{
    tokio::spawn(async move {
        let mut seen = 0;
        while let Some(event) = rx.recv().await {
            handle(&event);
            seen += 1;
        }
        seen
    })
}

/// Consumer that logs every event through `tracing`.
pub fn spawn_progress_logger(rx: UnboundedReceiver<ProgressEvent>) -> JoinHandle<usize> {
    spawn_progress_consumer(rx, |event| {
        tracing::info!(stage = %event.stage, "{}", event.message);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn consumer_finishes_when_reporter_dropped() {
        let (reporter, rx) = progress_channel();
        let consumer = spawn_progress_logger(rx);

        reporter.report(DeployStage::PublishImage, "Pushing container image");
        reporter.report(DeployStage::ApplyManifests, "Applying manifests");
        drop(reporter);

        assert_eq!(consumer.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn report_after_consumer_gone_is_silent() {
        let (reporter, rx) = progress_channel();
        drop(rx);
        reporter.report(DeployStage::Initialize, "nobody listening");
    }
}
