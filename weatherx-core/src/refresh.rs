//! Background refresh
//!
//! Keeps a [`Measure`] fresh on a timer so readers never wait for the
//! network. Readers keep calling [`Measure::get_text`] or
//! [`Measure::numeric_value`]; snapshots are swapped in as they arrive.

use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

use crate::measure::{Measure, RefreshOutcome};

/// Messages sent from the background task to whoever holds the handle.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshMessage {
    /// A new snapshot was swapped in
    Updated,
    /// A download failed; the previous snapshot is still served
    Failed(String),
}

/// Handle for controlling the background refresh task
#[derive(Debug)]
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Spawns a task that checks the measure every `tick` and refreshes it
    /// when its update interval has passed. The first check happens
    /// immediately.
    pub fn spawn(measure: Arc<Measure>, tick: Duration) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !measure.needs_refresh() {
                            continue;
                        }

                        let message = match measure.refresh().await {
                            Ok(RefreshOutcome::Updated) => RefreshMessage::Updated,
                            Ok(RefreshOutcome::AlreadyRunning | RefreshOutcome::Superseded) => {
                                continue;
                            }
                            Err(err) => RefreshMessage::Failed(err.to_string()),
                        };

                        if msg_tx.send(message).await.is_err() {
                            debug!("refresh receiver dropped, stopping");
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self { receiver: msg_rx, shutdown_tx, task }
    }

    /// Returns a pending message without blocking.
    pub fn try_recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.try_recv().ok()
    }

    /// Stops the background task and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, config::Config, error::FetchError, provider::WeatherProvider};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use url::Url;

    #[derive(Debug)]
    struct StaticProvider(Option<&'static str>);

    #[async_trait]
    impl WeatherProvider for StaticProvider {
        async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| FetchError::InvalidRequest("offline".into()))
        }
    }

    fn measure(provider: StaticProvider) -> Arc<Measure> {
        let now = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let measure = Measure::new(Arc::new(provider), Arc::new(FixedClock::new(now)));
        measure.reload(&Config {
            latitude: 1.0,
            longitude: 2.0,
            ..Config::default()
        });
        Arc::new(measure)
    }

    #[tokio::test]
    async fn first_tick_refreshes_and_reports() {
        let measure = measure(StaticProvider(Some(r#"{"current":{"temperature_2m":7.5}}"#)));
        let mut handle = RefreshHandle::spawn(measure.clone(), Duration::from_millis(10));

        let message = handle.receiver.recv().await;
        assert_eq!(message, Some(RefreshMessage::Updated));
        assert_eq!(measure.numeric_value(), 7.5);

        // the fixed clock never advances, so nothing else is downloaded
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.try_recv().is_none());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn failures_are_reported_and_retried() {
        let measure = measure(StaticProvider(None));
        let mut handle = RefreshHandle::spawn(measure.clone(), Duration::from_millis(5));

        let first = handle.receiver.recv().await;
        let second = handle.receiver.recv().await;
        assert_eq!(first, Some(RefreshMessage::Failed("Invalid request: offline".into())));
        assert_eq!(first, second);
        assert_eq!(measure.get_text(), "0.0");

        handle.shutdown().await;
    }
}
