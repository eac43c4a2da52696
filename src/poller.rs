use std::time::Instant;

use tokio::sync::watch;

use crate::{
    config::PollConfig,
    error::{Result, StudioError},
    gemini::GenerationClient,
    logger::Timer,
    models::{AsyncJobHandle, JobState},
};

/// Fires a [`CancelSignal`]. Cancelling twice is harmless.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

/// Observes cancellation of a running poll.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl CancelSignal {
    /// A signal nobody can fire.
    pub fn never() -> Self {
        let (_, signal) = cancel_pair();
        signal
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle is gone.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                futures::future::pending::<()>().await;
            }
        }
    }
}

/// Drives a long-running job to completion: wait, query, repeat.
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Returns the result reference of the finished job.
    ///
    /// Any query failure, a rejected key included, ends polling at once with
    /// `Polling`. There is no retry. The last wait is cut short at
    /// `max_elapsed`; a query already in flight is not.
    pub async fn wait(
        &self,
        client: &dyn GenerationClient,
        handle: AsyncJobHandle,
        cancel: &CancelSignal,
    ) -> Result<String> {
        let started = Instant::now();
        let _timer = Timer::new(format!("Polling {}", handle.operation));
        let mut handle = handle;
        let mut attempts: u32 = 0;

        loop {
            if handle.is_done() {
                return resolve(handle);
            }
            if cancel.is_cancelled() {
                log::warn!("Polling of {} cancelled", handle.operation);
                return Err(StudioError::Cancelled);
            }
            let budget_spent = self
                .config
                .max_attempts
                .is_some_and(|max| attempts >= max)
                || self
                    .config
                    .max_elapsed
                    .is_some_and(|max| started.elapsed() >= max);
            if budget_spent {
                let elapsed = started.elapsed();
                log::error!(
                    "{} still running after {} checks ({:.1}s), giving up",
                    handle.operation,
                    attempts,
                    elapsed.as_secs_f64()
                );
                return Err(StudioError::Timeout { attempts, elapsed });
            }

            let pause = self
                .config
                .max_elapsed
                .map(|max| max.saturating_sub(started.elapsed()))
                .map_or(self.config.interval, |left| left.min(self.config.interval));
            let mut signal = cancel.clone();
            tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    log::warn!("Polling of {} cancelled", handle.operation);
                    return Err(StudioError::Cancelled);
                }
                _ = tokio::time::sleep(pause) => {}
            }
            if pause < self.config.interval {
                // Deadline reached mid-wait.
                continue;
            }

            attempts += 1;
            handle = client
                .refresh_job(&handle)
                .await
                .map_err(|e| StudioError::Polling(e.to_string()))?;
            log::debug!(
                "Status check {} for {}: {}",
                attempts,
                handle.operation,
                if handle.is_done() { "done" } else { "pending" }
            );
        }
    }
}

fn resolve(handle: AsyncJobHandle) -> Result<String> {
    if let Some(uri) = handle.result_ref() {
        log::info!("{} finished", handle.operation);
        return Ok(uri.to_string());
    }
    let provider_error = match handle.state {
        JobState::Done { provider_error, .. } => provider_error,
        JobState::Pending => None,
    };
    log::error!(
        "{} finished without a result{}",
        handle.operation,
        provider_error
            .as_deref()
            .map(|e| format!(": {}", e))
            .unwrap_or_default()
    );
    Err(StudioError::MissingResult {
        operation: handle.operation,
        provider_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenerationRequest, GenerationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Reports `pending_rounds` pending states, then `finish`.
    struct ScriptedJobs {
        pending_rounds: usize,
        finish: AsyncJobHandle,
        fail: bool,
        reject_key: bool,
        queries: AtomicUsize,
    }

    impl ScriptedJobs {
        fn new(pending_rounds: usize, finish: AsyncJobHandle) -> Self {
            Self {
                pending_rounds,
                finish,
                fail: false,
                reject_key: false,
                queries: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(0, AsyncJobHandle::pending("op"))
            }
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedJobs {
        async fn submit_synchronous(&self, _: &GenerationRequest) -> Result<GenerationResult> {
            unreachable!("poller never submits")
        }

        async fn submit_asynchronous(&self, _: &GenerationRequest) -> Result<AsyncJobHandle> {
            unreachable!("poller never submits")
        }

        async fn refresh_job(&self, handle: &AsyncJobHandle) -> Result<AsyncJobHandle> {
            let seen = self.queries.fetch_add(1, Ordering::SeqCst);
            if self.reject_key {
                return Err(StudioError::InvalidCredential);
            }
            if self.fail {
                return Err(StudioError::transport("check video status", "HTTP 500"));
            }
            if seen < self.pending_rounds {
                Ok(AsyncJobHandle::pending(handle.operation.clone()))
            } else {
                Ok(self.finish.clone())
            }
        }

        async fn download(&self, _: &str) -> Result<Vec<u8>> {
            unreachable!("poller never downloads")
        }
    }

    fn fast() -> JobPoller {
        JobPoller::new(PollConfig::new().with_interval(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_n_pending_then_done_queries_n_plus_one() {
        for n in [0, 1, 4] {
            let jobs = ScriptedJobs::new(n, AsyncJobHandle::done("op", Some("https://v/1".into())));
            let uri = fast()
                .wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never())
                .await
                .unwrap();
            assert_eq!(uri, "https://v/1");
            assert_eq!(jobs.queries(), n + 1);
        }
    }

    #[tokio::test]
    async fn test_done_handle_resolves_without_query() {
        let jobs = ScriptedJobs::new(0, AsyncJobHandle::pending("op"));
        let uri = fast()
            .wait(
                &jobs,
                AsyncJobHandle::done("op", Some("https://v/2".into())),
                &CancelSignal::never(),
            )
            .await
            .unwrap();
        assert_eq!(uri, "https://v/2");
        assert_eq!(jobs.queries(), 0);
    }

    #[tokio::test]
    async fn test_query_error_stops_immediately() {
        let jobs = ScriptedJobs::failing();
        let err = fast()
            .wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Polling(ref msg) if msg.contains("HTTP 500")));
        assert_eq!(jobs.queries(), 1);
    }

    #[tokio::test]
    async fn test_done_without_reference() {
        let jobs = ScriptedJobs::new(1, AsyncJobHandle::failed("op", "blocked by safety filter"));
        let err = fast()
            .wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never())
            .await
            .unwrap_err();
        match err {
            StudioError::MissingResult { provider_error, .. } => {
                assert_eq!(provider_error.as_deref(), Some("blocked by safety filter"))
            }
            other => panic!("unexpected {:?}", other),
        }

        let jobs = ScriptedJobs::new(0, AsyncJobHandle::done("op", Some(" ".into())));
        assert!(matches!(
            fast()
                .wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never())
                .await,
            Err(StudioError::MissingResult { provider_error: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_attempt_budget() {
        let jobs = ScriptedJobs::new(usize::MAX, AsyncJobHandle::pending("op"));
        let poller = JobPoller::new(
            PollConfig::new()
                .unbounded()
                .with_interval(Duration::from_millis(1))
                .with_max_attempts(3),
        );
        let err = poller
            .wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Timeout { attempts: 3, .. }));
        assert_eq!(jobs.queries(), 3);
    }

    #[tokio::test]
    async fn test_rejected_key_while_polling_is_a_polling_error() {
        let jobs = ScriptedJobs {
            reject_key: true,
            ..ScriptedJobs::failing()
        };
        let err = fast()
            .wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Polling(_)), "{:?}", err);
        assert_eq!(jobs.queries(), 1);
    }

    #[tokio::test]
    async fn test_elapsed_budget_cuts_the_wait_short() {
        let jobs = ScriptedJobs::new(usize::MAX, AsyncJobHandle::pending("op"));
        let poller = JobPoller::new(
            PollConfig::new()
                .unbounded()
                .with_interval(Duration::from_secs(30))
                .with_max_elapsed(Duration::from_millis(20)),
        );
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            poller.wait(&jobs, AsyncJobHandle::pending("op"), &CancelSignal::never()),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(StudioError::Timeout { attempts: 0, .. })));
        assert_eq!(jobs.queries(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let jobs = Arc::new(ScriptedJobs::new(usize::MAX, AsyncJobHandle::pending("op")));
        let poller = JobPoller::new(
            PollConfig::new()
                .unbounded()
                .with_interval(Duration::from_secs(30)),
        );
        let (handle, signal) = cancel_pair();

        let task = {
            let jobs = jobs.clone();
            tokio::spawn(async move {
                poller
                    .wait(jobs.as_ref(), AsyncJobHandle::pending("op"), &signal)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(StudioError::Cancelled)));
        assert_eq!(jobs.queries(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let jobs = ScriptedJobs::new(0, AsyncJobHandle::done("op", Some("x".into())));
        let (handle, signal) = cancel_pair();
        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(handle.signal().is_cancelled());
        assert!(matches!(
            fast().wait(&jobs, AsyncJobHandle::pending("op"), &signal).await,
            Err(StudioError::Cancelled)
        ));
        assert_eq!(jobs.queries(), 0);
    }
}
