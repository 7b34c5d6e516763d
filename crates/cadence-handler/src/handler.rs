//! Input stream handler protocol
//!
//! A handler sits between a node's input streams and the scheduler. The
//! scheduler repeatedly asks for [`NodeReadiness`]; on `ReadyForProcess`
//! it asks the handler to fill an [`InputSet`] at the ready timestamp.
//! [`HandlerCore`] holds what every handler shares: the streams and the
//! scheduler callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cadence_core::{CadenceError, CadenceResult, Timestamp};
use cadence_stream::InputStreamCollection;
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::{InputSet, NodeReadiness};

/// Work handed to the scheduler
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// Run the node on one input set
    Process(InputSet),
    /// Every input is exhausted; finalize the node
    Close,
}

impl Invocation {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Invocation::Process(input_set) => input_set.timestamp(),
            Invocation::Close => Timestamp::Done,
        }
    }
}

pub type HeadersReadyCallback = Box<dyn Fn() + Send + Sync>;
pub type NotificationCallback = Box<dyn Fn() + Send + Sync>;
pub type ScheduleCallback = Box<dyn Fn(Invocation) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(CadenceError) + Send + Sync>;

/// Scheduler hooks supplied when a run is prepared
pub struct HandlerCallbacks {
    /// Stream headers are available
    pub headers_ready: HeadersReadyCallback,
    /// Some input changed; readiness should be re-evaluated
    pub notification: NotificationCallback,
    /// An invocation is ready to run
    pub schedule: ScheduleCallback,
    /// A fatal error occurred; the session must abort
    pub error: ErrorCallback,
}

impl HandlerCallbacks {
    /// Callbacks that do nothing
    pub fn noop() -> Self {
        HandlerCallbacks {
            headers_ready: Box::new(|| {}),
            notification: Box::new(|| {}),
            schedule: Box::new(|_| {}),
            error: Box::new(|_| {}),
        }
    }
}

impl std::fmt::Debug for HandlerCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCallbacks").finish_non_exhaustive()
    }
}

/// State shared by every handler: the node's streams and the callbacks
/// of the current run.
pub struct HandlerCore {
    streams: Arc<InputStreamCollection>,
    callbacks: RwLock<Option<HandlerCallbacks>>,
    close_scheduled: AtomicBool,
}

impl HandlerCore {
    pub fn new(streams: Arc<InputStreamCollection>) -> Self {
        HandlerCore {
            streams,
            callbacks: RwLock::new(None),
            close_scheduled: AtomicBool::new(false),
        }
    }

    pub fn streams(&self) -> &InputStreamCollection {
        &self.streams
    }

    /// Install the callbacks of a new run. Stream headers are not
    /// modelled, so they are reported ready immediately, once the
    /// callbacks are in place.
    pub fn prepare_for_run(&self, callbacks: HandlerCallbacks) {
        self.close_scheduled.store(false, Ordering::SeqCst);
        *self.callbacks.write() = Some(callbacks);
        if let Some(callbacks) = self.callbacks.read_recursive().as_ref() {
            (callbacks.headers_ready)();
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.callbacks.read().is_some()
    }

    /// Forward a stream change to the scheduler.
    pub fn notify(&self) {
        if let Some(callbacks) = self.callbacks.read_recursive().as_ref() {
            (callbacks.notification)();
        }
    }

    pub fn schedule(&self, invocation: Invocation) {
        if let Some(callbacks) = self.callbacks.read_recursive().as_ref() {
            (callbacks.schedule)(invocation);
        }
    }

    /// Report a fatal error. Without installed callbacks the error is
    /// only logged.
    pub fn report_error(&self, err: CadenceError) {
        match self.callbacks.read_recursive().as_ref() {
            Some(callbacks) => (callbacks.error)(err),
            None => error!(%err, "input stream handler failed before prepare"),
        }
    }

    /// True exactly once per run.
    fn claim_close(&self) -> bool {
        !self.close_scheduled.swap(true, Ordering::SeqCst)
    }
}

impl std::fmt::Debug for HandlerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCore")
            .field("streams", &self.streams)
            .field("prepared", &self.is_prepared())
            .field("close_scheduled", &self.close_scheduled.load(Ordering::SeqCst))
            .finish()
    }
}

/// Decides when a node is ready to run and which packets it receives.
pub trait InputStreamHandler: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    fn core(&self) -> &HandlerCore;

    /// Reset per-run state and install the scheduler callbacks.
    fn prepare_for_run(&self, callbacks: HandlerCallbacks) -> CadenceResult<()>;

    /// Evaluate readiness. Repeated calls without an intervening fill or
    /// stream change return the same verdict.
    fn node_readiness(&self) -> NodeReadiness;

    /// Drain the packets of the ready input at `timestamp`. Valid only
    /// right after `node_readiness` returned `ReadyForProcess(timestamp)`.
    fn fill_input_set(&self, timestamp: Timestamp) -> CadenceResult<InputSet>;

    /// Schedule up to `max_allowance` invocations. Returns how many were
    /// scheduled. A fill error is reported through the error callback and
    /// stops scheduling.
    fn schedule_invocations(&self, max_allowance: usize) -> usize {
        let core = self.core();
        let mut scheduled = 0;
        while scheduled < max_allowance {
            match self.node_readiness() {
                NodeReadiness::NotReady => break,
                NodeReadiness::ReadyForProcess(timestamp) => {
                    match self.fill_input_set(timestamp) {
                        Ok(input_set) => {
                            core.schedule(Invocation::Process(input_set));
                            scheduled += 1;
                        }
                        Err(err) => {
                            core.report_error(err);
                            break;
                        }
                    }
                }
                NodeReadiness::ReadyForClose => {
                    if core.claim_close() {
                        debug!(handler = self.name(), "scheduling close");
                        core.schedule(Invocation::Close);
                        scheduled += 1;
                    }
                    break;
                }
            }
        }
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_prepare_reports_headers_ready() {
        let (collection, _) = InputStreamCollection::with_queues(&["a"]).unwrap();
        let core = HandlerCore::new(Arc::new(collection));
        let headers = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&headers);
        core.prepare_for_run(HandlerCallbacks {
            headers_ready: Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            ..HandlerCallbacks::noop()
        });

        assert!(core.is_prepared());
        assert_eq!(headers.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notify_and_error_forwarded() {
        let (collection, _) = InputStreamCollection::with_queues(&["a"]).unwrap();
        let core = HandlerCore::new(Arc::new(collection));
        let notified = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        // Before prepare nothing is installed
        core.notify();

        let (n, e) = (Arc::clone(&notified), Arc::clone(&errors));
        core.prepare_for_run(HandlerCallbacks {
            notification: Box::new(move || {
                n.fetch_add(1, Ordering::SeqCst);
            }),
            error: Box::new(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            }),
            ..HandlerCallbacks::noop()
        });
        core.notify();
        core.report_error(CadenceError::NothingReady);

        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_headers_ready_can_reach_the_scheduler() {
        let (collection, _) = InputStreamCollection::with_queues(&["a"]).unwrap();
        let core = Arc::new(HandlerCore::new(Arc::new(collection)));
        let notified = Arc::new(AtomicUsize::new(0));

        let (weak, n) = (Arc::downgrade(&core), Arc::clone(&notified));
        core.prepare_for_run(HandlerCallbacks {
            headers_ready: Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.notify();
                }
            }),
            notification: Box::new(move || {
                n.fetch_add(1, Ordering::SeqCst);
            }),
            ..HandlerCallbacks::noop()
        });

        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_is_claimed_once_per_run() {
        let (collection, _) = InputStreamCollection::with_queues(&["a"]).unwrap();
        let core = HandlerCore::new(Arc::new(collection));
        assert!(core.claim_close());
        assert!(!core.claim_close());

        core.prepare_for_run(HandlerCallbacks::noop());
        assert!(core.claim_close());
    }
}
