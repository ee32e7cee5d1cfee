//! Event-driven scroll spy running on a tokio task.
//!
//! The host (a rendering layer, a WebSocket client, a test harness) pushes
//! [`SpyEvent`]s whenever visibility changes; the task folds them into a
//! [`ScrollSpy`] and publishes the result on a `watch` channel. Nothing polls.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::options::ScrollSpyOptions;
use super::spy::{LayoutSnapshot, ScrollSpy, SectionRef, VisibilityEntry};
use crate::error::ScrollSpyError;

/// Pending notifications buffered between the host and the task.
const EVENT_BUFFER: usize = 64;

/// A notification delivered to a running observer.
#[derive(Debug, Clone)]
pub enum SpyEvent {
    Register(Vec<SectionRef>),
    Configure(ScrollSpyOptions),
    Visibility(Vec<VisibilityEntry>),
    Layout(LayoutSnapshot),
}

/// What the observer has concluded so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    pub active: Option<String>,
    /// Number of events processed; increases even when `active` does not change.
    pub processed: u64,
}

/// Spawns observers.
pub struct ScrollSpyObserver;

impl ScrollSpyObserver {
    /// Start observing `sections` with `options` on the current tokio runtime.
    pub fn spawn(
        options: ScrollSpyOptions,
        sections: Vec<SectionRef>,
    ) -> Result<ObserverHandle, ScrollSpyError> {
        let mut spy = ScrollSpy::new(options)?;
        spy.register(sections);
        Ok(Self::spawn_spy(spy))
    }

    /// Drive an existing spy.
    pub fn spawn_spy(spy: ScrollSpy) -> ObserverHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(ObservedState {
            active: spy.active().map(String::from),
            processed: 0,
        });
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(spy, event_rx, state_tx, cancel.clone()));

        ObserverHandle {
            events: event_tx,
            state: state_rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run(
    mut spy: ScrollSpy,
    mut events: mpsc::Receiver<SpyEvent>,
    state: watch::Sender<ObservedState>,
    cancel: CancellationToken,
) -> ScrollSpy {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            SpyEvent::Register(sections) => {
                spy.register(sections);
            }
            SpyEvent::Configure(options) => {
                if let Err(e) = spy.configure(options) {
                    warn!(error = %e, "Ignoring invalid scroll spy configuration");
                }
            }
            SpyEvent::Visibility(entries) => {
                spy.on_visibility(&entries);
            }
            SpyEvent::Layout(snapshot) => {
                spy.on_layout(&snapshot);
            }
        }

        if cancel.is_cancelled() {
            break;
        }
        let active = spy.active().map(String::from);
        state.send_modify(|s| {
            s.active = active;
            s.processed += 1;
        });
    }

    spy.detach();
    debug!("Scroll spy observer stopped");
    spy
}

/// Owner of a running observer. Dropping the handle detaches it.
pub struct ObserverHandle {
    events: mpsc::Sender<SpyEvent>,
    state: watch::Receiver<ObservedState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<ScrollSpy>>,
}

impl ObserverHandle {
    /// Deliver one event. Returns `false` once the observer is detached.
    pub async fn notify(&self, event: SpyEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.events.send(event).await.is_ok()
    }

    pub async fn register(&self, sections: Vec<SectionRef>) -> bool {
        self.notify(SpyEvent::Register(sections)).await
    }

    /// Replace the configuration. Invalid options are rejected here, before
    /// they reach the task.
    pub async fn configure(&self, options: ScrollSpyOptions) -> Result<bool, ScrollSpyError> {
        let options = options.validated()?;
        Ok(self.notify(SpyEvent::Configure(options)).await)
    }

    pub async fn visibility(&self, entries: Vec<VisibilityEntry>) -> bool {
        self.notify(SpyEvent::Visibility(entries)).await
    }

    pub async fn layout(&self, snapshot: LayoutSnapshot) -> bool {
        self.notify(SpyEvent::Layout(snapshot)).await
    }

    /// Active section as of the last processed event.
    pub fn active(&self) -> Option<String> {
        self.state.borrow().active.clone()
    }

    /// A receiver for observing state changes.
    pub fn subscribe(&self) -> watch::Receiver<ObservedState> {
        self.state.clone()
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop delivery. Safe to call any number of times.
    pub fn detach(&self) {
        self.cancel.cancel();
    }

    /// Detach and wait for the task, returning the final spy state.
    pub async fn shutdown(mut self) -> Option<ScrollSpy> {
        self.detach();
        match self.task.take() {
            Some(task) => task.await.ok(),
            None => None,
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
