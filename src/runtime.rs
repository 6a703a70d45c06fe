use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

/// Wall-clock time between countdown ticks. Each tick takes one second off the trial.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// One second of trial time, tagged with the session generation that owns it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Everything that can change a session, applied in arrival order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Start { username: String },
    InputChanged(String),
    Tick(Tick),
    Submit,
    Reset,
}

impl From<Tick> for SessionEvent {
    fn from(tick: Tick) -> Self {
        SessionEvent::Tick(tick)
    }
}

/// Background countdown for one session generation.
///
/// The thread only ever sends ticks into the event channel; it never touches session
/// state. Cancelling (or dropping the handle) stops further sends.
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn spawn<E>(tx: Sender<E>, generation: u64, interval: Duration) -> Self
    where
        E: From<Tick> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || loop {
            thread::sleep(interval);

            if flag.load(Ordering::Acquire) {
                break;
            }
            if tx.send(E::from(Tick { generation })).is_err() {
                break;
            }
        });

        debug!("timer spawned for generation {}", generation);
        Self {
            generation,
            cancelled,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            debug!("timer for generation {} cancelled", self.generation);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Source of events for the app runner
pub trait EventSource: Send + 'static {
    type Event;

    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<Self::Event, RecvTimeoutError>;
}

/// Event source backed by an mpsc channel. Producers (keyboard reader, timers) hold
/// the senders; the consumer is the only thread that mutates session state.
pub struct ChannelEventSource<E> {
    rx: Receiver<E>,
}

impl<E> ChannelEventSource<E> {
    pub fn new(rx: Receiver<E>) -> Self {
        Self { rx }
    }
}

impl<E: Send + 'static> EventSource for ChannelEventSource<E> {
    type Event = E;

    fn recv_timeout(&self, timeout: Duration) -> Result<E, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Result of one runner step
#[derive(Debug, PartialEq, Eq)]
pub enum Step<E> {
    Event(E),
    /// Nothing arrived within the poll interval.
    Idle,
    /// Every producer is gone.
    Closed,
}

/// Runner that advances the application one event at a time
pub struct Runner<S: EventSource> {
    event_source: S,
    poll_interval: Duration,
}

impl<S: EventSource> Runner<S> {
    pub fn new(event_source: S, poll_interval: Duration) -> Self {
        Self {
            event_source,
            poll_interval,
        }
    }

    /// Blocks up to the poll interval and returns the next event, if any
    pub fn step(&self) -> Step<S::Event> {
        match self.event_source.recv_timeout(self.poll_interval) {
            Ok(ev) => Step::Event(ev),
            Err(RecvTimeoutError::Timeout) => Step::Idle,
            Err(RecvTimeoutError::Disconnected) => Step::Closed,
        }
    }
}
