use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::warn;

/// Everything the drill loop reacts to
#[derive(Clone, Debug)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Where drill events come from: the terminal in production, a channel in tests
pub trait DrillEventSource: Send + 'static {
    /// Wait up to `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;

    /// Next event if one is already queued
    fn try_recv(&self) -> Result<DrillEvent, TryRecvError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let drill_event = match event::read() {
                Ok(CtEvent::Key(key)) => DrillEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => DrillEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    warn!(%err, "terminal event reader stopped");
                    break;
                }
            };
            if tx.send(drill_event).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Result<DrillEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for headless tests
pub struct TestEventSource {
    rx: Receiver<DrillEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self { rx }
    }
}

impl DrillEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Result<DrillEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

/// Hands the drill loop one event at a time, falling back to a tick so the
/// screen can be redrawn even when the keyboard is quiet
pub struct Runner<E: DrillEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: DrillEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> DrillEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => DrillEvent::Tick,
        }
    }

    /// Everything already queued, without waiting. Key bursts (a chord arriving
    /// as several events) are handled together before the next redraw.
    pub fn drain(&self) -> Vec<DrillEvent> {
        std::iter::from_fn(|| self.event_source.try_recv().ok()).collect()
    }
}
