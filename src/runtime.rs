//! Event pump for the terminal host: reads input, stamps it with a clock
//! and hands it to the [`App`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::layout::Rect;

use crate::timers::Millis;
use crate::App;

/// Frame interval for the terminal host
pub const FRAME_MS: u64 = 16;

#[derive(Clone, Debug)]
pub enum HostEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// New terminal size in columns and rows
    Resize(u16, u16),
    Tick,
}

pub trait HostEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError>;
}

/// Events arriving over a channel, either from the crossterm reader thread
/// or pushed by a test
pub struct ChannelEventSource {
    rx: Receiver<HostEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<HostEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a thread forwarding terminal input. Key releases and repeats
    /// are dropped so each press reaches the app once.
    pub fn crossterm() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => HostEvent::Key(key),
                Ok(CtEvent::Mouse(mouse)) => HostEvent::Mouse(mouse),
                Ok(CtEvent::Resize(cols, rows)) => HostEvent::Resize(cols, rows),
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(forwarded).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl HostEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Milliseconds handed to sessions; never decreases
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Clock moved by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Advances the application one event or frame at a time
pub struct Runner<E: HostEventSource, C: Clock> {
    event_source: E,
    clock: C,
    frame: Duration,
}

impl<E: HostEventSource, C: Clock> Runner<E, C> {
    pub fn new(event_source: E, clock: C) -> Self {
        Self {
            event_source,
            clock,
            frame: Duration::from_millis(FRAME_MS),
        }
    }

    pub fn with_frame(mut self, frame: Duration) -> Self {
        self.frame = frame;
        self
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Blocks up to one frame and returns the next event, or Tick on timeout
    pub fn step(&self) -> HostEvent {
        match self.event_source.recv_timeout(self.frame) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => HostEvent::Tick,
        }
    }

    /// Take one step, deliver it to `app` at the current clock reading and
    /// let the running session catch up to that time
    pub fn drive(&self, app: &mut App) -> HostEvent {
        let event = self.step();
        let now = self.now();
        match &event {
            HostEvent::Key(key) => app.on_key(*key, now),
            HostEvent::Mouse(mouse) => app.on_mouse(*mouse, now),
            HostEvent::Resize(cols, rows) => app.on_resize(Rect::new(0, 0, *cols, *rows)),
            HostEvent::Tick => {}
        }
        app.on_tick(now);
        event
    }
}
