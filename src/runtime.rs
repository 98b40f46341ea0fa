use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

/// Primary-button pointer gesture in terminal cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Down { column: u16, row: u16 },
    Drag { column: u16, row: u16 },
    Up,
}

impl PointerAction {
    pub fn from_mouse(mouse: &MouseEvent) -> Option<Self> {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(PointerAction::Down { column, row }),
            MouseEventKind::Drag(MouseButton::Left) => Some(PointerAction::Drag { column, row }),
            MouseEventKind::Up(MouseButton::Left) => Some(PointerAction::Up),
            _ => None,
        }
    }
}

/// Input the game loop reacts to. Mouse traffic the game has no use for
/// (other buttons, hover, scroll) never becomes an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Pointer(PointerAction),
    Resize,
    /// A frame went by without input.
    Idle,
}

impl AppEvent {
    fn from_terminal(event: CtEvent) -> Option<Self> {
        match event {
            CtEvent::Key(key) => Some(AppEvent::Key(key)),
            CtEvent::Mouse(mouse) => PointerAction::from_mouse(&mouse).map(AppEvent::Pointer),
            CtEvent::Resize(_, _) => Some(AppEvent::Resize),
            _ => None,
        }
    }
}

pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Terminal input read on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(raw) => match AppEvent::from_terminal(raw) {
                    Some(evt) => evt,
                    None => continue,
                },
                Err(e) => {
                    log::warn!("terminal input closed: {e}");
                    break;
                }
            };
            if tx.send(evt).is_err() {
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

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events fed by hand, for headless runs. Once the script is drained and
/// every sender is gone, each step is an idle frame.
pub struct ScriptedEventSource {
    rx: Receiver<AppEvent>,
}

impl ScriptedEventSource {
    /// A source plus the sender to keep feeding it while the loop runs.
    pub fn channel() -> (Sender<AppEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    pub fn from_events(events: impl IntoIterator<Item = AppEvent>) -> Self {
        let (tx, source) = Self::channel();
        for event in events {
            // the receiver lives in `source`, so this cannot fail
            let _ = tx.send(event);
        }
        source
    }
}

impl AppEventSource for ScriptedEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Frame pacing and the time base the game clock is derived from.
pub trait FrameClock: Send + 'static {
    /// How long a step waits for input before reporting an idle frame.
    fn frame_wait(&self) -> Duration;
    fn now(&self) -> Instant;
    /// Called once per idle frame.
    fn idle_frame(&self) {}
}

/// Real time, waiting up to one frame for input.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    frame: Duration,
}

impl WallClock {
    pub fn new(frame: Duration) -> Self {
        Self { frame }
    }
}

impl FrameClock for WallClock {
    fn frame_wait(&self) -> Duration {
        self.frame
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic time for headless runs: never blocks, and only idle frames
/// move the clock, each by one `frame`.
#[derive(Debug)]
pub struct SimulatedClock {
    frame: Duration,
    origin: Instant,
    frames: AtomicU32,
}

impl SimulatedClock {
    pub fn new(frame: Duration) -> Self {
        Self {
            frame,
            origin: Instant::now(),
            frames: AtomicU32::new(0),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    pub fn frames_elapsed(&self) -> u32 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl FrameClock for SimulatedClock {
    fn frame_wait(&self) -> Duration {
        Duration::ZERO
    }

    fn now(&self) -> Instant {
        self.origin + self.frame * self.frames_elapsed()
    }

    fn idle_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

/// One turn of the game loop: what happened, and when.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub event: AppEvent,
    pub at: Instant,
}

/// Pulls one event (or an idle frame) per step and stamps it with the
/// clock's time, which the caller hands to the metronome.
pub struct Runner<E: AppEventSource, C: FrameClock> {
    events: E,
    clock: C,
}

impl<E: AppEventSource, C: FrameClock> Runner<E, C> {
    pub fn new(events: E, clock: C) -> Self {
        Self { events, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn step(&self) -> Step {
        let event = match self.events.recv_timeout(self.clock.frame_wait()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.clock.idle_frame();
                AppEvent::Idle
            }
        };
        Step {
            event,
            at: self.clock.now(),
        }
    }
}
