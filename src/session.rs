use std::sync::Arc;

use serde::Serialize;

use crate::clock::{ClockTicket, Schedule, ScheduleKind};
use crate::geometry::Point;
use crate::sampler::Curve;
use crate::score::ScoreTier;
use crate::tracker::{Evaluation, Tracker};

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;
pub const DEFAULT_COUNTDOWN_TICKS: u32 = 3;
pub const DEFAULT_PICKUP_DISTANCE: f64 = 40.0;
/// Progress at or above this percentage counts as reaching the end.
pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 99.0;
pub const LOW_TIME_SECS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub time_limit_secs: u32,
    pub countdown_ticks: u32,
    pub pickup_distance: f64,
    pub completion_threshold: f64,
    pub tracker: Tracker,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            pickup_distance: DEFAULT_PICKUP_DISTANCE,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            tracker: Tracker::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SessionPhase {
    Idle,
    Countdown,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum FinishReason {
    Completed,
    OutOfBounds,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub remaining_secs: u32,
    pub countdown_remaining: u32,
    // authoritative progress; every transition decision reads these two
    pub progress: f64,
    pub progress_index: usize,
    pub player_position: Point,
    pub grabbing: bool,
    pub finish_reason: Option<FinishReason>,
}

impl SessionState {
    fn fresh(phase: SessionPhase, config: &SessionConfig, start: Point) -> Self {
        Self {
            phase,
            remaining_secs: config.time_limit_secs,
            countdown_remaining: config.countdown_ticks,
            progress: 0.0,
            progress_index: 0,
            player_position: start,
            grabbing: false,
            finish_reason: None,
        }
    }
}

/// Notifications for the presentation layer, drained after each event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CountdownStarted { ticks: u32 },
    CountdownTick { remaining: u32 },
    Activated,
    ClockTick { remaining_secs: u32 },
    GrabAccepted,
    GrabRejected { distance: f64 },
    Released,
    ProgressAdvanced { progress: f64 },
    Finished { reason: FinishReason, progress: f64 },
}

/// What a pointer entry point did with its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// Not active, or no grab held.
    Ignored,
    /// Pointer-down too far from the player marker.
    Rejected,
    Released,
    Tracked(Evaluation),
    Finished(FinishReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Ticket belongs to a cancelled schedule.
    Stale,
    Countdown { remaining: u32 },
    Activated,
    Ticked { remaining_secs: u32 },
    TimedOut,
}

/// Display projection of the session, rounded for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub remaining_secs: u32,
    pub countdown: Option<u32>,
    pub progress_percent: u8,
    pub player_position: Point,
    pub grabbing: bool,
    pub finish_reason: Option<FinishReason>,
    pub score_tier: Option<ScoreTier>,
}

impl SessionSnapshot {
    pub fn is_low_time(&self) -> bool {
        self.phase == SessionPhase::Active && self.remaining_secs <= LOW_TIME_SECS
    }
}

/// The game state machine: `Idle → Countdown → Active → Finished`, with
/// restart re-entering `Countdown` from any phase.
#[derive(Debug)]
pub struct GameSession {
    curve: Arc<Curve>,
    config: SessionConfig,
    state: SessionState,
    schedule: Schedule,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(curve: Arc<Curve>, config: SessionConfig) -> Self {
        let state = SessionState::fresh(SessionPhase::Idle, &config, curve.start());
        Self {
            curve,
            config,
            state,
            schedule: Schedule::new(),
            events: Vec::new(),
        }
    }

    /// `Idle | Finished → Countdown`. Returns false when a cycle is already
    /// running; use `restart_session` to abandon it.
    pub fn start_session(&mut self) -> bool {
        match self.state.phase {
            SessionPhase::Idle | SessionPhase::Finished => {
                self.begin_cycle();
                true
            }
            phase => {
                log::debug!("start ignored while {phase}");
                false
            }
        }
    }

    /// Cancel any armed schedule, discard all session state and start over.
    pub fn restart_session(&mut self) {
        self.schedule.cancel();
        self.begin_cycle();
    }

    fn begin_cycle(&mut self) {
        self.state = SessionState::fresh(SessionPhase::Countdown, &self.config, self.curve.start());
        self.schedule.arm(ScheduleKind::Countdown);
        self.events.push(SessionEvent::CountdownStarted {
            ticks: self.config.countdown_ticks,
        });
        log::info!(
            "countdown started ({} ticks, {}s limit)",
            self.config.countdown_ticks,
            self.config.time_limit_secs
        );
        if self.config.countdown_ticks == 0 {
            self.activate();
        }
    }

    fn activate(&mut self) {
        self.state.phase = SessionPhase::Active;
        self.schedule.arm(ScheduleKind::SessionClock);
        self.events.push(SessionEvent::Activated);
        log::info!("session active");
    }

    fn finish(&mut self, reason: FinishReason) {
        self.state.phase = SessionPhase::Finished;
        self.state.finish_reason = Some(reason);
        self.state.grabbing = false;
        self.schedule.cancel();
        self.events.push(SessionEvent::Finished {
            reason,
            progress: self.state.progress,
        });
        log::info!(
            "session finished: {reason} at {:.1}% with {}s left",
            self.state.progress,
            self.state.remaining_secs
        );
    }

    pub fn on_pointer_down(&mut self, point: Point) -> PointerOutcome {
        if self.state.phase != SessionPhase::Active {
            return PointerOutcome::Ignored;
        }
        let distance = point.distance(self.state.player_position);
        if distance >= self.config.pickup_distance {
            log::debug!("grab rejected {distance:.1} units from marker");
            self.events.push(SessionEvent::GrabRejected { distance });
            return PointerOutcome::Rejected;
        }
        self.state.grabbing = true;
        self.events.push(SessionEvent::GrabAccepted);
        log::debug!("grab accepted {distance:.1} units from marker");
        self.track(point)
    }

    pub fn on_pointer_move(&mut self, point: Point) -> PointerOutcome {
        if self.state.phase != SessionPhase::Active || !self.state.grabbing {
            return PointerOutcome::Ignored;
        }
        self.track(point)
    }

    /// Always drops the grab, whatever the phase.
    pub fn on_pointer_up(&mut self) -> PointerOutcome {
        if !self.state.grabbing {
            return PointerOutcome::Ignored;
        }
        self.state.grabbing = false;
        self.events.push(SessionEvent::Released);
        PointerOutcome::Released
    }

    fn track(&mut self, point: Point) -> PointerOutcome {
        let tracker = &self.config.tracker;
        let eval = tracker.evaluate(point, self.state.progress_index, &self.curve);
        log::trace!(
            "cursor ({:.1}, {:.1}) -> sample {} at {:.2}",
            point.x,
            point.y,
            eval.best_index,
            eval.best_distance
        );

        if !tracker.is_contained(&eval) {
            self.finish(FinishReason::OutOfBounds);
            return PointerOutcome::Finished(FinishReason::OutOfBounds);
        }

        self.state.player_position = point;

        let resolution = self.curve.resolution();
        let candidate = eval.best_index as f64 * 100.0 / resolution as f64;
        if candidate > self.state.progress {
            self.state.progress = candidate;
            self.state.progress_index = eval.best_index;
            self.events
                .push(SessionEvent::ProgressAdvanced { progress: candidate });
        }

        if self.state.progress >= self.config.completion_threshold {
            self.state.progress = 100.0;
            self.state.progress_index = resolution;
            self.finish(FinishReason::Completed);
            return PointerOutcome::Finished(FinishReason::Completed);
        }

        PointerOutcome::Tracked(eval)
    }

    /// Deliver one second of clock time for the schedule `ticket` was
    /// issued for.
    pub fn on_clock_tick(&mut self, ticket: ClockTicket) -> TickOutcome {
        if !self.schedule.accepts(ticket) {
            log::debug!("discarding stale tick from schedule #{}", ticket.generation());
            return TickOutcome::Stale;
        }

        match self.state.phase {
            SessionPhase::Countdown => {
                self.state.countdown_remaining = self.state.countdown_remaining.saturating_sub(1);
                if self.state.countdown_remaining == 0 {
                    self.activate();
                    TickOutcome::Activated
                } else {
                    let remaining = self.state.countdown_remaining;
                    self.events.push(SessionEvent::CountdownTick { remaining });
                    TickOutcome::Countdown { remaining }
                }
            }
            SessionPhase::Active => {
                self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
                if self.state.remaining_secs == 0 {
                    self.finish(FinishReason::TimedOut);
                    TickOutcome::TimedOut
                } else {
                    let remaining_secs = self.state.remaining_secs;
                    self.events.push(SessionEvent::ClockTick { remaining_secs });
                    TickOutcome::Ticked { remaining_secs }
                }
            }
            // the schedule is cancelled on entering these phases
            SessionPhase::Idle | SessionPhase::Finished => TickOutcome::Stale,
        }
    }

    /// Ticket for the currently armed schedule; `None` when nothing should tick.
    pub fn clock_ticket(&self) -> Option<ClockTicket> {
        self.schedule.ticket()
    }

    pub fn state(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.state.remaining_secs
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        (self.state.phase == SessionPhase::Countdown).then_some(self.state.countdown_remaining)
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn progress_percent(&self) -> u8 {
        self.state.progress.round().clamp(0.0, 100.0) as u8
    }

    pub fn progress_index(&self) -> usize {
        self.state.progress_index
    }

    pub fn player_position(&self) -> Point {
        self.state.player_position
    }

    pub fn is_grabbing(&self) -> bool {
        self.state.grabbing
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.state.finish_reason
    }

    pub fn score_tier(&self) -> Option<ScoreTier> {
        (self.state.phase == SessionPhase::Finished)
            .then(|| ScoreTier::from_progress(self.state.progress))
    }

    pub fn curve(&self) -> &Arc<Curve> {
        &self.curve
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            countdown: self.countdown_remaining(),
            progress_percent: self.progress_percent(),
            player_position: self.state.player_position,
            grabbing: self.state.grabbing,
            finish_reason: self.state.finish_reason,
            score_tier: self.score_tier(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}
