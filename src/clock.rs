use std::time::{Duration, Instant};

/// Identifies one armed schedule. A tick delivered with a ticket that is no
/// longer armed belongs to a cancelled schedule and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockTicket {
    generation: u64,
}

impl ClockTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScheduleKind {
    Countdown,
    SessionClock,
}

/// Owned, cancellable one-second schedule. Every `arm` invalidates all
/// previously issued tickets.
#[derive(Debug, Default)]
pub struct Schedule {
    generation: u64,
    armed: Option<(ClockTicket, ScheduleKind)>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: ScheduleKind) -> ClockTicket {
        self.generation += 1;
        let ticket = ClockTicket {
            generation: self.generation,
        };
        self.armed = Some((ticket, kind));
        ticket
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn ticket(&self) -> Option<ClockTicket> {
        self.armed.map(|(t, _)| t)
    }

    pub fn kind(&self) -> Option<ScheduleKind> {
        self.armed.map(|(_, k)| k)
    }

    pub fn accepts(&self, ticket: ClockTicket) -> bool {
        self.ticket() == Some(ticket)
    }
}

/// Turns wall-clock time into whole-period ticks for one armed ticket.
///
/// The driver calls `sync` with the session's current ticket after every
/// event; a changed ticket re-anchors the metronome so the first tick of a
/// new schedule always lands one full period after it was armed.
#[derive(Debug)]
pub struct Metronome {
    period: Duration,
    armed: Option<(ClockTicket, Instant)>,
    fired: u32,
}

impl Metronome {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            armed: None,
            fired: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticket(&self) -> Option<ClockTicket> {
        self.armed.map(|(t, _)| t)
    }

    pub fn sync(&mut self, ticket: Option<ClockTicket>, now: Instant) {
        if self.ticket() == ticket {
            return;
        }
        self.armed = ticket.map(|t| (t, now));
        self.fired = 0;
    }

    /// Next tick that has come due by `now`, if any.
    pub fn next_due(&mut self, now: Instant) -> Option<ClockTicket> {
        let (ticket, anchor) = self.armed?;
        let due_at = anchor + self.period * (self.fired + 1);
        if now >= due_at {
            self.fired += 1;
            Some(ticket)
        } else {
            None
        }
    }
}
