use std::sync::Arc;

use assert_matches::assert_matches;
use steadypath::{
    clock::ClockTicket,
    config::Config,
    path::PathDefinition,
    score::ScoreTier,
    session::{PointerOutcome, SessionConfig, TickOutcome},
    Curve, FinishReason, GameSession, Point, SessionPhase,
};

// End-to-end game scenarios against the public session API on a straight
// 1000-unit track sampled at 1000, so sample i sits at (i, 0).

fn straight() -> GameSession {
    let track = PathDefinition::parse("M 0 0 L 1000 0").unwrap();
    let curve = Curve::sample(&track, 1000).unwrap();
    GameSession::new(Arc::new(curve), SessionConfig::default())
}

fn ticket(session: &GameSession) -> ClockTicket {
    session.clock_ticket().expect("an armed schedule")
}

fn tick(session: &mut GameSession) -> TickOutcome {
    let t = ticket(session);
    session.on_clock_tick(t)
}

fn active() -> GameSession {
    let mut session = straight();
    assert!(session.start_session());
    for _ in 0..3 {
        tick(&mut session);
    }
    assert_eq!(session.state(), SessionPhase::Active);
    session
}

/// Grab the marker and walk it along the centreline up to `x`.
fn walk_to(session: &mut GameSession, x: f64) {
    session.on_pointer_down(Point::new(0.0, 0.0));
    let mut at = 0.0;
    while at < x {
        at = (at + 50.0).min(x);
        session.on_pointer_move(Point::new(at, 0.0));
    }
}

#[test]
fn leaving_the_track_scores_distance_so_far() {
    let mut session = active();
    walk_to(&mut session, 400.0);
    assert_eq!(session.progress(), 40.0);
    assert_eq!(session.progress_index(), 400);

    let radius = session.config().tracker.safe_radius;
    let outcome = session.on_pointer_move(Point::new(400.0, radius + 5.0));
    assert_eq!(outcome, PointerOutcome::Finished(FinishReason::OutOfBounds));

    assert_eq!(session.state(), SessionPhase::Finished);
    assert_eq!(session.progress(), 40.0);
    assert_eq!(session.player_position(), Point::new(400.0, 0.0));
    assert!(!session.is_grabbing());
    assert_eq!(session.score_tier(), Some(ScoreTier::Two));
    assert_eq!(session.clock_ticket(), None);
}

#[test]
fn never_grabbing_runs_out_the_clock() {
    let mut session = active();
    for second in 1..30u32 {
        assert_eq!(
            tick(&mut session),
            TickOutcome::Ticked {
                remaining_secs: 30 - second
            }
        );
    }
    assert_eq!(tick(&mut session), TickOutcome::TimedOut);
    assert_eq!(session.finish_reason(), Some(FinishReason::TimedOut));
    assert_eq!(session.progress(), 0.0);
    assert_eq!(session.score_tier(), Some(ScoreTier::One));
    assert_eq!(session.snapshot().score_tier.map(|t| t.points()), Some(1));
}

#[test]
fn timing_out_mid_drag_keeps_progress() {
    let mut session = active();
    walk_to(&mut session, 100.0);
    assert!(session.is_grabbing());
    for _ in 0..30 {
        tick(&mut session);
    }
    assert_eq!(session.finish_reason(), Some(FinishReason::TimedOut));
    assert_eq!(session.progress(), 10.0);
    assert!(!session.is_grabbing());
    assert_eq!(session.on_pointer_move(Point::new(150.0, 0.0)), PointerOutcome::Ignored);
}

#[test]
fn reaching_the_threshold_completes_at_full_progress() {
    let mut session = active();
    walk_to(&mut session, 990.0);
    assert_eq!(session.finish_reason(), Some(FinishReason::Completed));
    assert_eq!(session.progress(), 100.0);
    assert_eq!(session.progress_percent(), 100);
    assert_eq!(session.score_tier(), Some(ScoreTier::Three));
}

#[test]
fn restart_mid_countdown_discards_old_ticks() {
    let mut session = straight();
    session.start_session();
    let old = ticket(&session);
    assert_eq!(
        session.on_clock_tick(old),
        TickOutcome::Countdown { remaining: 2 }
    );

    session.restart_session();
    assert_eq!(session.countdown_remaining(), Some(3));
    assert_eq!(session.on_clock_tick(old), TickOutcome::Stale);
    assert_eq!(session.countdown_remaining(), Some(3));

    assert_matches!(tick(&mut session), TickOutcome::Countdown { remaining: 2 });
    assert_matches!(tick(&mut session), TickOutcome::Countdown { remaining: 1 });
    assert_eq!(tick(&mut session), TickOutcome::Activated);
    assert_eq!(session.remaining_secs(), 30);
}

#[test]
fn repeated_restarts_leave_one_clean_countdown() {
    let mut session = straight();
    session.start_session();
    let mut stale = vec![ticket(&session)];
    for _ in 0..4 {
        session.restart_session();
        stale.push(ticket(&session));
    }
    stale.pop();

    for old in &stale {
        assert_eq!(session.on_clock_tick(*old), TickOutcome::Stale);
    }
    tick(&mut session);
    tick(&mut session);
    assert_eq!(session.state(), SessionPhase::Countdown);
    tick(&mut session);
    assert_eq!(session.state(), SessionPhase::Active);
}

#[test]
fn countdown_ticket_cannot_drive_the_session_clock() {
    let mut session = straight();
    session.start_session();
    let countdown = ticket(&session);
    for _ in 0..3 {
        session.on_clock_tick(countdown);
    }
    assert_eq!(session.state(), SessionPhase::Active);
    assert_eq!(session.on_clock_tick(countdown), TickOutcome::Stale);
    assert_eq!(session.remaining_secs(), 30);
}

#[test]
fn restart_after_progress_resets_everything() {
    let mut session = active();
    walk_to(&mut session, 300.0);
    session.restart_session();

    let state = session.session_state();
    assert_eq!(state.phase, SessionPhase::Countdown);
    assert_eq!(state.progress, 0.0);
    assert_eq!(state.progress_index, 0);
    assert_eq!(state.player_position, Point::new(0.0, 0.0));
    assert!(!state.grabbing);
    assert_eq!(state.finish_reason, None);
    assert_eq!(state.remaining_secs, 30);
}

#[test]
fn progress_never_moves_backwards() {
    let mut session = active();
    walk_to(&mut session, 300.0);
    assert_eq!(session.progress(), 30.0);

    // inside the backtrack window: position follows, progress holds
    let outcome = session.on_pointer_move(Point::new(290.0, 0.0));
    assert_matches!(outcome, PointerOutcome::Tracked(eval) if eval.best_index == 290);
    assert_eq!(session.progress(), 30.0);
    assert_eq!(session.progress_index(), 300);
    assert_eq!(session.player_position(), Point::new(290.0, 0.0));

    session.on_pointer_move(Point::new(320.0, 0.0));
    assert_eq!(session.progress(), 32.0);
}

#[test]
fn pickup_distance_is_exclusive() {
    let mut session = active();
    assert_eq!(
        session.on_pointer_down(Point::new(40.1, 0.0)),
        PointerOutcome::Rejected
    );
    assert_eq!(
        session.on_pointer_down(Point::new(40.0, 0.0)),
        PointerOutcome::Rejected
    );
    assert!(!session.is_grabbing());

    assert_matches!(
        session.on_pointer_down(Point::new(39.9, 0.0)),
        PointerOutcome::Tracked(_)
    );
    assert!(session.is_grabbing());
    assert_eq!(session.progress_index(), 40);
}

#[test]
fn pointer_input_outside_active_is_ignored() {
    let mut session = straight();
    assert_eq!(
        session.on_pointer_down(Point::new(0.0, 0.0)),
        PointerOutcome::Ignored
    );
    session.start_session();
    assert_eq!(
        session.on_pointer_down(Point::new(0.0, 0.0)),
        PointerOutcome::Ignored
    );
    assert_eq!(
        session.on_pointer_move(Point::new(10.0, 0.0)),
        PointerOutcome::Ignored
    );
    assert_eq!(session.progress(), 0.0);
}

#[test]
fn default_config_plays_the_default_track() {
    let mut session = Config::default().build_session().unwrap();
    let start = session.curve().start();
    assert_eq!(start, Point::new(175.0, 450.0));
    assert_eq!(session.curve().end(), Point::new(175.0, 50.0));

    session.start_session();
    for _ in 0..3 {
        tick(&mut session);
    }
    assert_matches!(
        session.on_pointer_down(Point::new(start.x, start.y + 10.0)),
        PointerOutcome::Tracked(_)
    );

    // trace the whole track one sample at a time
    let points: Vec<Point> = session.curve().points().to_vec();
    for p in points.iter().skip(1) {
        if session.state() == SessionPhase::Finished {
            break;
        }
        session.on_pointer_move(*p);
    }
    assert_eq!(session.finish_reason(), Some(FinishReason::Completed));
    assert_eq!(session.progress(), 100.0);
}
