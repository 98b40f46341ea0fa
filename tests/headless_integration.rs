use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use steadypath::{
    clock::Metronome,
    path::PathDefinition,
    runtime::{AppEvent, AppEventSource, PointerAction, Runner, ScriptedEventSource, SimulatedClock},
    session::SessionConfig,
    Curve, FinishReason, GameSession, Point, SessionPhase,
};

// Headless integration using the runtime + GameSession without a TTY.
// Pointer cells map one-to-one onto curve units along a horizontal track.
// Time is simulated: each idle frame is a quarter second, and the session
// clock is driven through the metronome exactly as the terminal loop does.

const FRAME: Duration = Duration::from_millis(250);

fn session() -> GameSession {
    let track = PathDefinition::parse("M 0 0 L 100 0").unwrap();
    let curve = Curve::sample(&track, 100).unwrap();
    GameSession::new(Arc::new(curve), SessionConfig::default())
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn point(column: u16, row: u16) -> Point {
    Point::new(column as f64, row as f64)
}

/// One turn of the game loop. Returns the event that was handled.
fn turn<E: AppEventSource>(
    runner: &Runner<E, SimulatedClock>,
    metronome: &mut Metronome,
    session: &mut GameSession,
) -> AppEvent {
    let step = runner.step();
    match &step.event {
        AppEvent::Key(k) if k.code == KeyCode::Enter => {
            session.start_session();
        }
        AppEvent::Key(k) if k.code == KeyCode::Char('r') => session.restart_session(),
        AppEvent::Pointer(PointerAction::Down { column, row }) => {
            session.on_pointer_down(point(*column, *row));
        }
        AppEvent::Pointer(PointerAction::Drag { column, row }) => {
            session.on_pointer_move(point(*column, *row));
        }
        AppEvent::Pointer(PointerAction::Up) => {
            session.on_pointer_up();
        }
        _ => {}
    }

    metronome.sync(session.clock_ticket(), step.at);
    while let Some(ticket) = metronome.next_due(step.at) {
        session.on_clock_tick(ticket);
        metronome.sync(session.clock_ticket(), step.at);
    }
    step.event
}

#[test]
fn headless_trace_reaches_the_end() {
    let mut session = session();
    let mut metronome = Metronome::new(Duration::from_secs(1));
    let (tx, source) = ScriptedEventSource::channel();
    let runner = Runner::new(source, SimulatedClock::new(FRAME));

    tx.send(key(KeyCode::Enter)).unwrap();

    let mut sent_gesture = false;
    for _ in 0..200u32 {
        turn(&runner, &mut metronome, &mut session);

        if session.state() == SessionPhase::Active && !sent_gesture {
            tx.send(AppEvent::Pointer(PointerAction::Down { column: 0, row: 0 }))
                .unwrap();
            for column in (10..=100).step_by(10) {
                tx.send(AppEvent::Pointer(PointerAction::Drag { column, row: 0 }))
                    .unwrap();
            }
            tx.send(AppEvent::Pointer(PointerAction::Up)).unwrap();
            sent_gesture = true;
        }
        if session.state() == SessionPhase::Finished {
            break;
        }
    }

    assert_eq!(session.finish_reason(), Some(FinishReason::Completed));
    assert_eq!(session.progress(), 100.0);
    // the whole gesture lands inside the first second of play
    assert_eq!(session.remaining_secs(), 30);
    assert_eq!(runner.clock().frames_elapsed(), 12);
    assert_eq!(session.score_tier().map(|t| t.points()), Some(3));
}

#[test]
fn headless_idle_marker_times_out_on_schedule() {
    let mut session = session();
    let mut metronome = Metronome::new(Duration::from_secs(1));
    let runner = Runner::new(
        ScriptedEventSource::from_events([key(KeyCode::Enter)]),
        SimulatedClock::new(FRAME),
    );

    for _ in 0..500u32 {
        turn(&runner, &mut metronome, &mut session);
        if session.state() == SessionPhase::Finished {
            break;
        }
    }

    // three countdown seconds then the full session clock, four frames each
    assert_eq!(runner.clock().frames_elapsed(), 33 * 4);
    assert_eq!(session.finish_reason(), Some(FinishReason::TimedOut));
    assert_eq!(session.progress(), 0.0);
    assert_eq!(session.score_tier().map(|t| t.points()), Some(1));
}

#[test]
fn headless_restart_mid_countdown_starts_a_fresh_second() {
    let mut session = session();
    let mut metronome = Metronome::new(Duration::from_secs(1));
    let (tx, source) = ScriptedEventSource::channel();
    let runner = Runner::new(source, SimulatedClock::new(FRAME));

    tx.send(key(KeyCode::Enter)).unwrap();
    turn(&runner, &mut metronome, &mut session);
    for _ in 0..6 {
        turn(&runner, &mut metronome, &mut session);
    }
    assert_eq!(session.countdown_remaining(), Some(2));

    // restart at 1.5s; the old countdown's next tick at 2s must not count
    tx.send(key(KeyCode::Char('r'))).unwrap();
    turn(&runner, &mut metronome, &mut session);
    assert_eq!(session.countdown_remaining(), Some(3));

    for _ in 0..100u32 {
        if session.state() == SessionPhase::Active {
            break;
        }
        turn(&runner, &mut metronome, &mut session);
    }
    assert_eq!(runner.clock().frames_elapsed(), 18);
    assert_eq!(session.remaining_secs(), 30);
}

#[test]
fn headless_resize_changes_nothing() {
    let mut session = session();
    let mut metronome = Metronome::new(Duration::from_secs(1));
    let runner = Runner::new(
        ScriptedEventSource::from_events([
            key(KeyCode::Enter),
            AppEvent::Resize,
            AppEvent::Resize,
        ]),
        SimulatedClock::new(FRAME),
    );

    assert_eq!(turn(&runner, &mut metronome, &mut session), key(KeyCode::Enter));
    let before = session.session_state().clone();
    assert_eq!(turn(&runner, &mut metronome, &mut session), AppEvent::Resize);
    assert_eq!(turn(&runner, &mut metronome, &mut session), AppEvent::Resize);
    assert_eq!(session.session_state(), &before);
    assert_eq!(runner.clock().frames_elapsed(), 0);
}
