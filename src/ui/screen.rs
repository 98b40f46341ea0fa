use ratatui::Frame;
use steadypath::SessionPhase;

use crate::{
    ui::{render_start, render_track},
    App,
};

/// A UI Screen boundary: responsible for rendering one phase of the game
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Title card shown before the first run
pub struct StartScreen;

impl Screen for StartScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_start(app, f);
    }
}

/// Header, canvas and key hints; overlays are layered on top by the caller
pub struct TrackScreen;

impl Screen for TrackScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_track(app, f);
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: SessionPhase) -> Box<dyn Screen> {
    match phase {
        SessionPhase::Idle => Box::new(StartScreen),
        SessionPhase::Countdown | SessionPhase::Active | SessionPhase::Finished => {
            Box::new(TrackScreen)
        }
    }
}
