mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use steadypath::{
    app_dirs::AppDirs,
    clock::Metronome,
    config::{Config, ConfigStore, FileConfigStore, ViewBox},
    runtime::{AppEvent, CrosstermEventSource, PointerAction, Runner, WallClock},
    session::SessionEvent,
    GameSession, SessionPhase,
};

use crate::ui::{viewport::Viewport, TrackArt};

const FRAME_MS: u64 = 50;

/// trace a winding track against the clock without leaving it
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal steadiness game: drag the marker along a winding track before time runs out. Leave the track and the run is over."
)]
pub struct Cli {
    /// number of seconds allowed per run
    #[clap(short = 's', long)]
    secs: Option<u32>,

    /// how far the marker may stray from the centreline
    #[clap(long)]
    safe_radius: Option<f64>,

    /// how close a click must land to pick up the marker
    #[clap(long)]
    pickup: Option<f64>,

    /// number of samples taken along the track
    #[clap(short = 'r', long)]
    resolution: Option<usize>,

    /// track as SVG path data (M, L, H, V, C, Z)
    #[clap(short = 't', long)]
    track: Option<String>,

    /// settings file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the effective settings back to the settings file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Layer command line overrides on top of the stored settings
    fn apply(&self, mut config: Config) -> Config {
        if let Some(secs) = self.secs {
            config.time_limit_secs = secs;
        }
        if let Some(radius) = self.safe_radius {
            config.safe_radius = radius;
        }
        if let Some(pickup) = self.pickup {
            config.pickup_distance = pickup;
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(track) = &self.track {
            config.track = track.clone();
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub session: GameSession,
    pub view_box: ViewBox,
    pub track: TrackArt,
    /// Canvas area from the last draw; `None` until the track is on screen
    pub viewport: Option<Viewport>,
    pub show_result: bool,
    pub show_rules: bool,
}

impl App {
    pub fn new(session: GameSession, view_box: ViewBox) -> Self {
        let track = TrackArt::new(
            session.curve(),
            view_box,
            session.config().tracker.safe_radius,
        );
        Self {
            session,
            view_box,
            track,
            viewport: None,
            show_result: false,
            show_rules: false,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
            KeyCode::Enter | KeyCode::Char('s') => {
                self.session.start_session();
            }
            KeyCode::Char('r') => self.session.restart_session(),
            KeyCode::Char('v') => {
                if self.session.state() == SessionPhase::Finished {
                    self.show_result = true;
                }
            }
            KeyCode::Char('x') => {
                self.show_result = false;
                self.show_rules = false;
            }
            KeyCode::Char('?') => self.show_rules = !self.show_rules,
            _ => {}
        }
        self.absorb_session_events();
        Control::Continue
    }

    pub fn on_pointer(&mut self, action: PointerAction) {
        let viewport = self.viewport;
        let to_curve = |column, row| viewport.and_then(|vp| vp.to_curve(column, row));

        match action {
            PointerAction::Down { column, row } => {
                if let Some(point) = to_curve(column, row) {
                    self.session.on_pointer_down(point);
                }
            }
            PointerAction::Drag { column, row } => match to_curve(column, row) {
                Some(point) => {
                    self.session.on_pointer_move(point);
                }
                // dragging off the canvas lets go of the marker
                None => {
                    self.session.on_pointer_up();
                }
            },
            PointerAction::Up => {
                self.session.on_pointer_up();
            }
        }
        self.absorb_session_events();
    }

    /// Apply session notifications to overlay state.
    pub fn absorb_session_events(&mut self) {
        for event in self.session.drain_events() {
            log::trace!("session event {event:?}");
            match event {
                SessionEvent::CountdownStarted { .. } => self.show_result = false,
                SessionEvent::Finished { .. } => self.show_result = true,
                _ => {}
            }
        }
    }

    /// Deliver whole seconds of clock time that have elapsed by `now`.
    pub fn drive_clock(&mut self, metronome: &mut Metronome, now: Instant) -> bool {
        let mut ticked = false;
        metronome.sync(self.session.clock_ticket(), now);
        while let Some(ticket) = metronome.next_due(now) {
            self.session.on_clock_tick(ticket);
            metronome.sync(self.session.clock_ticket(), now);
            ticked = true;
        }
        self.absorb_session_events();
        ticked
    }
}

fn install_logger(target: env_logger::Target) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(target)
        .try_init()
}

/// Send logs to the state directory; the terminal belongs to the TUI.
fn init_logging() -> Result<(), Box<dyn Error>> {
    let Some(path) = AppDirs::log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    install_logger(env_logger::Target::Pipe(Box::new(file)))?;
    log::info!("steadypath {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = cli.store();
    let config = cli.apply(store.load());
    let session = match config.build_session() {
        Ok(session) => session,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e).exit();
        }
    };
    if cli.save_config {
        store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = init_logging() {
        eprintln!("steadypath: logging disabled: {e}");
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, config.view_box);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        WallClock::new(Duration::from_millis(FRAME_MS)),
    );
    let mut metronome = Metronome::new(Duration::from_secs(1));

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let step = runner.step();
        let redraw = match step.event {
            AppEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    break;
                }
                true
            }
            AppEvent::Pointer(action) => {
                app.on_pointer(action);
                true
            }
            AppEvent::Resize => true,
            AppEvent::Idle => false,
        };

        let ticked = app.drive_clock(&mut metronome, step.at);
        if redraw || ticked {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    log::info!("quitting");
    Ok(())
}
