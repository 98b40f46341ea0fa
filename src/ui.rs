pub mod screen;
pub mod viewport;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Points},
        Block, BorderType, Borders, Clear, Paragraph, Wrap,
    },
    Frame,
};
use steadypath::{config::ViewBox, score::ScoreTier, Curve, FinishReason, Point, SessionPhase};
use unicode_width::UnicodeWidthStr;

use self::{screen::current_screen, viewport::to_canvas, viewport::Viewport};
use crate::App;

const HEADER_HEIGHT: u16 = 3;
const PLAYER_RADIUS: f64 = 12.0;
const END_MARKER_RADIUS: f64 = 6.0;

const TRACK_COLOR: Color = Color::Rgb(224, 204, 173);
const EDGE_COLOR: Color = Color::Rgb(143, 112, 66);
const MARKER_COLOR: Color = Color::Rgb(176, 141, 85);
const PLAYER_COLOR: Color = Color::Rgb(196, 150, 80);
const GRAB_COLOR: Color = Color::LightGreen;

/// Pre-computed canvas coordinates for the static parts of the track.
#[derive(Debug, Clone, Default)]
pub struct TrackArt {
    pub centre: Vec<(f64, f64)>,
    pub edges: Vec<(f64, f64)>,
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl TrackArt {
    /// `half_width` is the distance from the centreline to each drawn edge.
    pub fn new(curve: &Curve, view_box: ViewBox, half_width: f64) -> Self {
        let points = curve.points();
        let last = points.len().saturating_sub(1);
        let mut edges = Vec::with_capacity(points.len() * 2);
        for (i, p) in points.iter().enumerate() {
            let tangent = points[(i + 1).min(last)] - points[i.saturating_sub(1)];
            let len = tangent.x.hypot(tangent.y);
            if len == 0.0 {
                continue;
            }
            let normal = Point::new(-tangent.y / len, tangent.x / len) * half_width;
            edges.push(to_canvas(view_box, *p + normal));
            edges.push(to_canvas(view_box, *p - normal));
        }

        Self {
            centre: points.iter().map(|p| to_canvas(view_box, *p)).collect(),
            edges,
            start: to_canvas(view_box, curve.start()),
            end: to_canvas(view_box, curve.end()),
        }
    }
}

pub fn draw(app: &mut App, f: &mut Frame) {
    let phase = app.session.state();
    current_screen(phase).render(app, f);

    let area = f.area();
    if let Some(remaining) = app.session.countdown_remaining() {
        render_countdown(remaining, f, area);
    }
    if app.show_result && phase == SessionPhase::Finished {
        render_result(app, f, area);
    }
    if app.show_rules {
        render_rules(app, f, area);
    }
}

pub(crate) fn render_start(app: &mut App, f: &mut Frame) {
    let area = f.area();
    app.viewport = None;

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let mut lines = vec![
        Line::from(Span::styled("steadypath", bold.fg(MARKER_COLOR))),
        Line::from(""),
        Line::from("Guide the marker along the track without leaving it."),
        Line::from(""),
    ];
    lines.extend(rule_lines(app.session.config().time_limit_secs));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "press enter to start",
        bold.fg(Color::Green),
    )));
    lines.push(Line::from(Span::styled("? rules   q quit", dim)));

    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top), Constraint::Min(0)])
        .split(area);

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, chunks[1]);
}

pub(crate) fn render_track(app: &mut App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(app, f, chunks[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(EDGE_COLOR));
    let inner = block.inner(chunks[1]);
    app.viewport = Some(Viewport::new(inner, app.view_box));

    let art = &app.track;
    let player = to_canvas(app.view_box, app.session.player_position());
    let player_color = if app.session.is_grabbing() {
        GRAB_COLOR
    } else {
        PLAYER_COLOR
    };

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, app.view_box.width])
        .y_bounds([0.0, app.view_box.height])
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &art.edges,
                color: EDGE_COLOR,
            });
            ctx.draw(&Points {
                coords: &art.centre,
                color: TRACK_COLOR,
            });
            ctx.layer();
            for (x, y) in [art.start, art.end] {
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: END_MARKER_RADIUS,
                    color: MARKER_COLOR,
                });
            }
            ctx.draw(&Circle {
                x: player.0,
                y: player.1,
                radius: PLAYER_RADIUS,
                color: player_color,
            });
        });
    f.render_widget(canvas, chunks[1]);

    let hints = Paragraph::new(Span::styled(
        "enter start  r restart  v result  ? rules  q quit",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hints, chunks[2]);
}

fn render_header(app: &App, f: &mut Frame, area: Rect) {
    let snapshot = app.session.snapshot();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let timer_style = if snapshot.is_low_time() {
        bold.fg(Color::Red).add_modifier(Modifier::SLOW_BLINK)
    } else {
        bold
    };

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(EDGE_COLOR));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Span::styled(
            format!("⏳ {}s", snapshot.remaining_secs),
            timer_style,
        )),
        columns[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(
            "steadypath",
            bold.fg(MARKER_COLOR).add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center),
        columns[1],
    );
    f.render_widget(
        Paragraph::new(Span::styled(
            format!("{}%", snapshot.progress_percent),
            bold.fg(Color::Green),
        ))
        .alignment(Alignment::Right),
        columns[2],
    );
}

fn render_countdown(remaining: u32, f: &mut Frame, area: Rect) {
    let lines = vec![Line::from(Span::styled(
        remaining.to_string(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];
    render_popup(f, area, lines, "get ready");
}

fn reason_text(reason: FinishReason) -> &'static str {
    match reason {
        FinishReason::Completed => "reached the end",
        FinishReason::OutOfBounds => "left the track",
        FinishReason::TimedOut => "out of time",
    }
}

/// Headline and hint shown for each tier.
pub fn tier_copy(tier: ScoreTier) -> (&'static str, &'static str) {
    match tier {
        ScoreTier::Three => (
            "Steady hands, nimble moves",
            "Very fine control. An impressive run.",
        ),
        ScoreTier::Two => (
            "Good footing, steady rhythm",
            "Solid precision. Just a little more patience.",
        ),
        ScoreTier::One => (
            "Shaky ground, take it slow",
            "Breathe deeply and slow down; the next run will be more precise.",
        ),
    }
}

fn render_result(app: &App, f: &mut Frame, area: Rect) {
    let Some(tier) = app.session.score_tier() else {
        return;
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let (headline, hint) = tier_copy(tier);

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Completed "),
            Span::styled(
                format!("{}%", app.session.progress_percent()),
                bold.fg(Color::Green),
            ),
            Span::raw(" of the track"),
        ]),
    ];
    if let Some(reason) = app.session.finish_reason() {
        lines.push(Line::from(Span::styled(reason_text(reason), dim)));
    }
    lines.extend([
        Line::from(""),
        Line::from(Span::styled(headline, bold.fg(Color::Green))),
        Line::from(hint),
        Line::from(vec![
            Span::raw("Score: "),
            Span::styled(tier.points().to_string(), bold),
        ]),
        Line::from(""),
        Line::from(Span::styled("Scoring", bold)),
    ]);
    for (range, row_tier) in [
        ("70-100%", ScoreTier::Three),
        ("35-69% ", ScoreTier::Two),
        ("0-34%  ", ScoreTier::One),
    ] {
        let style = if row_tier == tier { bold } else { dim };
        lines.push(Line::from(Span::styled(
            format!("{range}  {} pts  {}", row_tier.points(), tier_copy(row_tier).0),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("r play again   x close", dim)));

    render_popup(f, area, lines, "result");
}

fn rule_lines(time_limit_secs: u32) -> Vec<Line<'static>> {
    vec![
        Line::from(format!(
            "1. You have {time_limit_secs} seconds to drag the marker along the track"
        )),
        Line::from("2. The run ends the moment the marker leaves the track"),
        Line::from("3. When time runs out or you leave, you score by distance travelled"),
    ]
}

fn render_rules(app: &App, f: &mut Frame, area: Rect) {
    let mut lines = rule_lines(app.session.config().time_limit_secs);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "x close",
        Style::default().add_modifier(Modifier::DIM),
    )));
    render_popup(f, area, lines, "rules");
}

fn line_width(line: &Line) -> usize {
    line.spans.iter().map(|s| s.content.width()).sum()
}

fn render_popup(f: &mut Frame, area: Rect, lines: Vec<Line>, title: &str) {
    let content_width = lines.iter().map(line_width).max().unwrap_or(0) as u16;
    let width = content_width.saturating_add(4).min(area.width);
    let height = (lines.len() as u16).saturating_add(2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let block = Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(EDGE_COLOR));

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}
