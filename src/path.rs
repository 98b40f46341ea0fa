//! Track definitions written as SVG path data.
//!
//! Only the subset needed to describe a single open track is understood:
//! move-to, line-to (including the horizontal and vertical forms),
//! cubic Bézier and close-path, each in absolute and relative form.

use thiserror::Error;

use crate::geometry::Point;

/// S-curve from bottom centre, sweeping left, back right and ending top centre.
pub const DEFAULT_TRACK: &str =
    "M 175 450 C 75 450 50 350 50 300 C 50 200 200 250 250 150 C 275 100 200 50 175 50";

/// A curve that can be evaluated at a normalised parameter `t` in `[0, 1]`.
pub trait ParametricCurve {
    fn point_at(&self, t: f64) -> Point;

    /// Number of independently parameterised pieces. Samplers use this to
    /// size their arc-length tables so each piece gets the same density.
    fn segment_count(&self) -> usize {
        1
    }
}

impl<T: ParametricCurve + ?Sized> ParametricCurve for &T {
    fn point_at(&self, t: f64) -> Point {
        (**self).point_at(t)
    }

    fn segment_count(&self) -> usize {
        (**self).segment_count()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathParseError {
    #[error("path data is empty")]
    Empty,
    #[error("path data must start with a move-to command")]
    MissingMoveTo,
    #[error("unsupported path command '{0}'")]
    UnsupportedCommand(char),
    #[error("invalid number '{0}' in path data")]
    InvalidNumber(String),
    #[error("command '{command}' expects {expected} numbers")]
    MissingArguments { command: char, expected: usize },
    #[error("close-path takes no arguments, found {0}")]
    TrailingNumber(f64),
    #[error("unexpected character '{0}' in path data")]
    UnexpectedChar(char),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Point, Point),
    Cubic(Point, Point, Point, Point),
}

impl Segment {
    pub fn point_at(&self, t: f64) -> Point {
        match *self {
            Segment::Line(a, b) => a.lerp(b, t),
            Segment::Cubic(p0, p1, p2, p3) => {
                let u = 1.0 - t;
                let b0 = u * u * u;
                let b1 = 3.0 * u * u * t;
                let b2 = 3.0 * u * t * t;
                let b3 = t * t * t;
                p0 * b0 + p1 * b1 + p2 * b2 + p3 * b3
            }
        }
    }

    pub fn start(&self) -> Point {
        match *self {
            Segment::Line(a, _) | Segment::Cubic(a, _, _, _) => a,
        }
    }

    pub fn end(&self) -> Point {
        match *self {
            Segment::Line(_, b) | Segment::Cubic(_, _, _, b) => b,
        }
    }
}

/// An open path made of line and cubic segments, parameterised uniformly
/// per segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathDefinition {
    segments: Vec<Segment>,
}

impl PathDefinition {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn parse(data: &str) -> Result<Self, PathParseError> {
        let tokens = tokenize(data)?;
        let mut iter = tokens.into_iter().peekable();

        let mut command = match iter.next() {
            None => return Err(PathParseError::Empty),
            Some(Token::Command(c)) if c == 'M' || c == 'm' => c,
            Some(_) => return Err(PathParseError::MissingMoveTo),
        };

        let mut segments = Vec::new();
        let mut cursor = Point::default();
        let mut subpath_start = Point::default();

        loop {
            let relative = command.is_ascii_lowercase();
            let origin = if relative { cursor } else { Point::default() };

            match command.to_ascii_uppercase() {
                'M' => {
                    let p = take_point(&mut iter, command, 2)? + origin;
                    cursor = p;
                    subpath_start = p;
                    // further coordinate pairs after a move-to are line-tos
                    command = if relative { 'l' } else { 'L' };
                }
                'L' => {
                    let p = take_point(&mut iter, command, 2)? + origin;
                    segments.push(Segment::Line(cursor, p));
                    cursor = p;
                }
                'H' => {
                    let x = take_number(&mut iter, command, 1)?;
                    let p = Point::new(if relative { cursor.x + x } else { x }, cursor.y);
                    segments.push(Segment::Line(cursor, p));
                    cursor = p;
                }
                'V' => {
                    let y = take_number(&mut iter, command, 1)?;
                    let p = Point::new(cursor.x, if relative { cursor.y + y } else { y });
                    segments.push(Segment::Line(cursor, p));
                    cursor = p;
                }
                'C' => {
                    let c1 = take_point(&mut iter, command, 6)? + origin;
                    let c2 = take_point(&mut iter, command, 6)? + origin;
                    let end = take_point(&mut iter, command, 6)? + origin;
                    segments.push(Segment::Cubic(cursor, c1, c2, end));
                    cursor = end;
                }
                'Z' => {
                    if cursor != subpath_start {
                        segments.push(Segment::Line(cursor, subpath_start));
                    }
                    cursor = subpath_start;
                    if let Some(Token::Number(n)) = iter.peek() {
                        return Err(PathParseError::TrailingNumber(*n));
                    }
                }
                other => return Err(PathParseError::UnsupportedCommand(other)),
            }

            match iter.peek() {
                None => break,
                Some(Token::Command(c)) => {
                    command = *c;
                    iter.next();
                }
                // implicit repetition of the current command
                Some(Token::Number(_)) => {}
            }
        }

        Ok(Self { segments })
    }
}

impl ParametricCurve for PathDefinition {
    fn point_at(&self, t: f64) -> Point {
        let n = self.segments.len();
        if n == 0 {
            return Point::default();
        }
        let scaled = t.clamp(0.0, 1.0) * n as f64;
        let idx = (scaled.floor() as usize).min(n - 1);
        self.segments[idx].point_at(scaled - idx as f64)
    }

    fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl std::str::FromStr for PathDefinition {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn take_number(
    iter: &mut impl Iterator<Item = Token>,
    command: char,
    expected: usize,
) -> Result<f64, PathParseError> {
    match iter.next() {
        Some(Token::Number(n)) => Ok(n),
        _ => Err(PathParseError::MissingArguments { command, expected }),
    }
}

fn take_point(
    iter: &mut impl Iterator<Item = Token>,
    command: char,
    expected: usize,
) -> Result<Point, PathParseError> {
    let x = take_number(iter, command, expected)?;
    let y = take_number(iter, command, expected)?;
    Ok(Point::new(x, y))
}

fn tokenize(data: &str) -> Result<Vec<Token>, PathParseError> {
    let chars: Vec<char> = data.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() || c == ',' {
            i += 1;
            continue;
        }
        if c.is_ascii_alphabetic() {
            tokens.push(Token::Command(c));
            i += 1;
            continue;
        }
        if !(c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
            return Err(PathParseError::UnexpectedChar(c));
        }

        let start = i;
        let mut seen_dot = c == '.';
        let mut seen_exp = false;
        i += 1;
        while i < chars.len() {
            let d = chars[i];
            if d.is_ascii_digit() {
                i += 1;
            } else if d == '.' && !seen_dot && !seen_exp {
                seen_dot = true;
                i += 1;
            } else if (d == 'e' || d == 'E') && !seen_exp {
                seen_exp = true;
                i += 1;
                if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
                    i += 1;
                }
            } else {
                break;
            }
        }

        let text: String = chars[start..i].iter().collect();
        let n = text
            .parse::<f64>()
            .map_err(|_| PathParseError::InvalidNumber(text.clone()))?;
        tokens.push(Token::Number(n));
    }

    Ok(tokens)
}
