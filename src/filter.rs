//! ffmpeg `drawtext` filter fragments for the six burn-in positions.

use std::fmt;
use std::path::Path;
use tracing::warn;

use crate::font::FontResolver;
use crate::measure::TextMeasurer;
use crate::options::BurnOptions;
use crate::template::{CURRENT_FRAME_SPLITTER, MISSING_KEY_VALUE};

/// Screen anchor of a burn-in element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    TopLeft,
    TopCentered,
    TopRight,
    BottomLeft,
    BottomCentered,
    BottomRight,
}

impl Position {
    /// Parse a position name, ignoring case and surrounding whitespace
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "top_left" => Some(Position::TopLeft),
            "top_centered" | "top_center" => Some(Position::TopCentered),
            "top_right" => Some(Position::TopRight),
            "bottom_left" => Some(Position::BottomLeft),
            "bottom_centered" | "bottom_center" => Some(Position::BottomCentered),
            "bottom_right" => Some(Position::BottomRight),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Position::TopLeft => "top_left",
            Position::TopCentered => "top_centered",
            Position::TopRight => "top_right",
            Position::BottomLeft => "bottom_left",
            Position::BottomCentered => "bottom_centered",
            Position::BottomRight => "bottom_right",
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Position::TopLeft | Position::TopCentered | Position::TopRight)
    }

    fn is_centered(&self) -> bool {
        matches!(self, Position::TopCentered | Position::BottomCentered)
    }

    fn is_right(&self) -> bool {
        matches!(self, Position::TopRight | Position::BottomRight)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single text or timecode element to draw
#[derive(Debug, Clone)]
pub struct BurnRequest {
    pub position: Position,
    pub text: String,
    /// Frame the `{current_frame}` expression starts from
    pub frame_start: Option<i64>,
    /// Only used to measure the widest frame number
    pub frame_end: Option<i64>,
    pub timecode: Option<TimecodeRequest>,
    pub options: BurnOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimecodeRequest {
    /// `HH:MM:SS:FF` of the first frame
    pub timecode: String,
    pub rate: f64,
}

/// Rendered `drawtext` filter plus its optional background box
#[derive(Debug, Clone, PartialEq)]
pub struct FilterFragment {
    pub drawtext: String,
    pub background: Option<String>,
}

impl fmt::Display for FilterFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.background {
            Some(background) => write!(f, "{}:{}", self.drawtext, background),
            None => f.write_str(&self.drawtext),
        }
    }
}

/// Builds filter fragments for one source resolution
#[derive(Debug)]
pub struct FilterBuilder {
    width: u32,
    height: u32,
    fonts: FontResolver,
    measurer: TextMeasurer,
}

impl FilterBuilder {
    pub fn new(resolution: (u32, u32), fonts: FontResolver) -> Self {
        Self {
            width: resolution.0,
            height: resolution.1,
            fonts,
            measurer: TextMeasurer::new(),
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn build(&mut self, request: &BurnRequest) -> FilterFragment {
        let options = &request.options;
        let frame_start = request.frame_start.or(options.frame_offset);
        let frame_end = request.frame_end.or(options.frame_end).or(frame_start);

        let mut final_text = request.text.clone();
        let mut size_text = request.text.clone();
        if request.text.contains(CURRENT_FRAME_SPLITTER) {
            let (rendered, measured) = match (frame_start, frame_end) {
                (Some(start), Some(end)) => (format!("%{{eif:n+{}:d}}", start), end.to_string()),
                _ => (MISSING_KEY_VALUE.to_string(), MISSING_KEY_VALUE.to_string()),
            };
            final_text = final_text.replace(CURRENT_FRAME_SPLITTER, &rendered);
            size_text = size_text.replace(CURRENT_FRAME_SPLITTER, &measured);
        }
        if let Some(timecode) = &request.timecode {
            size_text.push_str(&timecode.timecode);
        }

        let (x, y) = self.anchor(request.position, &size_text, options);
        let font = self.fonts.filter_path(options.font.as_ref());
        let text = escape_text(&final_text);

        let drawtext = match &request.timecode {
            Some(timecode) => format!(
                "drawtext=timecode=\\'{}\\':text=\\'{}\\':timecode_rate={:.2}:x={}:y={}:fontcolor={}@{:.1}:fontsize={}:fontfile='{}'",
                timecode.timecode,
                text,
                timecode.rate,
                x,
                y,
                options.font_color,
                options.opacity,
                options.font_size,
                font
            ),
            None => format!(
                "drawtext=fontfile='{}':text=\\'{}\\':x={}:y={}:fontcolor={}@{:.1}:fontsize={}",
                font, text, x, y, options.font_color, options.opacity, options.font_size
            ),
        };

        let background = options.bg_color.as_ref().map(|color| {
            format!(
                "box=1:boxborderw={}:boxcolor={}@{:.1}",
                options.bg_padding, color, options.bg_opacity
            )
        });

        FilterFragment { drawtext, background }
    }

    fn anchor(&mut self, position: Position, size_text: &str, options: &BurnOptions) -> (String, String) {
        let x = if position.is_centered() {
            "w/2-tw/2".to_string()
        } else if position.is_right() {
            let text_width = self.text_width(size_text, options) as i64;
            (self.width as i64 - (text_width + options.x_offset as i64)).to_string()
        } else {
            options.x_offset.to_string()
        };

        let y = if position.is_top() {
            options.y_offset.to_string()
        } else {
            format!("h-text_h-{}", options.y_offset)
        };

        (x, y)
    }

    /// Width of `text` in the font `drawtext` will use
    fn text_width(&mut self, text: &str, options: &BurnOptions) -> u32 {
        let font = self.fonts.resolve(options.font.as_ref());
        match self.measurer.text_width(Path::new(&font), text, options.font_size) {
            Ok(width) => width,
            Err(e) => {
                warn!("Cannot measure text with font '{}', estimating width: {}", font, e);
                estimate_text_width(text, options.font_size)
            }
        }
    }
}

/// Escape characters that delimit options in the filter language
pub fn escape_text(text: &str) -> String {
    text.replace(',', r"\,").replace(':', r"\:")
}

/// Join fragments into one `-vf` chain
pub fn filter_chain(fragments: &[FilterFragment]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Approximate rendered width of `text` in pixels for a proportional sans font,
/// used when the font file cannot be read
pub fn estimate_text_width(text: &str, font_size: u32) -> u32 {
    let em: f64 = text.chars().map(glyph_advance).sum();
    (em * font_size as f64).ceil() as u32
}

fn glyph_advance(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '/' | '\\' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.86,
        'A'..='Z' => 0.68,
        '0'..='9' => 0.56,
        c if c.is_ascii() => 0.52,
        _ => 0.9,
    }
}

/// Convert a frame count to `HH:MM:SS:FF`
pub fn frames_to_timecode(frames: i64, rate: f64) -> String {
    let frames = frames as f64;
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        (frames / (3600.0 * rate)) as i64,
        ((frames / (60.0 * rate)) % 60.0) as i64,
        ((frames / rate) % 60.0) as i64,
        frames.rem_euclid(rate) as i64
    )
}
