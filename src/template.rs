//! Template resolution for burn-in text.
//!
//! Templates are free-form strings with `{key}` placeholders looked up in the
//! job data. Three keys are reserved: `{current_frame}` becomes a frame number
//! expression evaluated by ffmpeg while rendering, while `{timecode}` and
//! `{source_timecode}` turn the whole slot into a timecode burn-in.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

use crate::error::{BurninError, Result};
use crate::probe::StreamInfo;

/// Text shown for anything that cannot be resolved
pub const MISSING_KEY_VALUE: &str = "N/A";
pub const CURRENT_FRAME_KEY: &str = "{current_frame}";
/// Marker left in resolved text where the live frame number goes
pub const CURRENT_FRAME_SPLITTER: &str = "_-_CURRENT_FRAME_-_";
pub const TIMECODE_KEY: &str = "{timecode}";
pub const SOURCE_TIMECODE_KEY: &str = "{source_timecode}";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder pattern is valid")
});

/// Where a timecode burn-in starts counting from
#[derive(Debug, Clone, PartialEq)]
pub enum TimecodeSource {
    /// Frame number, converted with the frame rate
    Frames(i64),
    /// Ready-made `HH:MM:SS:FF` string
    Literal(String),
}

impl TimecodeSource {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(TimecodeSource::Frames),
            Value::String(s) if !s.is_empty() => Some(TimecodeSource::Literal(s.clone())),
            _ => None,
        }
    }
}

/// Outcome of resolving one screen position
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSlot {
    Text(String),
    Timecode {
        /// Text rendered in front of the timecode
        text: Option<String>,
        start: TimecodeSource,
    },
}

/// Resolves per-position templates against job data
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    data: Map<String, Value>,
    frame_start: Option<i64>,
    frame_end: Option<i64>,
    frame_start_tc: Option<TimecodeSource>,
    source_timecode: Option<String>,
}

impl TemplateResolver {
    /// Build a resolver, filling stream derived keys the caller did not set
    pub fn new(mut data: Map<String, Value>, stream: &StreamInfo) -> Self {
        if !data.contains_key("resolution_width") {
            data.insert("resolution_width".to_string(), optional_number(stream.width));
        }
        if !data.contains_key("resolution_height") {
            data.insert("resolution_height".to_string(), optional_number(stream.height));
        }
        if !data.contains_key("fps") {
            data.insert("fps".to_string(), Value::String(stream.fps()));
        }

        let frame_start = data.get("frame_start").and_then(frame_number);
        let frame_end = data.get("frame_end").and_then(frame_number);
        let frame_start_tc = match data.get("frame_start_tc") {
            Some(value) if !value.is_null() => TimecodeSource::from_value(value),
            _ => frame_start.map(TimecodeSource::Frames),
        };

        if frame_start.is_some() {
            data.insert(key_name(CURRENT_FRAME_KEY), Value::String(CURRENT_FRAME_SPLITTER.to_string()));
        }
        if frame_start_tc.is_some() {
            data.insert(key_name(TIMECODE_KEY), Value::String(TIMECODE_KEY.to_string()));
        }

        let source_timecode = stream.timecode.clone();
        if source_timecode.is_some() {
            data.insert(key_name(SOURCE_TIMECODE_KEY), Value::String(SOURCE_TIMECODE_KEY.to_string()));
        }

        Self {
            data,
            frame_start,
            frame_end,
            frame_start_tc,
            source_timecode,
        }
    }

    pub fn frame_start(&self) -> Option<i64> {
        self.frame_start
    }

    pub fn frame_end(&self) -> Option<i64> {
        self.frame_end
    }

    /// Resolve the template configured for `position`.
    ///
    /// Empty values yield `None`; containers are rejected.
    pub fn resolve(&self, position: &str, value: &Value) -> Result<Option<ResolvedSlot>> {
        let mut template = match value {
            Value::Null | Value::Bool(false) => return Ok(None),
            Value::String(s) if s.is_empty() => return Ok(None),
            Value::Number(n) if n.as_f64() == Some(0.0) => return Ok(None),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(BurninError::invalid_value(position, value));
            }
        };

        let mut has_timecode = template.contains(TIMECODE_KEY);
        if has_timecode && self.frame_start_tc.is_none() {
            warn!("`frame_start` and `frame_start_tc` are not set in entered data");
            has_timecode = false;
            template = template.replace(TIMECODE_KEY, MISSING_KEY_VALUE);
        }

        let mut has_source_timecode = template.contains(SOURCE_TIMECODE_KEY);
        if has_source_timecode && self.source_timecode.is_none() {
            warn!("Source does not have set timecode value");
            has_source_timecode = false;
            template = template.replace(SOURCE_TIMECODE_KEY, MISSING_KEY_VALUE);
        }

        let text = self.format(position, &template)?;

        if has_source_timecode {
            if let Some(timecode) = &self.source_timecode {
                return Ok(Some(ResolvedSlot::Timecode {
                    text: leading_text(&text, SOURCE_TIMECODE_KEY),
                    start: TimecodeSource::Literal(timecode.clone()),
                }));
            }
        }

        if has_timecode {
            if let Some(start) = &self.frame_start_tc {
                return Ok(Some(ResolvedSlot::Timecode {
                    text: leading_text(&text, TIMECODE_KEY),
                    start: start.clone(),
                }));
            }
        }

        Ok(Some(ResolvedSlot::Text(text)))
    }

    /// Substitute every `{placeholder}` in `template`.
    ///
    /// `{{` and `}}` produce literal braces, unmatched braces are kept as they
    /// are and unknown keys become [`MISSING_KEY_VALUE`].
    pub fn format(&self, position: &str, template: &str) -> Result<String> {
        let mut resolved: HashMap<&str, String> = HashMap::new();
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let start = caps.get(0).map_or(0, |m| m.start());
            output.push_str(&template[last..start]);
            last = start + whole.len();

            match whole {
                "{{" => output.push('{'),
                "}}" => output.push('}'),
                _ => {
                    let field = caps.get(1).map_or("", |m| m.as_str());
                    if !resolved.contains_key(field) {
                        let value = self.format_field(position, field)?;
                        resolved.insert(field, value);
                    }
                    output.push_str(&resolved[field]);
                }
            }
        }
        output.push_str(&template[last..]);

        Ok(output)
    }

    fn format_field(&self, position: &str, field: &str) -> Result<String> {
        let (path, spec) = match field.split_once(':') {
            Some((path, spec)) => (path, Some(spec)),
            None => (field, None),
        };

        let value = match lookup(&self.data, path) {
            Some(value) => value,
            None => return Ok(MISSING_KEY_VALUE.to_string()),
        };

        match value {
            Value::Array(_) | Value::Object(_) => Err(BurninError::invalid_value(position, value)),
            Value::Null => Ok(MISSING_KEY_VALUE.to_string()),
            _ => {
                let formatted = match spec {
                    Some(spec) => FormatSpec::parse(spec).and_then(|spec| spec.apply(value)),
                    None => Some(scalar_text(value)),
                };
                Ok(formatted.unwrap_or_else(|| MISSING_KEY_VALUE.to_string()))
            }
        }
    }
}

fn key_name(token: &str) -> String {
    token.trim_start_matches('{').trim_end_matches('}').to_string()
}

fn optional_number(value: Option<u32>) -> Value {
    value
        .map(Value::from)
        .unwrap_or_else(|| Value::String(MISSING_KEY_VALUE.to_string()))
}

fn frame_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn leading_text(text: &str, token: &str) -> Option<String> {
    if text.starts_with(token) {
        return None;
    }
    text.split(token).next().map(str::to_string)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Look up `name`, `name[key]`, `name.key` and chains of those
fn lookup<'a>(data: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let end = path.find(['[', '.']).unwrap_or(path.len());
    let (name, mut rest) = path.split_at(end);
    let mut current = data.get(name)?;

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('[') {
            let close = inner.find(']')?;
            let key = &inner[..close];
            current = match current {
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(key)?,
                _ => return None,
            };
            rest = &inner[close + 1..];
        } else if let Some(inner) = rest.strip_prefix('.') {
            let end = inner.find(['[', '.']).unwrap_or(inner.len());
            current = current.as_object()?.get(&inner[..end])?;
            rest = &inner[end..];
        } else {
            return None;
        }
    }

    Some(current)
}

/// `[[fill]align][0][width][.precision][type]`
#[derive(Debug, Clone, PartialEq)]
struct FormatSpec {
    fill: char,
    align: Option<char>,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(spec: &str) -> Option<Self> {
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec {
            fill: ' ',
            align: None,
            zero: false,
            width: 0,
            precision: None,
            kind: None,
        };
        let mut i = 0;

        let is_align = |c: char| matches!(c, '<' | '>' | '^');
        if chars.len() >= 2 && is_align(chars[1]) {
            parsed.fill = chars[0];
            parsed.align = Some(chars[1]);
            i = 2;
        } else if chars.first().is_some_and(|c| is_align(*c)) {
            parsed.align = Some(chars[0]);
            i = 1;
        }

        if chars.get(i) == Some(&'0') {
            parsed.zero = true;
            i += 1;
        }

        let width_start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > width_start {
            parsed.width = chars[width_start..i].iter().collect::<String>().parse().ok()?;
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let precision_start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == precision_start {
                return None;
            }
            parsed.precision = chars[precision_start..i].iter().collect::<String>().parse().ok();
        }

        if let Some(kind) = chars.get(i) {
            if !matches!(kind, 'd' | 'f' | 's') {
                return None;
            }
            parsed.kind = Some(*kind);
            i += 1;
        }

        (i == chars.len()).then_some(parsed)
    }

    fn apply(&self, value: &Value) -> Option<String> {
        let (body, numeric) = match (self.kind, value) {
            (Some('d'), Value::Number(n)) => (n.as_i64()?.to_string(), true),
            (Some('f'), Value::Number(n)) => (format!("{:.*}", self.precision.unwrap_or(6), n.as_f64()?), true),
            (None, Value::Number(n)) => match self.precision {
                Some(precision) => (format!("{:.*}", precision, n.as_f64()?), true),
                None => (n.to_string(), true),
            },
            (Some('s') | None, Value::String(s)) => match self.precision {
                Some(precision) => (s.chars().take(precision).collect(), false),
                None => (s.clone(), false),
            },
            (None, Value::Bool(b)) => (b.to_string(), false),
            _ => return None,
        };

        let len = body.chars().count();
        if len >= self.width {
            return Some(body);
        }
        let pad = self.width - len;

        if self.zero && self.align.is_none() && numeric {
            let (sign, digits) = match body.strip_prefix('-') {
                Some(digits) => ("-", digits),
                None => ("", body.as_str()),
            };
            return Some(format!("{}{}{}", sign, "0".repeat(pad), digits));
        }

        let fill = if self.zero && self.align.is_none() { '0' } else { self.fill };
        let fill_str = |n: usize| fill.to_string().repeat(n);
        let align = self.align.unwrap_or(if numeric { '>' } else { '<' });

        Some(match align {
            '>' => format!("{}{}", fill_str(pad), body),
            '^' => format!("{}{}{}", fill_str(pad / 2), body, fill_str(pad - pad / 2)),
            _ => format!("{}{}", body, fill_str(pad)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stream() -> StreamInfo {
        StreamInfo {
            width: Some(1920),
            height: Some(1080),
            r_frame_rate: Some("25/1".to_string()),
            ..Default::default()
        }
    }

    fn resolver(data: Value) -> TemplateResolver {
        let map = data.as_object().cloned().unwrap_or_default();
        TemplateResolver::new(map, &stream())
    }

    fn text(slot: Option<ResolvedSlot>) -> String {
        match slot {
            Some(ResolvedSlot::Text(text)) => text,
            other => panic!("expected text slot, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_unchanged() {
        let r = resolver(json!({"frame_start": 1001}));
        let out = r.resolve("top_left", &json!("static text, no tokens")).unwrap();
        assert_eq!(text(out), "static text, no tokens");
    }

    #[test]
    fn test_missing_key_replaced_in_place() {
        let r = resolver(json!({"shot": "sh0010"}));
        let out = r.resolve("top_left", &json!("Shot {shot} / Task {task} end")).unwrap();
        assert_eq!(text(out), "Shot sh0010 / Task N/A end");
    }

    #[test]
    fn test_duplicate_placeholders() {
        let r = resolver(json!({"shot": "sh0010"}));
        let out = r.resolve("top_left", &json!("{shot}-{shot}-{missing}-{missing}")).unwrap();
        assert_eq!(text(out), "sh0010-sh0010-N/A-N/A");
    }

    #[test]
    fn test_literal_braces() {
        let r = resolver(json!({"shot": "sh0010"}));
        assert_eq!(r.format("top_left", "{{literal}} {shot}").unwrap(), "{literal} sh0010");
        assert_eq!(r.format("top_left", "open { brace {shot}").unwrap(), "open { brace sh0010");
        assert_eq!(r.format("top_left", "close } brace").unwrap(), "close } brace");
        assert_eq!(r.format("top_left", "{{shot}").unwrap(), "{shot}");
    }

    #[test]
    fn test_stream_defaults() {
        let r = resolver(json!({}));
        assert_eq!(r.format("top_left", "{resolution_width}x{resolution_height}@{fps}").unwrap(), "1920x1080@25");
    }

    #[test]
    fn test_stream_defaults_do_not_override_data() {
        let r = resolver(json!({"fps": "23.976", "resolution_width": 2048}));
        assert_eq!(r.format("top_left", "{resolution_width} {fps}").unwrap(), "2048 23.976");
    }

    #[test]
    fn test_container_template_rejected() {
        let r = resolver(json!({}));
        let err = r.resolve("top_right", &json!(["a", "b"])).unwrap_err();
        match err {
            BurninError::InvalidValueType { position, value } => {
                assert_eq!(position, "top_right");
                assert_eq!(value, r#"["a","b"]"#);
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(matches!(
            r.resolve("top_right", &json!({"text": "x"})),
            Err(BurninError::InvalidValueType { .. })
        ));
    }

    #[test]
    fn test_container_substitution_rejected() {
        let r = resolver(json!({"tags": ["a", "b"]}));
        let err = r.resolve("bottom_left", &json!("{tags}")).unwrap_err();
        assert!(matches!(err, BurninError::InvalidValueType { ref position, .. } if position == "bottom_left"));
    }

    #[test]
    fn test_nested_lookup() {
        let r = resolver(json!({"asset": {"name": "hero", "versions": [3, 4]}}));
        assert_eq!(r.format("top_left", "{asset[name]} v{asset[versions][1]}").unwrap(), "hero v4");
        assert_eq!(r.format("top_left", "{asset.name}").unwrap(), "hero");
        assert_eq!(r.format("top_left", "{asset[nope]}").unwrap(), "N/A");
    }

    #[test]
    fn test_format_spec() {
        let r = resolver(json!({"version": 7, "fps": 23.976, "task": "comp"}));
        assert_eq!(r.format("top_left", "v{version:03d}").unwrap(), "v007");
        assert_eq!(r.format("top_left", "{fps:.2f}").unwrap(), "23.98");
        assert_eq!(r.format("top_left", "[{task:>6}]").unwrap(), "[  comp]");
        assert_eq!(r.format("top_left", "[{task:*^8}]").unwrap(), "[**comp**]");
        assert_eq!(r.format("top_left", "{task:d}").unwrap(), "N/A");
        assert_eq!(r.format("top_left", "{version:bogus}").unwrap(), "N/A");
    }

    #[test]
    fn test_empty_values_skipped() {
        let r = resolver(json!({}));
        assert_eq!(r.resolve("top_left", &json!("")).unwrap(), None);
        assert_eq!(r.resolve("top_left", &Value::Null).unwrap(), None);
        assert_eq!(text(r.resolve("top_left", &json!(42)).unwrap()), "42");
    }

    #[test]
    fn test_current_frame_kept_as_marker() {
        let r = resolver(json!({"frame_start": 1001, "shot": "sh0010"}));
        let out = text(r.resolve("bottom_right", &json!("{frame_start}{current_frame}")).unwrap());
        assert_eq!(out, format!("1001{}", CURRENT_FRAME_SPLITTER));
    }

    #[test]
    fn test_current_frame_without_start() {
        let r = resolver(json!({}));
        let out = text(r.resolve("bottom_right", &json!("F {current_frame}")).unwrap());
        assert_eq!(out, "F N/A");
    }

    #[test]
    fn test_timecode_without_prerequisite() {
        let r = resolver(json!({"shot": "sh0010"}));
        let out = text(r.resolve("bottom_left", &json!("TC: {timecode}")).unwrap());
        assert_eq!(out, "TC: N/A");
    }

    #[test]
    fn test_timecode_defaults_to_frame_start() {
        let r = resolver(json!({"frame_start": 1001}));
        let out = r.resolve("bottom_left", &json!("{timecode}")).unwrap();
        assert_eq!(
            out,
            Some(ResolvedSlot::Timecode { text: None, start: TimecodeSource::Frames(1001) })
        );
    }

    #[test]
    fn test_timecode_with_prefix() {
        let r = resolver(json!({"frame_start": 1001, "frame_start_tc": 1, "shot": "sh0010"}));
        let out = r.resolve("bottom_left", &json!("{shot} TC: {timecode} trailing")).unwrap();
        assert_eq!(
            out,
            Some(ResolvedSlot::Timecode {
                text: Some("sh0010 TC: ".to_string()),
                start: TimecodeSource::Frames(1),
            })
        );
    }

    #[test]
    fn test_timecode_literal_start() {
        let r = resolver(json!({"frame_start_tc": "01:00:00:00"}));
        let out = r.resolve("bottom_left", &json!("{timecode}")).unwrap();
        assert_eq!(
            out,
            Some(ResolvedSlot::Timecode {
                text: None,
                start: TimecodeSource::Literal("01:00:00:00".to_string()),
            })
        );
    }

    #[test]
    fn test_source_timecode() {
        let mut source = stream();
        source.timecode = Some("10:00:00:00".to_string());
        let r = TemplateResolver::new(Map::new(), &source);
        let out = r.resolve("top_right", &json!("SRC {source_timecode}")).unwrap();
        assert_eq!(
            out,
            Some(ResolvedSlot::Timecode {
                text: Some("SRC ".to_string()),
                start: TimecodeSource::Literal("10:00:00:00".to_string()),
            })
        );

        let r = resolver(json!({}));
        let out = text(r.resolve("top_right", &json!("SRC {source_timecode}")).unwrap());
        assert_eq!(out, "SRC N/A");
    }
}
