use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BurninError, Result};

/// Frame rate reported when ffprobe cannot provide one.
pub const UNKNOWN_FPS: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    profile: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    bit_rate: Option<String>,
    timecode: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    timecode: Option<String>,
    encoder: Option<String>,
}

/// One probed media stream
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamInfo {
    pub index: u32,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub profile: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub r_frame_rate: Option<String>,
    pub pix_fmt: Option<String>,
    pub bit_rate: Option<String>,
    /// Embedded timecode, from the stream itself or its tag block
    pub timecode: Option<String>,
    pub encoder: Option<String>,
}

impl StreamInfo {
    /// Normalized frame rate string, see [`get_fps`]
    pub fn fps(&self) -> String {
        get_fps(self.r_frame_rate.as_deref().unwrap_or("0/0"))
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width.unwrap_or(0), self.height.unwrap_or(0))
    }
}

impl From<FfprobeStream> for StreamInfo {
    fn from(stream: FfprobeStream) -> Self {
        Self {
            index: stream.index,
            codec_type: stream.codec_type,
            codec_name: stream.codec_name,
            profile: stream.profile,
            width: stream.width,
            height: stream.height,
            r_frame_rate: stream.r_frame_rate,
            pix_fmt: stream.pix_fmt,
            bit_rate: stream.bit_rate,
            timecode: stream.timecode.or(stream.tags.timecode),
            encoder: stream.tags.encoder,
        }
    }
}

/// Parse ffprobe `-print_format json -show_streams` output
pub fn parse_streams(json: &str) -> Result<Vec<StreamInfo>> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| BurninError::Probe(format!("Unparseable ffprobe output: {}", e)))?;

    Ok(output.streams.into_iter().map(StreamInfo::from).collect())
}

/// Normalize an ffprobe `r_frame_rate` ratio.
///
/// `"24/1"` becomes `"24"`, `"24000/1001"` keeps its decimal expansion and a
/// zero denominator yields [`UNKNOWN_FPS`].
pub fn get_fps(value: &str) -> String {
    if value == "0/0" {
        warn!("Source has \"r_frame_rate\" value set to \"0/0\"");
        return UNKNOWN_FPS.to_string();
    }

    let fps = match value.split_once('/') {
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(_), Ok(den)) if den == 0.0 => None,
            (Ok(num), Ok(den)) => Some(num / den),
            _ => None,
        },
        None => value.trim().parse::<f64>().ok(),
    };

    match fps {
        Some(fps) if fps.is_finite() => {
            if fps.fract() == 0.0 {
                format!("{}", fps as i64)
            } else {
                format!("{}", fps)
            }
        }
        _ => {
            warn!("Unable to interpret frame rate '{}'", value);
            UNKNOWN_FPS.to_string()
        }
    }
}

/// Parse a normalized fps string back into a number
pub fn fps_value(fps: &str) -> Option<f64> {
    if fps == UNKNOWN_FPS {
        return None;
    }
    fps.parse::<f64>().ok().filter(|v| *v > 0.0)
}
