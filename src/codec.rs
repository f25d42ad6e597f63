use crate::error::{BurninError, Result};
use crate::probe::StreamInfo;

/// Encoder arguments for the burn-in render.
///
/// An explicit codec list is used as given, each entry tokenized with shell
/// quoting rules; otherwise the source stream's codec, profile, bit rate and
/// pixel format are carried over. Every frame is forced to be a keyframe so
/// review tools can seek exactly.
pub fn codec_args(explicit: Option<&[String]>, stream: &StreamInfo) -> Result<Vec<String>> {
    let mut args = match explicit {
        Some(codec) if !codec.is_empty() => split_entries(codec)?,
        _ => derive_from_stream(stream),
    };

    // same as the deprecated `-intra`
    args.push("-g".to_string());
    args.push("1".to_string());
    Ok(args)
}

fn split_entries(codec: &[String]) -> Result<Vec<String>> {
    let mut args = Vec::new();
    for entry in codec {
        let words = shell_words::split(entry).map_err(|e| {
            BurninError::Config(format!("Invalid codec argument '{}': {}", entry, e))
        })?;
        args.extend(words);
    }
    Ok(args)
}

fn derive_from_stream(stream: &StreamInfo) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(codec_name) = stream.codec_name.as_deref().filter(|c| !c.is_empty()) {
        args.push("-codec:v".to_string());
        args.push(encoder_name(codec_name, stream.encoder.as_deref()));
    }

    if let Some(profile) = stream.profile.as_deref().filter(|p| !p.is_empty()) {
        args.push("-profile:v".to_string());
        args.push(profile.replace(' ', "_").to_lowercase());
    }

    if let Some(bit_rate) = stream.bit_rate.as_deref().filter(|b| !b.is_empty()) {
        args.push("-b:v".to_string());
        args.push(bit_rate.to_string());
    }

    if let Some(pix_fmt) = stream.pix_fmt.as_deref().filter(|p| !p.is_empty()) {
        args.push("-pix_fmt".to_string());
        args.push(pix_fmt.to_string());
    }

    args
}

/// `prores` alone does not pick an ffmpeg encoder; the encoder tag does
fn encoder_name(codec_name: &str, encoder: Option<&str>) -> String {
    if codec_name == "prores" {
        let encoder = encoder.unwrap_or_default();
        if encoder.ends_with("prores_ks") {
            return "prores_ks".to_string();
        }
        if encoder.ends_with("prores_aw") {
            return "prores_aw".to_string();
        }
    }
    codec_name.to_string()
}
