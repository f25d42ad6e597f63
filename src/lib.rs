//! Burnin - Video Burn-in Compositor
//!
//! Overlays shot metadata, frame numbers and timecode onto review media.
//! Streams are inspected with ffprobe, per-position text templates are
//! resolved against job data, and the result is rendered by ffmpeg through
//! a `drawtext` filter chain.

pub mod burnins;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod font;
pub mod job;
pub mod measure;
pub mod media;
pub mod options;
pub mod probe;
pub mod template;
