// Media tool access
//
// - Processor: ffmpeg/ffprobe backed implementation
// - Commands: command builders and execution

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;
use crate::probe::StreamInfo;

/// Main trait for media tool operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Inspect the streams of a media file
    async fn probe(&self, source: &Path) -> Result<Vec<StreamInfo>>;

    /// Check if the media tools are available
    async fn check_availability(&self) -> Result<()>;

    /// Run a command to completion, capturing its output
    async fn execute_command(&self, command: MediaCommand) -> Result<CommandOutput>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (ffmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
