use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use super::{CommandOutput, MediaCommand, MediaCommandBuilder, MediaProcessorTrait};
use crate::config::MediaConfig;
use crate::error::{BurninError, Result};
use crate::probe::{StreamInfo, parse_streams};

/// Concrete implementation of media processor (ffmpeg/ffprobe CLI)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    /// Probe streams of a media file
    async fn probe(&self, source: &Path) -> Result<Vec<StreamInfo>> {
        info!("Probing streams of {}", source.display());

        let command = self.command_builder.probe_streams(source);
        let output = command
            .execute()
            .await
            .map_err(|e| BurninError::Probe(format!("Failed to run: {} ({})", command.command_line(), e)))?;

        if !output.success() {
            return Err(BurninError::Probe(format!(
                "Failed to run: {}: {}",
                command.command_line(),
                output.stderr.trim()
            )));
        }

        let streams = parse_streams(&output.stdout)?;
        debug!("Probed {} stream(s)", streams.len());
        Ok(streams)
    }

    /// Check if ffmpeg and ffprobe are available
    async fn check_availability(&self) -> Result<()> {
        for tool in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            let path = which::which(tool).map_err(|_| BurninError::ToolNotFound(tool.clone()))?;

            let output = MediaCommand::new(path.to_string_lossy(), "Version check")
                .arg("-version")
                .execute()
                .await?;

            if !output.success() {
                return Err(BurninError::ToolNotFound(format!("{} version check failed", tool)));
            }
            debug!("{} resolved to {}", tool, path.display());
        }

        info!("ffmpeg and ffprobe are available");
        Ok(())
    }

    /// Execute a media processing command
    async fn execute_command(&self, command: MediaCommand) -> Result<CommandOutput> {
        info!("Executing media processing command: {}", command.description);
        command.execute().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(ffmpeg_path: &str, ffprobe_path: &str) -> MediaProcessorImpl {
        MediaProcessorImpl::new(MediaConfig {
            ffmpeg_path: ffmpeg_path.to_string(),
            ffprobe_path: ffprobe_path.to_string(),
        })
    }

    #[tokio::test]
    async fn test_probe_missing_tool() {
        let media = processor("ffmpeg", "/nonexistent/burnin-ffprobe");
        let err = media.probe(Path::new("/in.mov")).await.unwrap_err();
        assert!(matches!(err, BurninError::Probe(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_nonzero_exit() {
        // `false` ignores its arguments and exits with status 1
        let media = processor("ffmpeg", "false");
        let err = media.probe(Path::new("/in.mov")).await.unwrap_err();
        match err {
            BurninError::Probe(message) => assert!(message.contains("Failed to run")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_check_availability_missing_tool() {
        let media = processor("burnin-missing-ffmpeg", "burnin-missing-ffprobe");
        let err = media.check_availability().await.unwrap_err();
        match err {
            BurninError::ToolNotFound(tool) => assert_eq!(tool, "burnin-missing-ffmpeg"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_check_availability_failing_version() {
        let media = processor("false", "false");
        let err = media.check_availability().await.unwrap_err();
        assert!(matches!(err, BurninError::ToolNotFound(_)));
    }
}
