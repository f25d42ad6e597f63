use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{BurninError, Result};

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Printable command line, quoted for a POSIX shell
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.binary_path).chain(self.args.iter()))
    }

    /// Run the command to completion and capture its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::status`], only a
    /// failure to launch is an error.
    pub async fn execute(&self) -> Result<CommandOutput> {
        debug!("Executing media processing command: {}", self.command_line());
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BurninError::ToolNotFound(self.binary_path.clone())
                } else {
                    BurninError::Io(e)
                }
            })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Builder for the commands a burn-in job needs
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build stream inspection command
    pub fn probe_streams<P: AsRef<Path>>(&self, source: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Stream probe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .output(source)
    }

    /// Build burn-in render command
    pub fn burnin<P: AsRef<Path>>(
        &self,
        input_path: P,
        filter_chain: &str,
        additional_args: &[String],
        overwrite: bool,
        output_path: P,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.ffmpeg_path, "Burn-in render").input(input_path);

        if !filter_chain.is_empty() {
            cmd = cmd.video_filter(filter_chain);
        }

        cmd = cmd.args(additional_args.iter().cloned());

        if overwrite {
            cmd = cmd.overwrite();
        }

        cmd.output(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burnin_command() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.burnin(
            "/in.mov",
            "drawtext=text=x",
            &["-g".to_string(), "1".to_string()],
            true,
            "/out.mov",
        );
        assert_eq!(
            cmd.args,
            vec!["-i", "/in.mov", "-vf", "drawtext=text=x", "-g", "1", "-y", "/out.mov"]
        );
    }

    #[test]
    fn test_burnin_command_without_filters() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.burnin("/in.mov", "", &[], false, "/out.mov");
        assert_eq!(cmd.args, vec!["-i", "/in.mov", "/out.mov"]);
    }

    #[test]
    fn test_probe_command() {
        let builder = MediaCommandBuilder::new("ffmpeg", "/opt/ffprobe");
        let cmd = builder.probe_streams("/in.mov");
        assert_eq!(cmd.binary_path, "/opt/ffprobe");
        assert_eq!(
            cmd.command_line(),
            "/opt/ffprobe -v quiet -print_format json -show_format -show_streams /in.mov"
        );
    }

    #[test]
    fn test_command_line_quoting() {
        let cmd = MediaCommand::new("ffmpeg", "test")
            .arg("my file.mov")
            .arg("a\"b")
            .video_filter(r"drawtext=text=\'TC\: 01\'");
        let line = cmd.command_line();
        assert_eq!(
            shell_words::split(&line).unwrap(),
            vec!["ffmpeg", "my file.mov", "a\"b", "-vf", r"drawtext=text=\'TC\: 01\'"]
        );
    }
}
