//! Burn-in job orchestration.
//!
//! [`Burnins`] collects filter fragments for one source and renders them with
//! ffmpeg. [`burnins_from_data`] drives a whole [`Job`]: probe, resolve the
//! templates, build the filter chain, choose codec arguments and render.

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::codec::codec_args;
use crate::config::Config;
use crate::error::{BurninError, Result};
use crate::filter::{
    filter_chain, frames_to_timecode, BurnRequest, FilterBuilder, FilterFragment, Position,
    TimecodeRequest,
};
use crate::font::FontResolver;
use crate::job::Job;
use crate::media::{MediaCommand, MediaCommandBuilder, MediaProcessorTrait};
use crate::options::BurnOptions;
use crate::probe::{fps_value, StreamInfo};
use crate::template::{ResolvedSlot, TemplateResolver, TimecodeSource};

static FRAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%|%(0)?(\d*)d").expect("frame pattern is valid"));

/// Filter fragments for one source file
pub struct Burnins {
    source: PathBuf,
    streams: Vec<StreamInfo>,
    options: BurnOptions,
    builder: FilterBuilder,
    fragments: Vec<FilterFragment>,
    commands: MediaCommandBuilder,
}

impl Burnins {
    /// `options` is the base look applied when an element brings none
    pub fn new<P: AsRef<Path>>(
        source: P,
        streams: Vec<StreamInfo>,
        options: BurnOptions,
        config: &Config,
    ) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        let first = streams.first().ok_or_else(|| {
            BurninError::Probe(format!("No streams found in {}", source.display()))
        })?;
        options.validate()?;

        let builder = FilterBuilder::new(first.resolution(), FontResolver::new(config.fonts.clone()));
        let commands = MediaCommandBuilder::new(&config.media.ffmpeg_path, &config.media.ffprobe_path);

        Ok(Self {
            source,
            streams,
            options,
            builder,
            fragments: Vec::new(),
            commands,
        })
    }

    pub fn with_font_resolver(mut self, fonts: FontResolver) -> Self {
        self.builder = FilterBuilder::new(self.builder.resolution(), fonts);
        self
    }

    /// The authoritative stream
    pub fn stream(&self) -> &StreamInfo {
        &self.streams[0]
    }

    pub fn frame_rate(&self) -> String {
        self.stream().fps()
    }

    pub fn fragments(&self) -> &[FilterFragment] {
        &self.fragments
    }

    /// Add static text, optionally containing the current frame marker
    pub fn add_text(
        &mut self,
        text: &str,
        position: Position,
        frame_start: Option<i64>,
        frame_end: Option<i64>,
        options: Option<&BurnOptions>,
    ) {
        let request = BurnRequest {
            position,
            text: text.to_string(),
            frame_start,
            frame_end,
            timecode: None,
            options: options.unwrap_or(&self.options).clone(),
        };
        self.push(request);
    }

    /// Add a running timecode, optionally preceded by `text`
    pub fn add_timecode(
        &mut self,
        position: Position,
        frame_start: Option<i64>,
        frame_end: Option<i64>,
        start: &TimecodeSource,
        text: Option<&str>,
        options: Option<&BurnOptions>,
    ) -> Result<()> {
        let options = options.unwrap_or(&self.options).clone();

        let rate = match options.fps {
            Some(fps) => fps,
            None => fps_value(&self.frame_rate()).ok_or_else(|| {
                BurninError::FrameRate(format!(
                    "Timecode burn-in at {} needs a frame rate but the source reports '{}'",
                    position,
                    self.frame_rate()
                ))
            })?,
        };

        let timecode = match start {
            TimecodeSource::Frames(frames) => frames_to_timecode(*frames, rate),
            TimecodeSource::Literal(timecode) => timecode.clone(),
        };

        let request = BurnRequest {
            position,
            text: text.unwrap_or_default().to_string(),
            frame_start,
            frame_end,
            timecode: Some(TimecodeRequest { timecode, rate }),
            options,
        };
        self.push(request);
        Ok(())
    }

    fn push(&mut self, request: BurnRequest) {
        let fragment = self.builder.build(&request);
        debug!("{} burn-in: {}", request.position, fragment);
        self.fragments.push(fragment);
    }

    pub fn filter_string(&self) -> String {
        filter_chain(&self.fragments)
    }

    /// The complete ffmpeg invocation
    pub fn command<P: AsRef<Path>>(&self, output: P, args: &[String], overwrite: bool) -> MediaCommand {
        self.commands.burnin(
            self.source.as_path(),
            &self.filter_string(),
            args,
            overwrite,
            output.as_ref(),
        )
    }

    /// Render to `output`.
    ///
    /// Sequence outputs (`%04d` style patterns) are checked after expanding
    /// the pattern with `duration`.
    pub async fn render<P: AsRef<Path>>(
        &self,
        media: &dyn MediaProcessorTrait,
        output: P,
        args: &[String],
        overwrite: bool,
        duration: Option<i64>,
    ) -> Result<()> {
        let output = output.as_ref();
        if !overwrite && output.exists() {
            return Err(BurninError::Render(format!(
                "Destination '{}' exists, please use overwrite",
                output.display()
            )));
        }

        let output_str = output.to_string_lossy().to_string();
        let is_sequence = output_str.contains('%');

        let command = self.command(output, args, overwrite);
        info!("Launching command: {}", command.command_line());

        let result = media.execute_command(command.clone()).await?;
        for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!("{}", line);
        }
        for line in result.stderr.lines().filter(|l| !l.trim().is_empty()) {
            info!("{}", line);
        }

        if !result.success() {
            return Err(BurninError::Render(format!(
                "Failed to render '{}': {}",
                output.display(),
                command.command_line()
            )));
        }

        let expected = if is_sequence {
            let duration = duration.ok_or_else(|| {
                BurninError::Render(format!(
                    "Sequence output '{}' needs a duration to verify the result",
                    output_str
                ))
            })?;
            PathBuf::from(expand_frame_pattern(&output_str, duration))
        } else {
            output.to_path_buf()
        };

        if !expected.exists() {
            return Err(BurninError::Render(format!(
                "Failed to generate file '{}'",
                expected.display()
            )));
        }

        info!("Burn-in rendered to {}", expected.display());
        Ok(())
    }
}

/// Substitute `frame` into printf style `%d` / `%04d` placeholders
pub fn expand_frame_pattern(pattern: &str, frame: i64) -> String {
    FRAME_PATTERN
        .replace_all(pattern, |caps: &Captures| {
            if &caps[0] == "%%" {
                return "%".to_string();
            }
            let width = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .unwrap_or(0);
            if caps.get(1).is_some() {
                format!("{:0width$}", frame, width = width)
            } else {
                format!("{:width$}", frame, width = width)
            }
        })
        .to_string()
}

/// A job ready to render
pub struct RenderPlan {
    pub burnins: Burnins,
    pub args: Vec<String>,
    pub output: PathBuf,
    pub overwrite: bool,
    pub duration: Option<i64>,
}

impl RenderPlan {
    pub fn command(&self) -> MediaCommand {
        self.burnins.command(&self.output, &self.args, self.overwrite)
    }

    pub async fn render(&self, media: &dyn MediaProcessorTrait) -> Result<()> {
        self.burnins
            .render(media, &self.output, &self.args, self.overwrite, self.duration)
            .await
    }
}

/// Resolve every burn-in of `job` against already probed `streams`
pub fn plan(config: &Config, job: &Job, streams: Vec<StreamInfo>) -> Result<RenderPlan> {
    let options = match &job.options {
        Some(patch) => config.options.merged(patch),
        None => config.options.clone(),
    };

    let mut burnins = Burnins::new(&job.input, streams, options, config)?;
    let resolver = TemplateResolver::new(job.burnin_data.clone(), burnins.stream());
    let frame_start = resolver.frame_start();
    let frame_end = resolver.frame_end();

    for (name, value) in &job.values {
        let Some(slot) = resolver.resolve(name, value)? else {
            continue;
        };

        let Some(position) = Position::parse(name) else {
            warn!("Unknown burn-in position '{}', skipping", name);
            continue;
        };

        match slot {
            ResolvedSlot::Text(text) => {
                burnins.add_text(&text, position, frame_start, frame_end, None);
            }
            ResolvedSlot::Timecode { text, start } => {
                burnins.add_timecode(position, frame_start, frame_end, &start, text.as_deref(), None)?;
            }
        }
    }

    let args = codec_args(job.codec.as_deref(), burnins.stream())?;

    Ok(RenderPlan {
        burnins,
        args,
        output: job.output.clone(),
        overwrite: job.overwrite,
        duration: job.duration(),
    })
}

/// Probe, resolve and render a burn-in job
pub async fn burnins_from_data(
    media: &dyn MediaProcessorTrait,
    config: &Config,
    job: &Job,
) -> Result<()> {
    info!(
        "Burn-in job {} -> {}",
        job.input.display(),
        job.output.display()
    );

    let streams = media.probe(&job.input).await?;
    let plan = plan(config, job, streams)?;
    plan.render(media).await
}
