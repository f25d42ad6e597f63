use std::collections::BTreeMap;

use burnin::burnins::plan;
use burnin::config::Config;
use burnin::font::{FontResolver, Platform};
use burnin::job::Job;
use burnin::options::FontSpec;
use burnin::probe::parse_streams;

const FFPROBE_OUTPUT: &str = r#"{
    "streams": [
        {
            "index": 0,
            "codec_name": "prores",
            "codec_type": "video",
            "profile": "HQ",
            "width": 2048,
            "height": 858,
            "pix_fmt": "yuv422p10le",
            "r_frame_rate": "24000/1001",
            "tags": {"timecode": "01:00:00:00", "encoder": "Lavc58.54.100 prores_ks"}
        }
    ],
    "format": {"filename": "/renders/sh0020.mov", "format_name": "mov,mp4,m4a,3gp,3g2,mj2"}
}"#;

#[test]
fn test_job_and_config_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("burnin.toml");
    std::fs::write(
        &config_path,
        r##"
[media]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
ffprobe_path = "/opt/ffmpeg/bin/ffprobe"

[options]
font_size = 30
x_offset = 12
bg_color = "#000000"

[fonts]
default_font = "/studio/fonts/Mono.ttf"
"##,
    )
    .unwrap();

    let job_path = dir.path().join("job.json");
    std::fs::write(
        &job_path,
        r#"{
            "input": "/renders/sh0020.mov",
            "output": "/review/sh0020.mov",
            "burnin_data": {"frame_start": 1001, "frame_end": 1096, "shot": "sh0020", "version": 12},
            "options": {"bg_opacity": 0.3},
            "values": {
                "TOP_LEFT": "{shot} v{version:03d}",
                "TOP_RIGHT": "{resolution_width}x{resolution_height} @ {fps}",
                "BOTTOM_LEFT": "SRC {source_timecode}"
            }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let job = Job::from_file(&job_path).unwrap();
    let streams = parse_streams(FFPROBE_OUTPUT).unwrap();

    let plan = plan(&config, &job, streams).unwrap();
    let fragments = plan.burnins.fragments();
    assert_eq!(fragments.len(), 3);

    assert!(fragments[0].drawtext.contains(r"text=\'sh0020 v012\'"));
    assert!(fragments[0].drawtext.contains("x=12:y=5"));
    assert!(fragments[0].drawtext.contains("fontsize=30"));
    assert_eq!(
        fragments[0].background.as_deref(),
        Some("box=1:boxborderw=5:boxcolor=#000000@0.3")
    );

    assert!(fragments[1].drawtext.contains(r"text=\'2048x858 @ 23.976023976023978\'"));

    assert!(fragments[2].drawtext.contains(r"timecode=\'01:00:00:00\'"));
    assert!(fragments[2].drawtext.contains(r"text=\'SRC \'"));
    assert!(fragments[2].drawtext.contains("timecode_rate=23.98"));

    let command = plan.command();
    assert_eq!(command.binary_path, "/opt/ffmpeg/bin/ffmpeg");
    let expected = ["-codec:v", "prores_ks", "-profile:v", "hq", "-pix_fmt", "yuv422p10le", "-g", "1"];
    assert!(command.args.windows(expected.len()).any(|window| window == expected));
}

#[test]
fn test_per_os_font_in_filter() {
    let mut fonts = BTreeMap::new();
    fonts.insert("windows".to_string(), "C:\\Fonts\\arial.ttf".to_string());
    fonts.insert("linux".to_string(), "/usr/share/fonts/arial.ttf".to_string());

    let mut config = Config::default();
    config.options.font = Some(FontSpec::PerOs(fonts));

    let job: Job = serde_json::from_str(
        r#"{"input": "/in.mov", "output": "/out.mov", "values": {"top_left": "x"}}"#,
    )
    .unwrap();
    let streams = parse_streams(FFPROBE_OUTPUT).unwrap();

    let mut plan = plan(&config, &job, streams).unwrap();
    plan.burnins = plan
        .burnins
        .with_font_resolver(FontResolver::with_platform(config.fonts.clone(), Platform::Windows));
    plan.burnins.add_text("y", burnin::filter::Position::TopRight, None, None, None);

    let fragment = plan.burnins.fragments().last().unwrap();
    assert!(fragment.drawtext.starts_with(r"drawtext=fontfile='C\:\\\Fonts\\\arial.ttf'"));
}
