use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::ProbeError;

/// Technical metadata for one source file, as reported by ffprobe.
///
/// Every field has a working default so a failed probe can be substituted
/// with [`SourceMetadata::fallback`] by callers that tolerate it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Container duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate numerator
    pub frame_rate_num: u32,
    /// Frame rate denominator
    pub frame_rate_den: u32,
    /// Video codec name
    pub codec_name: String,
    /// Pixel format
    pub pix_fmt: String,
    /// Colorspace tag
    pub colorspace: String,
    /// Color transfer characteristic
    pub color_trc: String,
    /// Audio sample rate in Hz
    pub sample_rate: u32,
    /// Audio channel count
    pub audio_channels: u32,
    /// Audio codec name
    pub audio_codec: String,
    /// Container creation time, ISO-8601
    pub creation_time: String,
}

impl SourceMetadata {
    /// Placeholder metadata substituted when probing fails: HD h264 at
    /// NTSC 29.97 fps with stereo AAC audio.
    pub fn fallback() -> Self {
        Self {
            duration: 0.0,
            width: 1920,
            height: 1080,
            frame_rate_num: 30000,
            frame_rate_den: 1001,
            codec_name: "h264".to_string(),
            pix_fmt: "yuv420p".to_string(),
            colorspace: "709".to_string(),
            color_trc: "1".to_string(),
            sample_rate: 48000,
            audio_channels: 2,
            audio_codec: "aac".to_string(),
            creation_time: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Frame rate as a float
    pub fn fps(&self) -> f64 {
        self.frame_rate_num as f64 / self.frame_rate_den.max(1) as f64
    }
}

/// Probing collaborator seam.
///
/// The production implementation shells out to ffprobe; tests substitute
/// call-counting fakes.
pub trait Prober {
    fn probe(&mut self, path: &Path) -> Result<SourceMetadata, ProbeError>;
}

/// ffprobe-backed [`Prober`]
#[derive(Debug, Default)]
pub struct Ffprobe;

impl Ffprobe {
    pub fn new() -> Self {
        Self
    }
}

impl Prober for Ffprobe {
    fn probe(&mut self, path: &Path) -> Result<SourceMetadata, ProbeError> {
        probe_source(path)
    }
}

/// ffprobe JSON output format.
#[derive(Debug, Deserialize)]
struct RawProbe {
    format: Option<RawFormat>,
    #[serde(default)]
    streams: Vec<RawStream>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    duration: Option<String>,
    tags: Option<RawTags>,
}

#[derive(Debug, Deserialize)]
struct RawTags {
    creation_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    #[serde(alias = "color_space")]
    colorspace: Option<String>,
    #[serde(alias = "color_transfer")]
    color_trc: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

/// Probe a media file with ffprobe.
///
/// Each invocation opens the file only for the lifetime of one ffprobe
/// process; nothing stays open afterwards.
pub fn probe_source(path: &Path) -> Result<SourceMetadata, ProbeError> {
    which::which("ffprobe").map_err(|_| ProbeError::ToolMissing)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ProbeError::Failed { path: path.to_path_buf(), reason: e.to_string() })?;

    if !output.status.success() {
        return Err(ProbeError::Failed {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let raw: RawProbe = serde_json::from_slice(&output.stdout)
        .map_err(|_| ProbeError::Malformed { path: path.to_path_buf() })?;

    Ok(metadata_from_raw(raw))
}

/// Read just the duration of a media file.
///
/// Works for both video and audio containers; used by the footage index
/// and for defaulting the collage length to the soundtrack length.
pub fn probe_duration(path: &Path) -> Result<f64, ProbeError> {
    probe_source(path).map(|meta| meta.duration)
}

fn metadata_from_raw(raw: RawProbe) -> SourceMetadata {
    let mut meta = SourceMetadata::fallback();

    if let Some(format) = raw.format {
        if let Some(duration) = format.duration.as_deref().and_then(|d| d.parse::<f64>().ok()) {
            meta.duration = duration;
        }
        if let Some(creation_time) = format.tags.and_then(|t| t.creation_time) {
            meta.creation_time = creation_time;
        }
    }

    for stream in raw.streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                if let Some(width) = stream.width {
                    meta.width = width;
                }
                if let Some(height) = stream.height {
                    meta.height = height;
                }
                if let Some((num, den)) =
                    stream.r_frame_rate.as_deref().and_then(parse_frame_rate)
                {
                    meta.frame_rate_num = num;
                    meta.frame_rate_den = den;
                }
                if let Some(codec) = stream.codec_name {
                    meta.codec_name = codec;
                }
                if let Some(pix_fmt) = stream.pix_fmt {
                    meta.pix_fmt = pix_fmt;
                }
                if let Some(colorspace) = stream.colorspace {
                    meta.colorspace = colorspace;
                }
                if let Some(color_trc) = stream.color_trc {
                    meta.color_trc = color_trc;
                }
            }
            Some("audio") => {
                if let Some(rate) = stream.sample_rate.as_deref().and_then(|r| r.parse().ok()) {
                    meta.sample_rate = rate;
                }
                if let Some(channels) = stream.channels {
                    meta.audio_channels = channels;
                }
                if let Some(codec) = stream.codec_name {
                    meta.audio_codec = codec;
                }
            }
            _ => {}
        }
    }

    meta
}

/// Parse a frame rate fraction like "30000/1001" or a bare "29.97".
fn parse_frame_rate(s: &str) -> Option<(u32, u32)> {
    if let Some((num, den)) = s.split_once('/') {
        let num: u32 = num.parse().ok()?;
        let den: u32 = den.parse().ok()?;
        return Some((num, den.max(1)));
    }
    let fps: f64 = s.parse().ok()?;
    Some((fps as u32, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some((30, 1)));
        assert_eq!(parse_frame_rate("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_frame_rate("25"), Some((25, 1)));
        assert_eq!(parse_frame_rate("30000/0"), Some((30000, 1)));
        assert_eq!(parse_frame_rate("garbage"), None);
    }

    #[test]
    fn test_metadata_from_full_probe() {
        let json = r#"{
            "format": {
                "duration": "12.480000",
                "tags": { "creation_time": "2025-03-01T10:00:00" }
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "hevc",
                    "width": 3840,
                    "height": 2160,
                    "r_frame_rate": "60/1",
                    "pix_fmt": "yuv420p10le",
                    "color_space": "bt2020nc",
                    "color_transfer": "arib-std-b67"
                },
                {
                    "codec_type": "audio",
                    "codec_name": "pcm_s16le",
                    "sample_rate": "44100",
                    "channels": 4
                }
            ]
        }"#;

        let raw: RawProbe = serde_json::from_str(json).unwrap();
        let meta = metadata_from_raw(raw);

        assert_eq!(meta.duration, 12.48);
        assert_eq!(meta.width, 3840);
        assert_eq!(meta.height, 2160);
        assert_eq!(meta.frame_rate_num, 60);
        assert_eq!(meta.frame_rate_den, 1);
        assert_eq!(meta.codec_name, "hevc");
        assert_eq!(meta.pix_fmt, "yuv420p10le");
        assert_eq!(meta.colorspace, "bt2020nc");
        assert_eq!(meta.color_trc, "arib-std-b67");
        assert_eq!(meta.sample_rate, 44100);
        assert_eq!(meta.audio_channels, 4);
        assert_eq!(meta.audio_codec, "pcm_s16le");
        assert_eq!(meta.creation_time, "2025-03-01T10:00:00");
    }

    #[test]
    fn test_metadata_defaults_fill_gaps() {
        let json = r#"{ "format": { "duration": "3.0" }, "streams": [] }"#;

        let raw: RawProbe = serde_json::from_str(json).unwrap();
        let meta = metadata_from_raw(raw);

        assert_eq!(meta.duration, 3.0);
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.frame_rate_num, 30000);
        assert_eq!(meta.frame_rate_den, 1001);
        assert_eq!(meta.audio_codec, "aac");
    }

    #[test]
    fn test_fallback_fps() {
        let meta = SourceMetadata::fallback();
        assert!((meta.fps() - 29.97).abs() < 0.01);
    }
}
