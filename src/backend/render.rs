use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::traits::Backend;
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::footage::FootageIndex;
use crate::media::ffmpeg;
use crate::schedule::ClipPlacement;

/// Realizes placements as one encoded video via batched ffmpeg work.
///
/// Placements are processed in fixed-size batches: each batch's clips are
/// cut (normalized to the common resolution), concatenated into one
/// intermediate file, and the per-clip cuts deleted before the next batch
/// begins, so simultaneous decoder and file usage is bounded by one batch
/// no matter how many placements arrive. Batches are written and consumed
/// strictly in order, which is what keeps final playback order equal to
/// placement order.
pub struct RenderBackend {
    config: RenderConfig,
    audio_path: PathBuf,
}

impl RenderBackend {
    pub fn new(config: RenderConfig, audio_path: PathBuf) -> Self {
        Self { config, audio_path }
    }

    /// Cut and concatenate one batch, returning its intermediate file.
    async fn write_batch(
        &self,
        batch_index: usize,
        batch: &[ClipPlacement],
        scratch: &Path,
    ) -> Result<PathBuf> {
        debug!("batch {}: cutting {} clips", batch_index, batch.len());

        let jobs: Vec<(PathBuf, Vec<String>, PathBuf)> = batch
            .iter()
            .enumerate()
            .map(|(i, placement)| {
                let cut_path = scratch.join(format!("cut_{batch_index:03}_{i:03}.mp4"));
                let args = cut_args(placement, &self.config, &cut_path);
                (cut_path, args, placement.source_path.clone())
            })
            .collect();

        let mut cut_paths = Vec::with_capacity(batch.len());

        // Cuts within a batch are independent; run them in bounded waves.
        for wave in jobs.chunks(self.config.processing_threads) {
            let mut handles = Vec::with_capacity(wave.len());
            for (cut_path, args, source) in wave {
                handles.push((source.clone(), tokio::spawn(ffmpeg::run(args.clone()))));
                cut_paths.push(cut_path.clone());
            }
            for (source, handle) in handles {
                handle
                    .await
                    .map_err(|e| RenderError::CutFailed {
                        path: source.clone(),
                        reason: e.to_string(),
                    })?
                    .map_err(|e| RenderError::CutFailed { path: source, reason: e.to_string() })?;
            }
        }

        let list_path = scratch.join(format!("batch_{batch_index:03}.txt"));
        ffmpeg::write_concat_list(&cut_paths, &list_path)?;

        let batch_output = scratch.join(format!("batch_{batch_index:03}.mp4"));
        ffmpeg::run(concat_args(&list_path, &batch_output))
            .await
            .map_err(|e| RenderError::BatchFailed { index: batch_index, reason: e.to_string() })?;

        // The batch is sealed; its cuts are no longer needed.
        for cut in &cut_paths {
            let _ = std::fs::remove_file(cut);
        }

        Ok(batch_output)
    }
}

#[async_trait]
impl Backend for RenderBackend {
    fn name(&self) -> &str {
        "render"
    }

    async fn realize(
        &mut self,
        placements: &[ClipPlacement],
        _footage: &FootageIndex,
        output: &Path,
    ) -> Result<()> {
        ffmpeg::require_ffmpeg()?;

        if placements.is_empty() {
            info!("no clips scheduled; writing a minimal placeholder video");
            ffmpeg::run(placeholder_args(&self.config, output))
                .await
                .map_err(|e| RenderError::OutputFailed { reason: e.to_string() })?;
            return Ok(());
        }

        let scratch = tempfile::tempdir()?;

        let mut batch_outputs = Vec::new();
        for (batch_index, batch) in placements.chunks(self.config.batch_size).enumerate() {
            let batch_output = self.write_batch(batch_index, batch, scratch.path()).await?;
            batch_outputs.push(batch_output);
        }

        info!("concatenating {} batches", batch_outputs.len());

        let list_path = scratch.path().join("batches.txt");
        ffmpeg::write_concat_list(&batch_outputs, &list_path)?;

        let total_length: f64 = placements.iter().map(|p| p.duration).sum();
        let args =
            finalize_args(&list_path, &self.audio_path, total_length, &self.config, output);
        ffmpeg::run(args)
            .await
            .map_err(|e| RenderError::OutputFailed { reason: e.to_string() })?;

        info!(
            "wrote {} ({} clips, {:.1}s)",
            output.display(),
            placements.len(),
            total_length
        );
        Ok(())
    }
}

/// Normalize every cut to the common output geometry, preserving aspect.
fn scale_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1"
    )
}

/// Trim the soundtrack to the output length and fade it out at the end.
fn audio_filter(total_length: f64, fade: f64) -> String {
    let fade = fade.min(total_length);
    if fade <= 0.0 {
        return format!("atrim=0:{total_length:.3}");
    }
    let fade_start = (total_length - fade).max(0.0);
    format!("atrim=0:{total_length:.3},afade=t=out:st={fade_start:.3}:d={fade:.3}")
}

/// Arguments for cutting one placement out of its source file.
///
/// Cuts are re-encoded with the output codec so the later concatenations
/// can stream-copy.
fn cut_args(placement: &ClipPlacement, config: &RenderConfig, output: &Path) -> Vec<String> {
    let (width, height) = config.resolution;
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{:.3}", placement.source_offset),
        "-t".to_string(),
        format!("{:.3}", placement.duration),
        "-i".to_string(),
        placement.source_path.display().to_string(),
        "-vf".to_string(),
        scale_filter(width, height),
        "-r".to_string(),
        config.fps.to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        config.codec.clone(),
        "-b:v".to_string(),
        config.bitrate.clone(),
        output.display().to_string(),
    ]
}

/// Arguments for stream-copy concatenation of uniform intermediates.
fn concat_args(list_path: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_path.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.display().to_string(),
    ]
}

/// Arguments for the final pass: concatenate the batch intermediates in
/// order, overlay the faded soundtrack, optionally rotate, and encode.
fn finalize_args(
    list_path: &Path,
    audio_path: &Path,
    total_length: f64,
    config: &RenderConfig,
    output: &Path,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_path.display().to_string(),
        "-i".to_string(),
        audio_path.display().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
    ];

    if config.rotate {
        args.push("-vf".to_string());
        args.push("hflip,vflip".to_string());
    }

    args.extend([
        "-af".to_string(),
        audio_filter(total_length, config.audio_fade_out),
        "-r".to_string(),
        config.fps.to_string(),
        "-c:v".to_string(),
        config.codec.clone(),
        "-b:v".to_string(),
        config.bitrate.clone(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-t".to_string(),
        format!("{total_length:.3}"),
        output.display().to_string(),
    ]);

    args
}

/// A single black frame at the output geometry: the minimal valid
/// artifact for an empty schedule.
fn placeholder_args(config: &RenderConfig, output: &Path) -> Vec<String> {
    let (width, height) = config.resolution;
    vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("color=c=black:s={width}x{height}:r={}", config.fps),
        "-frames:v".to_string(),
        "1".to_string(),
        "-c:v".to_string(),
        config.codec.clone(),
        output.display().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> ClipPlacement {
        ClipPlacement {
            timeline_start: 12.5,
            source_offset: 2.5,
            source_path: PathBuf::from("/footage/surf.mp4"),
            duration: 2.0,
        }
    }

    #[test]
    fn test_cut_args_seek_and_trim() {
        let args = cut_args(&placement(), &RenderConfig::default(), Path::new("/tmp/cut.mp4"));

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "2.500");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "2.000");

        // Audio is stripped at the cut stage; the soundtrack replaces it.
        assert!(args.contains(&"-an".to_string()));
        assert!(args.iter().any(|a| a.starts_with("scale=1920:1080")));
    }

    #[test]
    fn test_finalize_args_rotation_toggle() {
        let plain = finalize_args(
            Path::new("list.txt"),
            Path::new("song.mp3"),
            12.0,
            &RenderConfig::default(),
            Path::new("out.mp4"),
        );
        assert!(!plain.contains(&"hflip,vflip".to_string()));

        let mut config = RenderConfig::default();
        config.rotate = true;
        let rotated = finalize_args(
            Path::new("list.txt"),
            Path::new("song.mp3"),
            12.0,
            &config,
            Path::new("out.mp4"),
        );
        assert!(rotated.contains(&"hflip,vflip".to_string()));
    }

    #[test]
    fn test_audio_filter_fade_window() {
        assert_eq!(
            audio_filter(12.0, 2.0),
            "atrim=0:12.000,afade=t=out:st=10.000:d=2.000"
        );
        // Fade longer than the output collapses to the whole length
        assert_eq!(
            audio_filter(1.0, 2.0),
            "atrim=0:1.000,afade=t=out:st=0.000:d=1.000"
        );
        assert_eq!(audio_filter(12.0, 0.0), "atrim=0:12.000");
    }

    #[test]
    fn test_finalize_args_trims_to_total_length() {
        let args = finalize_args(
            Path::new("list.txt"),
            Path::new("song.mp3"),
            14.0,
            &RenderConfig::default(),
            Path::new("out.mp4"),
        );
        let t = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "14.000");
    }

    #[test]
    fn test_placeholder_is_single_frame() {
        let args = placeholder_args(&RenderConfig::default(), Path::new("out.mp4"));
        assert!(args.contains(&"lavfi".to_string()));
        assert!(args.contains(&"-frames:v".to_string()));
        assert!(args.iter().any(|a| a.contains("1920x1080")));
    }
}
