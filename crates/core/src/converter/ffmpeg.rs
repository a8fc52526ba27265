//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::capabilities::EncoderCapabilities;
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionResult, EncodingMode};
use crate::discovery::WorkItem;
use crate::planner::ResourcePlan;
use crate::runner::{CommandRequest, CommandRunner};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter<R: CommandRunner> {
    config: ConverterConfig,
    runner: Arc<R>,
}

impl<R: CommandRunner> FfmpegConverter<R> {
    /// Creates a new FFmpeg converter running the engine through `runner`.
    pub fn new(config: ConverterConfig, runner: Arc<R>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds the ffmpeg arguments for one work item.
    ///
    /// Source and output paths are passed through unchanged, so file names
    /// that are not valid UTF-8 still reach the engine intact.
    pub fn build_args(
        &self,
        item: &WorkItem,
        plan: &ResourcePlan,
        mode: EncodingMode,
    ) -> Vec<OsString> {
        let encoder = &self.config.encoder;

        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            // Never read the terminal
            "-nostdin".into(),
            "-y".into(), // Overwrite partial output
            "-i".into(),
            item.source.clone().into_os_string(),
        ];

        args.extend(mode.video_args(encoder, plan).into_iter().map(OsString::from));

        // Scale down to the bounding box keeping aspect ratio, never up, then fix the frame rate
        let filter = format!(
            "scale='min({},iw)':'min({},ih)':force_original_aspect_ratio=decrease:\
             force_divisible_by=2,fps={}",
            encoder.max_width, encoder.max_height, encoder.fps
        );
        args.extend(["-vf".into(), filter.into()]);

        // Audio
        args.extend([
            "-c:a".into(),
            encoder.audio_codec.clone().into(),
            "-b:a".into(),
            format!("{}k", encoder.audio_bitrate_kbps).into(),
            "-ac".into(),
            encoder.audio_channels.to_string().into(),
        ]);

        // Container metadata and layout
        args.extend([
            "-map_metadata".into(),
            "0".into(),
            "-movflags".into(),
            "+faststart".into(),
        ]);

        args.push(item.output.clone().into_os_string());

        args
    }

    /// Reads the last `lines` non-empty lines of a log.
    ///
    /// Progress updates are separated by carriage returns, so both `\r` and
    /// `\n` end a line.
    async fn read_log_tail(path: &Path, lines: usize) -> Vec<String> {
        let Ok(bytes) = tokio::fs::read(path).await else {
            return Vec::new();
        };
        let text = String::from_utf8_lossy(&bytes);
        let all: Vec<&str> = text
            .split(['\r', '\n'])
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();

        all[all.len().saturating_sub(lines)..]
            .iter()
            .map(|l| l.to_string())
            .collect()
    }

    /// Appends a note to the item log so a retained log explains spawn failures.
    async fn append_to_log(path: &Path, message: &str) {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await;
        match file {
            Ok(mut file) => {
                let _ = file.write_all(format!("{message}\n").as_bytes()).await;
            }
            Err(e) => warn!(log = %path.display(), error = %e, "Failed to write item log"),
        }
    }
}

#[async_trait]
impl<R: CommandRunner + 'static> Converter for FfmpegConverter<R> {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(
        &self,
        item: &WorkItem,
        plan: &ResourcePlan,
        mode: EncodingMode,
    ) -> ConversionResult {
        let request = CommandRequest::new(&self.config.ffmpeg_path)
            .args(self.build_args(item, plan, mode))
            .log_to(&item.log)
            .timeout(self.config.timeout());

        debug!(
            source = %item.source.display(),
            %mode,
            runner = self.runner.name(),
            "Starting engine"
        );

        let start = Instant::now();
        let outcome = self.runner.run(&request).await;
        let elapsed = start.elapsed();

        let output_exists = tokio::fs::try_exists(&item.output).await.unwrap_or(false);

        let mut result = match outcome {
            Ok(output) => ConversionResult::classify(
                output.exit_code,
                output.timed_out,
                output_exists,
                elapsed,
            ),
            Err(e) => {
                Self::append_to_log(&item.log, &format!("[reelpress] {e}")).await;
                ConversionResult::failed(e.to_string(), output_exists, elapsed)
            }
        };

        if !result.is_success() {
            result.log_tail = Self::read_log_tail(&item.log, self.config.log_tail_lines).await;
        }

        result
    }

    async fn validate(&self, mode: EncodingMode) -> Result<(), ConverterError> {
        let request = CommandRequest::new(&self.config.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-encoders");

        let output = self.runner.run(&request).await.map_err(|e| {
            if e.is_not_found() {
                ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                }
            } else {
                ConverterError::Runner(e)
            }
        })?;

        if !output.success() {
            return Err(ConverterError::ValidationFailed {
                reason: format!("`ffmpeg -encoders` exited with {:?}", output.exit_code),
            });
        }

        let capabilities = EncoderCapabilities::parse(&output.output);
        let encoder = mode.encoder(&self.config.encoder);
        if !capabilities.supports(encoder) {
            debug!(
                available = ?capabilities.video_encoders().collect::<Vec<_>>(),
                "Encoder missing from ffmpeg build"
            );
            if mode == EncodingMode::Hardware && capabilities.has_hardware_hevc() {
                warn!(
                    encoder,
                    "Another hardware HEVC encoder is available; \
                     set encoder.hardware_codec to use it"
                );
            }
            return Err(ConverterError::EncoderUnavailable {
                encoder: encoder.to_string(),
            });
        }

        debug!(encoder, "Engine validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::OutputLayout;
    use crate::planner::{plan, UtilizationFraction};
    use crate::testing::MockRunner;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn layout(dir: &Path) -> OutputLayout {
        OutputLayout::new(dir.join("out"), ".logs", "mp4")
    }

    fn lossy(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn converter(runner: &Arc<MockRunner>) -> FfmpegConverter<MockRunner> {
        FfmpegConverter::new(ConverterConfig::default(), Arc::clone(runner))
    }

    async fn prepared_item(dir: &TempDir, name: &str) -> WorkItem {
        let source = dir.path().join(name);
        tokio::fs::write(&source, vec![0u8; 1000]).await.unwrap();
        let layout = layout(dir.path());
        tokio::fs::create_dir_all(layout.log_dir()).await.unwrap();
        WorkItem::new(source, &layout)
    }

    #[test]
    fn test_build_args_software() {
        let converter = converter(&Arc::new(MockRunner::new()));
        let item = WorkItem::new(
            PathBuf::from("/in/clip.MOV"),
            &OutputLayout::new(PathBuf::from("/out"), ".logs", "mp4"),
        );
        let args = lossy(&converter.build_args(
            &item,
            &plan(UtilizationFraction::Half, 8),
            EncodingMode::Software,
        ));

        assert_eq!(&args[..5], &["-hide_banner", "-nostdin", "-y", "-i", "/in/clip.MOV"]);
        assert!(args.contains(&"libx265".to_string()));
        assert!(args.contains(&"pools=2".to_string()));
        assert_eq!(args.last().unwrap(), "/out/clip.mp4");

        let filter = args[args.iter().position(|a| a == "-vf").unwrap() + 1].clone();
        assert!(filter.contains("min(1920,iw)"));
        assert!(filter.contains("min(1080,ih)"));
        assert!(filter.contains("force_original_aspect_ratio=decrease"));
        assert!(filter.ends_with("fps=30"));

        for flag in ["-c:a", "aac", "-b:a", "128k", "-ac", "2", "-map_metadata", "+faststart"] {
            assert!(args.contains(&flag.to_string()), "missing {flag}");
        }
        assert!(!args.contains(&"-tag:v".to_string()));
    }

    #[test]
    fn test_build_args_hardware() {
        let converter = converter(&Arc::new(MockRunner::new()));
        let item = WorkItem::new(
            PathBuf::from("/in/clip.mp4"),
            &OutputLayout::new(PathBuf::from("/out"), ".logs", "mp4"),
        );
        let args = lossy(&converter.build_args(
            &item,
            &plan(UtilizationFraction::Full, 8),
            EncodingMode::Hardware,
        ));

        assert!(args.contains(&"-nostdin".to_string()));
        assert!(args.contains(&"hevc_videotoolbox".to_string()));
        assert!(args.contains(&"hvc1".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
        assert!(!args.contains(&"-x265-params".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_build_args_keeps_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let converter = converter(&Arc::new(MockRunner::new()));
        let source = PathBuf::from(OsStr::from_bytes(b"/in/caf\xe9.mov"));
        let item = WorkItem::new(
            source.clone(),
            &OutputLayout::new(PathBuf::from("/out"), ".logs", "mp4"),
        );
        let args = converter.build_args(
            &item,
            &plan(UtilizationFraction::Full, 8),
            EncodingMode::Software,
        );

        assert_eq!(args[4], source.into_os_string());
        assert_eq!(args.last().unwrap().as_bytes(), b"/out/caf\xe9.mp4");
    }

    #[tokio::test]
    async fn test_convert_success() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let item = prepared_item(&dir, "ok.mov").await;

        let result = converter(&runner)
            .convert(&item, &plan(UtilizationFraction::Full, 4), EncodingMode::Software)
            .await;

        assert!(result.is_success());
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output_exists);
        assert!(result.log_tail.is_empty());
        assert!(item.log.exists());
        assert_eq!(runner.engine_invocations().await, 1);
    }

    #[tokio::test]
    async fn test_convert_failure_keeps_tail() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.fail_source("broken.mov").await;
        let item = prepared_item(&dir, "broken.mov").await;

        let result = converter(&runner)
            .convert(&item, &plan(UtilizationFraction::Full, 4), EncodingMode::Software)
            .await;

        assert!(!result.is_success());
        assert_eq!(result.exit_code, Some(1));
        assert!(!result.log_tail.is_empty());
        assert!(result.log_tail.len() <= 20);
        assert!(result
            .log_tail
            .last()
            .unwrap()
            .contains("Invalid data found when processing input"));
    }

    #[tokio::test]
    async fn test_convert_exit_zero_without_output() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.skip_output_for("ghost.mov").await;
        let item = prepared_item(&dir, "ghost.mov").await;

        let result = converter(&runner)
            .convert(&item, &plan(UtilizationFraction::Full, 4), EncodingMode::Software)
            .await;

        assert_eq!(result.exit_code, Some(0));
        assert!(!result.output_exists);
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_convert_spawn_failure_is_item_failure() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.remove_program("ffmpeg").await;
        let item = prepared_item(&dir, "clip.mov").await;

        let result = converter(&runner)
            .convert(&item, &plan(UtilizationFraction::Full, 4), EncodingMode::Software)
            .await;

        assert!(!result.is_success());
        assert_eq!(result.exit_code, None);
        assert!(result.failure_reason().unwrap().contains("spawn"));
        assert!(result.log_tail.iter().any(|l| l.contains("[reelpress]")));
    }

    #[tokio::test]
    async fn test_read_log_tail_splits_carriage_returns() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("x.log");
        let mut text = String::new();
        for i in 0..30 {
            text.push_str(&format!("line {i}\n"));
        }
        text.push_str("frame=1\rframe=2\rframe=3\n");
        tokio::fs::write(&log, text).await.unwrap();

        let tail = FfmpegConverter::<MockRunner>::read_log_tail(&log, 5).await;
        assert_eq!(tail, vec!["line 28", "line 29", "frame=1", "frame=2", "frame=3"]);
    }

    #[tokio::test]
    async fn test_read_log_tail_missing_file() {
        let missing = Path::new("/nonexistent/x.log");
        let tail = FfmpegConverter::<MockRunner>::read_log_tail(missing, 5).await;
        assert!(tail.is_empty());
    }

    #[tokio::test]
    async fn test_validate_modes() {
        let runner = Arc::new(MockRunner::new());
        let converter = converter(&runner);
        assert!(converter.validate(EncodingMode::Software).await.is_ok());
        assert!(converter.validate(EncodingMode::Hardware).await.is_ok());

        runner.set_encoders(&["libx265"]).await;
        let err = converter.validate(EncodingMode::Hardware).await.unwrap_err();
        assert!(matches!(
            err,
            ConverterError::EncoderUnavailable { ref encoder } if encoder == "hevc_videotoolbox"
        ));
    }

    #[tokio::test]
    async fn test_validate_missing_ffmpeg() {
        let runner = Arc::new(MockRunner::new());
        runner.remove_program("ffmpeg").await;
        let err = converter(&runner).validate(EncodingMode::Software).await.unwrap_err();
        assert!(matches!(err, ConverterError::FfmpegNotFound { .. }));
    }
}
