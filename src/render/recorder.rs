//! GIF recorder for capturing run frames.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use super::RenderError;

/// Configuration for frame recording.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Display duration of each frame.
    pub frame_delay_ms: u32,
    /// Record every Nth frame (1 = every frame).
    pub frame_skip: u32,
    /// Maximum frames to record (0 = unlimited).
    pub max_frames: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            frame_delay_ms: 200,
            frame_skip: 1,
            max_frames: 0,
        }
    }
}

/// Collects frames and writes them as an infinitely looping GIF.
///
/// The output file is created immediately so that an unwritable path is
/// reported before any work is done.
///
/// ```ignore
/// let mut recorder = GifRecorder::new("run.gif", RecorderConfig::default())?;
/// experiment.run_with_callback(|report| {
///     recorder.record_frame(render_frame(report.grid, report.step, report.total_steps, &render));
///     Ok::<_, RenderError>(())
/// })?;
/// let stats = recorder.finalize()?;
/// ```
pub struct GifRecorder {
    writer: BufWriter<File>,
    config: RecorderConfig,
    frames: Vec<RgbaImage>,
    step_counter: u32,
}

impl GifRecorder {
    pub fn new<P: AsRef<Path>>(path: P, config: RecorderConfig) -> Result<Self, RenderError> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            config,
            frames: Vec::new(),
            step_counter: 0,
        })
    }

    /// Record a frame.
    ///
    /// Returns true if the frame was kept (frames may be skipped per config).
    pub fn record_frame(&mut self, image: RgbaImage) -> bool {
        self.step_counter += 1;
        if self.step_counter < self.config.frame_skip {
            return false;
        }
        self.step_counter = 0;

        if self.config.max_frames > 0 && self.frames.len() as u64 >= self.config.max_frames {
            return false;
        }

        self.frames.push(image);
        true
    }

    pub fn frames_recorded(&self) -> usize {
        self.frames.len()
    }

    /// Encode all recorded frames and flush the file.
    pub fn finalize(mut self) -> Result<RecordingStats, RenderError> {
        let Some((width, height)) = self.frames.first().map(|f| f.dimensions()) else {
            return Err(RenderError::NoFrames);
        };
        let frame_count = self.frames.len() as u64;
        let delay = Delay::from_numer_denom_ms(self.config.frame_delay_ms, 1);

        {
            let mut encoder = GifEncoder::new(&mut self.writer);
            encoder.set_repeat(Repeat::Infinite)?;
            encoder.encode_frames(
                self.frames
                    .drain(..)
                    .map(|image| Frame::from_parts(image, 0, 0, delay)),
            )?;
        }
        self.writer.flush()?;

        let total_bytes = self.writer.get_ref().metadata()?.len();
        Ok(RecordingStats {
            frame_count,
            total_bytes,
            width,
            height,
        })
    }
}

/// Statistics from a recording session.
#[derive(Debug, Clone)]
pub struct RecordingStats {
    pub frame_count: u64,
    pub total_bytes: u64,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for RecordingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames of {}x{}, {} bytes total",
            self.frame_count, self.width, self.height, self.total_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, Rgba};
    use std::fs;
    use std::io::BufReader;
    use tempfile::tempdir;

    fn frame(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255]))
    }

    fn decoded_frames(path: &Path) -> usize {
        let reader = BufReader::new(File::open(path).unwrap());
        GifDecoder::new(reader)
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap()
            .len()
    }

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.gif");

        let mut recorder = GifRecorder::new(&path, RecorderConfig::default()).unwrap();
        for i in 0..6 {
            assert!(recorder.record_frame(frame(i * 40)));
        }

        let stats = recorder.finalize().unwrap();
        assert_eq!(stats.frame_count, 6);
        assert_eq!((stats.width, stats.height), (8, 8));

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"GIF89a"));
        assert_eq!(stats.total_bytes, bytes.len() as u64);
        assert_eq!(decoded_frames(&path), 6);
    }

    #[test]
    fn test_recorder_frame_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.gif");

        let config = RecorderConfig {
            frame_skip: 5,
            ..Default::default()
        };
        let mut recorder = GifRecorder::new(&path, config).unwrap();

        // 20 frames offered, kept at 5, 10, 15, 20
        for i in 0..20 {
            recorder.record_frame(frame(i * 10));
        }

        assert_eq!(recorder.finalize().unwrap().frame_count, 4);
    }

    #[test]
    fn test_recorder_max_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("max.gif");

        let config = RecorderConfig {
            max_frames: 3,
            ..Default::default()
        };
        let mut recorder = GifRecorder::new(&path, config).unwrap();
        for i in 0..50 {
            recorder.record_frame(frame(i));
        }

        assert_eq!(recorder.frames_recorded(), 3);
        assert_eq!(recorder.finalize().unwrap().frame_count, 3);
    }

    #[test]
    fn test_bad_path_fails_up_front() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("run.gif");

        assert!(matches!(
            GifRecorder::new(&path, RecorderConfig::default()),
            Err(RenderError::Io(_))
        ));
    }

    #[test]
    fn test_empty_recording_is_an_error() {
        let dir = tempdir().unwrap();
        let recorder =
            GifRecorder::new(dir.path().join("empty.gif"), RecorderConfig::default()).unwrap();

        assert!(matches!(recorder.finalize(), Err(RenderError::NoFrames)));
    }
}
