use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

pub const SINGLE_FRAME_NAME: &str = "capture.tga";

/// Writes presented frames to TGA files and owns the video frame counter.
#[derive(Debug)]
pub struct FrameCapture {
    dir: PathBuf,
    next_video_frame: u32,
}

impl FrameCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_video_frame: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn video_frames_written(&self) -> u32 {
        self.next_video_frame
    }

    fn video_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("video_{:05}.tga", index))
    }

    /// Saves tightly packed, top-down RGBA pixels. Single frames overwrite
    /// `capture.tga`; video frames are numbered consecutively.
    pub fn save_frame(&mut self, pixels: &[u8], width: u32, height: u32, video: bool) -> Result<PathBuf> {
        ensure!(
            pixels.len() == (width * height * 4) as usize,
            "expected {} bytes for a {}x{} frame, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        );

        let path = if video {
            self.video_path(self.next_video_frame)
        } else {
            self.dir.join(SINGLE_FRAME_NAME)
        };

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create capture directory {}", self.dir.display()))?;
        image::save_buffer_with_format(
            &path,
            pixels,
            width,
            height,
            image::ColorType::Rgba8,
            image::ImageFormat::Tga,
        )
        .with_context(|| format!("failed to write {}", path.display()))?;

        if video {
            self.next_video_frame += 1;
        }
        log::info!("Saved frame to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn frame(width: u32, height: u32) -> Vec<u8> {
        (0..width * height).flat_map(|i| [i as u8, 0, 255, 255]).collect()
    }

    #[test]
    fn single_frames_overwrite_one_file() {
        let dir = TempDir::new().unwrap();
        let mut capture = FrameCapture::new(dir.path());

        let first = capture.save_frame(&frame(4, 2), 4, 2, false).unwrap();
        let second = capture.save_frame(&frame(4, 2), 4, 2, false).unwrap();
        assert_eq!(first, second);
        assert!(dir.child("capture.tga").path().exists());
        assert_eq!(capture.video_frames_written(), 0);
    }

    #[test]
    fn video_frames_are_numbered() {
        let dir = TempDir::new().unwrap();
        let mut capture = FrameCapture::new(dir.child("frames").path());

        for _ in 0..3 {
            capture.save_frame(&frame(2, 2), 2, 2, true).unwrap();
        }
        for name in ["video_00000.tga", "video_00001.tga", "video_00002.tga"] {
            assert!(dir.child("frames").child(name).path().exists(), "{} missing", name);
        }
        assert_eq!(capture.video_frames_written(), 3);
    }

    #[test]
    fn written_frame_decodes_top_down() {
        let dir = TempDir::new().unwrap();
        let mut capture = FrameCapture::new(dir.path());
        let path = capture.save_frame(&frame(3, 2), 3, 2, false).unwrap();

        let decoded = image::open(path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(decoded.get_pixel(2, 1).0, [5, 0, 255, 255]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut capture = FrameCapture::new(dir.path());
        assert!(capture.save_frame(&[0; 8], 4, 4, true).is_err());
        assert_eq!(capture.video_frames_written(), 0);
    }
}
