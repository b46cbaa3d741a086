use dotboy_core::gameboy::FrameSink;
use dotboy_core::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Keeps the most recently presented frame around for screenshots.
pub struct Capture {
    pub frame: Vec<u32>,
    pub presented: u64,
}

impl Capture {
    pub fn new() -> Self {
        Self {
            frame: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            presented: 0,
        }
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for Capture {
    fn present(&mut self, frame: &[u32], frame_count: u64) {
        self.frame.copy_from_slice(frame);
        self.presented = frame_count;
    }
}

/// Write `0x00RRGGBB` pixels as an 8-bit RGB PNG.
pub fn save_png(path: &Path, frame: &[u32]) -> Result<(), png::EncodingError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let mut rgb = Vec::with_capacity(frame.len() * 3);
    for &pixel in frame {
        rgb.extend_from_slice(&[(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]);
    }
    writer.write_image_data(&rgb)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use tempfile::tempdir;

    #[test]
    fn screenshot_is_rgb_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        let mut frame = vec![0x00E8FCCC; SCREEN_WIDTH * SCREEN_HEIGHT];
        frame[1] = 0x00142C38;
        save_png(&path, &frame).unwrap();

        let decoder = png::Decoder::new(BufReader::new(File::open(&path).unwrap()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size().unwrap()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (160, 144));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        assert_eq!(&buf[..6], &[0xE8, 0xFC, 0xCC, 0x14, 0x2C, 0x38]);
    }
}
