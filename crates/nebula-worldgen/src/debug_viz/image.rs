//! Opaque RGB map image with RGBA and PPM export.

use std::io::{self, Write};

use hashbrown::HashMap;

/// Colour of cells no renderer has written.
pub const UNSAMPLED: [u8; 3] = [0, 0, 0];

/// Row-major map image, one opaque colour per cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugImage {
    width: u32,
    height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl DebugImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![UNSAMPLED; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Write one cell. Writes outside the image are ignored.
    pub fn put(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Row-major RGBA bytes with full alpha, ready for a texture upload.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&[r, g, b]| [r, g, b, 255])
            .collect()
    }

    /// Cells per colour. On a biome map this is the area of each biome.
    pub fn color_histogram(&self) -> HashMap<[u8; 3], usize> {
        let mut counts = HashMap::new();
        for &color in &self.pixels {
            *counts.entry(color).or_insert(0) += 1;
        }
        counts
    }

    /// Write the map as a binary PPM (`P6`).
    pub fn write_ppm(&self, mut out: impl Write) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for color in &self.pixels {
            out.write_all(color)?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_image_is_unsampled() {
        let image = DebugImage::new(12, 5);
        assert_eq!(image.dimensions(), (12, 5));
        assert_eq!(image.pixels.len(), 60);
        assert_eq!(image.color_histogram().get(&UNSAMPLED), Some(&60));
    }

    #[test]
    fn test_put_clips_outside_writes() {
        let mut image = DebugImage::new(8, 8);
        image.put(2, 3, [10, 20, 30]);
        image.put(8, 0, [1, 2, 3]);
        image.put(0, 99, [1, 2, 3]);
        assert_eq!(image.pixel(2, 3), Some([10, 20, 30]));
        assert_eq!(image.pixel(8, 0), None);
        assert_eq!(image.color_histogram().len(), 2, "out-of-range writes ignored");
    }

    #[test]
    fn test_rgba_export_is_row_major() {
        let mut image = DebugImage::new(2, 2);
        image.put(1, 0, [9, 8, 7]);
        image.put(0, 1, [1, 2, 3]);
        let rgba = image.to_rgba();
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[4..8], &[9, 8, 7, 255]);
        assert_eq!(&rgba[8..12], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_histogram_counts_area() {
        let mut image = DebugImage::new(4, 1);
        image.put(0, 0, [255, 0, 0]);
        image.put(1, 0, [0, 255, 0]);
        image.put(2, 0, [255, 0, 0]);
        image.put(3, 0, [0, 0, 255]);
        let histogram = image.color_histogram();
        assert_eq!(histogram.len(), 3);
        assert_eq!(histogram[&[255, 0, 0]], 2);
    }

    #[test]
    fn test_ppm_header_and_payload() {
        let mut image = DebugImage::new(3, 2);
        image.put(2, 1, [40, 50, 60]);
        let mut out = Vec::new();
        image.write_ppm(&mut out).unwrap();
        let header = b"P6\n3 2\n255\n";
        assert!(out.starts_with(header));
        assert_eq!(out.len(), header.len() + 3 * 2 * 3);
        assert_eq!(&out[out.len() - 3..], &[40, 50, 60]);
    }
}
