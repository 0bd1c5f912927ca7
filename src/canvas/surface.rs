use crate::error::RenderError;
use image::RgbaImage;
use tiny_skia::{Color, Pixmap};

/// Largest side we are willing to allocate a surface for.
pub const MAX_SURFACE_SIDE: u32 = 8192;

/// Straight (non-premultiplied) RGBA8 pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data
            .get(i..i + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }
}

/// Raster target the renderer paints strokes into.
///
/// Strokes live on a transparent layer; the background color is only applied
/// on read-back, so erased pixels show the paper again.
pub struct RasterSurface {
    pixmap: Pixmap,
    background: [u8; 4],
}

fn acquire(width: u32, height: u32) -> Result<Pixmap, RenderError> {
    if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(RenderError::SurfaceUnavailable { width, height });
    }
    Pixmap::new(width, height).ok_or(RenderError::SurfaceUnavailable { width, height })
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, background: [u8; 4]) -> Result<Self, RenderError> {
        Ok(Self {
            pixmap: acquire(width, height)?,
            background,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    pub fn set_background(&mut self, background: [u8; 4]) {
        self.background = background;
    }

    /// Re-acquires the pixmap if the requested size differs.
    pub fn ensure_size(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.width() != width || self.height() != height {
            self.pixmap = acquire(width, height)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Stroke layer composited over the background, as straight RGBA.
    pub fn read_pixels(&self) -> PixelBuffer {
        let bg = self.background;
        let bg_a = bg[3] as u32;
        let bg_p = [
            bg[0] as u32 * bg_a / 255,
            bg[1] as u32 * bg_a / 255,
            bg[2] as u32 * bg_a / 255,
        ];

        let mut data = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for px in self.pixmap.pixels() {
            let a = px.alpha() as u32;
            let inv = 255 - a;
            let out_a = a + (bg_a * inv + 127) / 255;
            let src = [px.red() as u32, px.green() as u32, px.blue() as u32];
            for c in 0..3 {
                let premul = (src[c] + (bg_p[c] * inv + 127) / 255).min(255);
                let straight = if out_a == 0 {
                    0
                } else if out_a >= 255 {
                    premul
                } else {
                    (premul * 255 + out_a / 2) / out_a
                };
                data.push(straight.min(255) as u8);
            }
            data.push(out_a.min(255) as u8);
        }

        PixelBuffer {
            width: self.width(),
            height: self.height(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surface_is_unavailable() {
        assert!(matches!(
            RasterSurface::new(0, 10, [255; 4]),
            Err(RenderError::SurfaceUnavailable {
                width: 0,
                height: 10
            })
        ));
        assert!(RasterSurface::new(MAX_SURFACE_SIDE + 1, 1, [255; 4]).is_err());
    }

    #[test]
    fn blank_surface_reads_back_background() {
        let surface = RasterSurface::new(4, 3, [10, 20, 30, 255]).unwrap();
        let px = surface.read_pixels();
        assert_eq!(px.byte_len(), 4 * 3 * 4);
        assert_eq!(px.pixel(3, 2), Some([10, 20, 30, 255]));
        assert_eq!(px.pixel(4, 0), None);
        assert!(px.to_rgba_image().is_some());
    }

    #[test]
    fn ensure_size_reallocates() {
        let mut surface = RasterSurface::new(4, 4, [0, 0, 0, 255]).unwrap();
        surface.ensure_size(8, 2).unwrap();
        assert_eq!((surface.width(), surface.height()), (8, 2));
        assert!(surface.ensure_size(0, 2).is_err());
    }
}
