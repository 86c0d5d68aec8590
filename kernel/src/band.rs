// Status band buffer: the bottom rows of the panel, 4bpp grey.
// Borrowed byte slice instead of a full framebuffer; draws address
// absolute panel coordinates and anything outside the band is
// clipped. Two pixels per byte, left pixel in the high nibble.

use core::convert::Infallible;
use core::fmt;

use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{Gray4, GrayColor},
};

pub const fn band_bytes(width: u16, rows: u16) -> usize {
    (width as usize * rows as usize).div_ceil(2)
}

/// Panel side of the band: takes a finished 4bpp strip and puts it
/// on screen. `data` is `band_bytes(width, rows)` long.
pub trait StatusSink {
    type Error: fmt::Debug;

    fn push(&mut self, width: u16, top: u16, rows: u16, data: &[u8]) -> Result<(), Self::Error>;
}

pub struct StatusBand<'a> {
    buf: &'a mut [u8],
    width: u16,
    top: u16,
    rows: u16,
}

impl<'a> StatusBand<'a> {
    /// Band of `rows` rows ending at the bottom of a
    /// `width` x `panel_height` panel, cleared to white.
    pub fn new(buf: &'a mut [u8], width: u16, panel_height: u16, mut rows: u16) -> Self {
        let max_rows = if width == 0 {
            0
        } else {
            (buf.len() * 2 / width as usize).min(u16::MAX as usize) as u16
        };
        if rows > max_rows {
            log::warn!(
                "status band: {}x{} exceeds {}B buffer, clamping rows -> {}",
                width,
                rows,
                buf.len(),
                max_rows
            );
            rows = max_rows;
        }
        rows = rows.min(panel_height);

        let mut band = Self {
            buf,
            width,
            top: panel_height - rows,
            rows,
        };
        band.clear(Gray4::WHITE);
        band
    }

    #[inline]
    pub fn top(&self) -> u16 {
        self.top
    }

    #[inline]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn data(&self) -> &[u8] {
        &self.buf[..band_bytes(self.width, self.rows)]
    }

    /// Hand the band to the panel. An empty band is not pushed.
    pub fn present<S: StatusSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        if self.rows == 0 || self.width == 0 {
            return Ok(());
        }
        sink.push(self.width, self.top, self.rows, self.data())
    }

    pub fn clear(&mut self, color: Gray4) {
        let l = color.luma();
        let total = band_bytes(self.width, self.rows);
        self.buf[..total].fill((l << 4) | l);
    }

    /// Pixel at absolute panel coordinates, `None` outside the band.
    pub fn pixel(&self, x: u16, y: u16) -> Option<Gray4> {
        let (byte, high) = self.index(x, y)?;
        let v = self.buf[byte];
        Some(Gray4::new(if high { v >> 4 } else { v & 0x0F }))
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<(usize, bool)> {
        if x >= self.width || y < self.top || y >= self.top + self.rows {
            return None;
        }
        let idx = (y - self.top) as usize * self.width as usize + x as usize;
        Some((idx / 2, idx % 2 == 0))
    }

    #[inline]
    fn set_pixel(&mut self, x: u16, y: u16, color: Gray4) {
        let Some((byte, high)) = self.index(x, y) else {
            return;
        };
        let l = color.luma();
        let v = &mut self.buf[byte];
        *v = if high {
            (*v & 0x0F) | (l << 4)
        } else {
            (*v & 0xF0) | l
        };
    }
}

impl OriginDimensions for StatusBand<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, (self.top + self.rows) as u32)
    }
}

impl DrawTarget for StatusBand<'_> {
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x < 0 || p.y < 0 || p.x > u16::MAX as i32 || p.y > u16::MAX as i32 {
                continue;
            }
            self.set_pixel(p.x as u16, p.y as u16, color);
        }
        Ok(())
    }
}
