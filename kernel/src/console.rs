// Cursor-and-print text output over any grey DrawTarget.
// Backs `TextDisplay` with an embedded-graphics mono font so the
// status line can be drawn without a full display driver.

use core::fmt;

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::alert::TextDisplay;

const FONT: &MonoFont<'static> = &FONT_10X20;

/// 3-bit panel level (0..=7) -> 4-bit grey.
#[inline]
pub fn gray_from_3bit(level: u8) -> Gray4 {
    let l = level.min(7);
    Gray4::new(l * 2 + l / 4)
}

pub struct StatusConsole<'d, D> {
    target: &'d mut D,
    cursor: Point,
    fg: Gray4,
    bg: Gray4,
}

impl<'d, D> StatusConsole<'d, D>
where
    D: DrawTarget<Color = Gray4>,
{
    pub fn new(target: &'d mut D) -> Self {
        Self {
            target,
            cursor: Point::zero(),
            fg: Gray4::BLACK,
            bg: Gray4::WHITE,
        }
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    fn newline(&mut self) {
        self.cursor.x = 0;
        self.cursor.y += FONT.character_size.height as i32;
    }

    fn draw_run(&mut self, run: &str) -> fmt::Result {
        if run.is_empty() {
            return Ok(());
        }
        let style = MonoTextStyleBuilder::new()
            .font(FONT)
            .text_color(self.fg)
            .background_color(self.bg)
            .build();
        self.cursor = Text::with_baseline(run, self.cursor, style, Baseline::Top)
            .draw(&mut *self.target)
            .map_err(|_| fmt::Error)?;
        Ok(())
    }
}

impl<D> fmt::Write for StatusConsole<'_, D>
where
    D: DrawTarget<Color = Gray4>,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.draw_run(first)?;
        }
        for line in lines {
            self.newline();
            self.draw_run(line)?;
        }
        Ok(())
    }
}

impl<D> TextDisplay for StatusConsole<'_, D>
where
    D: DrawTarget<Color = Gray4>,
{
    fn set_text_color(&mut self, fg: u8, bg: u8) {
        self.fg = gray_from_3bit(fg);
        self.bg = gray_from_3bit(bg);
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Point::new(x as i32, y as i32);
    }

    fn height(&self) -> u16 {
        self.target.bounding_box().size.height.min(u16::MAX as u32) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::report_battery;
    use crate::band::{StatusBand, band_bytes};
    use crate::battery::BatteryReading;
    use crate::config::BatteryConfig;

    const W: u16 = 800;
    const H: u16 = 600;
    const ROWS: u16 = 25;

    fn count(band: &StatusBand<'_>, color: Gray4) -> usize {
        (band.top()..H)
            .flat_map(|y| (0..W).map(move |x| (x, y)))
            .filter(|&(x, y)| band.pixel(x, y) == Some(color))
            .count()
    }

    #[test]
    fn three_bit_levels_span_grey_range() {
        assert_eq!(gray_from_3bit(0), Gray4::BLACK);
        assert_eq!(gray_from_3bit(7), Gray4::WHITE);
        assert_eq!(gray_from_3bit(9), Gray4::WHITE);
    }

    #[test]
    fn low_battery_lands_in_status_band() {
        let mut buf = [0u8; band_bytes(W, ROWS)];
        let mut band = StatusBand::new(&mut buf, W, H, ROWS);
        {
            let mut console = StatusConsole::new(&mut band);
            assert_eq!(console.height(), H);
            let alert = report_battery(
                &mut console,
                BatteryReading::from_volts(3.5),
                &BatteryConfig::DEFAULT,
            );
            assert!(alert.is_some());
            assert_eq!(console.cursor(), Point::new(0, (H - ROWS) as i32 + 20));
        }

        // white glyphs on a black cell background
        assert!(count(&band, Gray4::BLACK) > 0);
        assert!(count(&band, Gray4::WHITE) > 0);
        assert_eq!(band.pixel(0, H - ROWS), Some(Gray4::BLACK));
    }

    #[test]
    fn silent_report_leaves_band_untouched() {
        let mut buf = [0u8; band_bytes(W, ROWS)];
        let mut band = StatusBand::new(&mut buf, W, H, ROWS);
        {
            let mut console = StatusConsole::new(&mut band);
            let alert = report_battery(
                &mut console,
                BatteryReading::from_volts(4.0),
                &BatteryConfig::DEFAULT,
            );
            assert!(alert.is_none());
        }
        assert!(band.data().iter().all(|&b| b == 0xFF));
    }
}
