// Panel end of the status band.
//
// The ED060 waveform driver lives outside this crate. Until one is
// attached the band is reported and dropped, so the log never claims
// a refresh that did not happen.

use inkframe_kernel::StatusSink;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError {
    NoDriver,
}

pub struct DetachedPanel;

impl StatusSink for DetachedPanel {
    type Error = PanelError;

    fn push(&mut self, width: u16, top: u16, rows: u16, data: &[u8]) -> Result<(), PanelError> {
        warn!(
            "panel: no driver attached, {}x{} status band at y={} ({} B) not shown",
            width,
            rows,
            top,
            data.len()
        );
        Err(PanelError::NoDriver)
    }
}
