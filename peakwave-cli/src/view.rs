//! Renderer state shared between the session and the terminal UI.

use std::cell::RefCell;
use std::rc::Rc;

use peakwave_lib::peaks::PeakData;
use peakwave_lib::wave::ProgressRenderer;

#[derive(Debug, Default)]
pub struct WaveView {
    pub peaks: Option<PeakData>,
    /// Pixel column of the progress cursor.
    pub offset: u64,
}

/// Session renderer that records what the next UI draw should show.
#[derive(Debug, Clone, Default)]
pub struct TerminalRenderer {
    view: Rc<RefCell<WaveView>>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> Rc<RefCell<WaveView>> {
        Rc::clone(&self.view)
    }
}

impl ProgressRenderer for TerminalRenderer {
    fn set_peaks(&mut self, peaks: Option<&PeakData>) {
        self.view.borrow_mut().peaks = peaks.cloned();
    }

    fn change_offset_pixels(&mut self, pixels: u64) {
        self.view.borrow_mut().offset = pixels;
    }
}
