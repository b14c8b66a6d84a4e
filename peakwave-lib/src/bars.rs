//! Bar geometry for drawing a peak channel.

use crate::peaks::Peaks;

/// Spacing of waveform bars, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarStyle {
    pub bar_width: u32,
    pub bar_gap: u32,
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            bar_width: 1,
            bar_gap: 0,
        }
    }
}

/// One filled rectangle. `y` grows downwards from the top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: u32,
    pub y: f64,
    pub width: u32,
    pub height: f64,
}

/// Lay out bars for `peaks` across a `width` x `height` area.
///
/// Every `bar_width + bar_gap` pixels one bar spans from the column's
/// maximum above the centre line to its minimum below it. `offset` skips
/// that many leading columns. Columns past the end of the data are not drawn.
pub fn layout_bars(
    peaks: &Peaks,
    width: u32,
    height: f64,
    style: BarStyle,
    offset: usize,
) -> Vec<Bar> {
    let max_value = peaks.bits().magnitude();
    let half = height / 2.0;
    let step = (style.bar_width + style.bar_gap).max(1) as usize;

    (0..width as usize)
        .step_by(step)
        .map_while(|pixel| {
            let (min, max) = peaks.column(pixel + offset)?;
            let min = (f64::from(min) / max_value * half).abs();
            let max = (f64::from(max) / max_value * half).abs();
            Some(Bar {
                x: pixel as u32,
                y: half - max,
                width: style.bar_width,
                height: max + min,
            })
        })
        .collect()
}
