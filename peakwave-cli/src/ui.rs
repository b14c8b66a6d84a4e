use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use peakwave_lib::bars::{layout_bars, BarStyle};
use peakwave_lib::peaks::Peaks;

use crate::controls::HELP;
use crate::view::WaveView;

const MARGIN: u16 = 1;
const LOG_HEIGHT: u16 = 8;

/// Pixel columns available to the waveform for a terminal `columns` wide.
pub fn waveform_width(columns: u16) -> u32 {
    u32::from(columns.saturating_sub(2 * MARGIN + 2))
}

/// Character rows for one channel, one character per pixel column.
pub fn waveform_rows(peaks: &Peaks, width: u32, rows: u16) -> Vec<String> {
    let rows = usize::from(rows.max(1));
    let mut grid = vec![vec![' '; width as usize]; rows];
    let centre = rows / 2;

    for bar in layout_bars(peaks, width, rows as f64, BarStyle::default(), 0) {
        let column = bar.x as usize;
        let top = bar.y;
        let bottom = bar.y + bar.height;
        if bar.height < 0.5 {
            grid[centre][column] = '─';
            continue;
        }
        for (row, line) in grid.iter_mut().enumerate() {
            let row_top = row as f64;
            if row_top + 1.0 > top && row_top < bottom {
                line[column] = '█';
            }
        }
    }

    grid.into_iter().map(|line| line.into_iter().collect()).collect()
}

fn waveform_lines(view: &WaveView, width: u32, height: u16) -> Vec<Line<'static>> {
    let Some(peaks) = view.peaks.as_ref() else {
        return vec![Line::from("Loading waveform...")];
    };
    let channel_count = peaks.channels.len().max(1) as u16;
    let rows = (height / channel_count).max(1);
    let played = view.offset as usize;
    let played_style = Style::default().fg(Color::Cyan);
    let pending_style = Style::default().fg(Color::DarkGray);

    peaks
        .channels
        .iter()
        .flat_map(|channel| waveform_rows(channel, width, rows))
        .map(|row| {
            let split = row
                .char_indices()
                .nth(played)
                .map(|(index, _)| index)
                .unwrap_or(row.len());
            let (left, right) = row.split_at(split);
            Line::from(vec![
                Span::styled(left.to_string(), played_style),
                Span::styled(right.to_string(), pending_style),
            ])
        })
        .collect()
}

pub fn draw(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    status: &str,
    view: &WaveView,
    log_lines: &[String],
) {
    let _ = terminal.draw(|f| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(MARGIN)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(4),
                Constraint::Length(LOG_HEIGHT),
            ])
            .split(f.size());

        let controls = Paragraph::new(HELP)
            .style(Style::default().fg(Color::Blue))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(controls, chunks[0]);

        let wave_area = chunks[1];
        let lines = waveform_lines(
            view,
            u32::from(wave_area.width.saturating_sub(2)),
            wave_area.height.saturating_sub(2),
        );
        let waveform =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Peakwave"));
        f.render_widget(waveform, wave_area);

        let status_widget = Paragraph::new(status)
            .style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title("Playback"));
        f.render_widget(status_widget, chunks[2]);

        let log_height = chunks[3].height.saturating_sub(2) as usize;
        let start = log_lines.len().saturating_sub(log_height);
        let log_text = if log_lines.is_empty() {
            "No logs yet.".to_string()
        } else {
            log_lines[start..].join("\n")
        };

        let log_widget = Paragraph::new(log_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        f.render_widget(log_widget, chunks[3]);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_column_fills_every_row() {
        let peaks = Peaks::I8(vec![-128, 127, 0, 0]);
        let rows = waveform_rows(&peaks, 2, 4);
        assert_eq!(rows, vec!["█ ", "█ ", "█─", "█ "]);
    }

    #[test]
    fn half_scale_column_fills_the_middle() {
        let peaks = Peaks::I16(vec![-16_384, 16_384]);
        let rows = waveform_rows(&peaks, 1, 4);
        assert_eq!(rows, vec![" ", "█", "█", " "]);
    }

    #[test]
    fn width_leaves_room_for_margin_and_border() {
        assert_eq!(waveform_width(84), 80);
        assert_eq!(waveform_width(2), 0);
    }
}
