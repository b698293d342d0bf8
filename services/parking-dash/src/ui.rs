// services/parking-dash/src/ui.rs
//
// Terminal rendering for the parking dashboard

use parkkit::types::{DashboardMetrics, ParkingSpot};
use ratatui::{prelude::*, widgets::*};

use crate::layout::{RowGroup, SpotLayout};
use crate::presentation::{format_occupancy, occupancy_counts, occupancy_summary, status_label};
use crate::state::{DashboardState, LogLevel};

// Color palette: Slate, White, Green, Amber, Red
mod colors {
    use ratatui::style::Color;

    pub const WHITE: Color = Color::Rgb(241, 245, 249);
    pub const SLATE: Color = Color::Rgb(148, 163, 184);
    pub const INDIGO: Color = Color::Rgb(99, 102, 241);
    pub const AMBER: Color = Color::Rgb(251, 191, 36);
    pub const DARK_AMBER: Color = Color::Rgb(180, 83, 9);
    pub const FREE: Color = Color::Rgb(16, 185, 129);
    pub const OCCUPIED: Color = Color::Rgb(239, 68, 68);
    pub const BG_DARK: Color = Color::Rgb(15, 23, 42);
    pub const BG_PANEL: Color = Color::Rgb(30, 41, 59);
}

const STAT_TITLES: [&str; 6] = [
    "OCCUPANCY",
    "PEAK HOUR",
    "LEAST BUSY",
    "TOP ROW",
    "EXCESSIVE USE",
    "STATUS",
];

pub fn draw_ui(frame: &mut Frame, state: &DashboardState, demo_mode: bool) {
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(colors::BG_DARK)),
        area,
    );

    let banner = state.offline_banner();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                          // Header
            Constraint::Length(3),                                          // Camera selector
            Constraint::Length(if banner.is_some() { 1 } else { 0 }),       // Offline banner
            Constraint::Min(12),                                            // Spots + analytics
            Constraint::Length(8),                                          // Activity
            Constraint::Length(3),                                          // Footer
        ])
        .split(area);

    draw_header(frame, chunks[0], state, demo_mode);
    draw_camera_selector(frame, chunks[1], state);
    if let Some(text) = banner {
        draw_banner(frame, chunks[2], &text);
    }
    draw_main_content(frame, chunks[3], state);
    draw_activity_panel(frame, chunks[4], state);
    draw_footer(frame, chunks[5], demo_mode);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DashboardState, demo_mode: bool) {
    let (mode_text, mode_color) = if demo_mode {
        ("DEMO", colors::AMBER)
    } else if state.is_offline() {
        ("OFFLINE", colors::OCCUPIED)
    } else {
        ("LIVE", colors::FREE)
    };

    let updated = state
        .spots_state()
        .last_updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let title = Line::from(vec![
        Span::styled(
            " PARKING-DASH ",
            Style::default().fg(colors::WHITE).bg(colors::INDIGO).bold(),
        ),
        Span::raw("  "),
        Span::styled("OCCUPANCY MONITOR", Style::default().fg(colors::AMBER).bold()),
        Span::raw("  "),
        Span::styled(format!("[{}]", mode_text), Style::default().fg(mode_color).bold()),
        Span::raw("  "),
        Span::styled(
            format!("updated {}", updated),
            Style::default().fg(colors::SLATE),
        ),
    ]);

    let header = Paragraph::new(title).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(colors::INDIGO))
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(header, area);
}

fn draw_camera_selector(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let titles: Vec<String> = state.cameras.iter().map(|c| c.to_uppercase()).collect();

    let tabs = Tabs::new(titles)
        .select(state.selected_camera)
        .style(Style::default().fg(colors::SLATE))
        .highlight_style(Style::default().fg(colors::INDIGO).bg(colors::WHITE).bold())
        .divider(Span::styled("|", Style::default().fg(colors::SLATE)))
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" CAMERAS  ·  {} VIEW ", state.view_mode.title().to_uppercase()),
                    Style::default().fg(colors::WHITE).bold(),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(colors::SLATE))
                .style(Style::default().bg(colors::BG_PANEL)),
        );

    frame.render_widget(tabs, area);
}

fn draw_banner(frame: &mut Frame, area: Rect, text: &str) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(" ! ", Style::default().fg(colors::BG_DARK).bg(colors::AMBER).bold()),
        Span::styled(format!(" {}", text), Style::default().fg(colors::AMBER)),
    ]))
    .style(Style::default().bg(colors::BG_DARK));

    frame.render_widget(banner, area);
}

fn draw_main_content(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_spots_panel(frame, chunks[0], state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(6)])
        .split(chunks[1]);

    draw_analytics_panel(frame, right[0], state);
    draw_metrics_chart(frame, right[1], state);
}

fn draw_spots_panel(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let spots = state.spots.data().map(Vec::as_slice).unwrap_or_default();
    let title = format!(
        " LIVE SPOTS  ·  {}  ·  {} ",
        state.selected_camera_name().to_uppercase(),
        occupancy_summary(spots)
    );

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(colors::WHITE).bold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors::SLATE))
        .style(Style::default().bg(colors::BG_PANEL));

    let block = match state.selected_spot() {
        Some(spot) => block.title_bottom(Span::styled(
            format!(" {} ", describe_spot(&spot)),
            Style::default().fg(colors::SLATE),
        )),
        None => block,
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.spots.data().is_none() {
        let text = if state.spots_state().is_loading {
            "Loading spots..."
        } else {
            "No data"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(colors::SLATE)))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let layout = state.layout();
    if layout.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No spots reported for this camera",
                Style::default().fg(colors::SLATE),
            ))
            .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let selected = state.selected_spot().map(|s| s.id);
    let width = inner.width as usize;
    let lines = match &layout {
        SpotLayout::Grid(spots) => tile_lines(spots, selected, width),
        SpotLayout::Rows(groups) => {
            let mut lines = Vec::new();
            for group in groups {
                lines.push(row_heading(group));
                lines.extend(tile_lines(&group.spots, selected, width));
                lines.push(Line::from(""));
            }
            lines
        }
        SpotLayout::Street(sections) => {
            let mut lines = Vec::new();
            for section in sections {
                if let Some(top) = &section.top {
                    lines.push(row_heading(top));
                    lines.extend(tile_lines(&top.spots, selected, width));
                }
                lines.push(lane_line(width));
                lines.extend(tile_lines(&section.bottom.spots, selected, width));
                lines.push(row_heading(&section.bottom));
                lines.push(Line::from(""));
            }
            lines
        }
    };

    let scroll = cursor_scroll(&layout, state, inner.height as usize, width);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

fn spot_span(spot: &ParkingSpot, selected: Option<i64>) -> Span<'static> {
    let (icon, color) = if spot.occupied {
        ("●", colors::OCCUPIED)
    } else {
        ("○", colors::FREE)
    };

    let mut style = Style::default().fg(color);
    if selected == Some(spot.id) {
        style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
    }

    Span::styled(format!(" {} {} ", icon, spot.label), style)
}

fn tile_width(spots: &[ParkingSpot]) -> usize {
    spots
        .iter()
        .map(|s| s.label.chars().count() + 5)
        .max()
        .unwrap_or(8)
}

fn tile_lines(spots: &[ParkingSpot], selected: Option<i64>, width: usize) -> Vec<Line<'static>> {
    let per_line = (width / tile_width(spots).max(1)).max(1);
    spots
        .chunks(per_line)
        .map(|chunk| {
            let mut spans = Vec::with_capacity(chunk.len() * 2);
            for spot in chunk {
                spans.push(spot_span(spot, selected));
                spans.push(Span::raw(" "));
            }
            Line::from(spans)
        })
        .collect()
}

fn row_heading(group: &RowGroup) -> Line<'static> {
    let (occupied, total) = occupancy_counts(&group.spots);
    Line::from(vec![
        Span::styled(
            format!(" ROW {} ", group.row),
            Style::default().fg(colors::BG_DARK).bg(colors::SLATE).bold(),
        ),
        Span::styled(
            format!("  {}/{} occupied", occupied, total),
            Style::default().fg(colors::SLATE),
        ),
    ])
}

fn lane_line(width: usize) -> Line<'static> {
    let label = " TRAFFIC LANE ";
    let side = width.saturating_sub(label.len()) / 2;
    Line::from(Span::styled(
        format!("{}{}{}", "═".repeat(side), label, "═".repeat(side)),
        Style::default().fg(colors::DARK_AMBER),
    ))
}

/// Vertical scroll that keeps the cursor's tile in view. Only the grid layout
/// can overflow in practice, so the others stay pinned to the top.
fn cursor_scroll(layout: &SpotLayout, state: &DashboardState, height: usize, width: usize) -> u16 {
    match layout {
        SpotLayout::Grid(spots) if height > 0 => {
            let per_line = (width / tile_width(spots).max(1)).max(1);
            let line = state.spot_cursor / per_line;
            line.saturating_sub(height.saturating_sub(1)) as u16
        }
        _ => 0,
    }
}

fn draw_analytics_panel(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .title(Span::styled(
            format!(" ANALYTICS  ·  {} ", state.selected_camera_name().to_uppercase()),
            Style::default().fg(colors::WHITE).bold(),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors::SLATE))
        .style(Style::default().bg(colors::BG_PANEL));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let values = stat_values(state.analytics.data());
    for (r, row) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(*row);

        for (c, cell) in cells.iter().enumerate() {
            let idx = r * 3 + c;
            let (value, color) = &values[idx];
            draw_stat_box(frame, *cell, STAT_TITLES[idx], value, *color);
        }
    }
}

/// Display values for the six stat boxes, "N/A" until the first result.
fn stat_values(metrics: Option<&DashboardMetrics>) -> Vec<(String, Color)> {
    let Some(m) = metrics else {
        return STAT_TITLES
            .iter()
            .map(|_| ("N/A".to_string(), colors::SLATE))
            .collect();
    };

    let or_na = |v: Option<String>| v.unwrap_or_else(|| "N/A".to_string());
    let status_color = match m.status {
        parkkit::types::SystemStatus::Online => colors::FREE,
        parkkit::types::SystemStatus::Offline => colors::OCCUPIED,
    };

    vec![
        (format_occupancy(m.occupancy_pct), colors::INDIGO),
        (or_na(m.peak_hour.clone()), colors::OCCUPIED),
        (or_na(m.least_busy_hour.clone()), colors::FREE),
        (
            m.top_row
                .as_ref()
                .map(|r| format!("Row {}", r))
                .unwrap_or_else(|| "-".to_string()),
            colors::INDIGO,
        ),
        (
            m.current_excessive
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "None".to_string()),
            colors::AMBER,
        ),
        (m.status.to_string(), status_color),
    ]
}

fn draw_stat_box(frame: &mut Frame, area: Rect, label: &str, value: &str, value_color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SLATE))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = vec![
        Line::from(Span::styled(
            label,
            Style::default().fg(colors::SLATE).add_modifier(Modifier::DIM),
        )),
        Line::from(Span::styled(
            value,
            Style::default().fg(value_color).add_modifier(Modifier::BOLD),
        )),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

fn draw_metrics_chart(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let simulated = state.metrics.state().is_offline();
    let title = if simulated {
        " HOURLY OCCUPANCY (simulated) "
    } else {
        " HOURLY OCCUPANCY "
    };

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(colors::AMBER).bold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors::DARK_AMBER))
        .style(Style::default().bg(colors::BG_PANEL));

    let series = state.metrics.data().map(Vec::as_slice).unwrap_or_default();
    if series.is_empty() {
        let text = if state.metrics.state().is_loading {
            "Loading metrics..."
        } else {
            "No data"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(colors::SLATE)))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.occupancy))
        .collect();

    let last = series.len() - 1;
    let x_labels: Vec<Span> = [0, last / 2, last]
        .iter()
        .map(|&i| Span::styled(series[i].hour.clone(), Style::default().fg(colors::SLATE)))
        .collect();

    let dataset = Dataset::default()
        .name("occupancy %")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(colors::INDIGO))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(colors::SLATE))
                .bounds([0.0, last.max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(colors::SLATE))
                .bounds([0.0, 100.0])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw("50"),
                    Span::raw("100"),
                ]),
        );

    frame.render_widget(chart, area);
}

fn draw_activity_panel(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .title(Span::styled(
            " ACTIVITY LOG ",
            Style::default().fg(colors::WHITE).bold(),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SLATE))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL));

    let logs: Vec<Line> = state
        .activity_log
        .iter()
        .rev()
        .skip(state.scroll_offset)
        .take(20)
        .map(|entry| {
            let (prefix, color) = match entry.level {
                LogLevel::Warn => ("[WRN]", colors::AMBER),
                LogLevel::Info => ("[INF]", colors::FREE),
            };

            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(colors::SLATE).add_modifier(Modifier::DIM),
                ),
                Span::styled(format!("{} ", prefix), Style::default().fg(color)),
                Span::styled(&entry.message, Style::default().fg(colors::WHITE)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(logs).block(block).wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, demo_mode: bool) {
    let key = |k: &'static str, bg: Color| {
        Span::styled(k, Style::default().fg(colors::BG_DARK).bg(bg))
    };
    let label = |l: &'static str| Span::styled(l, Style::default().fg(colors::SLATE));

    let mut spans = vec![
        key(" [Q] ", colors::OCCUPIED),
        label(" Quit "),
        Span::raw(" "),
        key(" [TAB] ", colors::INDIGO),
        label(" Camera "),
        Span::raw(" "),
        key(" [G/R/S] ", colors::AMBER),
        label(" Grid/Rows/Street "),
        Span::raw(" "),
        key(" [←/→] ", colors::WHITE),
        label(" Spot "),
        Span::raw(" "),
        key(" [F5] ", colors::FREE),
        label(" Refresh "),
    ];
    if demo_mode {
        spans.push(Span::raw(" "));
        spans.push(key(" [T] ", colors::AMBER));
        spans.push(label(" Toggle spot "));
    }

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(colors::INDIGO))
                .style(Style::default().bg(colors::BG_DARK)),
        );

    frame.render_widget(footer, area);
}

fn describe_spot(spot: &ParkingSpot) -> String {
    format!("{} · {}", spot.label, status_label(spot.occupied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ViewMode;
    use crate::mock::mock_dashboard_metrics;
    use parkkit::config::DashboardConfig;
    use ratatui::backend::TestBackend;

    fn spot(id: i64, row: u32, occupied: bool) -> ParkingSpot {
        ParkingSpot {
            id,
            label: format!("R{}-S{}", row, id),
            row,
            occupied,
        }
    }

    #[test]
    fn test_tile_lines_wrap_to_width() {
        let spots: Vec<ParkingSpot> = (1..=6).map(|i| spot(i, 1, false)).collect();
        // label "R1-Sn" is 5 chars, tile is 10 wide
        assert_eq!(tile_lines(&spots, None, 30).len(), 2);
        assert_eq!(tile_lines(&spots, None, 5).len(), 6);
    }

    #[test]
    fn test_stat_values_before_and_after_load() {
        assert!(stat_values(None).iter().all(|(v, _)| v == "N/A"));

        let values: Vec<String> = stat_values(Some(&mock_dashboard_metrics()))
            .into_iter()
            .map(|(v, _)| v)
            .collect();
        assert_eq!(values, vec!["45%", "18:00", "03:00", "Row 2", "A-12", "Offline"]);
    }

    #[test]
    fn test_draw_ui_renders_without_data() {
        let state = DashboardState::new(&DashboardConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| draw_ui(frame, &state, false)).unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("PARKING-DASH"));
        assert!(rendered.contains("CAM1"));
    }

    #[test]
    fn test_describe_spot() {
        assert_eq!(describe_spot(&spot(3, 2, true)), "R2-S3 · Occupied");
    }

    #[test]
    fn test_every_mode_draws() {
        let mut state = DashboardState::new(&DashboardConfig::default());
        let now = std::time::Instant::now();
        state.start(now);
        for request in state.due_requests(now) {
            if let crate::state::FetchRequest::Spots { session } = request {
                state.apply(
                    crate::state::Completion::Spots {
                        session,
                        result: Ok(crate::mock::mock_spot_records("cam3")),
                    },
                    now,
                );
            }
        }

        for mode in ViewMode::ALL {
            state.set_view_mode(mode);
            let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
            terminal.draw(|frame| draw_ui(frame, &state, true)).unwrap();
        }
    }
}
