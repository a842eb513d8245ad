use crate::app::{App, AssetStatus};
use crate::map::{MapLayers, Rgb};
use crate::tooltip::TooltipContent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

const TOOLTIP_WIDTH: u16 = 36;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let inner = render_map(frame, app, chunks[0]);
    if let Some(content) = app.tooltip.content() {
        render_tooltip(frame, content, inner);
    }
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " 浙江省 ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut camera = app.camera.clone();
    camera.set_size(inner.width as usize * 2, inner.height as usize * 4);

    let layers = app
        .renderer
        .render(&app.scene, &camera, inner.width as usize, inner.height as usize);

    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let inside = col >= inner.x && row >= inner.y && col < inner.x + inner.width && row < inner.y + inner.height;
        inside.then(|| (col - inner.x, row - inner.y))
    });

    let style = app.renderer.style();
    let map_widget = MapWidget {
        layers,
        cursor_pos,
        hovering: app.hovering,
        background: style.background,
        label_color: style.label_color,
        highlight: style.highlight_color,
    };
    frame.render_widget(map_widget, inner);
    inner
}

/// Braille map with per-cell colors and text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
    hovering: bool,
    background: Rgb,
    label_color: Rgb,
    highlight: Rgb,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let background = Color::from(self.background);
        let canvas = &self.layers.canvas;

        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                let x = area.x + col_idx as u16;
                let cell = &mut buf[(x, y)];
                cell.set_bg(background);
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let fg = canvas.cell_color(col_idx, row_idx).map_or(Color::Gray, Color::from);
                cell.set_char(ch).set_fg(fg);
            }
        }

        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            // Labels take the color of the region under them as background
            let bg = canvas
                .cell_color(*lx as usize, *ly as usize)
                .map_or(background, Color::from);
            let style = Style::default()
                .fg(Color::from(self.label_color))
                .bg(bg)
                .add_modifier(Modifier::BOLD);
            let max_width = (area.width - *lx) as usize;
            buf.set_stringn(area.x + *lx, area.y + *ly, text, max_width, style);
        }

        if let Some((cx, cy)) = self.cursor_pos {
            let (glyph, color) = if self.hovering {
                ('◆', Color::from(self.highlight))
            } else {
                ('╋', Color::DarkGray)
            };
            buf[(area.x + cx, area.y + cy)].set_char(glyph).set_fg(color);
        }
    }
}

/// Selected region's attractions, pinned to the top right of the map
fn render_tooltip(frame: &mut Frame, content: &TooltipContent, map: Rect) {
    let width = TOOLTIP_WIDTH.min(map.width);
    let mut lines: Vec<Line> = Vec::new();
    if content.entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "No attractions listed",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for attraction in &content.entries {
        lines.push(Line::from(Span::styled(
            attraction.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(attraction.description.clone()));
    }

    let wanted = lines.len() as u16 + 2;
    let height = wanted.min(map.height);
    let area = Rect::new(map.x + map.width - width, map.y, width, height);

    let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(Span::styled(
                format!(" {} ", content.heading),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(panel, area);
}

fn asset_span(name: &'static str, status: AssetStatus) -> Span<'static> {
    let (mark, color) = match status {
        AssetStatus::Loading => ("…", Color::Yellow),
        AssetStatus::Ready => ("✓", Color::Green),
        AssetStatus::Failed => ("✗", Color::Red),
    };
    Span::styled(format!("{name}{mark} "), Style::default().fg(color))
}

fn toggle_span(on: &'static str, off: &'static str, enabled: bool) -> Span<'static> {
    Span::styled(
        if enabled { on } else { off },
        Style::default().fg(if enabled { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.renderer.settings;

    let status = Line::from(vec![
        Span::styled(" Selected: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.selected_name().unwrap_or("none").to_string(),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            app.selected_region()
                .and_then(|r| r.center_hint)
                .map(|(lon, lat)| format!(" ({lon:.2}°, {lat:.2}°)"))
                .unwrap_or_default(),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            if app.hovering { " ◆ " } else { "   " },
            Style::default().fg(Color::Yellow),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        asset_span("map", app.status.boundaries),
        asset_span("font", app.status.font),
        asset_span("travel", app.status.attractions),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        toggle_span("[O]utline ", "[o]utline ", settings.show_outlines),
        toggle_span("[L]abels ", "[l]abels ", settings.show_labels),
        toggle_span("[G]rid ", "[g]rid ", settings.show_grid),
        Span::styled(
            "| drag/hjkl:orbit click:select x:clear r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
