use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style as RatStyle,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

use crate::app::{App, AppMode};
use crate::image::Image;
use crate::input::GridLayout;
use crate::mode::Tool;
use crate::replay::ReplayPlayer;
use crate::selection::Selection;
use crate::style::Style;

/// Terminal columns per image cell
pub const CELL_WIDTH: u16 = 2;

pub fn render(frame: &mut Frame, app: &App) -> GridLayout {
    let surface = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(surface);

    render_title(frame, app, chunks[0]);

    let editor_area = if app.session.is_overview_visible() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);
        render_overview(frame, app, columns[0]);
        columns[1]
    } else {
        chunks[1]
    };

    let layout = match &app.replay {
        Some(replay) => {
            render_replay_view(frame, &app.style, &replay.player, editor_area);
            // pointer mapping keeps the editor's layout while the overlay is up
            app.session.layout()
        }
        None => render_editor(frame, app, editor_area, surface),
    };

    render_status_bar(frame, app, chunks[2]);
    render_command_line(frame, app, chunks[3]);
    layout
}

/// Full-screen playback of a history file
pub fn render_replay(frame: &mut Frame, style: &Style, player: &ReplayPlayer, title: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
        .split(frame.size());

    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {} ", title), style.title())),
        chunks[0],
    );
    render_replay_view(frame, style, player, chunks[1]);
    frame.render_widget(
        Paragraph::new(Span::styled(" Esc/q: close", style.message_info())),
        chunks[2],
    );
}

/// Center an image of `width`x`height` cells inside `area`
pub fn grid_layout(area: Rect, surface: Rect, width: usize, height: usize) -> GridLayout {
    let grid_width = (width as u16).saturating_mul(CELL_WIDTH);
    let grid_height = height as u16;
    let x = area.x + area.width.saturating_sub(grid_width) / 2;
    let y = area.y + area.height.saturating_sub(grid_height) / 2;
    GridLayout {
        origin_x: x as f64,
        origin_y: y as f64,
        cell_width: CELL_WIDTH as f64,
        cell_height: 1.0,
        surface_width: surface.width as f64,
        surface_height: surface.height as f64,
    }
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let info = app.session.info();
    let line = Line::from(vec![
        Span::styled(format!(" {} / {} ", info.dataset, info.task), app.style.title()),
        Span::styled(format!(" {}", info.user), app.style.message_info()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect, surface: Rect) -> GridLayout {
    let session = &app.session;
    let title = format!(
        " Test {}/{} ",
        session.current_index() + 1,
        session.items().len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style.grid())
        .title(Span::styled(title, app.style.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let image = session.image();
    let layout = grid_layout(inner, surface, image.width(), image.height());

    let mut view = GridView::new(image, &app.style, &layout);
    if session.tool() == Tool::Select {
        view = view.selection(session.selection());
    }
    if let (Some((x, y)), Some(clip)) = (session.paste_origin(), session.clipboard().image()) {
        view = view.paste(clip, x, y);
    }
    frame.render_widget(view, inner);
    layout
}

fn render_overview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style.grid())
        .title(Span::styled(" Overview ", app.style.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let session = &app.session;
    let mut rows: Vec<(String, &Image, Option<&Image>)> = session
        .task()
        .train
        .iter()
        .enumerate()
        .map(|(i, pair)| (format!("train {}", i + 1), &pair.input, pair.output.as_ref()))
        .collect();
    for item in session.items() {
        let output = if session.solutions_revealed() {
            item.expected()
        } else {
            None
        };
        rows.push((format!("test {}", item.id() + 1), item.input(), output));
    }

    let mut y = inner.y;
    for (label, input, output) in rows {
        if y >= inner.bottom() {
            break;
        }
        frame.render_widget(
            Paragraph::new(Span::styled(label, app.style.message_info())),
            Rect::new(inner.x, y, inner.width, 1),
        );
        y += 1;

        let height = input.height().max(output.map_or(0, Image::height)) as u16;
        let area = Rect::new(inner.x, y, inner.width, height.min(inner.bottom() - y));
        frame.render_widget(MiniGrid::new(input, &app.style, (area.x, area.y)), area);
        if let Some(output) = output {
            let arrow_x = area.x + input.width() as u16 + 1;
            if arrow_x + 2 < area.right() {
                frame.render_widget(
                    Paragraph::new("→"),
                    Rect::new(arrow_x, area.y, 1, 1),
                );
                frame.render_widget(
                    MiniGrid::new(output, &app.style, (arrow_x + 2, area.y)),
                    area,
                );
            }
        }
        y = y.saturating_add(height + 1);
    }
}

fn render_replay_view(frame: &mut Frame, style: &Style, player: &ReplayPlayer, area: Rect) {
    let title = match player.current() {
        Some(current) => format!(
            " Replay #{} {}: {} ",
            player.shown(),
            current.sequence_id,
            current.message
        ),
        None => " Replay ".to_string(),
    };
    let title = if player.is_finished() {
        format!("{}(done) ", title)
    } else {
        title
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style.paste_preview())
        .title(Span::styled(title, style.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(current) = player.current() {
        let layout = grid_layout(inner, frame.size(), current.image.width(), current.image.height());
        frame.render_widget(GridView::new(&current.image, style, &layout), inner);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let item = session.item();
    let history = item.history();

    let mut spans = vec![
        Span::styled(format!(" {} ", session.tool().display_name()), app.style.status_tool()),
        Span::raw(" "),
        Span::styled("  ", RatStyle::default().bg(app.style.cell_color(session.color()))),
        Span::raw(format!(" {}  ", session.color())),
        Span::raw(format!(
            "test {}/{}  undo {}",
            session.current_index() + 1,
            session.items().len(),
            history.undo_len()
        )),
    ];
    if let Some(memento) = history.peek_undo() {
        spans.push(Span::raw(format!(" ({})", memento.label())));
    }
    spans.push(Span::raw(format!(" redo {}", history.redo_len())));
    if let Some(memento) = history.peek_redo() {
        spans.push(Span::raw(format!(" ({})", memento.label())));
    }
    if session.is_paste_mode() {
        spans.push(Span::styled("  PASTE", app.style.paste_preview()));
    }
    if item.is_solved() {
        spans.push(Span::raw("  solved"));
    }

    let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let right = match session.log().last() {
        Some(entry) => format!("#{} {} ", entry.sequence_id, entry.message),
        None => String::new(),
    };
    let padding = (area.width as usize).saturating_sub(left_width + right.len());
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::raw(right));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(app.style.status_bar()),
        area,
    );
}

fn render_command_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.mode == AppMode::Command {
        Line::from(vec![
            Span::styled(":", app.style.command_prompt()),
            Span::styled(app.command_handler.buffer.as_str(), app.style.command_line()),
        ])
    } else if let Some(message) = &app.message {
        let style = if message.is_error {
            app.style.message_error()
        } else {
            app.style.message_info()
        };
        Line::from(Span::styled(message.text.as_str(), style))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Paints an image at a fixed origin, clipped to the render area
pub struct GridView<'a> {
    image: &'a Image,
    style: &'a Style,
    origin: (i32, i32),
    cell_width: u16,
    selection: Option<Selection>,
    paste: Option<(&'a Image, i32, i32)>,
}

impl<'a> GridView<'a> {
    pub fn new(image: &'a Image, style: &'a Style, layout: &GridLayout) -> Self {
        Self {
            image,
            style,
            origin: (layout.origin_x as i32, layout.origin_y as i32),
            cell_width: layout.cell_width as u16,
            selection: None,
            paste: None,
        }
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn paste(mut self, image: &'a Image, x: i32, y: i32) -> Self {
        self.paste = Some((image, x, y));
        self
    }

    fn paint(&self, buf: &mut Buffer, area: Rect, x: i32, y: i32, value: u8, marker: Option<(&str, RatStyle)>) {
        let row = self.origin.1 + y;
        if row < area.y as i32 || row >= area.bottom() as i32 {
            return;
        }
        let bg = self.style.cell_color(value);
        for i in 0..self.cell_width {
            let col = self.origin.0 + x * self.cell_width as i32 + i as i32;
            if col < area.x as i32 || col >= area.right() as i32 {
                continue;
            }
            let (symbol, style) = match marker {
                Some((symbol, style)) if i + 1 == self.cell_width => (symbol, style),
                _ if i == 0 && self.cell_width > 1 && self.style.has_grid() => ("▏", self.style.grid()),
                _ => (" ", RatStyle::default()),
            };
            buf.get_mut(col as u16, row as u16)
                .set_symbol(symbol)
                .set_style(style.bg(bg));
        }
    }
}

impl Widget for GridView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (y, row) in self.image.pixels().iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                let marker = match self.selection {
                    Some(selection) if selection.contains(x, y) => Some(("·", self.style.selection())),
                    _ => None,
                };
                self.paint(buf, area, x as i32, y as i32, value, marker);
            }
        }

        if let Some((clip, px, py)) = self.paste {
            let marker = Some(("+", self.style.paste_preview()));
            for (y, row) in clip.pixels().iter().enumerate() {
                for (x, &value) in row.iter().enumerate() {
                    self.paint(buf, area, px + x as i32, py + y as i32, value, marker);
                }
            }
        }
    }
}

/// One column per cell, used by the overview
struct MiniGrid<'a> {
    image: &'a Image,
    style: &'a Style,
    origin: (u16, u16),
}

impl<'a> MiniGrid<'a> {
    fn new(image: &'a Image, style: &'a Style, origin: (u16, u16)) -> Self {
        Self { image, style, origin }
    }
}

impl Widget for MiniGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (y, row) in self.image.pixels().iter().enumerate() {
            let row_y = self.origin.1 as usize + y;
            if row_y >= area.bottom() as usize {
                break;
            }
            for (x, &value) in row.iter().enumerate() {
                let col = self.origin.0 as usize + x;
                if col >= area.right() as usize {
                    break;
                }
                buf.get_mut(col as u16, row_y as u16)
                    .set_symbol(" ")
                    .set_bg(self.style.cell_color(value));
            }
        }
    }
}
