use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::image::MAX_COLOR;
use crate::mode::Tool;

/// Keys the editor understands, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Left,
    Right,
    Up,
    Down,
}

/// Normalized input fed into the session. Coordinates are in the
/// renderer's surface space (terminal columns/rows for the TUI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    KeyPress(Key),
}

/// Actions a key can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PickTool(Tool),
    PickColor(u8),
    Undo,
    Redo,
    Copy,
    Paste,
    Crop,
    FlipX,
    FlipY,
    RotateCw,
    RotateCcw,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    StartOver,
    Submit,
    NextTest,
    PrevTest,
    ToggleOverview,
    RevealSolutions,
    // handled by the application, not the session
    ToggleGrid,
    Replay,
    CommandLine,
    Quit,
}

impl Action {
    /// Parse an action name as written in the `[keys]` settings table
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(color) = name.strip_prefix("color") {
            return color
                .parse()
                .ok()
                .filter(|&c| c <= MAX_COLOR)
                .map(Action::PickColor);
        }
        let action = match name {
            "draw" => Action::PickTool(Tool::Draw),
            "select" => Action::PickTool(Tool::Select),
            "fill" => Action::PickTool(Tool::Fill),
            "undo" => Action::Undo,
            "redo" => Action::Redo,
            "copy" => Action::Copy,
            "paste" => Action::Paste,
            "crop" => Action::Crop,
            "flipx" => Action::FlipX,
            "flipy" => Action::FlipY,
            "rotatecw" => Action::RotateCw,
            "rotateccw" => Action::RotateCcw,
            "moveleft" => Action::MoveLeft,
            "moveright" => Action::MoveRight,
            "moveup" => Action::MoveUp,
            "movedown" => Action::MoveDown,
            "startover" => Action::StartOver,
            "submit" => Action::Submit,
            "nexttest" => Action::NextTest,
            "prevtest" => Action::PrevTest,
            "overview" => Action::ToggleOverview,
            "reveal" => Action::RevealSolutions,
            "grid" => Action::ToggleGrid,
            "replay" => Action::Replay,
            "command" => Action::CommandLine,
            "quit" => Action::Quit,
            _ => return None,
        };
        Some(action)
    }
}

impl Key {
    /// A single character, or one of enter, escape, left, right, up, down
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(c));
        }
        match name.to_lowercase().as_str() {
            "enter" => Some(Key::Enter),
            "esc" | "escape" => Some(Key::Escape),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            _ => None,
        }
    }
}

/// Where the image is drawn on the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub surface_width: f64,
    pub surface_height: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_width: 1.0,
            cell_height: 1.0,
            surface_width: 0.0,
            surface_height: 0.0,
        }
    }
}

impl GridLayout {
    /// Cell under a surface position, may lie outside the image
    pub fn cell_at(&self, x: f64, y: f64) -> (i32, i32) {
        let cx = ((x - self.origin_x) / self.cell_width).floor() as i32;
        let cy = ((y - self.origin_y) / self.cell_height).floor() as i32;
        (cx, cy)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.surface_width / 2.0, self.surface_height / 2.0)
    }

    /// Top-left cell for an image of `width`x`height` cells centered on (x, y)
    pub fn paste_origin(&self, width: usize, height: usize, x: f64, y: f64) -> (i32, i32) {
        let half_width = (width as f64 * self.cell_width / 2.0).floor();
        let half_height = (height as f64 * self.cell_height / 2.0).floor();
        let min_x = ((x - half_width - self.origin_x) / self.cell_width + 0.5).floor() as i32;
        let min_y = ((y - half_height - self.origin_y) / self.cell_height + 0.5).floor() as i32;
        (min_x, min_y)
    }
}

/// Check for escape key (Esc or Ctrl+[)
pub fn is_escape(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('[') && key.modifiers.contains(KeyModifiers::CONTROL))
}

pub fn key_from_crossterm(key: KeyEvent) -> Option<Key> {
    if is_escape(key) {
        return Some(Key::Escape);
    }
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        _ => None,
    }
}

pub fn pointer_from_crossterm(mouse: MouseEvent) -> Option<InputEvent> {
    let x = mouse.column as f64;
    let y = mouse.row as f64;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(InputEvent::PointerDown { x, y }),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(InputEvent::PointerMove { x, y })
        }
        MouseEventKind::Up(MouseButton::Left) => Some(InputEvent::PointerUp),
        _ => None,
    }
}

/// Line editor for the `:` prompt
pub struct CommandHandler {
    pub buffer: String,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn start(&mut self) {
        self.buffer.clear();
    }

    /// Escape, or backspace on an empty line, cancels the prompt
    pub fn handle_key(&mut self, key: KeyEvent) -> CommandInput {
        if is_escape(key) {
            self.buffer.clear();
            return CommandInput::Cancelled;
        }

        match key.code {
            KeyCode::Enter => CommandInput::Submitted(std::mem::take(&mut self.buffer)),
            KeyCode::Backspace => {
                if self.buffer.pop().is_none() {
                    return CommandInput::Cancelled;
                }
                CommandInput::Editing
            }
            KeyCode::Char(c) => {
                self.buffer.push(c);
                CommandInput::Editing
            }
            _ => CommandInput::Editing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandInput {
    Editing,
    Submitted(String),
    Cancelled,
}
