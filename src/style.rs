use ratatui::style::{Color, Modifier, Style as RatStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Color that can be serialized/deserialized
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeColor {
    /// Named color: "red", "blue", "cyan", etc.
    Named(NamedColor),
    /// RGB color: [255, 128, 0]
    Rgb([u8; 3]),
    /// 256-color index: 42
    Indexed(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
    DarkGray,
    White,
    Reset,
}

impl From<ThemeColor> for Color {
    fn from(tc: ThemeColor) -> Color {
        match tc {
            ThemeColor::Named(n) => match n {
                NamedColor::Black => Color::Black,
                NamedColor::Red => Color::Red,
                NamedColor::Green => Color::Green,
                NamedColor::Yellow => Color::Yellow,
                NamedColor::Blue => Color::Blue,
                NamedColor::Magenta => Color::Magenta,
                NamedColor::Cyan => Color::Cyan,
                NamedColor::Gray => Color::Gray,
                NamedColor::DarkGray => Color::DarkGray,
                NamedColor::White => Color::White,
                NamedColor::Reset => Color::Reset,
            },
            ThemeColor::Rgb([r, g, b]) => Color::Rgb(r, g, b),
            ThemeColor::Indexed(i) => Color::Indexed(i),
        }
    }
}

/// 0xRRGGBB
const fn hex(value: u32) -> ThemeColor {
    ThemeColor::Rgb([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

/// Style definition for a single element
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg: Option<ThemeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<ThemeColor>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub dim: bool,
}

impl ElementStyle {
    pub fn fg(color: ThemeColor) -> Self {
        Self { fg: Some(color), ..Default::default() }
    }

    pub fn with_bg(mut self, color: ThemeColor) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn to_ratatui(&self) -> RatStyle {
        let mut style = RatStyle::default();
        if let Some(fg) = self.fg {
            style = style.fg(fg.into());
        }
        if let Some(bg) = self.bg {
            style = style.bg(bg.into());
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.dim {
            style = style.add_modifier(Modifier::DIM);
        }
        style
    }
}

/// Cell palette plus the styles of the surrounding UI
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,

    /// One color per cell value 0-9
    pub palette: [ThemeColor; 10],

    // Editor surface
    pub grid: ElementStyle,
    pub selection: ElementStyle,
    pub paste_preview: ElementStyle,
    pub title: ElementStyle,

    // Status bar
    pub status_bar: ElementStyle,
    pub status_tool: ElementStyle,

    // Messages
    pub message_info: ElementStyle,
    pub message_error: ElementStyle,

    // Command line
    pub command_line: ElementStyle,
    pub command_prompt: ElementStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self::standard()
    }
}

impl Theme {
    fn with_palette(name: &str, palette: [ThemeColor; 10]) -> Self {
        use NamedColor::*;
        Self {
            name: name.to_string(),
            palette,
            grid: ElementStyle::fg(ThemeColor::Named(DarkGray)),
            selection: ElementStyle::fg(ThemeColor::Named(White)).with_bold(),
            paste_preview: ElementStyle::fg(ThemeColor::Named(Yellow)).with_bold(),
            title: ElementStyle::fg(ThemeColor::Named(Cyan)).with_bold(),
            status_bar: ElementStyle::fg(ThemeColor::Named(White))
                .with_bg(ThemeColor::Named(DarkGray)),
            status_tool: ElementStyle::fg(ThemeColor::Named(Black))
                .with_bg(ThemeColor::Named(Cyan))
                .with_bold(),
            message_info: ElementStyle::fg(ThemeColor::Named(Gray)),
            message_error: ElementStyle::fg(ThemeColor::Named(Red)).with_bold(),
            command_line: ElementStyle::fg(ThemeColor::Named(White)),
            command_prompt: ElementStyle::fg(ThemeColor::Named(Cyan)),
        }
    }

    /// The ARC palette
    pub fn standard() -> Self {
        Self::with_palette(
            "default",
            [
                hex(0x000000), // black
                hex(0x0074d9), // blue
                hex(0xff4136), // red
                hex(0x2ecc40), // green
                hex(0xffdc00), // yellow
                hex(0xaaaaaa), // gray
                hex(0xf012be), // fuchsia
                hex(0xff851b), // orange
                hex(0x7fdbff), // teal
                hex(0x870c25), // brown
            ],
        )
    }

    pub fn greyscale() -> Self {
        let mut palette = [hex(0); 10];
        for (i, slot) in palette.iter_mut().enumerate() {
            let v = (i * 255 / 9) as u8;
            *slot = ThemeColor::Rgb([v, v, v]);
        }
        let mut theme = Self::with_palette("greyscale", palette);
        theme.selection = ElementStyle::fg(ThemeColor::Named(NamedColor::Red)).with_bold();
        theme
    }

    /// Paul Tol's muted qualitative scheme
    pub fn paul_tol_muted() -> Self {
        Self::with_palette(
            "paultolmuted",
            [
                hex(0x332288),
                hex(0x88ccee),
                hex(0x44aa99),
                hex(0x117733),
                hex(0x999933),
                hex(0xddcc77),
                hex(0xcc6677),
                hex(0x882255),
                hex(0xaa4499),
                hex(0xdddddd),
            ],
        )
    }

    pub fn c64() -> Self {
        let mut theme = Self::with_palette(
            "c64",
            [
                hex(0x000000),
                hex(0x0000aa),
                hex(0x880000),
                hex(0x00cc55),
                hex(0xeeee77),
                hex(0x777777),
                hex(0xcc44cc),
                hex(0xdd8855),
                hex(0xaaffee),
                hex(0x664400),
            ],
        );
        let light_blue = hex(0x0088ff);
        theme.status_bar = ElementStyle::fg(light_blue).with_bg(hex(0x0000aa));
        theme.status_tool = ElementStyle::fg(hex(0x0000aa)).with_bg(light_blue).with_bold();
        theme.command_prompt = ElementStyle::fg(light_blue);
        theme.message_info = ElementStyle::fg(light_blue).with_dim();
        theme
    }

    /// Load theme from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Get theme by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::standard()),
            "greyscale" | "grayscale" => Some(Self::greyscale()),
            "paultolmuted" => Some(Self::paul_tol_muted()),
            "c64" => Some(Self::c64()),
            _ => None,
        }
    }

    /// List available built-in themes
    pub fn builtin_names() -> &'static [&'static str] {
        &["default", "greyscale", "paultolmuted", "c64"]
    }
}

/// Runtime style manager
pub struct Style {
    pub theme: Theme,
    show_grid: bool,
}

impl Style {
    pub fn new(theme: Theme, show_grid: bool) -> Self {
        Self { theme, show_grid }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
    }

    pub fn has_grid(&self) -> bool {
        self.show_grid
    }

    /// Color of a cell value. Values without a palette slot fall back to reset.
    pub fn cell_color(&self, value: u8) -> Color {
        self.theme
            .palette
            .get(value as usize)
            .map(|&c| c.into())
            .unwrap_or(Color::Reset)
    }

    pub fn grid(&self) -> RatStyle {
        self.theme.grid.to_ratatui()
    }

    pub fn selection(&self) -> RatStyle {
        self.theme.selection.to_ratatui()
    }

    pub fn paste_preview(&self) -> RatStyle {
        self.theme.paste_preview.to_ratatui()
    }

    pub fn title(&self) -> RatStyle {
        self.theme.title.to_ratatui()
    }

    pub fn status_bar(&self) -> RatStyle {
        self.theme.status_bar.to_ratatui()
    }

    pub fn status_tool(&self) -> RatStyle {
        self.theme.status_tool.to_ratatui()
    }

    pub fn message_info(&self) -> RatStyle {
        self.theme.message_info.to_ratatui()
    }

    pub fn message_error(&self) -> RatStyle {
        self.theme.message_error.to_ratatui()
    }

    pub fn command_line(&self) -> RatStyle {
        self.theme.command_line.to_ratatui()
    }

    pub fn command_prompt(&self) -> RatStyle {
        self.theme.command_prompt.to_ratatui()
    }
}
