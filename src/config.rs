use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::input::{Action, Key};
use crate::mode::Tool;

/// Key bindings for editor actions
pub struct KeyMap {
    bindings: HashMap<Key, Action>,
}

impl KeyMap {
    /// Defaults with the `[keys]` table applied on top. Entries whose key
    /// or action is not understood are returned instead of bound.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> (Self, Vec<String>) {
        let mut keymap = Self::default();
        let mut rejected = Vec::new();
        for (key, action) in overrides {
            match (Key::from_name(key), Action::from_name(action)) {
                (Some(key), Some(action)) => keymap.bind(key, action),
                _ => rejected.push(format!("{} = {}", key, action)),
            }
        }
        (keymap, rejected)
    }

    pub fn get(&self, key: Key) -> Option<Action> {
        self.bindings.get(&key).copied()
    }

    pub fn bind(&mut self, key: Key, action: Action) {
        self.bindings.insert(key, action);
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut bindings = HashMap::from([
            (Key::Char('p'), Action::PickTool(Tool::Draw)),
            (Key::Char('s'), Action::PickTool(Tool::Select)),
            (Key::Char('l'), Action::PickTool(Tool::Fill)),
            (Key::Char('c'), Action::Copy),
            (Key::Char('v'), Action::Paste),
            (Key::Char('x'), Action::Crop),
            (Key::Char('z'), Action::Undo),
            (Key::Char('y'), Action::Redo),
            (Key::Char('r'), Action::RotateCw),
            (Key::Char('R'), Action::RotateCcw),
            (Key::Char('f'), Action::FlipX),
            (Key::Char('F'), Action::FlipY),
            (Key::Left, Action::MoveLeft),
            (Key::Right, Action::MoveRight),
            (Key::Up, Action::MoveUp),
            (Key::Down, Action::MoveDown),
            (Key::Char('a'), Action::StartOver),
            (Key::Enter, Action::Submit),
            (Key::Char('n'), Action::NextTest),
            (Key::Char('N'), Action::PrevTest),
            (Key::Char('o'), Action::ToggleOverview),
            (Key::Char('e'), Action::RevealSolutions),
            (Key::Char('g'), Action::ToggleGrid),
            (Key::Char('P'), Action::Replay),
            (Key::Char(':'), Action::CommandLine),
            (Key::Char('q'), Action::Quit),
        ]);
        for color in 0..=9u8 {
            bindings.insert(Key::Char((b'0' + color) as char), Action::PickColor(color));
        }
        Self { bindings }
    }
}

/// User settings, stored as TOML
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user: String,
    pub dataset: String,
    pub dataset_dir: PathBuf,
    pub cache_dir: Option<PathBuf>,
    pub history_dir: PathBuf,
    pub theme: String,
    pub theme_file: Option<PathBuf>,
    pub show_grid: bool,
    pub max_image_size: usize,
    pub replay_step_ms: u64,
    pub log_level: String,
    /// Key name to action name, e.g. `u = "undo"`
    pub keys: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        let base = config_dir();
        Self {
            user: std::env::var("USER").unwrap_or_else(|_| "anonymous".to_string()),
            dataset: "ARC".to_string(),
            dataset_dir: base.join("datasets"),
            cache_dir: Some(base.join("cache")),
            history_dir: base.join("history"),
            theme: "default".to_string(),
            theme_file: None,
            show_grid: true,
            max_image_size: 100,
            replay_step_ms: 100,
            log_level: "info".to_string(),
            keys: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}

/// `~/.config/gridedit`, or the working directory when HOME is unset
pub fn config_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config").join("gridedit"),
        None => PathBuf::from("."),
    }
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}
