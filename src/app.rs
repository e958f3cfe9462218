use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::Settings;
use crate::history::HistoryFile;
use crate::input::{
    is_escape, key_from_crossterm, pointer_from_crossterm, Action, CommandHandler, CommandInput,
    InputEvent,
};
use crate::replay::{step_from_millis, CancelToken, Replay, ReplayPlayer};
use crate::session::{EditResult, Outcome, Session};
use crate::style::{Style, Theme};
use crate::submit::{submit_and_log, SubmissionSink};
use crate::ui;

type Backend = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Command,
}

pub struct Message {
    pub text: String,
    pub is_error: bool,
}

/// Replay overlay of the running session
pub struct ReplayView {
    pub player: ReplayPlayer,
    token: CancelToken,
}

pub struct App {
    pub session: Session,
    pub style: Style,
    pub mode: AppMode,
    pub command_handler: CommandHandler,
    pub message: Option<Message>,
    pub replay: Option<ReplayView>,
    settings: Settings,
    settings_path: PathBuf,
    sink: Box<dyn SubmissionSink>,
    should_quit: bool,
}

impl App {
    pub fn new(
        mut session: Session,
        style: Style,
        settings: Settings,
        settings_path: PathBuf,
        sink: Box<dyn SubmissionSink>,
    ) -> Self {
        session.set_max_size(settings.max_image_size);
        Self {
            session,
            style,
            mode: AppMode::Normal,
            command_handler: CommandHandler::new(),
            message: None,
            replay: None,
            settings,
            settings_path,
            sink,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut Backend) -> io::Result<()> {
        while !self.should_quit {
            if let Some(replay) = self.replay.as_mut() {
                replay.player.tick(Instant::now());
            }

            let mut layout = None;
            terminal.draw(|f| layout = Some(ui::render(f, self)))?;
            if let Some(layout) = layout {
                self.session.set_layout(layout);
            }

            if poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.replay.is_some() {
            if is_escape(key) || key.code == KeyCode::Char('q') {
                self.close_replay();
            }
            return;
        }

        if self.mode == AppMode::Command {
            match self.command_handler.handle_key(key) {
                CommandInput::Editing => {}
                CommandInput::Cancelled => self.mode = AppMode::Normal,
                CommandInput::Submitted(line) => {
                    self.mode = AppMode::Normal;
                    self.execute_command(&line);
                }
            }
            return;
        }

        self.message = None;
        if let Some(key) = key_from_crossterm(key) {
            let result = self.session.handle(InputEvent::KeyPress(key));
            self.apply(result);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.replay.is_some() || self.mode == AppMode::Command {
            return;
        }
        if let Some(event) = pointer_from_crossterm(mouse) {
            let result = self.session.handle(event);
            self.apply(result);
        }
    }

    /// Turn a session result into application effects and status messages
    fn apply(&mut self, result: EditResult) {
        match result {
            Ok(Outcome::App(action)) => self.perform(action),
            Ok(Outcome::Submitted(correct)) => self.submitted(correct),
            Ok(Outcome::Changed) | Ok(Outcome::Unchanged) => {}
            Err(e) => self.set_error(e.to_string()),
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::ToggleGrid => self.toggle_grid(),
            Action::Replay => self.start_replay(),
            Action::CommandLine => {
                self.command_handler.start();
                self.mode = AppMode::Command;
            }
            Action::Quit => self.quit(),
            other => debug!(action = ?other, "not an application action"),
        }
    }

    fn submitted(&mut self, correct: Option<bool>) {
        match correct {
            Some(true) => {
                self.set_message("Correct!");
                self.write_history();
            }
            Some(false) => self.set_error("Incorrect"),
            None => self.set_message("Submitted, no expected output to compare"),
        }
    }

    fn execute_command(&mut self, line: &str) {
        let Some(command) = Command::parse(line) else {
            self.set_error(format!("Invalid command: {}", line));
            return;
        };
        match command {
            Command::Write => {
                if self.write_history() {
                    self.set_message("History written");
                }
            }
            Command::Quit => self.should_quit = true,
            Command::WriteQuit => self.quit(),
            Command::Resize { width, height } => {
                let result = self.session.resize(width, height);
                self.apply(result);
            }
            Command::Test(index) => {
                if index >= self.session.items().len() {
                    self.set_error(format!("No test {}", index + 1));
                } else {
                    self.session.activate_test(index);
                }
            }
            Command::Theme(name) => self.set_theme(&name),
            Command::ThemeList => {
                self.set_message(format!("Themes: {}", Theme::builtin_names().join(", ")));
            }
            Command::Grid => self.toggle_grid(),
            Command::Clip => match self.session.clipboard().to_system() {
                Ok(msg) => self.set_message(msg),
                Err(e) => self.set_error(e.to_string()),
            },
            Command::SysPaste => match self.session.clipboard_mut().from_system() {
                Ok(msg) => self.set_message(msg),
                Err(e) => self.set_error(e.to_string()),
            },
            Command::Replay => self.start_replay(),
            Command::Unknown(cmd) => self.set_error(format!("Unknown command: {}", cmd)),
        }
    }

    /// Hand the history to the sink. One attempt; failures only show up as a message.
    fn write_history(&mut self) -> bool {
        let file = self.session.to_history_file();
        let ok = submit_and_log(self.sink.as_ref(), &file);
        if !ok {
            self.set_error("Could not write history, see log");
        }
        ok
    }

    fn quit(&mut self) {
        if !self.session.log().is_empty() {
            self.write_history();
        }
        self.should_quit = true;
    }

    fn toggle_grid(&mut self) {
        self.style.toggle_grid();
        self.settings.show_grid = self.style.has_grid();
        self.save_settings();
    }

    fn set_theme(&mut self, name: &str) {
        match Theme::by_name(name) {
            Some(theme) => {
                self.style.set_theme(theme);
                self.settings.theme = name.to_lowercase();
                self.settings.theme_file = None;
                self.save_settings();
                self.set_message(format!("Theme: {}", name));
            }
            None => self.set_error(format!("Unknown theme: {}", name)),
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.settings.save(&self.settings_path) {
            warn!(error = %e, "could not save settings");
            self.set_error(format!("Could not save settings: {}", e));
        }
    }

    fn start_replay(&mut self) {
        let token = CancelToken::new();
        let replay = Replay::new(self.session.log().entries().to_vec(), token.clone());
        let step = step_from_millis(self.settings.replay_step_ms);
        info!(entries = self.session.log().len(), "replay started");
        self.replay = Some(ReplayView {
            player: ReplayPlayer::new(replay, step),
            token,
        });
    }

    fn close_replay(&mut self) {
        if let Some(replay) = self.replay.take() {
            replay.token.cancel();
            debug!(shown = replay.player.shown(), "replay closed");
        }
    }

    fn set_message(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            is_error: true,
        });
    }
}

/// Play back a history file until it is dismissed
pub fn run_replay(
    terminal: &mut Backend,
    file: HistoryFile,
    style: &Style,
    step: Duration,
) -> io::Result<()> {
    let title = format!("{} / {} by {}", file.dataset, file.task, file.user);
    let token = CancelToken::new();
    let mut player = ReplayPlayer::new(Replay::new(file.history, token.clone()), step);

    while !token.is_cancelled() {
        player.tick(Instant::now());
        terminal.draw(|f| ui::render_replay(f, style, &player, &title))?;

        if poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if is_escape(key) || key.code == KeyCode::Char('q') {
                    token.cancel();
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Task;
    use crate::session::SessionInfo;
    use crate::submit::DirectorySink;
    use crossterm::event::KeyModifiers;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const TASK: &str = r#"{
        "id": "t1",
        "train": [{"input": [[1]], "output": [[2]]}],
        "test": [{"input": [[0, 0], [0, 0]], "output": [[1, 1], [1, 1]]}]
    }"#;

    fn app(dir: &TempDir) -> App {
        let info = SessionInfo {
            user: "tester".to_string(),
            dataset: "ARC".to_string(),
            task: "t1".to_string(),
        };
        let session = Session::new(info, Task::from_json(TASK).unwrap()).unwrap();
        let settings = Settings {
            history_dir: dir.path().join("history"),
            ..Settings::default()
        };
        let sink = Box::new(DirectorySink::new(settings.history_dir.clone()));
        App::new(
            session,
            Style::new(Theme::default(), true),
            settings,
            dir.path().join("settings.toml"),
            sink,
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_command(app: &mut App, line: &str) {
        press(app, KeyCode::Char(':'));
        assert_eq!(app.mode, AppMode::Command);
        for c in line.chars() {
            press(app, KeyCode::Char(c));
        }
        press(app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
    }

    fn history_files(dir: &TempDir) -> usize {
        fs::read_dir(dir.path().join("history")).map_or(0, |entries| entries.count())
    }

    #[test]
    fn resize_from_command_line() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        type_command(&mut app, "resize 5x4");
        assert_eq!(app.session.image().width(), 5);
        assert_eq!(app.session.image().height(), 4);
    }

    #[test]
    fn invalid_resize_is_reported() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        type_command(&mut app, "resize 500x4");
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));
        assert_eq!(app.session.image().width(), 2);
    }

    #[test]
    fn missing_test_is_reported() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        type_command(&mut app, "test 3");
        assert_eq!(app.message.as_ref().map(|m| m.text.as_str()), Some("No test 3"));
    }

    #[test]
    fn empty_undo_shows_message() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('z'));
        let message = app.message.as_ref().unwrap();
        assert!(message.is_error);
        assert_eq!(message.text, "Nothing to undo");
    }

    #[test]
    fn escape_cancels_command_line() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char(':'));
        press(&mut app, KeyCode::Char('w'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(history_files(&dir), 0);
    }

    #[test]
    fn write_saves_history() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        type_command(&mut app, "w");
        assert_eq!(history_files(&dir), 1);
        assert!(!app.should_quit);
    }

    #[test]
    fn correct_submission_saves_history() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('s'));
        // with the select tool picking a color fills the selection
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.session.image(), app.session.item().expected().unwrap());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.message.as_ref().map(|m| m.text.as_str()), Some("Correct!"));
        assert_eq!(history_files(&dir), 1);
    }

    #[test]
    fn quit_writes_history() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
        assert_eq!(history_files(&dir), 1);
    }

    #[test]
    fn theme_and_grid_are_persisted() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        type_command(&mut app, "theme c64");
        press(&mut app, KeyCode::Char('g'));

        let saved = Settings::load(&dir.path().join("settings.toml")).unwrap();
        assert_eq!(saved.theme, "c64");
        assert!(!saved.show_grid);
        assert_eq!(app.style.theme.name, "c64");
    }

    #[test]
    fn unknown_theme_keeps_current() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        type_command(&mut app, "theme nope");
        assert_eq!(app.style.theme.name, "default");
        assert!(app.message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn replay_overlay_blocks_editing_until_closed() {
        let dir = tempdir().unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('P'));
        assert!(app.replay.is_some());

        let entries = app.session.log().len();
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.session.log().len(), entries);

        press(&mut app, KeyCode::Esc);
        assert!(app.replay.is_none());
    }
}
