mod app;
mod cache;
mod clipboard;
mod command;
mod config;
mod error;
mod history;
mod image;
mod input;
mod item;
mod mode;
mod puzzle;
mod replay;
mod selection;
mod session;
mod style;
mod submit;
mod ui;
mod undo;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::panic;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn, Level};
use tracing_subscriber::fmt::writer::MakeWriter;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::App;
use cache::{DirCache, NoCache};
use config::{config_dir, default_settings_path, KeyMap, Settings};
use error::Result;
use puzzle::{DatasetSource, FileSource, PuzzleSource, Task};
use session::{Session, SessionInfo};
use style::{Style, Theme};
use submit::{load_history, DirectorySink};

#[derive(Debug, Default)]
struct Args {
    task_id: Option<String>,
    dataset: Option<String>,
    task_file: Option<PathBuf>,
    replay: Option<PathBuf>,
    config: Option<PathBuf>,
    user: Option<String>,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--dataset" => {
                parsed.dataset = Some(option_value(&args, i));
                i += 2;
            }
            "--task-file" => {
                parsed.task_file = Some(PathBuf::from(option_value(&args, i)));
                i += 2;
            }
            "--replay" => {
                parsed.replay = Some(PathBuf::from(option_value(&args, i)));
                i += 2;
            }
            "-c" | "--config" => {
                parsed.config = Some(PathBuf::from(option_value(&args, i)));
                i += 2;
            }
            "-u" | "--user" => {
                parsed.user = Some(option_value(&args, i));
                i += 2;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
            _ => {
                parsed.task_id = Some(args[i].clone());
                i += 1;
            }
        }
    }

    parsed
}

fn option_value(args: &[String], i: usize) -> String {
    match args.get(i + 1) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires an argument", args[i]);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    eprintln!("gridedit - A terminal editor for colored-grid puzzles");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    gridedit [OPTIONS] <TASK_ID>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -d, --dataset <ID>        Dataset to load the task from");
    eprintln!("    --task-file <PATH>        Load a single task JSON file instead of a dataset");
    eprintln!("    --replay <HISTORY_JSON>   Play back a saved history file");
    eprintln!("    -c, --config <PATH>       Settings file (default ~/.config/gridedit/settings.toml)");
    eprintln!("    -u, --user <NAME>         User name recorded in the history");
    eprintln!("    -h, --help                Print this help message");
    eprintln!();
    eprintln!("Diagnostics are written to ~/.config/gridedit/gridedit.log");
}

/// Restore the terminal and log panics
fn install_panic_hook() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);

        if let Some(location) = info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                "panic occured"
            );
        } else {
            error!("panic occured");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }

        default_hook(info);
    }));
}

/// A `MakeWriter` for `tracing` that appends to a log file, the screen
/// belongs to the editor.
pub struct LogFileWriter {
    path: PathBuf,
}

impl<'a> MakeWriter<'a> for LogFileWriter {
    type Writer = LogFileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .ok();
        LogFileHandle { file }
    }
}

/// Drops output when the log file cannot be opened
pub struct LogFileHandle {
    file: Option<File>,
}

impl Write for LogFileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn init_logging(settings: &Settings) {
    let dir = config_dir();
    let _ = fs::create_dir_all(&dir);
    let level = settings.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(LogFileWriter {
            path: dir.join("gridedit.log"),
        })
        .init();
}

/// Theme file first, then the named built-in theme
fn load_theme(settings: &Settings) -> Theme {
    if let Some(path) = &settings.theme_file {
        match Theme::from_file(path) {
            Ok(theme) => return theme,
            Err(e) => warn!(error = %e, path = %path.display(), "could not load theme file"),
        }
    }
    Theme::by_name(&settings.theme).unwrap_or_else(|| {
        warn!(theme = %settings.theme, "unknown theme, using default");
        Theme::default()
    })
}

fn load_task(settings: &Settings, task_file: Option<&Path>, task_id: &str) -> Result<Task> {
    match (task_file, &settings.cache_dir) {
        (Some(path), _) => FileSource::new(path).load_task(task_id),
        (None, Some(cache_dir)) => {
            DatasetSource::new(&settings.dataset, &settings.dataset_dir, DirCache::new(cache_dir))
                .load_task(task_id)
        }
        (None, None) => {
            DatasetSource::new(&settings.dataset, &settings.dataset_dir, NoCache).load_task(task_id)
        }
    }
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()
}

fn main() -> Result<()> {
    let args = parse_args();

    let settings_path = args.config.clone().unwrap_or_else(default_settings_path);
    let mut settings = Settings::load(&settings_path)?;
    if let Some(user) = args.user {
        settings.user = user;
    }
    if let Some(dataset) = args.dataset {
        settings.dataset = dataset;
    }

    init_logging(&settings);
    info!("gridedit started");

    install_panic_hook();

    let style = Style::new(load_theme(&settings), settings.show_grid);

    if let Some(path) = args.replay {
        let file = load_history(&path).map_err(|e| {
            error!(error = %e, path = %path.display(), "failed to load history");
            e
        })?;
        let step = replay::step_from_millis(settings.replay_step_ms);
        let mut terminal = setup_terminal()?;
        let result = app::run_replay(&mut terminal, file, &style, step);
        restore_terminal(&mut terminal)?;
        return Ok(result?);
    }

    // a task file names its own task when no id is given
    let task_id = args.task_id.or_else(|| {
        args.task_file
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
    });
    let Some(task_id) = task_id else {
        eprintln!("Error: missing TASK_ID");
        print_help();
        std::process::exit(1);
    };

    let task = load_task(&settings, args.task_file.as_deref(), &task_id).map_err(|e| {
        error!(error = %e, task = %task_id, "failed to load task");
        e
    })?;

    let info = SessionInfo {
        user: settings.user.clone(),
        dataset: settings.dataset.clone(),
        task: task_id,
    };
    let mut session = Session::new(info, task)?;
    let (keymap, rejected) = KeyMap::with_overrides(&settings.keys);
    for binding in rejected {
        warn!(binding = %binding, "ignoring key binding");
    }
    session.set_keymap(keymap);
    let sink = Box::new(DirectorySink::new(settings.history_dir.clone()));

    let mut terminal = setup_terminal()?;
    let mut app = App::new(session, style, settings, settings_path, sink);
    let result = app.run(&mut terminal);
    restore_terminal(&mut terminal)?;

    Ok(result?)
}
