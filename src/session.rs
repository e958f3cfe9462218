//! Editing session
//!
//! A [`Session`] owns everything one puzzle needs while it is being edited:
//! one [`EditableItem`] per test pair, the active tool and color, the
//! clipboard with its paste preview, and the [`HistoryLog`].
//!
//! Every action that can change the image goes through the same steps.
//! The candidate image is computed on a copy and compared with the current
//! one. Exactly one log entry is written with `sameImage` and the resulting
//! pixels. Only when the image actually changed is an undo point pushed and
//! the candidate made current, so the undo stack holds effective edits only
//! while the log keeps every attempt.
//!
//! Input arrives as [`InputEvent`]s in surface coordinates and is mapped to
//! cells through the [`GridLayout`] published by the renderer.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::clipboard::Clipboard;
use crate::config::KeyMap;
use crate::error::{EditError, Error};
use crate::history::{HistoryFile, HistoryLog, Summary, FILE_TYPE};
use crate::image::{check_color, Image, ImageError};
use crate::input::{Action, GridLayout, InputEvent, Key};
use crate::item::EditableItem;
use crate::mode::Tool;
use crate::puzzle::Task;
use crate::selection::{clamp_cell, Rect, Selection};

/// Largest size the image can be resized to
pub const DEFAULT_MAX_SIZE: usize = 100;

pub type EditResult = std::result::Result<Outcome, EditError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user: String,
    pub dataset: String,
    pub task: String,
}

/// What handling an input did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Visible state changed
    Changed,
    /// Nothing to redraw
    Unchanged,
    /// A submission was checked; None when the expected output is unknown
    Submitted(Option<bool>),
    /// The action belongs to the application
    App(Action),
}

/// Pointer position of the paste preview, in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PasteState {
    pub x: f64,
    pub y: f64,
    dragging: bool,
}

#[derive(Debug, Default)]
struct Gesture {
    active: bool,
    // last (x, y, color) drawn during this gesture
    last_key: Option<(i32, i32, u8)>,
}

pub struct Session {
    info: SessionInfo,
    task: Task,
    items: Vec<EditableItem>,
    current: usize,
    tool: Tool,
    color: u8,
    clipboard: Clipboard,
    paste: Option<PasteState>,
    log: HistoryLog,
    layout: GridLayout,
    gesture: Gesture,
    keymap: KeyMap,
    max_size: usize,
    overview_visible: bool,
    solutions_revealed: bool,
    reveal_count: usize,
    show_overview_count: usize,
    start_time: DateTime<Utc>,
}

impl Session {
    pub fn new(info: SessionInfo, task: Task) -> Result<Self, Error> {
        if task.test.is_empty() {
            return Err(Error::NoTests(task.id));
        }
        let items: Vec<EditableItem> = task
            .test
            .iter()
            .enumerate()
            .map(|(id, pair)| EditableItem::new(id, pair.input.clone(), pair.output.clone()))
            .collect();

        let mut session = Self {
            info,
            task,
            items,
            current: 0,
            tool: Tool::default(),
            color: 0,
            clipboard: Clipboard::new(),
            paste: None,
            log: HistoryLog::new(),
            layout: GridLayout::default(),
            gesture: Gesture::default(),
            keymap: KeyMap::default(),
            max_size: DEFAULT_MAX_SIZE,
            overview_visible: false,
            solutions_revealed: false,
            reveal_count: 0,
            show_overview_count: 0,
            start_time: Utc::now(),
        };
        info!(
            dataset = %session.info.dataset,
            task = %session.info.task,
            tests = session.items.len(),
            "task loaded"
        );
        let context = json!({
            "dataset": session.info.dataset,
            "task": session.info.task,
            "trainCount": session.task.train.len(),
            "testCount": session.items.len(),
            "image": session.image().to_json(),
        });
        session.log.log("load task", Some(context));
        Ok(session)
    }

    pub fn set_keymap(&mut self, keymap: KeyMap) {
        self.keymap = keymap;
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// Called by the renderer after every layout pass
    pub fn set_layout(&mut self, layout: GridLayout) {
        self.layout = layout;
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn items(&self) -> &[EditableItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn item(&self) -> &EditableItem {
        &self.items[self.current]
    }

    fn item_mut(&mut self) -> &mut EditableItem {
        &mut self.items[self.current]
    }

    pub fn image(&self) -> &Image {
        self.item().image()
    }

    pub fn selection(&self) -> Selection {
        self.item().selection()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> u8 {
        self.color
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    pub fn is_paste_mode(&self) -> bool {
        self.paste.is_some()
    }

    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    pub fn is_overview_visible(&self) -> bool {
        self.overview_visible
    }

    pub fn solutions_revealed(&self) -> bool {
        self.solutions_revealed
    }

    // ---- dispatch ----

    pub fn handle(&mut self, event: InputEvent) -> EditResult {
        if self.paste.is_some() {
            return self.handle_paste_input(event);
        }
        match event {
            InputEvent::KeyPress(key) => match self.keymap.get(key) {
                Some(action) => self.perform(action),
                None => Ok(Outcome::Unchanged),
            },
            InputEvent::PointerDown { x, y } => {
                self.gesture = Gesture {
                    active: true,
                    last_key: None,
                };
                let (cx, cy) = self.layout.cell_at(x, y);
                match self.tool {
                    Tool::Select => Ok(self.selection_begin(cx, cy)),
                    Tool::Draw => self.draw_at(cx, cy),
                    Tool::Fill => {
                        if !self.image().contains(cx, cy) {
                            return Ok(Outcome::Unchanged);
                        }
                        self.flood_fill(cx, cy)
                    }
                }
            }
            InputEvent::PointerMove { x, y } => {
                if !self.gesture.active {
                    return Ok(Outcome::Unchanged);
                }
                let (cx, cy) = self.layout.cell_at(x, y);
                match self.tool {
                    Tool::Select => Ok(self.selection_update(cx, cy)),
                    Tool::Draw => self.draw_at(cx, cy),
                    Tool::Fill => Ok(Outcome::Unchanged),
                }
            }
            InputEvent::PointerUp => {
                self.gesture = Gesture::default();
                Ok(Outcome::Unchanged)
            }
        }
    }

    /// While pasting only the preview position, accept and reject are handled
    fn handle_paste_input(&mut self, event: InputEvent) -> EditResult {
        match event {
            InputEvent::KeyPress(Key::Enter) => self.paste_accept(),
            InputEvent::KeyPress(Key::Escape) => Ok(self.paste_reject()),
            InputEvent::KeyPress(_) => Ok(Outcome::Unchanged),
            InputEvent::PointerDown { x, y } => {
                if let Some(paste) = self.paste.as_mut() {
                    paste.dragging = true;
                }
                Ok(self.paste_move(x, y))
            }
            InputEvent::PointerMove { x, y } => {
                if self.paste.is_some_and(|p| p.dragging) {
                    return Ok(self.paste_move(x, y));
                }
                Ok(Outcome::Unchanged)
            }
            InputEvent::PointerUp => {
                if let Some(paste) = self.paste.as_mut() {
                    paste.dragging = false;
                }
                Ok(Outcome::Unchanged)
            }
        }
    }

    pub fn perform(&mut self, action: Action) -> EditResult {
        match action {
            Action::PickTool(tool) => Ok(self.pick_tool(tool)),
            Action::PickColor(color) => self.pick_color(color),
            Action::Undo => self.undo(),
            Action::Redo => self.redo(),
            Action::Copy => self.copy(),
            Action::Paste => Ok(self.paste_begin()),
            Action::Crop => self.crop(),
            Action::FlipX => self.flip_x(),
            Action::FlipY => self.flip_y(),
            Action::RotateCw => self.rotate_cw(),
            Action::RotateCcw => self.rotate_ccw(),
            Action::MoveLeft => self.move_left(),
            Action::MoveRight => self.move_right(),
            Action::MoveUp => self.move_up(),
            Action::MoveDown => self.move_down(),
            Action::StartOver => self.start_over(),
            Action::Submit => Ok(Outcome::Submitted(self.submit())),
            Action::NextTest => Ok(self.next_test()),
            Action::PrevTest => Ok(self.prev_test()),
            Action::ToggleOverview => Ok(self.toggle_overview()),
            Action::RevealSolutions => Ok(self.reveal_solutions()),
            Action::ToggleGrid | Action::Replay | Action::CommandLine | Action::Quit => {
                Ok(Outcome::App(action))
            }
        }
    }

    // ---- edit protocol ----

    /// Log the attempt, then keep the candidate only if it differs
    fn commit_edit(&mut self, label: &str, context: Value, candidate: Image) -> Outcome {
        let same_image = &candidate == self.image();
        let mut context = match context {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        context.insert("sameImage".to_string(), Value::Bool(same_image));
        context.insert("image".to_string(), candidate.to_json());
        self.log.log(label, Some(Value::Object(context)));

        if same_image {
            return Outcome::Unchanged;
        }
        let item = self.item_mut();
        item.history_mut().commit(label, candidate);
        item.fit_selection();
        Outcome::Changed
    }

    /// Selection when the select tool is active, otherwise the whole image
    fn tool_rect(&self) -> Rect {
        match self.tool {
            Tool::Select => self.selection().rect(),
            _ => Rect::full(self.image()),
        }
    }

    fn rect_context(rect: Rect) -> Value {
        json!({"x": rect.x, "y": rect.y, "width": rect.width, "height": rect.height})
    }

    // ---- tools ----

    pub fn pick_tool(&mut self, tool: Tool) -> Outcome {
        debug!(tool = tool.id(), "pick tool");
        let same_tool = self.tool == tool;
        self.tool = tool;
        self.log
            .log("pick tool", Some(json!({"tool": tool.id(), "sameTool": same_tool})));
        if same_tool {
            Outcome::Unchanged
        } else {
            Outcome::Changed
        }
    }

    /// Picking a color while selecting also fills the selection
    pub fn pick_color(&mut self, color: u8) -> EditResult {
        check_color(color)?;
        let same_color = self.color == color;
        self.color = color;
        self.log
            .log("pick color", Some(json!({"color": color, "sameColor": same_color})));
        if self.tool == Tool::Select {
            return self.fill_selection();
        }
        Ok(Outcome::Changed)
    }

    fn draw_at(&mut self, x: i32, y: i32) -> EditResult {
        if !self.image().contains(x, y) {
            return Ok(Outcome::Unchanged);
        }
        let key = (x, y, self.color);
        if self.gesture.last_key == Some(key) {
            return Ok(Outcome::Unchanged);
        }
        self.gesture.last_key = Some(key);
        self.draw_pixel(x, y)
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32) -> EditResult {
        let mut candidate = self.image().clone();
        candidate.set_pixel(x, y, self.color)?;
        let context = json!({"x": x, "y": y, "color": self.color});
        Ok(self.commit_edit("set pixel", context, candidate))
    }

    pub fn flood_fill(&mut self, x: i32, y: i32) -> EditResult {
        let mut candidate = self.image().clone();
        candidate.flood_fill(x, y, self.color)?;
        let context = json!({"x": x, "y": y, "color": self.color});
        Ok(self.commit_edit("flood fill", context, candidate))
    }

    pub fn fill_selection(&mut self) -> EditResult {
        let rect = self.selection().rect();
        let patch = Image::color(rect.width as usize, rect.height as usize, self.color)?;
        let candidate = self.image().overlay(&patch, rect.x, rect.y);
        let mut context = Self::rect_context(rect);
        context["color"] = json!(self.color);
        Ok(self.commit_edit("fill selection", context, candidate))
    }

    // ---- selection ----

    pub fn selection_begin(&mut self, x: i32, y: i32) -> Outcome {
        let (cx, cy) = clamp_cell(self.image(), x, y);
        self.set_selection("selection begin", Selection::point(cx, cy))
    }

    pub fn selection_update(&mut self, x: i32, y: i32) -> Outcome {
        let (cx, cy) = clamp_cell(self.image(), x, y);
        let mut selection = self.selection();
        selection.x1 = cx;
        selection.y1 = cy;
        self.set_selection("selection update", selection)
    }

    fn set_selection(&mut self, label: &str, selection: Selection) -> Outcome {
        let same_selection = self.selection() == selection;
        self.item_mut().set_selection(selection);
        let context = json!({
            "x0": selection.x0,
            "y0": selection.y0,
            "x1": selection.x1,
            "y1": selection.y1,
            "sameSelection": same_selection,
        });
        self.log.log(label, Some(context));
        if same_selection {
            Outcome::Unchanged
        } else {
            Outcome::Changed
        }
    }

    // ---- transforms ----

    /// Only available with the select tool
    pub fn crop(&mut self) -> EditResult {
        if !self.tool.exposes_crop() {
            debug!("crop is only available in select mode");
            return Ok(Outcome::Unchanged);
        }
        let rect = self.selection().rect();
        let candidate = self.image().crop(rect.x, rect.y, rect.width, rect.height)?;
        let outcome = self.commit_edit("crop", Self::rect_context(rect), candidate);
        if outcome == Outcome::Changed {
            self.item_mut().reset_selection();
        }
        Ok(outcome)
    }

    fn transform_rect(
        &mut self,
        label: &str,
        transform: impl Fn(&Image) -> Image,
    ) -> EditResult {
        let rect = self.tool_rect();
        let region = self.image().crop(rect.x, rect.y, rect.width, rect.height)?;
        let candidate = self.image().overlay(&transform(&region), rect.x, rect.y);
        Ok(self.commit_edit(label, Self::rect_context(rect), candidate))
    }

    pub fn flip_x(&mut self) -> EditResult {
        self.transform_rect("flip x", Image::flip_x)
    }

    pub fn flip_y(&mut self) -> EditResult {
        self.transform_rect("flip y", Image::flip_y)
    }

    pub fn rotate_cw(&mut self) -> EditResult {
        self.rotate("rotate cw", Image::rotate_cw)
    }

    pub fn rotate_ccw(&mut self) -> EditResult {
        self.rotate("rotate ccw", Image::rotate_ccw)
    }

    /// Rotates the whole image unless selecting; a selection must be square
    fn rotate(&mut self, label: &str, rotate: fn(&Image) -> Image) -> EditResult {
        if self.tool != Tool::Select {
            let candidate = rotate(self.image());
            let outcome = self.commit_edit(label, json!({"wholeImage": true}), candidate);
            if outcome == Outcome::Changed {
                self.item_mut().reset_selection();
            }
            return Ok(outcome);
        }

        let rect = self.selection().rect();
        if !rect.is_square() {
            let mut context = Self::rect_context(rect);
            context["reason"] = json!("selection is not square");
            let unchanged = self.image().clone();
            return Ok(self.commit_edit(label, context, unchanged));
        }
        self.transform_rect(label, rotate)
    }

    fn move_rect(
        &mut self,
        label: &str,
        shift: fn(&Image, i32, i32, i32, i32) -> Result<Image, ImageError>,
    ) -> EditResult {
        let rect = self.tool_rect();
        let candidate = shift(self.image(), rect.x, rect.y, rect.width, rect.height)?;
        Ok(self.commit_edit(label, Self::rect_context(rect), candidate))
    }

    pub fn move_left(&mut self) -> EditResult {
        self.move_rect("move left", Image::move_left)
    }

    pub fn move_right(&mut self) -> EditResult {
        self.move_rect("move right", Image::move_right)
    }

    pub fn move_up(&mut self) -> EditResult {
        self.move_rect("move up", Image::move_up)
    }

    pub fn move_down(&mut self) -> EditResult {
        self.move_rect("move down", Image::move_down)
    }

    pub fn resize(&mut self, width: usize, height: usize) -> EditResult {
        if width > self.max_size || height > self.max_size {
            return Err(ImageError::InvalidSize { width, height }.into());
        }
        let candidate = self.image().resize(width, height, self.color)?;
        let context = json!({"width": width, "height": height, "color": self.color});
        let outcome = self.commit_edit("resize", context, candidate);
        if outcome == Outcome::Changed {
            self.item_mut().reset_selection();
        }
        Ok(outcome)
    }

    /// Back to the test input. Counted even when nothing changes.
    pub fn start_over(&mut self) -> EditResult {
        let item = self.item_mut();
        item.start_over_count += 1;
        let candidate = item.input().clone();
        let outcome = self.commit_edit("start over", json!({}), candidate);
        if outcome == Outcome::Changed {
            self.item_mut().reset_selection();
        }
        Ok(outcome)
    }

    // ---- clipboard ----

    pub fn copy(&mut self) -> EditResult {
        let rect = self.tool_rect();
        let image = self.image().crop(rect.x, rect.y, rect.width, rect.height)?;
        let same_clipboard = !self.clipboard.copy(image);
        let mut context = Self::rect_context(rect);
        context["sameClipboard"] = json!(same_clipboard);
        self.log.log("copy", Some(context));
        Ok(Outcome::Unchanged)
    }

    /// Enter paste mode with the preview centered on the surface
    pub fn paste_begin(&mut self) -> Outcome {
        let Some(image) = self.clipboard.image() else {
            debug!("paste with empty clipboard");
            return Outcome::Unchanged;
        };
        let context = json!({"width": image.width(), "height": image.height()});
        let (x, y) = self.layout.center();
        self.paste = Some(PasteState {
            x,
            y,
            dragging: false,
        });
        self.log.log("paste", Some(context));
        Outcome::Changed
    }

    pub fn paste_move(&mut self, x: f64, y: f64) -> Outcome {
        match self.paste.as_mut() {
            Some(paste) => {
                paste.x = x;
                paste.y = y;
                Outcome::Changed
            }
            None => Outcome::Unchanged,
        }
    }

    /// Top-left cell the clipboard would land on
    pub fn paste_origin(&self) -> Option<(i32, i32)> {
        let paste = self.paste?;
        let image = self.clipboard.image()?;
        Some(
            self.layout
                .paste_origin(image.width(), image.height(), paste.x, paste.y),
        )
    }

    /// Overlay the clipboard at the preview position. The selection becomes
    /// the pasted rectangle clamped to the image.
    pub fn paste_accept(&mut self) -> EditResult {
        let (Some((min_x, min_y)), Some(clip)) = (self.paste_origin(), self.clipboard.image())
        else {
            return Ok(Outcome::Unchanged);
        };
        let clip = clip.clone();
        self.paste = None;

        let candidate = self.image().overlay(&clip, min_x, min_y);
        let (x0, y0) = clamp_cell(&candidate, min_x, min_y);
        let (x1, y1) = clamp_cell(
            &candidate,
            min_x + clip.width() as i32 - 1,
            min_y + clip.height() as i32 - 1,
        );
        let context = json!({
            "x": min_x,
            "y": min_y,
            "width": clip.width(),
            "height": clip.height(),
        });
        self.commit_edit("paste accept", context, candidate);
        self.item_mut().set_selection(Selection { x0, y0, x1, y1 });
        // the preview is gone even when the image did not change
        Ok(Outcome::Changed)
    }

    pub fn paste_reject(&mut self) -> Outcome {
        if self.paste.take().is_none() {
            return Outcome::Unchanged;
        }
        self.log.log("paste reject", None);
        Outcome::Changed
    }

    // ---- history ----

    pub fn undo(&mut self) -> EditResult {
        let result = self.item_mut().history_mut().undo();
        self.log_stack_move("undo", result)
    }

    pub fn redo(&mut self) -> EditResult {
        let result = self.item_mut().history_mut().redo();
        self.log_stack_move("redo", result)
    }

    fn log_stack_move(
        &mut self,
        label: &str,
        result: Result<String, EditError>,
    ) -> EditResult {
        match result {
            Ok(action) => {
                self.item_mut().fit_selection();
                let context = json!({"action": action, "image": self.image().to_json()});
                self.log.log(label, Some(context));
                Ok(Outcome::Changed)
            }
            Err(e) => {
                self.log.log(label, Some(json!({"result": "empty"})));
                Err(e)
            }
        }
    }

    // ---- tests and submission ----

    /// Check the current image against the expected output
    pub fn submit(&mut self) -> Option<bool> {
        let test = self.current;
        let correct = self.item_mut().check_submission();
        let context = json!({
            "test": test,
            "correct": correct,
            "image": self.image().to_json(),
        });
        self.log.log("submit", Some(context));
        correct
    }

    /// Switch the edited test; each test keeps its own history and selection
    pub fn activate_test(&mut self, index: usize) -> Outcome {
        let to = index % self.items.len();
        let from = self.current;
        self.current = to;
        self.gesture = Gesture::default();
        self.paste = None;
        let context = json!({"from": from, "to": to, "image": self.image().to_json()});
        self.log.log("activate test", Some(context));
        if from == to {
            Outcome::Unchanged
        } else {
            Outcome::Changed
        }
    }

    pub fn next_test(&mut self) -> Outcome {
        self.activate_test(self.current + 1)
    }

    pub fn prev_test(&mut self) -> Outcome {
        self.activate_test(self.current + self.items.len() - 1)
    }

    pub fn toggle_overview(&mut self) -> Outcome {
        self.overview_visible = !self.overview_visible;
        if self.overview_visible {
            self.show_overview_count += 1;
            self.log.log("show overview", None);
        } else {
            self.log.log("hide overview", None);
        }
        Outcome::Changed
    }

    pub fn reveal_solutions(&mut self) -> Outcome {
        self.solutions_revealed = true;
        self.reveal_count += 1;
        self.log.log("reveal solutions", None);
        Outcome::Changed
    }

    // ---- artifact ----

    pub fn summary(&self) -> Summary {
        let solved = self.items.iter().filter(|item| item.is_solved()).count();
        Summary {
            history_count: self.log.len(),
            reveal_count: self.reveal_count,
            start_over_count: self
                .items
                .iter()
                .map(|item| item.start_over_count as usize)
                .sum(),
            test_solved_count: solved,
            test_unsolved_count: self.items.len() - solved,
            show_overview_count: self.show_overview_count,
        }
    }

    pub fn to_history_file(&self) -> HistoryFile {
        HistoryFile {
            file_type: FILE_TYPE.to_string(),
            start_time: self.start_time,
            user: self.info.user.clone(),
            dataset: self.info.dataset.clone(),
            task: self.info.task.clone(),
            summary: self.summary(),
            history: self.log.entries().to_vec(),
        }
    }
}
