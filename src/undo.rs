use std::fmt;

use crate::error::EditError;
use crate::image::Image;

/// Captured image plus the label of the action that was about to change it
#[derive(Debug, Clone, PartialEq)]
pub struct Memento {
    image: Image,
    label: String,
}

impl Memento {
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Undo,
    Redo,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackKind::Undo => write!(f, "undo"),
            StackKind::Redo => write!(f, "redo"),
        }
    }
}

/// Current image plus undo/redo stacks of mementos
#[derive(Debug, Clone)]
pub struct UndoRedo {
    current: Image,
    undo_stack: Vec<Memento>,
    redo_stack: Vec<Memento>,
}

impl UndoRedo {
    pub fn new(image: Image) -> Self {
        Self {
            current: image,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn image(&self) -> &Image {
        &self.current
    }

    /// Replace the current image without creating an undo point
    pub fn set_image(&mut self, image: Image) {
        self.current = image;
    }

    /// Push the current image onto the undo stack (clears redo stack)
    pub fn save_state(&mut self, label: impl Into<String>) {
        self.undo_stack.push(Memento {
            image: self.current.clone(),
            label: label.into(),
        });
        self.redo_stack.clear();
    }

    /// Save the current image under `label`, then make `image` current
    pub fn commit(&mut self, label: impl Into<String>, image: Image) {
        self.save_state(label);
        self.set_image(image);
    }

    /// Restore the most recent memento, returns its label
    pub fn undo(&mut self) -> Result<String, EditError> {
        let memento = self.undo_stack.pop().ok_or(EditError::EmptyStack(StackKind::Undo))?;
        let current = std::mem::replace(&mut self.current, memento.image);
        self.redo_stack.push(Memento {
            image: current,
            label: memento.label.clone(),
        });
        Ok(memento.label)
    }

    /// Re-apply the most recently undone memento, returns its label
    pub fn redo(&mut self) -> Result<String, EditError> {
        let memento = self.redo_stack.pop().ok_or(EditError::EmptyStack(StackKind::Redo))?;
        let current = std::mem::replace(&mut self.current, memento.image);
        self.undo_stack.push(Memento {
            image: current,
            label: memento.label.clone(),
        });
        Ok(memento.label)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Peek at the next undo memento without removing it
    pub fn peek_undo(&self) -> Option<&Memento> {
        self.undo_stack.last()
    }

    pub fn peek_redo(&self) -> Option<&Memento> {
        self.redo_stack.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black() -> Image {
        Image::color(3, 3, 0).unwrap()
    }

    fn with_pixel(x: i32, y: i32, color: u8) -> Image {
        let mut image = black();
        image.set_pixel(x, y, color).unwrap();
        image
    }

    #[test]
    fn test_undo_redo_single_pixel() {
        let mut history = UndoRedo::new(black());
        history.commit("set pixel", with_pixel(1, 1, 2));
        assert_eq!(history.image().get(1, 1), Some(2));

        assert_eq!(history.undo().unwrap(), "set pixel");
        assert_eq!(history.image(), &black());

        assert_eq!(history.redo().unwrap(), "set pixel");
        assert_eq!(history.image(), &with_pixel(1, 1, 2));
    }

    #[test]
    fn test_undo_empty_stack_leaves_state() {
        let mut history = UndoRedo::new(black());
        assert_eq!(history.undo(), Err(EditError::EmptyStack(StackKind::Undo)));
        assert_eq!(history.redo(), Err(EditError::EmptyStack(StackKind::Redo)));
        assert_eq!(history.image(), &black());
    }

    #[test]
    fn test_undo_all_then_redo_all() {
        let mut history = UndoRedo::new(black());
        let mut image = black();
        for i in 0..3 {
            image.set_pixel(i, i, 1).unwrap();
            history.commit(format!("edit {}", i), image.clone());
        }
        let last = history.image().clone();

        for _ in 0..3 {
            history.undo().unwrap();
        }
        assert_eq!(history.image(), &black());
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.redo_len(), 3);

        for _ in 0..3 {
            history.redo().unwrap();
        }
        assert_eq!(history.image(), &last);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = UndoRedo::new(black());
        history.commit("a", with_pixel(0, 0, 1));
        history.undo().unwrap();
        assert_eq!(history.redo_len(), 1);

        history.commit("b", with_pixel(2, 2, 3));
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.peek_undo().map(|m| m.label()), Some("b"));
    }

    #[test]
    fn test_set_image_does_not_touch_stacks() {
        let mut history = UndoRedo::new(black());
        history.commit("a", with_pixel(0, 0, 1));
        history.undo().unwrap();
        history.set_image(with_pixel(0, 0, 4));
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.redo_len(), 1);
        assert_eq!(history.image().get(0, 0), Some(4));
    }

    #[test]
    fn test_redo_memento_keeps_label() {
        let mut history = UndoRedo::new(black());
        history.commit("flood fill", with_pixel(0, 0, 1));
        history.undo().unwrap();
        let memento = history.peek_redo().unwrap();
        assert_eq!(memento.label(), "flood fill");
    }
}
