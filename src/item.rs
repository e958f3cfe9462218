use crate::image::Image;
use crate::selection::Selection;
use crate::undo::UndoRedo;

/// One editable test slot: its own undo history, selection and counters
#[derive(Debug, Clone)]
pub struct EditableItem {
    id: usize,
    input: Image,
    expected: Option<Image>,
    history: UndoRedo,
    selection: Selection,
    pub submit_correct_count: u32,
    pub submit_incorrect_count: u32,
    pub start_over_count: u32,
}

impl EditableItem {
    /// Start from the test input, selection covering the whole image
    pub fn new(id: usize, input: Image, expected: Option<Image>) -> Self {
        Self {
            id,
            selection: Selection::full(&input),
            history: UndoRedo::new(input.clone()),
            input,
            expected,
            submit_correct_count: 0,
            submit_incorrect_count: 0,
            start_over_count: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn input(&self) -> &Image {
        &self.input
    }

    pub fn expected(&self) -> Option<&Image> {
        self.expected.as_ref()
    }

    pub fn image(&self) -> &Image {
        self.history.image()
    }

    pub fn history(&self) -> &UndoRedo {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut UndoRedo {
        &mut self.history
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Select the whole current image
    pub fn reset_selection(&mut self) {
        self.selection = Selection::full(self.history.image());
    }

    /// Reset the selection if the image shrank underneath it
    pub fn fit_selection(&mut self) {
        if !self.selection.fits(self.history.image()) {
            self.reset_selection();
        }
    }

    /// Compare the current image against the expected output, updating counters.
    /// Returns None when the expected output is unknown.
    pub fn check_submission(&mut self) -> Option<bool> {
        let expected = self.expected.as_ref()?;
        let correct = expected == self.history.image();
        if correct {
            self.submit_correct_count += 1;
        } else {
            self.submit_incorrect_count += 1;
        }
        Some(correct)
    }

    pub fn is_solved(&self) -> bool {
        self.submit_correct_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_selects_whole_input() {
        let input = Image::color(4, 2, 1).unwrap();
        let item = EditableItem::new(0, input.clone(), None);
        assert_eq!(item.image(), &input);
        assert_eq!(item.selection(), Selection::full(&input));
        assert_eq!(item.history().undo_len(), 0);
    }

    #[test]
    fn fit_selection_resets_after_shrink() {
        let mut item = EditableItem::new(0, Image::color(4, 4, 0).unwrap(), None);
        item.set_selection(Selection { x0: 3, y0: 3, x1: 1, y1: 1 });
        item.history_mut().commit("crop", Image::color(2, 2, 0).unwrap());
        item.fit_selection();
        assert_eq!(item.selection(), Selection { x0: 0, y0: 0, x1: 1, y1: 1 });
    }

    #[test]
    fn submission_counters() {
        let expected = Image::color(2, 2, 3).unwrap();
        let mut item = EditableItem::new(1, Image::color(2, 2, 0).unwrap(), Some(expected.clone()));
        assert_eq!(item.check_submission(), Some(false));
        item.history_mut().commit("fill", expected);
        assert_eq!(item.check_submission(), Some(true));
        assert_eq!((item.submit_correct_count, item.submit_incorrect_count), (1, 1));
        assert!(item.is_solved());

        let mut unknown = EditableItem::new(2, Image::color(1, 1, 0).unwrap(), None);
        assert_eq!(unknown.check_submission(), None);
        assert_eq!(unknown.submit_incorrect_count, 0);
    }
}
