#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Draw,
    Select,
    Fill,
}

impl Tool {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Draw => "DRAW",
            Tool::Select => "SELECT",
            Tool::Fill => "FILL",
        }
    }

    /// Name used in history contexts
    pub fn id(&self) -> &'static str {
        match self {
            Tool::Draw => "draw",
            Tool::Select => "select",
            Tool::Fill => "fill",
        }
    }

    /// Crop is only offered while selecting
    pub fn exposes_crop(&self) -> bool {
        matches!(self, Tool::Select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tool_is_draw() {
        assert_eq!(Tool::default(), Tool::Draw);
    }

    #[test]
    fn only_select_exposes_crop() {
        assert!(Tool::Select.exposes_crop());
        assert!(!Tool::Draw.exposes_crop());
        assert!(!Tool::Fill.exposes_crop());
    }
}
