use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write,
    Quit,
    WriteQuit,
    Resize { width: usize, height: usize },
    Test(usize),    // 1-based on the command line, stored 0-based
    Theme(String),  // Set theme by name
    ThemeList,      // List available themes
    Grid,
    Clip,           // Copy clipboard to system clipboard
    SysPaste,       // Load clipboard from system clipboard
    Replay,
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();

        if let Some(cmd) = Self::parse_resize(trimmed) {
            return Some(cmd);
        }

        if let Some(rest) = trimmed.strip_prefix("test ") {
            return match rest.trim().parse::<usize>() {
                Ok(n) if n >= 1 => Some(Command::Test(n - 1)),
                _ => None,
            };
        }

        if let Some(theme_name) = trimmed.strip_prefix("theme ") {
            return Some(Command::Theme(theme_name.trim().to_string()));
        }

        match trimmed {
            "w" => Some(Command::Write),
            "q" => Some(Command::Quit),
            "wq" | "x" => Some(Command::WriteQuit),
            "grid" => Some(Command::Grid),
            "theme" | "themes" => Some(Command::ThemeList),
            "clip" | "cp" => Some(Command::Clip),
            "sp" | "syspaste" => Some(Command::SysPaste),
            "replay" => Some(Command::Replay),
            _ => Some(Command::Unknown(trimmed.to_string())),
        }
    }

    /// Formats: resize 5x7, resize 5 x 7
    fn parse_resize(input: &str) -> Option<Command> {
        let re = Regex::new(r"^resize\s+(\d+)\s*[xX]\s*(\d+)$").ok()?;
        let caps = re.captures(input)?;
        let width = caps.get(1)?.as_str().parse().ok()?;
        let height = caps.get(2)?.as_str().parse().ok()?;
        Some(Command::Resize { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(Command::parse("w"), Some(Command::Write));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("wq"), Some(Command::WriteQuit));
        assert_eq!(Command::parse("grid"), Some(Command::Grid));
        assert_eq!(Command::parse("replay"), Some(Command::Replay));
        assert_eq!(Command::parse("clip"), Some(Command::Clip));
        assert_eq!(Command::parse("syspaste"), Some(Command::SysPaste));
    }

    #[test]
    fn test_parse_resize() {
        assert_eq!(
            Command::parse("resize 5x7"),
            Some(Command::Resize { width: 5, height: 7 })
        );
        assert_eq!(
            Command::parse("resize 12 X 3"),
            Some(Command::Resize { width: 12, height: 3 })
        );
        assert_eq!(
            Command::parse("resize 5"),
            Some(Command::Unknown("resize 5".to_string()))
        );
    }

    #[test]
    fn test_parse_test_index() {
        assert_eq!(Command::parse("test 1"), Some(Command::Test(0)));
        assert_eq!(Command::parse("test 3"), Some(Command::Test(2)));
        assert_eq!(Command::parse("test 0"), None);
        assert_eq!(Command::parse("test abc"), None);
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!(Command::parse("theme c64"), Some(Command::Theme("c64".to_string())));
        assert_eq!(Command::parse("themes"), Some(Command::ThemeList));
        assert_eq!(Command::parse("theme"), Some(Command::ThemeList));
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(Command::parse("  w  "), Some(Command::Write));
        assert_eq!(Command::parse("\tq\n"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse("foobar"),
            Some(Command::Unknown("foobar".to_string()))
        );
        assert_eq!(Command::parse(""), Some(Command::Unknown(String::new())));
    }
}
