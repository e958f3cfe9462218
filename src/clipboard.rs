use crate::error::{Error, Result};
use crate::image::Image;

/// Session clipboard, holds at most one image. Pasting reads it without
/// consuming it.
#[derive(Debug, Default)]
pub struct Clipboard {
    image: Option<Image>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// Replace the content. Returns false if it already held an equal image.
    pub fn copy(&mut self, image: Image) -> bool {
        if self.image.as_ref() == Some(&image) {
            return false;
        }
        self.image = Some(image);
        true
    }

    /// Copy the clipboard to the system clipboard as a JSON pixel matrix
    pub fn to_system(&self) -> Result<String> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| Error::Clipboard("Nothing to copy".to_string()))?;
        let text = serde_json::to_string(image)?;
        copy_to_system_clipboard(&text)?;
        Ok(format!(
            "Copied {}x{} to system clipboard",
            image.width(),
            image.height()
        ))
    }

    /// Read a JSON pixel matrix from the system clipboard
    pub fn from_system(&mut self) -> Result<String> {
        let text = paste_from_system_clipboard()?;
        let image = parse_matrix(&text)?;
        let message = format!(
            "Copied {}x{} from system clipboard",
            image.width(),
            image.height()
        );
        self.image = Some(image);
        Ok(message)
    }
}

fn parse_matrix(text: &str) -> Result<Image> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Clipboard("System clipboard is empty".to_string()));
    }
    Ok(serde_json::from_str(text)?)
}

fn copy_to_system_clipboard(text: &str) -> Result<()> {
    // Command-line tools behave better than arboard from inside a terminal
    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let commands = [
            ("wl-copy", vec![]),
            ("xclip", vec!["-selection", "clipboard"]),
            ("xsel", vec!["--clipboard", "--input"]),
        ];

        for (cmd, args) in commands {
            if let Ok(mut child) = Command::new(cmd)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                if let Some(mut stdin) = child.stdin.take() {
                    if stdin.write_all(text.as_bytes()).is_ok() {
                        drop(stdin);
                        if child.wait().map(|s| s.success()).unwrap_or(false) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| Error::Clipboard(e.to_string()))
}

fn paste_from_system_clipboard() -> Result<String> {
    #[cfg(target_os = "linux")]
    {
        use std::process::Command;

        let commands = [
            ("wl-paste", vec!["--no-newline"]),
            ("xclip", vec!["-selection", "clipboard", "-o"]),
            ("xsel", vec!["--clipboard", "--output"]),
        ];

        for (cmd, args) in commands {
            if let Ok(output) = Command::new(cmd).args(&args).output() {
                if output.status.success() {
                    return String::from_utf8(output.stdout).map_err(|_| {
                        Error::Clipboard("Clipboard contains invalid UTF-8".to_string())
                    });
                }
            }
        }
    }

    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
    clipboard
        .get_text()
        .map_err(|e| Error::Clipboard(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clipboard_is_empty() {
        let clipboard = Clipboard::new();
        assert!(clipboard.image().is_none());
        assert!(clipboard.image().is_none());
    }

    #[test]
    fn copy_reports_change() {
        let mut clipboard = Clipboard::new();
        let image = Image::color(2, 2, 3).unwrap();
        assert!(clipboard.copy(image.clone()));
        assert!(!clipboard.copy(image.clone()));
        assert!(clipboard.copy(Image::color(1, 1, 3).unwrap()));
        assert_eq!(clipboard.image(), Some(&Image::color(1, 1, 3).unwrap()));
    }

    #[test]
    fn paste_does_not_consume() {
        let mut clipboard = Clipboard::new();
        clipboard.copy(Image::color(1, 2, 4).unwrap());
        let first = clipboard.image().cloned();
        let second = clipboard.image().cloned();
        assert_eq!(first, second);
        assert!(clipboard.image().is_some());
    }

    #[test]
    fn parse_matrix_validates() {
        let image = parse_matrix(" [[1,2],[3,4]]\n").unwrap();
        assert_eq!(image.get(1, 1), Some(4));
        assert!(matches!(parse_matrix(""), Err(Error::Clipboard(_))));
        assert!(matches!(parse_matrix("[[1,2],[3]]"), Err(Error::Json(_))));
        assert!(parse_matrix("hello").is_err());
    }
}
