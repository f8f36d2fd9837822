// src/presenter/clipboard.rs
use std::env;
use std::fmt;
use std::io::{ IsTerminal, Write };
use std::path::PathBuf;
use std::process::Stdio;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    Unavailable,
    Failed(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "No clipboard is available"),
            Self::Failed(e) => write!(f, "Clipboard write failed: {}", e),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// A way of putting text on the user's clipboard.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clipboard: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

// Checked in order; the first one on PATH wins.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip.exe", &[]),
];

fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Pipes text into a platform clipboard tool.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    tool: Option<(PathBuf, &'static [&'static str])>,
}

impl CommandClipboard {
    pub fn detect() -> Self {
        let tool = CLIPBOARD_TOOLS
            .iter()
            .find_map(|(program, args)| find_on_path(program).map(|path| (path, *args)));
        if let Some((path, _)) = &tool {
            debug!("Using clipboard tool {}", path.display());
        }
        Self { tool }
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    fn name(&self) -> &'static str {
        "command"
    }

    fn is_available(&self) -> bool {
        self.tool.is_some()
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let (path, args) = self.tool.as_ref().ok_or(ClipboardError::Unavailable)?;

        let mut child = Command::new(path)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClipboardError::Failed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes()).await
                .map_err(|e| ClipboardError::Failed(e.to_string()))?;
        }

        let status = child.wait().await.map_err(|e| ClipboardError::Failed(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Failed(format!("{} exited with {}", path.display(), status)))
        }
    }
}

/// Asks the terminal emulator to set the clipboard (OSC 52).
#[derive(Debug, Clone, Default)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    pub fn sequence(text: &str) -> String {
        format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
    }
}

#[async_trait]
impl Clipboard for Osc52Clipboard {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn is_available(&self) -> bool {
        std::io::stdout().is_terminal()
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if !self.is_available() {
            return Err(ClipboardError::Unavailable);
        }
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(Self::sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| ClipboardError::Failed(e.to_string()))
    }
}

/// Primary strategy plus the one tried when it is missing or fails.
pub struct ClipboardStrategies {
    pub primary: Box<dyn Clipboard>,
    pub fallback: Box<dyn Clipboard>,
}

/// Picks strategies from what this machine supports: a clipboard tool when
/// one is installed, otherwise the terminal sequence first.
pub fn probe_clipboards() -> ClipboardStrategies {
    let command = CommandClipboard::detect();
    if command.is_available() {
        ClipboardStrategies {
            primary: Box::new(command),
            fallback: Box::new(Osc52Clipboard),
        }
    } else {
        ClipboardStrategies {
            primary: Box::new(Osc52Clipboard),
            fallback: Box::new(command),
        }
    }
}
