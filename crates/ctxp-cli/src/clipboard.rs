//! Clipboard collaborator. Any backend can stand behind [`Clipboard`];
//! without one the commands fall back to stdout and terminal paste.

/// Clipboard access. Failures are reported through the return value.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> bool;
    fn paste(&mut self) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[cfg(not(feature = "clipboard"))]
    #[error("clipboard support not compiled in")]
    Disabled,
    #[cfg(feature = "clipboard")]
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn open() -> Result<Self, ClipboardError> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> bool {
        match self.inner.set_text(text.to_owned()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "clipboard copy failed");
                false
            }
        }
    }

    fn paste(&mut self) -> Option<String> {
        match self.inner.get_text() {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard paste failed");
                None
            }
        }
    }
}

#[cfg(feature = "clipboard")]
fn open_system() -> Result<Box<dyn Clipboard>, ClipboardError> {
    Ok(Box::new(SystemClipboard::open()?))
}

#[cfg(not(feature = "clipboard"))]
fn open_system() -> Result<Box<dyn Clipboard>, ClipboardError> {
    Err(ClipboardError::Disabled)
}

/// The system clipboard, or `None` when disabled or unavailable.
pub fn system(enabled: bool) -> Option<Box<dyn Clipboard>> {
    if !enabled {
        return None;
    }
    match open_system() {
        Ok(cb) => Some(cb),
        Err(e) => {
            tracing::warn!(error = %e, "falling back to terminal input/output");
            None
        }
    }
}

/// In-memory clipboard for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub fail_copy: bool,
}

#[cfg(test)]
impl Clipboard for MemoryClipboard {
    fn copy(&mut self, text: &str) -> bool {
        if self.fail_copy {
            return false;
        }
        self.contents = Some(text.to_string());
        true
    }

    fn paste(&mut self) -> Option<String> {
        self.contents.clone()
    }
}
