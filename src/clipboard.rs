use crate::error::LabError;

pub trait ClipboardBackend {
    fn set_text(&mut self, text: &str) -> Result<(), LabError>;
}

/// System clipboard through arboard, opened on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { inner: None }
    }

    fn ensure(&mut self) -> Result<&mut arboard::Clipboard, LabError> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|error| LabError::Clipboard(error.to_string()))?;
            self.inner = Some(clipboard);
        }

        self.inner
            .as_mut()
            .ok_or_else(|| LabError::Clipboard("clipboard not initialized".to_string()))
    }
}

impl ClipboardBackend for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), LabError> {
        let clipboard = self.ensure()?;
        clipboard
            .set_text(text.to_string())
            .map_err(|error| LabError::Clipboard(error.to_string()))
    }
}

pub struct ClipboardAdapter {
    backend: Box<dyn ClipboardBackend>,
}

impl ClipboardAdapter {
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        Self { backend }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard::new()))
    }

    /// Forwards the text verbatim, empty strings included.
    pub fn copy(&mut self, text: &str) -> Result<(), LabError> {
        self.backend.set_text(text)
    }
}
