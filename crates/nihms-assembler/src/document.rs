//! Generated package documents and their lazy readers.

use std::fmt;
use std::io::{self, Cursor, Read};
use std::mem;
use std::sync::Arc;

use crate::error::{AssembleError, Result};

/// Renders one generated package document.
pub trait DocumentSerializer: Send + Sync + fmt::Debug {
    /// Entry name of the document inside the package.
    fn name(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Render the complete document.
    fn render(&self) -> Result<Vec<u8>>;

    /// Reader over the rendered document. Nothing is rendered until the
    /// first `read`.
    fn open(&self) -> LazyDocument
    where
        Self: Clone + Sized + 'static,
    {
        LazyDocument::new(Arc::new(self.clone()))
    }
}

enum LazyState {
    Pending,
    Ready(Cursor<Vec<u8>>),
    Failed,
}

/// Single-pass reader that renders its document on first use.
///
/// A render failure is returned from that first `read` as an `io::Error`
/// carrying the [`AssembleError`]; the reader stays failed afterwards.
pub struct LazyDocument {
    serializer: Arc<dyn DocumentSerializer>,
    state: LazyState,
}

impl LazyDocument {
    pub fn new(serializer: Arc<dyn DocumentSerializer>) -> Self {
        Self {
            serializer,
            state: LazyState::Pending,
        }
    }

    pub fn name(&self) -> &str {
        self.serializer.name()
    }
}

impl Read for LazyDocument {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Failed stays in place if rendering errors.
        match mem::replace(&mut self.state, LazyState::Failed) {
            LazyState::Pending => {
                let bytes = self.serializer.render().map_err(AssembleError::into_io)?;
                self.state = LazyState::Ready(Cursor::new(bytes));
            }
            state => self.state = state,
        }
        match &mut self.state {
            LazyState::Ready(cursor) => cursor.read(buf),
            LazyState::Pending | LazyState::Failed => Err(AssembleError::StreamFailed.into_io()),
        }
    }
}

impl fmt::Debug for LazyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            LazyState::Pending => "pending",
            LazyState::Ready(_) => "ready",
            LazyState::Failed => "failed",
        };
        f.debug_struct("LazyDocument")
            .field("name", &self.serializer.name())
            .field("state", &state)
            .finish()
    }
}
