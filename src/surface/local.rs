//! Headless editing surface backed by the local filesystem
//!
//! Documents are read from disk and views are numbered. Only the most
//! recently opened document's text is kept; reveals are logged with the text
//! of the target line so the bridge is usable without an editor attached.
//! Operations are recorded only when a [`Journal`] is attached.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{DocumentHandle, EditingSurface, EditorView, Range, RevealKind, Selection};
use crate::error::{BridgeError, Result};

/// One operation performed on a [`LocalSurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Open { path: PathBuf },
    OpenFailed { path: PathBuf },
    Show { path: PathBuf, view: u64 },
    Select { view: u64, selection: Selection },
    Reveal { view: u64, range: Range, kind: RevealKind },
}

/// Shared, ordered record of surface operations
#[derive(Debug, Clone, Default)]
pub struct Journal {
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
}

impl Journal {
    fn lock(&self) -> MutexGuard<'_, Vec<SurfaceOp>> {
        self.ops.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, op: SurfaceOp) {
        self.lock().push(op);
    }

    /// Copy of all operations recorded so far
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.lock().clone()
    }

    /// Remove and return all recorded operations
    pub fn drain(&self) -> Vec<SurfaceOp> {
        std::mem::take(&mut *self.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Text of the document last opened
struct LoadedDocument {
    path: PathBuf,
    lines: Vec<String>,
}

pub struct LocalSurface {
    journal: Option<Journal>,
    loaded: Option<LoadedDocument>,
    next_view_id: u64,
    active_view: Option<u64>,
}

impl LocalSurface {
    pub fn new() -> Self {
        Self {
            journal: None,
            loaded: None,
            next_view_id: 1,
            active_view: None,
        }
    }

    /// Surface that records every operation into `journal`
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::new()
        }
    }

    /// Id of the view most recently shown
    pub fn active_view(&self) -> Option<u64> {
        self.active_view
    }

    /// Path of the document whose text is currently held
    pub fn loaded_document(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|doc| doc.path.as_path())
    }

    fn record(&self, op: SurfaceOp) {
        if let Some(journal) = &self.journal {
            journal.push(op);
        }
    }

    fn line_text(&self, path: &Path, line: u32) -> Option<&str> {
        self.loaded
            .as_ref()
            .filter(|doc| doc.path == path)
            .and_then(|doc| doc.lines.get(line as usize))
            .map(String::as_str)
    }
}

impl Default for LocalSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EditingSurface for LocalSurface {
    async fn open_document(&mut self, path: &Path) -> Result<DocumentHandle> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.record(SurfaceOp::OpenFailed {
                    path: path.to_path_buf(),
                });
                return Err(BridgeError::document_open(path, e));
            }
        };

        let lines: Vec<String> = String::from_utf8_lossy(&bytes)
            .lines()
            .map(String::from)
            .collect();

        log::debug!("Opened {} ({} lines)", path.display(), lines.len());
        self.loaded = Some(LoadedDocument {
            path: path.to_path_buf(),
            lines,
        });
        self.record(SurfaceOp::Open {
            path: path.to_path_buf(),
        });

        Ok(DocumentHandle {
            path: path.to_path_buf(),
        })
    }

    async fn show_document(&mut self, document: &DocumentHandle) -> Result<EditorView> {
        let id = self.next_view_id;
        self.next_view_id += 1;
        self.active_view = Some(id);

        self.record(SurfaceOp::Show {
            path: document.path.clone(),
            view: id,
        });

        Ok(EditorView {
            id,
            path: document.path.clone(),
            selection: None,
        })
    }

    fn set_selection(&mut self, view: &mut EditorView, selection: Selection) {
        view.selection = Some(selection);
        self.record(SurfaceOp::Select {
            view: view.id,
            selection,
        });
    }

    async fn reveal_range(
        &mut self,
        view: &EditorView,
        range: Range,
        kind: RevealKind,
    ) -> Result<()> {
        let line = range.start.line;
        match self.line_text(&view.path, line) {
            Some(text) => log::info!("{}:{}  {}", view.path.display(), line + 1, text.trim_end()),
            None => log::info!(
                "{}:{}  (past end of document)",
                view.path.display(),
                line + 1
            ),
        }

        self.record(SurfaceOp::Reveal {
            view: view.id,
            range,
            kind,
        });
        Ok(())
    }
}
