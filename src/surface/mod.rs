//! Editing surface abstraction
//!
//! The bridge never talks to an editor directly. Everything it does to the
//! editor goes through [`EditingSurface`]: open a document, show it, move the
//! selection, reveal a range. Positions on the surface are 0-based.

pub mod command;
pub mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use command::CommandSurface;
pub use local::{Journal, LocalSurface, SurfaceOp};

/// 0-based line/character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }
}

/// Selection from `anchor` to `active` (the cursor end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        Self {
            anchor: range.start,
            active: range.end,
        }
    }
}

/// Where a revealed range should land in the viewport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealKind {
    #[default]
    InCenter,
    AtTop,
    /// Scroll only as far as needed to make the range visible
    Minimal,
}

/// An opened document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub path: PathBuf,
}

/// A visible, editable view onto a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub id: u64,
    pub path: PathBuf,
    pub selection: Option<Selection>,
}

/// The host capability that can open documents and move selection/viewport
#[async_trait]
pub trait EditingSurface: Send {
    /// Open the document at `path`
    ///
    /// # Errors
    /// Returns [`crate::BridgeError::DocumentOpen`] if the path does not exist
    /// or cannot be opened
    async fn open_document(&mut self, path: &Path) -> Result<DocumentHandle>;

    /// Make the document the active, visible one
    async fn show_document(&mut self, document: &DocumentHandle) -> Result<EditorView>;

    /// Set the active selection of `view`
    fn set_selection(&mut self, view: &mut EditorView, selection: Selection);

    /// Scroll `view` so that `range` is visible
    async fn reveal_range(&mut self, view: &EditorView, range: Range, kind: RevealKind)
        -> Result<()>;
}
