//! Navigation applier
//!
//! Applies the file targets of a diagnosis event to an editing surface:
//! open, show, then select and reveal every line, strictly in input order.

use std::path::PathBuf;

use crate::config::{BridgeConfig, DEFAULT_SELECTION_WIDTH};
use crate::error::Result;
use crate::listener::FileTarget;
use crate::surface::{EditingSurface, Range, RevealKind};

pub struct Navigator<S> {
    surface: S,
    selection_width: u32,
    reveal: RevealKind,
    workspace_root: Option<PathBuf>,
}

impl<S: EditingSurface> Navigator<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            selection_width: DEFAULT_SELECTION_WIDTH,
            reveal: RevealKind::default(),
            workspace_root: None,
        }
    }

    pub fn from_config(surface: S, config: &BridgeConfig) -> Self {
        Self {
            surface,
            selection_width: config.selection_width,
            reveal: config.reveal,
            workspace_root: config.workspace_root.clone(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Range selected for a 1-based line, `None` for line 0
    pub fn range_for_line(&self, line: u32) -> Option<Range> {
        let line = line.checked_sub(1)?;
        Some(Range::new(line, 0, line, self.selection_width))
    }

    /// Resolve an event path against the workspace root
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    /// Apply every target in order. Returns how many documents were opened.
    pub async fn apply(&mut self, files: &[FileTarget]) -> usize {
        let mut opened = 0;
        for target in files {
            match self.apply_target(target).await {
                Ok(()) => opened += 1,
                Err(e) => log::warn!("Skipping {}: {}", target.path, e),
            }
        }
        opened
    }

    async fn apply_target(&mut self, target: &FileTarget) -> Result<()> {
        let path = self.resolve_path(&target.path);
        let document = self.surface.open_document(&path).await?;
        let mut view = self.surface.show_document(&document).await?;

        for &line in &target.lines {
            let Some(range) = self.range_for_line(line) else {
                log::warn!("Ignoring line 0 in {}; lines are 1-based", target.path);
                continue;
            };

            self.surface.set_selection(&mut view, range.into());
            if let Err(e) = self.surface.reveal_range(&view, range, self.reveal).await {
                log::warn!("Failed to reveal {}:{}: {}", target.path, line, e);
            }
        }
        Ok(())
    }
}
