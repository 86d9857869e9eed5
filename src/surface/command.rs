//! Editing surface that drives an external editor through its command line
//!
//! Each reveal runs the configured command template once, e.g.
//! `["code", "--goto", "{path}:{line}:{column}"]`. `{line}` and `{column}`
//! are substituted 1-based, which is what editor CLIs expect.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{DocumentHandle, EditingSurface, EditorView, Range, RevealKind, Selection};
use crate::error::{BridgeError, Result};

pub struct CommandSurface {
    template: Vec<String>,
    next_view_id: u64,
}

impl CommandSurface {
    /// Create a surface from a command template
    ///
    /// # Errors
    /// Returns error if the template is empty
    pub fn new(template: Vec<String>) -> Result<Self> {
        if template.is_empty() {
            return Err(BridgeError::invalid_config("editor command is empty"));
        }
        Ok(Self {
            template,
            next_view_id: 1,
        })
    }

    fn expand_args(&self, path: &Path, range: Range) -> Vec<String> {
        let path = path.to_string_lossy();
        let line = (range.start.line + 1).to_string();
        let column = (range.start.character + 1).to_string();

        self.template
            .iter()
            .map(|arg| {
                arg.replace("{path}", &path)
                    .replace("{line}", &line)
                    .replace("{column}", &column)
            })
            .collect()
    }
}

#[async_trait]
impl EditingSurface for CommandSurface {
    async fn open_document(&mut self, path: &Path) -> Result<DocumentHandle> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| BridgeError::document_open(path, e))?;
        if !metadata.is_file() {
            return Err(BridgeError::document_open(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        Ok(DocumentHandle {
            path: path.to_path_buf(),
        })
    }

    async fn show_document(&mut self, document: &DocumentHandle) -> Result<EditorView> {
        let id = self.next_view_id;
        self.next_view_id += 1;
        Ok(EditorView {
            id,
            path: document.path.clone(),
            selection: None,
        })
    }

    fn set_selection(&mut self, view: &mut EditorView, selection: Selection) {
        view.selection = Some(selection);
    }

    async fn reveal_range(
        &mut self,
        view: &EditorView,
        range: Range,
        _kind: RevealKind,
    ) -> Result<()> {
        let args = self.expand_args(&view.path, range);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| BridgeError::editor("editor command is empty"))?;

        log::debug!("Running editor command: {:?}", args);

        let status = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| BridgeError::editor(format!("Failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(BridgeError::editor(format!(
                "{} exited with {}",
                program, status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(CommandSurface::new(vec![]).is_err());
    }

    #[test]
    fn test_expand_args_is_one_based() {
        let surface =
            CommandSurface::new(template(&["code", "--goto", "{path}:{line}:{column}"])).unwrap();
        let args = surface.expand_args(Path::new("/src/main.rs"), Range::new(4, 0, 4, 100));
        assert_eq!(args, vec!["code", "--goto", "/src/main.rs:5:1"]);
    }

    #[tokio::test]
    async fn test_open_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = CommandSurface::new(template(&["true"])).unwrap();
        let err = surface.open_document(dir.path()).await.unwrap_err();
        assert!(matches!(err, BridgeError::DocumentOpen { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reveal_runs_command() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut ok = CommandSurface::new(template(&["true", "{path}:{line}"])).unwrap();
        let doc = ok.open_document(file.path()).await.unwrap();
        let view = ok.show_document(&doc).await.unwrap();
        let range = Range::new(0, 0, 0, 100);
        ok.reveal_range(&view, range, RevealKind::InCenter)
            .await
            .unwrap();

        let mut failing = CommandSurface::new(template(&["false"])).unwrap();
        let err = failing
            .reveal_range(&view, range, RevealKind::InCenter)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Editor(_)));
    }
}
