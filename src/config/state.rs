// Application state module
// Immutable per-process state shared by every request

use std::path::{Path, PathBuf};

use super::types::Config;
use super::validation::ConfigValidationError;
use crate::routing::ForwardTable;

/// Application state
///
/// Built once at startup and shared behind an `Arc`; nothing in it changes
/// while the process runs, so request handling takes no locks.
pub struct AppState {
    pub config: Config,
    pub forwards: ForwardTable,
    pub static_root: PathBuf,
}

impl AppState {
    /// Validate `config` and build the shared state
    pub fn new(config: Config) -> Result<Self, ConfigValidationError> {
        let forwards = config.validate()?;
        let static_root = PathBuf::from(&config.spa.static_dir);
        Ok(Self {
            config,
            forwards,
            static_root,
        })
    }

    /// Location of the SPA entry document on disk, if present
    pub async fn entry_document(&self) -> Option<PathBuf> {
        let root_dir = self
            .static_root
            .join(self.config.spa.forward_target.trim_start_matches('/'));
        if is_file(&root_dir).await {
            return Some(root_dir);
        }
        for name in &self.config.spa.index_files {
            let candidate = root_dir.join(name);
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_for(dir: &Path, extra_spa: &str) -> AppState {
        let toml = format!(
            "[spa]\nstatic_dir = {:?}\n{extra_spa}",
            dir.to_str().unwrap()
        );
        AppState::new(Config::from_toml(&toml).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_entry_document_resolves_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), "");
        assert!(state.entry_document().await.is_none());

        std::fs::write(dir.path().join("index.html"), "<div id=\"app\"></div>").unwrap();
        let entry = state.entry_document().await.unwrap();
        assert!(entry.ends_with("index.html"));
    }

    #[tokio::test]
    async fn test_entry_document_uses_file_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.html"), "<div id=\"app\"></div>").unwrap();
        let state = state_for(dir.path(), "forward_target = \"/app.html\"");
        let entry = state.entry_document().await.unwrap();
        assert!(entry.ends_with("app.html"));
    }
}
