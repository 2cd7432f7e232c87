//! Read-only template directory lookup.

use std::path::{Path, PathBuf};

use super::error::TemplateError;
use super::{DESCRIPTOR_FILE, EVALUATION_FILE};

/// A template id that was verified to exist on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateHandle {
    id: String,
    dir: PathBuf,
}

impl TemplateHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the template's default scoring config (may not exist).
    pub fn evaluation_path(&self) -> PathBuf {
        self.dir.join(EVALUATION_FILE)
    }
}

/// Maps template ids to template directories.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Verify that `template_id` names a directory holding a descriptor.
    ///
    /// Ids that could address anything outside the templates root are
    /// rejected without touching the filesystem.
    pub async fn resolve(&self, template_id: &str) -> Result<TemplateHandle, TemplateError> {
        if !is_plain_id(template_id) {
            return Err(TemplateError::not_found(template_id));
        }

        let dir = self.root.join(template_id);
        let is_dir = tokio::fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        let has_descriptor = is_dir
            && tokio::fs::metadata(dir.join(DESCRIPTOR_FILE))
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);

        if !has_descriptor {
            return Err(TemplateError::not_found(template_id));
        }

        Ok(TemplateHandle {
            id: template_id.to_string(),
            dir,
        })
    }
}

fn is_plain_id(template_id: &str) -> bool {
    !template_id.is_empty()
        && template_id != "."
        && template_id != ".."
        && !template_id.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_template(id: &str) -> (TempDir, TemplateStore) {
        let dir = TempDir::new().unwrap();
        let template_dir = dir.path().join(id);
        std::fs::create_dir_all(&template_dir).unwrap();
        std::fs::write(template_dir.join(DESCRIPTOR_FILE), b"{}").unwrap();
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_resolve_existing_template() {
        let (_dir, store) = store_with_template("default");
        let handle = store.resolve("default").await.unwrap();
        assert_eq!(handle.id(), "default");
        assert!(handle.dir().ends_with("default"));
        assert!(handle.evaluation_path().ends_with("default/evaluation.json"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_template() {
        let (_dir, store) = store_with_template("default");
        let err = store.resolve("missing").await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
        assert_eq!(err.to_string(), "Template 'missing' not found");
    }

    #[tokio::test]
    async fn test_resolve_directory_without_descriptor() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("bare")).unwrap();
        let store = TemplateStore::new(dir.path());
        assert!(store.resolve("bare").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_rejects_path_like_ids() {
        let (_dir, store) = store_with_template("default");
        for id in ["", ".", "..", "../default", "default/..", "a\\b"] {
            assert!(store.resolve(id).await.is_err(), "accepted {id:?}");
        }
    }
}
