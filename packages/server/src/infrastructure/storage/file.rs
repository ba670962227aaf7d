//! ファイルによるドキュメント永続化
//!
//! 本文を 1 つのテキストファイルに保存します。書き込みは一時ファイルに書いてから
//! rename で置き換えるため、途中で失敗しても既存のファイルは壊れません。

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{DocumentStorage, StorageError};

pub struct FileDocumentStorage {
    path: PathBuf,
    default_content: String,
}

impl FileDocumentStorage {
    pub fn new(path: impl Into<PathBuf>, default_content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_content: default_content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn ensure_parent(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStorage for FileDocumentStorage {
    async fn load(&self) -> Result<String, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                tracing::info!("Loaded document from {}", self.path.display());
                Ok(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "No document at {}, writing the default content",
                    self.path.display()
                );
                self.save(&self.default_content).await?;
                Ok(self.default_content.clone())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, content: &str) -> Result<(), StorageError> {
        self.ensure_parent().await?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(
            "Saved {} bytes to {}",
            content.len(),
            self.path.display()
        );
        Ok(())
    }
}
