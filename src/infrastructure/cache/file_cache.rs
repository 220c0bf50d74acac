// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::models::cache_record::CacheRecord;
use crate::domain::repositories::cache_repository::{CacheError, CacheRepository};

/// 本地 JSON 文件缓存
///
/// 写入先落到同目录的临时文件再重命名，读取方不会看到写了一半的文件
pub struct FileCacheRepository {
    path: PathBuf,
}

impl FileCacheRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
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
}

#[async_trait]
impl CacheRepository for FileCacheRepository {
    async fn load(&self) -> Result<Option<CacheRecord>, CacheError> {
        match fs::read(&self.path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    async fn save(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let json = serde_json::to_vec_pretty(record)?;

        // 确保目录存在
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), bytes = json.len(), "Cache file replaced");
        Ok(())
    }
}
