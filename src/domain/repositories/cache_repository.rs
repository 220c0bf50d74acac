// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::cache_record::CacheRecord;

/// 缓存错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 缓存仓库特质
///
/// 定义缓存记录的持久化接口
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// 读取缓存记录，不存在时返回 `None`
    async fn load(&self) -> Result<Option<CacheRecord>, CacheError>;

    /// 整体替换缓存记录
    async fn save(&self, record: &CacheRecord) -> Result<(), CacheError>;
}
