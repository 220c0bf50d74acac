// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge, histogram};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::domain::models::cache_record::CacheRecord;
use crate::domain::models::feed_item::FeedItem;
use crate::domain::repositories::cache_repository::{CacheError, CacheRepository};
use crate::domain::services::detail_fetcher::{DetailFetcher, FetchError};
use crate::domain::services::keyword_filter::filter_rows;
use crate::domain::services::search_scraper::SearchScraper;
use crate::domain::services::ttl_gate::{is_fresh, Clock};
use crate::domain::site::adapter::{ScrapeError, SiteAdapter};
use crate::engines::traits::{BrowserLauncher, DocumentFetcher};
use crate::infrastructure::observability::metrics::{
    FEED_ITEMS_PUBLISHED, FEED_REFRESH_DURATION_SECONDS, FEED_REFRESH_FAILED_TOTAL,
    FEED_REFRESH_TOTAL, FEED_REQUESTS_TOTAL,
};
use crate::utils::telemetry::now_for_log;

/// 刷新错误类型
#[derive(Error, Debug)]
pub enum RefreshError {
    /// 搜索阶段失败
    #[error("Search scrape failed: {0}")]
    Scrape(#[from] ScrapeError),
    /// 详情抓取失败
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// 刷新超时
    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),
    /// 缓存写入失败
    #[error("Cache persistence failed: {0}")]
    Persist(#[from] CacheError),
    /// 已有刷新在进行
    #[error("A refresh is already in progress")]
    InProgress,
    /// 刷新任务异常退出
    #[error("Refresh task failed: {0}")]
    Task(#[from] JoinError),
}

impl RefreshError {
    /// 失败所在阶段，用作指标标签
    pub fn stage(&self) -> &'static str {
        match self {
            RefreshError::Scrape(_) => "scrape",
            RefreshError::Fetch(_) => "fetch",
            RefreshError::Timeout(_) => "timeout",
            RefreshError::Persist(_) => "persist",
            RefreshError::InProgress => "in_progress",
            RefreshError::Task(_) => "task",
        }
    }
}

/// 单次刷新的上下文，在各阶段之间显式传递
#[derive(Debug, Clone)]
pub struct RefreshContext {
    pub id: Uuid,
    pub started_at_ms: i64,
    /// 整次刷新的截止时间，`None` 表示不限制
    pub deadline: Option<Instant>,
}

impl RefreshContext {
    pub fn new(started_at_ms: i64, deadline: Option<Instant>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at_ms,
            deadline,
        }
    }
}

/// 本次响应所用记录的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    /// 缓存仍然新鲜
    Cache,
    /// 本次请求完成了刷新
    Refresh,
    /// 刷新失败或正在进行，使用旧记录
    Stale,
}

impl FeedSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSource::Cache => "cache",
            FeedSource::Refresh => "refresh",
            FeedSource::Stale => "stale",
        }
    }
}

/// 订阅快照
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub record: Arc<CacheRecord>,
    pub source: FeedSource,
}

/// 订阅服务
///
/// 持有进程级的缓存记录，按 TTL 决定直接返回缓存还是执行
/// 抓取 → 过滤 → 详情 → 汇总 → 持久化 的刷新流程。
/// 同一时间最多只有一个刷新在运行。刷新在独立任务中执行，
/// 发起请求被丢弃后仍会跑完。
pub struct FeedService {
    scraper: SearchScraper,
    details: DetailFetcher,
    repository: Arc<dyn CacheRepository>,
    clock: Arc<dyn Clock>,
    terms: Vec<String>,
    ttl_minutes: u64,
    refresh_timeout: Option<Duration>,
    current: RwLock<Arc<CacheRecord>>,
    refresh_guard: Arc<Mutex<()>>,
}

impl FeedService {
    pub fn new(
        settings: &Settings,
        launcher: Arc<dyn BrowserLauncher>,
        fetcher: Arc<dyn DocumentFetcher>,
        adapter: Arc<dyn SiteAdapter>,
        repository: Arc<dyn CacheRepository>,
        clock: Arc<dyn Clock>,
        initial: CacheRecord,
    ) -> Self {
        gauge!(FEED_ITEMS_PUBLISHED).set(initial.rssitems.len() as f64);

        Self {
            scraper: SearchScraper::new(launcher, adapter.clone()),
            details: DetailFetcher::new(
                fetcher,
                adapter,
                settings.site.root_url.clone(),
                settings.site.display_name.clone(),
                settings.http.max_concurrent_fetches,
            ),
            repository,
            clock,
            terms: settings.search.terms.clone(),
            ttl_minutes: settings.feed.ttl_minutes,
            refresh_timeout: settings.refresh_timeout(),
            current: RwLock::new(Arc::new(initial)),
            refresh_guard: Arc::new(Mutex::new(())),
        }
    }

    /// 启动时读取缓存记录
    ///
    /// 文件不存在或无法读取时从空记录开始，首个请求会触发刷新
    pub async fn load_initial(repository: &dyn CacheRepository) -> CacheRecord {
        match repository.load().await {
            Ok(Some(record)) => {
                info!(
                    items = record.rssitems.len(),
                    last_cache = ?record.last_cache,
                    "Loaded cache record"
                );
                record
            }
            Ok(None) => {
                info!("No cache record found, starting with an empty feed");
                CacheRecord::empty()
            }
            Err(e) => {
                warn!("Cache record unreadable, starting with an empty feed: {}", e);
                CacheRecord::empty()
            }
        }
    }

    /// 当前记录
    pub fn current(&self) -> Arc<CacheRecord> {
        self.current.read().clone()
    }

    fn is_fresh(&self, record: &CacheRecord) -> bool {
        is_fresh(self.clock.now_millis(), record.last_cache, self.ttl_minutes)
    }

    /// 获取用于响应的订阅快照
    ///
    /// 刷新失败不会向调用方传播，而是返回上一份可用记录
    pub async fn feed(self: &Arc<Self>) -> FeedSnapshot {
        let snapshot = self.resolve().await;
        counter!(FEED_REQUESTS_TOTAL, "source" => snapshot.source.as_str()).increment(1);
        snapshot
    }

    async fn resolve(self: &Arc<Self>) -> FeedSnapshot {
        let record = self.current();
        if self.is_fresh(&record) {
            return FeedSnapshot {
                record,
                source: FeedSource::Cache,
            };
        }

        let Ok(guard) = self.refresh_guard.clone().try_lock_owned() else {
            info!("Refresh already in flight, serving stale feed");
            return self.stale();
        };

        // A refresh may have completed between the freshness check and the lock
        let record = self.current();
        if self.is_fresh(&record) {
            return FeedSnapshot {
                record,
                source: FeedSource::Cache,
            };
        }

        match self.spawn_refresh(guard).await {
            Ok(record) => FeedSnapshot {
                record,
                source: FeedSource::Refresh,
            },
            Err(_) => self.stale(),
        }
    }

    fn stale(&self) -> FeedSnapshot {
        FeedSnapshot {
            record: self.current(),
            source: FeedSource::Stale,
        }
    }

    /// 无视 TTL 立即刷新
    ///
    /// 已有刷新在进行时返回 [`RefreshError::InProgress`]
    pub async fn refresh(self: &Arc<Self>) -> Result<Arc<CacheRecord>, RefreshError> {
        let guard = self
            .refresh_guard
            .clone()
            .try_lock_owned()
            .map_err(|_| RefreshError::InProgress)?;
        self.spawn_refresh(guard).await
    }

    // The task owns the guard, so the lock is released only when the cycle ends.
    async fn spawn_refresh(
        self: &Arc<Self>,
        guard: OwnedMutexGuard<()>,
    ) -> Result<Arc<CacheRecord>, RefreshError> {
        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            service.run_refresh().await
        });

        handle.await.unwrap_or_else(|e| {
            error!("Refresh task failed: {}", e);
            Err(RefreshError::Task(e))
        })
    }

    async fn run_refresh(&self) -> Result<Arc<CacheRecord>, RefreshError> {
        let start = Instant::now();
        let ctx = RefreshContext::new(
            self.clock.now_millis(),
            self.refresh_timeout.map(|limit| start + limit),
        );
        let span = info_span!("refresh", refresh_id = %ctx.id);

        let result = async {
            let items = self.collect_items(&ctx).await?;
            self.commit(items).await
        }
        .instrument(span)
        .await;

        match &result {
            Ok(record) => {
                counter!(FEED_REFRESH_TOTAL).increment(1);
                histogram!(FEED_REFRESH_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
                gauge!(FEED_ITEMS_PUBLISHED).set(record.rssitems.len() as f64);
            }
            Err(e) => {
                error!(refresh_id = %ctx.id, stage = e.stage(), "Unable to update cache: {}", e);
                counter!(FEED_REFRESH_FAILED_TOTAL, "stage" => e.stage()).increment(1);
            }
        }
        result
    }

    async fn collect_items(&self, ctx: &RefreshContext) -> Result<Vec<FeedItem>, RefreshError> {
        // The scraper enforces the deadline itself so its session is always closed.
        let rows = self.scraper.scrape(ctx).await.map_err(|e| match e {
            ScrapeError::Deadline => self.timed_out(),
            e => RefreshError::Scrape(e),
        })?;
        let matched = filter_rows(rows, &self.terms);
        info!(matched = matched.len(), "Filtered search results by keyword");

        let fetch = self.details.fetch_all(ctx, matched);
        let items = match ctx.deadline {
            Some(at) => tokio::time::timeout_at(at, fetch)
                .await
                .map_err(|_| self.timed_out())??,
            None => fetch.await?,
        };
        Ok(items)
    }

    fn timed_out(&self) -> RefreshError {
        RefreshError::Timeout(self.refresh_timeout.unwrap_or_default())
    }

    // Persist first; the in-memory record only advances once the file is written.
    async fn commit(&self, items: Vec<FeedItem>) -> Result<Arc<CacheRecord>, RefreshError> {
        let previous = self.current();
        let record = Arc::new(CacheRecord::refreshed(
            self.clock.now_millis(),
            previous.last_cache,
            items,
        ));

        self.repository.save(&record).await?;
        *self.current.write() = record.clone();

        info!(items = record.rssitems.len(), "Updated cache file @ {}", now_for_log());
        Ok(record)
    }
}
