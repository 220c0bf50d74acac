// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    build_service, test_settings, FailingRepository, FixedClock, ScriptedLauncher,
    DOCS_WITHOUT_FORM, DOCS_WITH_FORM, NOW_MS, SEARCH_RESULTS,
};
use planfeed::domain::models::cache_record::CacheRecord;
use planfeed::domain::models::feed_item::{title_guid, FeedItem};
use planfeed::domain::repositories::cache_repository::CacheRepository;
use planfeed::domain::services::feed_service::{FeedService, FeedSource, RefreshError};
use planfeed::domain::site::adapter::ScrapeError;
use planfeed::infrastructure::cache::file_cache::FileCacheRepository;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETAILS_PATH: &str = "/online-applications/applicationDetails.do";
const NO_FORM: &str = "There is currently no Application Form available for this case.";

fn cache_repo(dir: &TempDir) -> (Arc<FileCacheRepository>, String) {
    let path = dir.path().join("rsscache.json");
    let path_str = path.to_string_lossy().into_owned();
    (Arc::new(FileCacheRepository::new(path)), path_str)
}

fn stale_record() -> CacheRecord {
    CacheRecord {
        last_cache: Some(0),
        rssitems: vec![FeedItem::new(
            "Old application".to_string(),
            "https://planning.example.gov.uk/old".to_string(),
            "<p>old</p>".to_string(),
        )],
    }
}

async fn mount_documents(server: &MockServer, key: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(DETAILS_PATH))
        .and(query_param("activeTab", "documents"))
        .and(query_param("keyVal", key))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// 端到端刷新测试
///
/// 过期缓存触发刷新，命中行带申请表时链接指向文档页，并写入缓存文件
#[tokio::test]
async fn refresh_publishes_matching_application_and_persists() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 200, DOCS_WITH_FORM).await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["new build"], &cache_path);
    let launcher = ScriptedLauncher::serving(SEARCH_RESULTS);
    let clock = FixedClock::new(NOW_MS);

    let service = build_service(
        &settings,
        launcher.clone(),
        repository.clone(),
        clock.clone(),
        CacheRecord {
            last_cache: Some(0),
            rssitems: Vec::new(),
        },
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Refresh);
    assert_eq!(snapshot.record.last_cache, Some(NOW_MS));
    assert_eq!(snapshot.record.rssitems.len(), 1);

    let item = &snapshot.record.rssitems[0];
    assert_eq!(item.title, "New Build detached house");
    assert_eq!(
        item.link,
        format!(
            "{}{}?activeTab=documents&keyVal=QA2",
            server.uri(),
            DETAILS_PATH
        )
    );
    assert_eq!(item.guid, title_guid("New Build detached house"));
    assert!(item.description.contains("<b>Ref</b>: PA20/00002"));
    assert!(item.description.contains("<b>Status</b>: Decided"));
    assert!(item.description.contains("activeTab=summary"));
    assert!(!item.description.contains(NO_FORM));

    let persisted = repository.load().await.unwrap().unwrap();
    assert_eq!(persisted, *snapshot.record);
    assert_eq!(launcher.opens(), 1);
    assert_eq!(launcher.closes(), 1);
}

/// TTL 内的请求不会重新抓取，过期后才会
#[tokio::test]
async fn fresh_cache_is_served_without_scraping() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 200, DOCS_WITH_FORM).await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["new build"], &cache_path);
    let launcher = ScriptedLauncher::serving(SEARCH_RESULTS);
    let clock = FixedClock::new(NOW_MS);

    let service = build_service(
        &settings,
        launcher.clone(),
        repository,
        clock.clone(),
        CacheRecord::empty(),
    );

    assert_eq!(service.feed().await.source, FeedSource::Refresh);

    clock.advance(Duration::from_secs(59 * 60));
    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Cache);
    assert_eq!(snapshot.record.last_cache, Some(NOW_MS));
    assert_eq!(launcher.opens(), 1);

    clock.advance(Duration::from_secs(2 * 60));
    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Refresh);
    assert_eq!(
        snapshot.record.last_cache,
        Some(NOW_MS + 61 * 60 * 1000)
    );
    assert_eq!(launcher.opens(), 2);
}

/// 没有申请表的案件链接到摘要页并附加说明
#[tokio::test]
async fn missing_application_form_links_summary_page() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA1", 200, DOCS_WITHOUT_FORM).await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["dwelling"], &cache_path);

    let service = build_service(
        &settings,
        ScriptedLauncher::serving(SEARCH_RESULTS),
        repository,
        FixedClock::new(NOW_MS),
        CacheRecord::empty(),
    );

    let record = service.refresh().await.unwrap();
    assert_eq!(record.rssitems.len(), 1);

    let item = &record.rssitems[0];
    assert_eq!(item.title, "Extension to dwelling");
    assert_eq!(
        item.link,
        format!("{}{}?activeTab=summary&keyVal=QA1", server.uri(), DETAILS_PATH)
    );
    assert!(item.description.contains(NO_FORM));
    assert!(item.description.contains("<b>Address</b>: Flat 1, Main St, Truro TR1 1AA"));
}

/// 任一详情页失败时整次刷新作废，保留旧记录
#[tokio::test]
async fn failed_document_fetch_keeps_previous_record() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 500, "Internal Server Error").await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["new build"], &cache_path);

    let service = build_service(
        &settings,
        ScriptedLauncher::serving(SEARCH_RESULTS),
        repository.clone(),
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Stale);
    assert_eq!(*snapshot.record, stale_record());
    assert_eq!(service.current().last_cache, Some(0));

    assert!(repository.load().await.unwrap().is_none());

    let err = service.refresh().await.unwrap_err();
    assert!(matches!(err, RefreshError::Fetch(_)));
    assert_eq!(err.stage(), "fetch");
}

/// 冷启动且浏览器不可用时返回空订阅
#[tokio::test]
async fn cold_start_with_unavailable_browser_serves_empty_feed() {
    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings("http://127.0.0.1:9", &["extension"], &cache_path);

    let initial = FeedService::load_initial(repository.as_ref()).await;
    assert_eq!(initial, CacheRecord::empty());

    let launcher = ScriptedLauncher::failing();
    let service = build_service(
        &settings,
        launcher.clone(),
        repository,
        FixedClock::new(NOW_MS),
        initial,
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Stale);
    assert!(snapshot.record.rssitems.is_empty());
    assert_eq!(snapshot.record.last_cache, None);
    assert_eq!(launcher.opens(), 1);

    let err = service.refresh().await.unwrap_err();
    assert_eq!(err.stage(), "scrape");
}

/// 无法解析的缓存文件按冷启动处理
#[tokio::test]
async fn unreadable_cache_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let (repository, _) = cache_repo(&dir);
    tokio::fs::write(repository.path(), b"{ not json").await.unwrap();

    let initial = FeedService::load_initial(repository.as_ref()).await;
    assert_eq!(initial, CacheRecord::empty());
}

/// 写入缓存失败时不更新内存记录
#[tokio::test]
async fn persist_failure_keeps_previous_record() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 200, DOCS_WITH_FORM).await;

    let settings = test_settings(&server.uri(), &["new build"], "unused.json");
    let service = build_service(
        &settings,
        ScriptedLauncher::serving(SEARCH_RESULTS),
        Arc::new(FailingRepository),
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Stale);
    assert_eq!(*snapshot.record, stale_record());

    let err = service.refresh().await.unwrap_err();
    assert!(matches!(err, RefreshError::Persist(_)));
}

/// 刷新进行中时并发请求拿到旧记录，强制刷新被拒绝
#[tokio::test]
async fn concurrent_request_gets_stale_record_while_refreshing() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 200, DOCS_WITH_FORM).await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["new build"], &cache_path);

    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let launcher = ScriptedLauncher::gated(SEARCH_RESULTS, started.clone(), release.clone());

    let service = build_service(
        &settings,
        launcher.clone(),
        repository,
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let refreshing = {
        let service = service.clone();
        tokio::spawn(async move { service.feed().await })
    };
    started.notified().await;

    let concurrent = service.feed().await;
    assert_eq!(concurrent.source, FeedSource::Stale);
    assert_eq!(*concurrent.record, stale_record());
    assert!(matches!(
        service.refresh().await,
        Err(RefreshError::InProgress)
    ));

    release.notify_one();
    let first = refreshing.await.unwrap();
    assert_eq!(first.source, FeedSource::Refresh);
    assert_eq!(first.record.rssitems.len(), 1);
    assert_eq!(launcher.opens(), 1);

    let after = service.feed().await;
    assert_eq!(after.source, FeedSource::Cache);
}

/// 超过刷新总时限时放弃本次刷新
#[tokio::test(start_paused = true)]
async fn refresh_timeout_serves_stale_record() {
    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings("http://127.0.0.1:9", &["extension"], &cache_path);
    assert_eq!(settings.refresh_timeout(), Some(Duration::from_secs(120)));

    let launcher = ScriptedLauncher::slow(SEARCH_RESULTS, Duration::from_secs(600));
    let service = build_service(
        &settings,
        launcher.clone(),
        repository,
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Stale);
    assert_eq!(*snapshot.record, stale_record());
    assert_eq!(launcher.closes(), 1);

    let err = service.refresh().await.unwrap_err();
    assert!(matches!(err, RefreshError::Timeout(d) if d == Duration::from_secs(120)));
    assert_eq!(err.stage(), "timeout");
    assert_eq!(launcher.opens(), 2);
    assert_eq!(launcher.closes(), 2);
}

/// 结果页结构不符时刷新失败，会话仍被关闭
#[tokio::test]
async fn malformed_results_page_still_releases_session() {
    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings("http://127.0.0.1:9", &["extension"], &cache_path);

    let launcher = ScriptedLauncher::serving(
        r#"<ul id="searchresults"><li class="searchresult"><a href="/x">Extension</a></li></ul>"#,
    );
    let service = build_service(
        &settings,
        launcher.clone(),
        repository,
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Stale);
    assert_eq!(*snapshot.record, stale_record());

    let err = service.refresh().await.unwrap_err();
    assert!(matches!(
        err,
        RefreshError::Scrape(ScrapeError::MissingElement(".address"))
    ));
    assert_eq!(launcher.opens(), 2);
    assert_eq!(launcher.closes(), 2);
}

/// 发起请求被丢弃后，已开始的刷新仍会完成并写入缓存
#[tokio::test]
async fn dropped_request_does_not_cancel_refresh() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 200, DOCS_WITH_FORM).await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["new build"], &cache_path);

    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let launcher = ScriptedLauncher::gated(SEARCH_RESULTS, started.clone(), release.clone());

    let service = build_service(
        &settings,
        launcher.clone(),
        repository.clone(),
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let request = {
        let service = service.clone();
        tokio::spawn(async move { service.feed().await })
    };
    started.notified().await;
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    release.notify_one();
    tokio::time::timeout(Duration::from_secs(5), async {
        while service.current().last_cache != Some(NOW_MS) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let record = service.current();
    assert_eq!(record.rssitems.len(), 1);
    assert_eq!(record.rssitems[0].title, "New Build detached house");
    assert_eq!(launcher.opens(), 1);
    assert_eq!(launcher.closes(), 1);
    assert_eq!(repository.load().await.unwrap(), Some((*record).clone()));
}

/// 时钟回拨时 lastCache 不会倒退
#[tokio::test]
async fn last_cache_never_moves_backwards() {
    let server = MockServer::start().await;
    mount_documents(&server, "QA2", 200, DOCS_WITH_FORM).await;

    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings(&server.uri(), &["new build"], &cache_path);
    let ahead = NOW_MS + 10 * 60 * 1000;

    let service = build_service(
        &settings,
        ScriptedLauncher::serving(SEARCH_RESULTS),
        repository,
        FixedClock::new(NOW_MS),
        CacheRecord {
            last_cache: Some(ahead),
            rssitems: Vec::new(),
        },
    );

    let record = service.refresh().await.unwrap();
    assert_eq!(record.last_cache, Some(ahead));
    assert_eq!(record.rssitems.len(), 1);
}

/// 没有命中关键词时发布空列表并推进 lastCache
#[tokio::test]
async fn no_matches_publishes_empty_feed() {
    let dir = TempDir::new().unwrap();
    let (repository, cache_path) = cache_repo(&dir);
    let settings = test_settings("http://127.0.0.1:9", &["swimming pool", "  "], &cache_path);

    let service = build_service(
        &settings,
        ScriptedLauncher::serving(SEARCH_RESULTS),
        repository.clone(),
        FixedClock::new(NOW_MS),
        stale_record(),
    );

    let snapshot = service.feed().await;
    assert_eq!(snapshot.source, FeedSource::Refresh);
    assert!(snapshot.record.rssitems.is_empty());
    assert_eq!(snapshot.record.last_cache, Some(NOW_MS));
    assert_eq!(repository.load().await.unwrap(), Some((*snapshot.record).clone()));
}
