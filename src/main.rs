// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Extension;
use planfeed::config::settings::Settings;
use planfeed::domain::services::feed_renderer::FeedMetadata;
use planfeed::domain::services::feed_service::FeedService;
use planfeed::domain::services::ttl_gate::SystemClock;
use planfeed::engines::chromium_engine::ChromiumLauncher;
use planfeed::engines::reqwest_engine::ReqwestEngine;
use planfeed::infrastructure::cache::file_cache::FileCacheRepository;
use planfeed::infrastructure::observability::metrics::init_metrics;
use planfeed::infrastructure::site::idox::IdoxAdapter;
use planfeed::presentation::routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use planfeed::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting planfeed...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    init_metrics(&settings.metrics)?;

    // 3. Load the persisted cache record
    let repository = Arc::new(FileCacheRepository::new(&settings.cache.path));
    let initial = FeedService::load_initial(repository.as_ref()).await;

    // 4. Initialize engines and the site adapter
    let launcher = Arc::new(ChromiumLauncher::from_settings(&settings));
    let fetcher = Arc::new(ReqwestEngine::from_settings(&settings)?);
    let adapter = Arc::new(IdoxAdapter::from_settings(&settings));

    let service = Arc::new(FeedService::new(
        &settings,
        launcher,
        fetcher,
        adapter,
        repository,
        Arc::new(SystemClock),
        initial,
    ));
    let metadata = Arc::new(FeedMetadata::from_settings(&settings));

    // 5. Start HTTP server
    let app = routes::routes(&settings.server.feed_path, &settings.server.static_dir)
        .layer(Extension(service))
        .layer(Extension(metadata));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Server listening on {}, feed at {}",
        addr, settings.server.feed_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}
