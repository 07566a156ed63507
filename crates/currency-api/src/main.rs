//! Currency API 서버.
//!
//! 환율 수집 스케줄러와 조회 HTTP 서버를 함께 실행합니다.
//! 종료 시그널을 받으면 새 요청/수집을 멈추고, 진행 중인 수집은
//! `SHUTDOWN_GRACE_SECS` 동안 기다린 뒤 강제 중단합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Request, ServiceExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use currency_api::metrics::setup_metrics_recorder;
use currency_api::{create_app, AppState, ServerConfig};
use currency_collector::shutdown::{drain, shutdown_signal};
use currency_collector::{init_tracing, CollectorConfig, RateScheduler};
use currency_data::{CurrencyApiClient, Database, RateRepository};

/// 진행 중인 HTTP 요청 정리 대기 상한
const SERVER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("currency_api=info,currency_collector=info,currency_data=info,tower_http=info");

    info!("Currency API 서버 시작");

    // 설정 로드 (.env 포함)
    let config = CollectorConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    let addr = server_config.socket_addr()?;

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus 메트릭 레코더 초기화 완료");

    // DB 연결 및 마이그레이션
    let db = Database::connect(config.database.clone()).await?;
    db.migrate().await?;
    info!("데이터베이스 연결 성공");

    let CollectorConfig {
        provider, schedule, ..
    } = config;

    let client = Arc::new(CurrencyApiClient::new(provider)?);
    let repository = Arc::new(RateRepository::new(db.clone()));
    let scheduler = Arc::new(RateScheduler::new(
        client,
        repository.clone(),
        schedule.interval,
    )?);

    let shutdown = CancellationToken::new();
    let force = CancellationToken::new();

    let scheduler_handle = {
        let scheduler = scheduler.clone();
        let (shutdown, force) = (shutdown.clone(), force.clone());
        tokio::spawn(async move { scheduler.run(shutdown, force).await })
    };

    let state = Arc::new(AppState::new(repository).with_scheduler(scheduler.subscribe()));
    let app = create_app(state, Some(metrics_handle));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "HTTP 서버 리스닝");

    let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.cancelled().await }
        });
    let mut server_handle = tokio::spawn(async move { server.await });

    // 시그널 또는 서버 조기 종료 대기
    let finished_early = tokio::select! {
        _ = shutdown_signal(shutdown.clone()) => None,
        result = &mut server_handle => Some(result),
    };
    shutdown.cancel();

    if let Some(stats) = drain(scheduler_handle, schedule.shutdown_grace, &force).await {
        info!(
            cycles = stats.total,
            rates = stats.total_rates,
            "스케줄러 정리 완료"
        );
    }

    let server_result = match finished_early {
        Some(result) => Ok(result),
        None => tokio::time::timeout(SERVER_SHUTDOWN_TIMEOUT, server_handle).await,
    };
    match server_result {
        Ok(Ok(Ok(()))) => info!("HTTP 서버 종료"),
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP 서버 오류"),
        Ok(Err(e)) => error!(error = %e, "HTTP 서버 태스크 실패"),
        Err(_) => warn!(timeout = ?SERVER_SHUTDOWN_TIMEOUT, "HTTP 서버 종료 타임아웃"),
    }

    db.close().await;
    info!("Currency API 서버 종료");

    Ok(())
}
