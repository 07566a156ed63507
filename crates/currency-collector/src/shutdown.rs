//! 종료 시그널 처리.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
/// 토큰이 다른 경로로 먼저 취소되어도 반환합니다.
pub async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
        _ = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}

/// 태스크 종료를 `grace` 동안 기다리고, 넘기면 `force`를 취소한 뒤 마저 기다립니다.
///
/// 태스크가 패닉 등으로 실패하면 `None`을 반환합니다.
pub async fn drain<T>(
    mut handle: JoinHandle<T>,
    grace: Duration,
    force: &CancellationToken,
) -> Option<T> {
    let joined = match tokio::time::timeout(grace, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
            warn!(?grace, "Grace period expired, aborting in-flight work");
            force.cancel();
            handle.await
        }
    };

    match joined {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, "Background task failed");
            None
        }
    }
}
