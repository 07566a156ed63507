//! Standalone currency collector CLI.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use currency_collector::shutdown::{drain, shutdown_signal};
use currency_collector::{init_tracing, modules, CollectorConfig, RateScheduler};
use currency_data::{CurrencyApiClient, Database, RateRepository};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "currency-collector")]
#[command(about = "Currency rate collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 환율 1회 수집
    CollectOnce,

    /// 데몬 모드: REQUEST_INTERVAL 주기로 수집
    Daemon,

    /// 데이터베이스 마이그레이션 실행
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_tracing(&format!("currency_collector={0},currency_data={0}", cli.log_level));

    tracing::info!("Currency Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(provider_url = %config.provider.url, "설정 로드 완료");

    // DB 연결
    let db = Database::connect(config.database.clone()).await?;
    tracing::info!("데이터베이스 연결 성공");

    let CollectorConfig {
        provider, schedule, ..
    } = config;

    match cli.command {
        Commands::Migrate => {
            db.migrate().await?;
        }
        Commands::CollectOnce => {
            let client = CurrencyApiClient::new(provider)?;
            let repository = RateRepository::new(db.clone());

            let report = modules::run_cycle(&client, &repository, CancellationToken::new()).await;
            tracing::info!(
                outcome = report.outcome.as_str(),
                audit_id = ?report.audit_id,
                rates = report.rates_written,
                "1회 수집 완료"
            );
        }
        Commands::Daemon => {
            let client = Arc::new(CurrencyApiClient::new(provider)?);
            let repository = Arc::new(RateRepository::new(db.clone()));
            let scheduler = RateScheduler::new(client, repository, schedule.interval)?;

            tracing::info!("=== 데몬 모드 시작 (주기: {:?}) ===", schedule.interval);

            let shutdown = CancellationToken::new();
            let force = CancellationToken::new();
            let handle = {
                let (shutdown, force) = (shutdown.clone(), force.clone());
                tokio::spawn(async move { scheduler.run(shutdown, force).await })
            };

            shutdown_signal(shutdown).await;
            drain(handle, schedule.shutdown_grace, &force).await;
        }
    }

    db.close().await;
    tracing::info!("Currency Collector 종료");

    Ok(())
}
