//! 시세 조회 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 종목명/코드 해석
//! stock resolve 贵州茅台
//!
//! # 시세 조회 (장중이면 실시간, 아니면 마지막 일봉)
//! stock quote 600519
//!
//! # 최근 30일 일봉
//! stock daily 000001.SZ --days 30
//!
//! # 종목 검색
//! stock search 银行 --limit 5
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use stock_core::{init_logging, AppConfig, LogConfig};
use stock_data::{QuoteService, UpstreamSources};
use tracing::info;

use stock_cli::commands::{directory, health, quote};

#[derive(Parser, Debug)]
#[command(name = "stock")]
#[command(about = "A주 종목 해석 및 시세 조회 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// 종목명/코드를 표준 코드로 해석
    Resolve {
        /// 종목 식별자 (예: 贵州茅台, 600519, 600519.SH)
        input: String,
    },

    /// 종목 정보 조회
    Info {
        /// 종목 식별자
        input: String,
    },

    /// 시세 조회
    Quote {
        /// 종목 식별자
        input: String,
    },

    /// 일봉 차트 조회
    Daily {
        /// 종목 식별자
        input: String,

        /// 조회 일수 (기본: 설정값)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// 종목 검색
    Search {
        /// 검색어 (종목명 일부 또는 코드)
        query: String,

        /// 최대 결과 수 (기본: 설정값)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 종목 디렉토리 즉시 갱신
    Refresh,

    /// 서비스 상태 확인
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config))?;
    init_logging(LogConfig::from_app_config(&config.logging))
        .map_err(|e| anyhow!("로깅 초기화 실패: {}", e))?;

    let sources = UpstreamSources::sina(&config.upstream)?;
    let service = QuoteService::new(&config, sources)?;

    // 수동 갱신은 파일 스냅샷을 건너뜀
    if cli.command != Commands::Refresh {
        let count = service.initialize().await;
        info!(count, "종목 디렉토리 준비 완료");
    }

    match cli.command {
        Commands::Resolve { input } => directory::resolve(&service, &input).await,
        Commands::Info { input } => directory::info(&service, &input).await,
        Commands::Quote { input } => quote::quote(&service, &input).await,
        Commands::Daily { input, days } => quote::daily(&service, &input, days).await,
        Commands::Search { query, limit } => directory::search(&service, &query, limit).await,
        Commands::Refresh => directory::refresh(&service).await,
        Commands::Health => health::health(&service).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_daily_with_days() {
        let cli = Cli::try_parse_from(["stock", "daily", "600519", "--days", "30"]).unwrap();
        assert_eq!(cli.config, "config/default.toml");
        assert_eq!(
            cli.command,
            Commands::Daily {
                input: "600519".to_string(),
                days: Some(30),
            }
        );
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["stock", "search", "银行", "--config", "local.toml"]).unwrap();
        assert_eq!(cli.config, "local.toml");
        assert_eq!(
            cli.command,
            Commands::Search {
                query: "银行".to_string(),
                limit: None,
            }
        );
    }

    #[test]
    fn test_missing_input_is_rejected() {
        assert!(Cli::try_parse_from(["stock", "quote"]).is_err());
    }
}
