//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → TOML 파일 → 환경 변수(`STOCK__SECTION__KEY`) 순서로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 종목 디렉토리 설정
    pub directory: DirectoryConfig,
    /// 거래 세션 설정
    pub session: SessionConfig,
    /// 일봉 캐시 설정
    pub series: SeriesConfig,
    /// 시세 조립 설정
    pub quote: QuoteConfig,
    /// 업스트림 호출 설정
    pub upstream: UpstreamConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 종목 디렉토리 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// 스냅샷 파일을 둘 디렉토리
    pub cache_dir: PathBuf,
    /// 스냅샷 파일명
    pub snapshot_file: String,
    /// 스냅샷 유효 기간 (시간)
    pub ttl_hours: u64,
    /// 검색 결과 최대 개수
    pub search_limit: usize,
    /// 갱신 실패 후 재시도까지 대기 시간 (초)
    pub retry_backoff_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            snapshot_file: "stock_list.json".to_string(),
            ttl_hours: 24,
            search_limit: 10,
            retry_backoff_secs: 300,
        }
    }
}

impl DirectoryConfig {
    /// 스냅샷 파일 전체 경로.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(&self.snapshot_file)
    }

    /// 스냅샷 TTL.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours as i64)
    }

    /// 갱신 실패 후 재시도 대기 시간.
    pub fn retry_backoff(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retry_backoff_secs as i64)
    }
}

/// 거래 세션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 거래소 타임존
    pub timezone: String,
    /// 오전 세션 시작 (HH:MM)
    pub morning_start: String,
    /// 오전 세션 종료 (HH:MM)
    pub morning_end: String,
    /// 오후 세션 시작 (HH:MM)
    pub afternoon_start: String,
    /// 오후 세션 종료 (HH:MM)
    pub afternoon_end: String,
    /// 주말을 장외로 취급
    pub weekdays_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Shanghai".to_string(),
            morning_start: "09:30".to_string(),
            morning_end: "11:30".to_string(),
            afternoon_start: "13:00".to_string(),
            afternoon_end: "15:00".to_string(),
            weekdays_only: true,
        }
    }
}

/// 일봉 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// 캐시 최대 항목 수
    pub capacity: usize,
    /// 일봉 차트 기본 조회 일수
    pub default_days: u32,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            capacity: 128,
            default_days: 60,
        }
    }
}

/// 시세 조립 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// 기간 변동률 계산 기간 (거래일)
    pub periods: Vec<u32>,
    /// 휴장·거래정지를 감안한 추가 조회 일수
    pub extra_days: u32,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            periods: vec![3, 5, 10],
            extra_days: 4,
        }
    }
}

impl QuoteConfig {
    /// 기준 시리즈 조회 일수 (최장 기간 + 당일 + 추가 일수).
    pub fn reference_lookback(&self) -> u32 {
        let longest = self.periods.iter().copied().max().unwrap_or(0);
        longest + 1 + self.extra_days
    }
}

/// 업스트림 호출 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// 시세/일봉 호출 타임아웃 (초)
    pub timeout_secs: u64,
    /// 전체 종목 목록 호출 타임아웃 (초)
    pub directory_timeout_secs: u64,
    /// 종목 목록 페이지 크기
    pub page_size: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            directory_timeout_secs: 300,
            page_size: 80,
        }
    }
}

impl UpstreamConfig {
    /// 시세/일봉 호출 타임아웃.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 종목 목록 호출 타임아웃.
    pub fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory_timeout_secs)
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("STOCK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("quote.periods")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
