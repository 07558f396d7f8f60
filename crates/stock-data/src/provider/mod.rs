//! 업스트림 데이터 Provider 모듈.
//!
//! 엔진은 세 가지 외부 협력자에만 의존합니다:
//! - `DirectorySource`: 전체 종목 목록
//! - `LiveQuoteSource`: 장중 실시간 스냅샷
//! - `KlineSource`: 일봉(K-line) 시리즈
//!
//! ## Sina 금융
//! - `SinaDirectoryClient`: 沪深 A주 전체 목록 (페이지 조회)
//! - `SinaQuoteClient`: `hq.sinajs.cn` 실시간 시세
//! - `SinaKlineClient`: `getKLineData` 일봉
//!
//! ## 기타
//! - `PredefinedDirectorySource`: 내장 주요 종목 목록
//! - `CompositeDirectorySource`: 여러 소스 통합 (단축코드 기준 중복 제거)

pub mod composite;
pub mod predefined;
pub mod sina;

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stock_core::{Instrument, KlineRecord, Price, Volume};

use crate::error::{DataError, Result};

pub use composite::CompositeDirectorySource;
pub use predefined::PredefinedDirectorySource;
pub use sina::{SinaDirectoryClient, SinaKlineClient, SinaQuoteClient};

/// 실시간 시세 스냅샷의 한 종목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTick {
    /// 종목명
    pub name: String,
    /// 현재가
    pub now: Price,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 전일 종가
    pub prior_close: Price,
    /// 거래량
    pub volume: Volume,
    /// 거래대금
    pub turnover: Price,
}

/// 종목 디렉토리 소스 trait.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 전체 종목 목록 조회.
    async fn fetch_full_instrument_list(&self) -> Result<Vec<Instrument>>;
}

/// 실시간 시세 소스 trait.
#[async_trait]
pub trait LiveQuoteSource: Send + Sync {
    /// 요청한 표준 코드들의 실시간 스냅샷 조회.
    ///
    /// 반환 맵의 키는 표준 코드(`600519.SH`)입니다. 업스트림에 없는 종목은
    /// 맵에서 빠집니다.
    async fn fetch_live_snapshot(&self, codes: &[String]) -> Result<HashMap<String, LiveTick>>;
}

/// 일봉 소스 trait.
#[async_trait]
pub trait KlineSource: Send + Sync {
    /// 최근 `lookback_days` 거래일의 일봉 조회.
    async fn fetch_kline(&self, canonical_code: &str, lookback_days: u32)
        -> Result<Vec<KlineRecord>>;
}

/// 업스트림 호출에 타임아웃을 적용합니다.
///
/// 타임아웃은 `DataError::Timeout`으로 변환됩니다.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DataError::Timeout(format!(
            "{} ({}s 초과)",
            operation,
            limit.as_secs()
        ))),
    }
}
