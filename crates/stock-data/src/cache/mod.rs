//! 캐시 모듈.
//!
//! - `HistoricalSeriesCache`: 일봉 시리즈 LRU 캐시 (키별 단일 페칭)

pub mod series;

pub use series::{CacheStats, HistoricalSeriesCache, Series, SeriesKey};
