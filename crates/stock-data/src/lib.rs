//! 종목 해석 및 시세 캐싱 엔진.
//!
//! 이 crate는 다음을 제공합니다:
//! - TTL 기반 종목 디렉토리 저장소 (파일 스냅샷, 갱신 병합)
//! - 별칭 인덱스 기반 심볼 해석 (코드 합성 폴백)
//! - 일봉 시리즈 LRU 캐시 (키별 단일 페칭)
//! - 실시간/과거 시세 조립 (기간별 변동률)
//! - Sina 금융 업스트림 클라이언트

pub mod cache;
pub mod directory;
pub mod error;
pub mod provider;
pub mod quote;
pub mod resolver;
pub mod service;

pub use error::{DataError, Result};

pub use cache::{CacheStats, HistoricalSeriesCache, Series, SeriesKey};
pub use directory::{AliasTarget, DirectorySnapshot, DirectoryStore};
pub use provider::{
    CompositeDirectorySource, DirectorySource, KlineSource, LiveQuoteSource, LiveTick,
    PredefinedDirectorySource, SinaDirectoryClient, SinaKlineClient, SinaQuoteClient,
};
pub use quote::{period_changes, preceding_bars, QuoteAssembler};
pub use resolver::{resolve_in, SymbolResolver};
pub use service::{HealthStatus, QuoteService, UpstreamSources};
