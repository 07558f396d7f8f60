//! 여러 디렉토리 소스를 통합하는 Provider.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use stock_core::Instrument;
use tracing::{info, warn};

use super::DirectorySource;
use crate::error::{DataError, Result};

/// 통합 디렉토리 소스.
///
/// 등록 순서대로 소스를 조회하고 단축코드 기준으로 중복을 제거합니다.
/// 먼저 등록된 소스의 종목이 우선합니다. 일부 소스가 실패해도 나머지
/// 결과로 진행하며, 모든 소스가 실패하거나 비어 있을 때만 오류입니다.
pub struct CompositeDirectorySource {
    sources: Vec<Arc<dyn DirectorySource>>,
}

impl CompositeDirectorySource {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// 소스 추가.
    pub fn with_source(mut self, source: Arc<dyn DirectorySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// 등록된 소스 수.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for CompositeDirectorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectorySource for CompositeDirectorySource {
    fn name(&self) -> &str {
        "composite"
    }

    async fn fetch_full_instrument_list(&self) -> Result<Vec<Instrument>> {
        let mut all = Vec::new();
        let mut seen = HashSet::new();
        let mut failures = Vec::new();

        for source in &self.sources {
            match source.fetch_full_instrument_list().await {
                Ok(instruments) => {
                    let before = all.len();
                    for instrument in instruments {
                        if seen.insert(instrument.short_code.clone()) {
                            all.push(instrument);
                        }
                    }
                    info!(
                        provider = source.name(),
                        added = all.len() - before,
                        "종목 목록 로드 완료"
                    );
                }
                Err(e) => {
                    warn!(provider = source.name(), error = %e, "종목 목록 로드 실패");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        if all.is_empty() {
            let detail = if failures.is_empty() {
                "모든 소스가 빈 목록 반환".to_string()
            } else {
                failures.join("; ")
            };
            return Err(DataError::DirectorySource(detail));
        }

        Ok(all)
    }
}
