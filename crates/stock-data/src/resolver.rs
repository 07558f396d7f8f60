//! 종목 식별자 해석.
//!
//! 사용자가 입력한 식별자(6자리 코드, 표준 코드, 종목명)를 표준 코드로
//! 변환합니다. 먼저 일치하는 규칙이 이깁니다:
//!
//! 1. 디렉토리에 있는 표준 코드 → 그대로
//! 2. 단축코드 또는 종목명 → 매핑된 표준 코드
//! 3. 6자리 숫자 → 접두사 규칙으로 합성 (존재 여부 미확인)
//! 4. 그 외 → 없음

use std::sync::Arc;

use stock_core::{CanonicalCode, Instrument};
use tracing::debug;

use crate::directory::{AliasTarget, DirectorySnapshot, DirectoryStore};

/// 스냅샷 하나에 대해 식별자를 해석합니다.
///
/// 입력 앞뒤 공백은 무시합니다.
pub fn resolve_in(snapshot: &DirectorySnapshot, input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match snapshot.lookup(input) {
        Some(AliasTarget::Instrument(_)) => return Some(input.to_string()),
        Some(AliasTarget::Canonical(code)) => return Some(code.clone()),
        None => {}
    }

    CanonicalCode::synthesize(input).map(|code| code.to_string())
}

/// 심볼 변환 서비스.
///
/// 요청마다 현재 스냅샷의 `Arc`를 잡고 해석하므로 갱신과 겹쳐도
/// 한 요청 안에서는 하나의 스냅샷만 봅니다.
#[derive(Clone)]
pub struct SymbolResolver {
    store: Arc<DirectoryStore>,
}

impl SymbolResolver {
    pub fn new(store: Arc<DirectoryStore>) -> Self {
        Self { store }
    }

    /// 식별자를 표준 코드로 변환합니다.
    pub async fn resolve(&self, input: &str) -> Option<String> {
        let snapshot = self.store.snapshot().await;
        let resolved = resolve_in(&snapshot, input);
        debug!(input, resolved = ?resolved, "심볼 해석");
        resolved
    }

    /// 식별자를 해석한 뒤 디렉토리의 종목 정보를 반환합니다.
    ///
    /// 합성된 코드는 디렉토리에 없으므로 `None`입니다.
    pub async fn instrument_info(&self, input: &str) -> Option<Instrument> {
        let snapshot = self.store.snapshot().await;
        let code = resolve_in(&snapshot, input)?;
        snapshot.instrument(&code).cloned()
    }
}
