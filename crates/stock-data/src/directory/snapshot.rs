//! 종목 디렉토리 스냅샷과 별칭 인덱스.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use stock_core::Instrument;

use crate::error::{DataError, Result};

/// 별칭 인덱스 값.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AliasTarget {
    /// 표준 코드 키 → 종목 목록 내 위치
    Instrument(usize),
    /// 단축코드/종목명 키 → 표준 코드
    Canonical(String),
}

/// 종목 디렉토리 스냅샷.
///
/// 종목 목록과 파생 별칭 인덱스를 함께 보관하며, 갱신 시 통째로 교체됩니다.
/// 파일에는 `{instruments, alias_index, saved_at}` 형태로 저장됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    instruments: Vec<Instrument>,
    alias_index: HashMap<String, AliasTarget>,
    #[serde(rename = "saved_at")]
    refreshed_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    /// 종목 목록으로 스냅샷을 만듭니다.
    ///
    /// 별칭 인덱스는 한 번의 순회로 만듭니다. 종목마다 단축코드, 종목명,
    /// 표준 코드 세 개의 키를 넣고, 별칭끼리 충돌하면 나중 것이 이깁니다.
    /// 표준 코드 키는 별칭으로 덮어쓰지 않습니다.
    pub fn build(instruments: Vec<Instrument>, refreshed_at: DateTime<Utc>) -> Self {
        let mut alias_index = HashMap::with_capacity(instruments.len() * 3);

        for (idx, instrument) in instruments.iter().enumerate() {
            for alias in [&instrument.short_code, &instrument.display_name] {
                let target = AliasTarget::Canonical(instrument.canonical_code.clone());
                match alias_index.get(alias.as_str()) {
                    Some(AliasTarget::Instrument(_)) => {}
                    _ => {
                        alias_index.insert(alias.clone(), target);
                    }
                }
            }
            alias_index.insert(
                instrument.canonical_code.clone(),
                AliasTarget::Instrument(idx),
            );
        }

        Self {
            instruments,
            alias_index,
            refreshed_at,
        }
    }

    /// 빈 스냅샷.
    pub fn empty() -> Self {
        Self::build(Vec::new(), DateTime::<Utc>::UNIX_EPOCH)
    }

    /// 갱신 시각을 바꾼 스냅샷을 반환합니다.
    pub fn with_refreshed_at(mut self, refreshed_at: DateTime<Utc>) -> Self {
        self.refreshed_at = refreshed_at;
        self
    }

    /// 역직렬화한 스냅샷의 인덱스가 종목 목록과 맞는지 검증합니다.
    pub fn validate(&self) -> Result<()> {
        for (key, target) in &self.alias_index {
            match target {
                AliasTarget::Instrument(idx) => {
                    let matches = self
                        .instruments
                        .get(*idx)
                        .is_some_and(|i| &i.canonical_code == key);
                    if !matches {
                        return Err(DataError::SerializationError(format!(
                            "별칭 인덱스 불일치: {} → #{}",
                            key, idx
                        )));
                    }
                }
                AliasTarget::Canonical(code) => {
                    if !matches!(self.alias_index.get(code), Some(AliasTarget::Instrument(_))) {
                        return Err(DataError::SerializationError(format!(
                            "알 수 없는 표준 코드: {} → {}",
                            key, code
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// 별칭 인덱스 키 수.
    pub fn alias_count(&self) -> usize {
        self.alias_index.len()
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// `now` 기준으로 TTL이 지났는지 확인합니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !within_ttl(self.refreshed_at, now, ttl)
    }

    /// 별칭 인덱스 조회.
    pub fn lookup(&self, key: &str) -> Option<&AliasTarget> {
        self.alias_index.get(key)
    }

    /// 표준 코드로 종목 조회.
    pub fn instrument(&self, canonical_code: &str) -> Option<&Instrument> {
        match self.alias_index.get(canonical_code)? {
            AliasTarget::Instrument(idx) => self.instruments.get(*idx),
            AliasTarget::Canonical(_) => None,
        }
    }

    /// 종목 검색.
    ///
    /// 종목명은 대소문자 무시 부분 일치, 단축코드와 표준 코드는 부분 일치로
    /// 비교합니다. 디렉토리 순서대로 최대 `limit`개를 반환합니다.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Instrument> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let query_lower = query.to_lowercase();
        let query_upper = query.to_uppercase();

        self.instruments
            .iter()
            .filter(|i| {
                i.display_name.to_lowercase().contains(&query_lower)
                    || i.short_code.contains(query)
                    || i.canonical_code.contains(&query_upper)
            })
            .take(limit)
            .collect()
    }

    /// 모든 별칭 키 → 종목 매핑.
    ///
    /// 클라이언트 측 종목 인식용입니다.
    pub fn mappings(&self) -> BTreeMap<&str, &Instrument> {
        self.alias_index
            .iter()
            .filter_map(|(key, target)| {
                let instrument = match target {
                    AliasTarget::Instrument(idx) => self.instruments.get(*idx),
                    AliasTarget::Canonical(code) => self.instrument(code),
                }?;
                Some((key.as_str(), instrument))
            })
            .collect()
    }
}

/// `written_at`으로부터 `now`까지의 경과 시간이 TTL 미만인지 확인합니다.
///
/// 미래 시각(시계 역행)은 유효로 봅니다.
pub fn within_ttl(written_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(written_at) < ttl
}
