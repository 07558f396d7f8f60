//! 종목 디렉토리.
//!
//! - `DirectorySnapshot`: 종목 목록 + 별칭 인덱스 (불변)
//! - `DirectoryStore`: 스냅샷 보관, TTL 판정, 파일 저장/로드, 갱신 병합

pub mod snapshot;
pub mod store;

pub use snapshot::{within_ttl, AliasTarget, DirectorySnapshot};
pub use store::DirectoryStore;
