//! 상태 점검 명령어.

use anyhow::Result;
use stock_data::QuoteService;

use super::print_json;

/// 서비스 상태를 출력합니다.
pub async fn health(service: &QuoteService) -> Result<()> {
    let status = service.health().await;
    if !status.snapshot_fresh {
        tracing::warn!("종목 디렉토리 스냅샷이 만료되었거나 없음");
    }
    print_json(&status)
}
