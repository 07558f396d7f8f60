//! 종목 디렉토리 명령어.

use anyhow::{bail, Result};
use serde::Serialize;
use stock_data::QuoteService;
use tracing::info;

use super::print_json;

/// 식별자 해석 결과.
#[derive(Debug, Serialize)]
pub struct Resolution<'a> {
    pub input: &'a str,
    pub canonical_code: String,
}

/// 식별자를 표준 코드로 해석해 출력합니다.
pub async fn resolve(service: &QuoteService, input: &str) -> Result<()> {
    let Some(canonical_code) = service.resolve(input).await else {
        bail!("종목을 해석할 수 없음: {}", input);
    };
    print_json(&Resolution {
        input,
        canonical_code,
    })
}

/// 종목 정보를 출력합니다.
pub async fn info(service: &QuoteService, input: &str) -> Result<()> {
    match service.instrument_info(input).await {
        Some(instrument) => print_json(&instrument),
        None => bail!("종목 정보 없음: {}", input),
    }
}

/// 종목을 검색해 출력합니다.
pub async fn search(service: &QuoteService, query: &str, limit: Option<usize>) -> Result<()> {
    let found = service.search(query, limit).await;
    info!(query, count = found.len(), "종목 검색");
    print_json(&found)
}

/// 종목 디렉토리를 즉시 갱신합니다.
pub async fn refresh(service: &QuoteService) -> Result<()> {
    let count = service.refresh_directory().await?;
    println!("종목 디렉토리 갱신 완료: {}개", count);
    Ok(())
}
