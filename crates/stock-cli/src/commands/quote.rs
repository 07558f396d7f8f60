//! 시세 명령어.

use anyhow::{bail, Result};
use stock_data::QuoteService;

use super::print_json;

/// 시세를 출력합니다.
pub async fn quote(service: &QuoteService, input: &str) -> Result<()> {
    match service.quote(input).await {
        Some(quote) => print_json(&quote),
        None => bail!("시세를 조회할 수 없음: {}", input),
    }
}

/// 일봉 차트를 출력합니다.
pub async fn daily(service: &QuoteService, input: &str, days: Option<u32>) -> Result<()> {
    match service.daily_chart(input, days).await {
        Some(chart) => print_json(&chart),
        None => bail!("일봉 데이터를 조회할 수 없음: {}", input),
    }
}
