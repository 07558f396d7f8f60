//! 시세 조립 및 일봉 캐시 통합 테스트.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use common::{date, harness, instrument, record, shanghai, FakeDirectory, FakeKline, FakeLive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stock_core::{KlineRecord, Provenance};

/// 贵州茅台 3거래일: 10 → 11 → 12 (마지막 봉 2025-07-09).
fn moutai_three_days() -> Vec<KlineRecord> {
    vec![
        record(date(7, 7), dec!(9.8), dec!(10)),
        record(date(7, 8), dec!(10.2), dec!(11)),
        record(date(7, 9), dec!(11.5), dec!(12)),
    ]
}

/// 2025-06-23 ~ 2025-07-08 16개 봉, 종가 100 ~ 115.
fn sixteen_days_until_yesterday() -> Vec<KlineRecord> {
    (0..16)
        .map(|i| {
            let close = Decimal::from(100 + i);
            record(date(6, 23) + ChronoDuration::days(i), close, close)
        })
        .collect()
}

fn moutai_directory() -> FakeDirectory {
    FakeDirectory::new(vec![instrument("600519.SH", "贵州茅台")])
}

#[tokio::test]
async fn test_moutai_after_close_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default().with_tick("600519.SH", dec!(99), dec!(98)),
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    h.service.initialize().await;

    let now = shanghai(9, 16, 0);
    let quote = h.service.quote_at("贵州茅台", now).await.unwrap();

    assert_eq!(quote.canonical_code, "600519.SH");
    assert_eq!(quote.close, dec!(12));
    assert_eq!(quote.previous_close, dec!(11));
    assert_eq!(quote.change_abs, dec!(1.00));
    assert_eq!(quote.change_pct, dec!(9.09));
    assert_eq!(quote.provenance, Provenance::Historical);
    assert_eq!(quote.as_of_date, date(7, 9));
    assert_eq!(quote.fetched_at, now);
    for period in [3, 5, 10] {
        assert!(quote.period_changes.is_absent(period), "{period}d");
    }

    // 장 마감 후에는 실시간 소스를 부르지 않음
    assert_eq!(h.live.calls(), 0);

    let json = serde_json::to_value(&quote).unwrap();
    assert_eq!(json["provenance"], "historical");
    assert!(json["period_changes"]["3d"].is_null());
}

#[tokio::test]
async fn test_live_quote_in_session() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default().with_tick("600519.SH", dec!(120), dec!(115)),
        FakeKline::default().with_series("600519.SH", sixteen_days_until_yesterday()),
    );
    h.service.initialize().await;

    let quote = h.service.quote_at("600519", shanghai(9, 10, 0)).await.unwrap();

    assert_eq!(quote.provenance, Provenance::Live);
    assert_eq!(quote.close, dec!(120));
    assert_eq!(quote.previous_close, dec!(115));
    assert_eq!(quote.change_abs, dec!(5.00));
    assert_eq!(quote.change_pct, dec!(4.35));
    assert_eq!(quote.as_of_date, date(7, 9));

    // 오늘 봉이 시리즈에 없으므로 마지막 봉(115)부터 거슬러 셈
    assert_eq!(quote.period_changes.get(3), Some(dec!(6.19)));
    assert_eq!(quote.period_changes.get(5), Some(dec!(8.11)));
    assert_eq!(quote.period_changes.get(10), Some(dec!(13.21)));
    assert_eq!(h.live.calls(), 1);
}

#[tokio::test]
async fn test_live_quote_excludes_todays_partial_bar() {
    let dir = tempfile::tempdir().unwrap();
    let mut records = sixteen_days_until_yesterday();
    records.push(record(date(7, 9), dec!(115), dec!(118)));

    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default().with_tick("600519.SH", dec!(120), dec!(115)),
        FakeKline::default().with_series("600519.SH", records),
    );
    h.service.initialize().await;

    let quote = h.service.quote_at("600519.SH", shanghai(9, 14, 0)).await.unwrap();

    assert_eq!(quote.provenance, Provenance::Live);
    // 과거 봉은 7-08(115)까지이므로 3일 기준은 113
    assert_eq!(quote.period_changes.get(3), Some(dec!(6.19)));
}

#[tokio::test]
async fn test_live_failure_falls_back_to_historical() {
    let dir = tempfile::tempdir().unwrap();
    let live = FakeLive::default().with_tick("600519.SH", dec!(120), dec!(115));
    live.fail.store(true, Ordering::SeqCst);

    let h = harness(
        dir.path(),
        moutai_directory(),
        live,
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    h.service.initialize().await;

    let quote = h.service.quote_at("贵州茅台", shanghai(9, 10, 30)).await.unwrap();
    assert_eq!(quote.provenance, Provenance::Historical);
    assert_eq!(quote.close, dec!(12));
    assert_eq!(h.live.calls(), 1);
}

#[tokio::test]
async fn test_malformed_live_tick_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default().with_tick("600519.SH", dec!(120), Decimal::ZERO),
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    h.service.initialize().await;

    let quote = h.service.quote_at("贵州茅台", shanghai(9, 13, 0)).await.unwrap();
    assert_eq!(quote.provenance, Provenance::Historical);
    assert_eq!(quote.change_pct, dec!(9.09));
}

#[tokio::test]
async fn test_weekend_uses_historical_even_in_session_hours() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default().with_tick("600519.SH", dec!(120), dec!(115)),
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    h.service.initialize().await;

    // 2025-07-12 토요일 10:00
    let quote = h.service.quote_at("贵州茅台", shanghai(12, 10, 0)).await.unwrap();
    assert_eq!(quote.provenance, Provenance::Historical);
    assert_eq!(h.live.calls(), 0);
}

#[tokio::test]
async fn test_missing_reference_series_means_no_quote() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default().with_tick("600519.SH", dec!(120), dec!(115)),
        FakeKline::default(),
    );
    h.service.initialize().await;

    assert!(h.service.quote_at("贵州茅台", shanghai(9, 10, 0)).await.is_none());
    assert_eq!(h.live.calls(), 0);

    // 실패한 조회는 캐시하지 않음
    assert!(h.service.quote_at("贵州茅台", shanghai(9, 10, 0)).await.is_none());
    assert_eq!(h.kline.calls(), 2);
    assert_eq!(h.service.series_cache().cache_stats().await.size, 0);
}

#[tokio::test]
async fn test_unresolvable_input_skips_upstream() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default(),
        FakeKline::default(),
    );
    h.service.initialize().await;

    assert!(h.service.quote("不存在的股票").await.is_none());
    assert!(h.service.daily_chart("123456", None).await.is_none());
    assert_eq!(h.kline.calls(), 0);
}

#[tokio::test]
async fn test_cache_hit_returns_same_series() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default(),
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    let cache = h.service.series_cache();

    let first = cache.get_series("600519.SH", 15).await.unwrap();
    let second = cache.get_series("600519.SH", 15).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    let stats = cache.cache_stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 1);
    assert_eq!(h.kline.calls(), 1);

    // 순서 보정 및 전일 종가 채움
    assert_eq!(first[0].date, date(7, 7));
    assert_eq!(first[0].previous_close, dec!(9.8));
    assert_eq!(first[2].previous_close, dec!(11));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_fetch_once() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default(),
        FakeKline::default()
            .with_series("600519.SH", moutai_three_days())
            .with_delay(Duration::from_millis(500)),
    );
    let cache = h.service.series_cache();

    let (a, b, c, d) = tokio::join!(
        cache.get_series("600519.SH", 15),
        cache.get_series("600519.SH", 15),
        cache.get_series("600519.SH", 15),
        cache.get_series("600519.SH", 15)
    );

    assert_eq!(h.kline.calls(), 1);
    let a = a.unwrap();
    for other in [b.unwrap(), c.unwrap(), d.unwrap()] {
        assert!(Arc::ptr_eq(&a, &other));
    }

    let stats = cache.cache_stats().await;
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
}

#[tokio::test(start_paused = true)]
async fn test_slow_upstream_times_out_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default(),
        FakeKline::default()
            .with_series("600519.SH", moutai_three_days())
            .with_delay(Duration::from_secs(30)),
    );

    let series = h.service.series_cache().get_series("600519.SH", 15).await;
    assert!(series.is_none());
    assert_eq!(h.service.series_cache().cache_stats().await.size, 0);
}

#[tokio::test]
async fn test_daily_chart() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default(),
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    h.service.initialize().await;

    let chart = h
        .service
        .daily_chart_at("贵州茅台", Some(60), shanghai(9, 18, 0))
        .await
        .unwrap();
    assert_eq!(chart.canonical_code, "600519.SH");
    assert_eq!(chart.bars.len(), 3);
    assert_eq!(chart.current_price, dec!(12));
    assert_eq!(chart.change_pct, dec!(9.09));
    assert_eq!(chart.volume, dec!(1000000));
    assert_eq!(chart.data_type, Provenance::Historical);

    let chart = h
        .service
        .daily_chart_at("600519", Some(2), shanghai(9, 9, 45))
        .await
        .unwrap();
    assert_eq!(chart.bars.len(), 2);
    assert_eq!(chart.data_type, Provenance::Live);
}

#[tokio::test]
async fn test_health_reports_directory_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        dir.path(),
        moutai_directory(),
        FakeLive::default(),
        FakeKline::default().with_series("600519.SH", moutai_three_days()),
    );
    h.service.initialize().await;
    h.service.quote("贵州茅台").await.unwrap();

    let health = h.service.health().await;
    assert_eq!(health.instrument_count, 1);
    assert!(health.snapshot_fresh);
    assert!(health.refreshed_at.is_some());
    assert_eq!(health.series_cache.size, 1);
    assert_eq!(health.series_cache.misses, 1);
}
