//! 내장 주요 종목 목록.
//!
//! 업스트림 종목 목록이 불완전하거나 실패해도 주요 대형주는 항상
//! 해석되도록 기본 목록을 제공합니다.

use async_trait::async_trait;
use stock_core::{CanonicalCode, Instrument};

use super::DirectorySource;
use crate::error::Result;

/// (표준 코드, 종목명, 업종)
const PREDEFINED_STOCKS: &[(&str, &str, &str)] = &[
    // 은행
    ("000001.SZ", "平安银行", "银行"),
    ("600036.SH", "招商银行", "银行"),
    ("601988.SH", "中国银行", "银行"),
    ("601398.SH", "工商银行", "银行"),
    ("601939.SH", "建设银行", "银行"),
    ("601328.SH", "交通银行", "银行"),
    ("002142.SZ", "宁波银行", "银行"),
    // 보험
    ("601318.SH", "中国平安", "保险"),
    ("601601.SH", "中国太保", "保险"),
    ("601319.SH", "中国人保", "保险"),
    // 백주
    ("600519.SH", "贵州茅台", "白酒"),
    ("000858.SZ", "五粮液", "白酒"),
    ("000568.SZ", "泸州老窖", "白酒"),
    ("600809.SH", "山西汾酒", "白酒"),
    ("000596.SZ", "古井贡酒", "白酒"),
    ("002304.SZ", "洋河股份", "白酒"),
    // 기술·제조
    ("002415.SZ", "海康威视", "安防"),
    ("300059.SZ", "东方财富", "互联网金融"),
    ("300750.SZ", "宁德时代", "电池"),
    ("000725.SZ", "京东方A", "显示器件"),
    ("002594.SZ", "比亚迪", "汽车"),
    ("000063.SZ", "中兴通讯", "通信设备"),
    ("002129.SZ", "中环股份", "半导体"),
    ("300274.SZ", "阳光电源", "电力设备"),
    // 통신
    ("600050.SH", "中国联通", "通信服务"),
    ("600941.SH", "中国移动", "通信服务"),
    // 소비
    ("600887.SH", "伊利股份", "乳制品"),
    ("000895.SZ", "双汇发展", "食品"),
    ("000333.SZ", "美的集团", "家电"),
    ("000651.SZ", "格力电器", "家电"),
    ("601933.SH", "永辉超市", "商贸零售"),
    ("000069.SZ", "华侨城A", "旅游"),
    // 의약
    ("600276.SH", "恒瑞医药", "医药"),
    ("000661.SZ", "长春高新", "医药"),
    ("300015.SZ", "爱尔眼科", "医疗服务"),
    // 에너지·소재
    ("600028.SH", "中国石化", "石油化工"),
    ("601857.SH", "中国石油", "石油开采"),
    ("600019.SH", "宝钢股份", "钢铁"),
    ("002155.SZ", "湖南黄金", "有色金属"),
    ("000792.SZ", "盐湖股份", "化工"),
    // 부동산
    ("000002.SZ", "万科A", "房地产"),
    ("600340.SH", "华夏幸福", "房地产"),
    // 항공
    ("601111.SH", "中国国航", "航空"),
    ("600115.SH", "东方航空", "航空"),
];

/// 내장 종목 목록 소스.
#[derive(Debug, Default, Clone)]
pub struct PredefinedDirectorySource;

impl PredefinedDirectorySource {
    pub fn new() -> Self {
        Self
    }

    /// 내장 목록을 종목으로 변환합니다.
    pub fn instruments() -> Vec<Instrument> {
        PREDEFINED_STOCKS
            .iter()
            .filter_map(|(code, name, industry)| {
                let code = CanonicalCode::parse(code).ok()?;
                Some(Instrument::new(&code, *name).with_industry(*industry))
            })
            .collect()
    }
}

#[async_trait]
impl DirectorySource for PredefinedDirectorySource {
    fn name(&self) -> &str {
        "predefined"
    }

    async fn fetch_full_instrument_list(&self) -> Result<Vec<Instrument>> {
        Ok(Self::instruments())
    }
}
