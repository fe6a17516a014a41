// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 字段缺失时写入的占位值
pub const UNKNOWN: &str = "NA";

/// 单个商户的抽取结果
///
/// 每个字段都可能独立缺失为 [`UNKNOWN`]，创建后不再修改。
/// 序列化字段名即批次表格的列名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Email")]
    pub email: String,
    /// 发现该商户的目标引用，合并去重的键
    #[serde(rename = "Source Reference")]
    pub source_reference: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
}

/// 一个城市的抓取结果
#[derive(Debug, Clone)]
pub struct CityResult {
    pub city: String,
    pub records: Vec<BusinessRecord>,
}
