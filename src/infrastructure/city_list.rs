// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::city::{City, TargetRegion};
use crate::utils::errors::RepositoryError;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CityRow {
    #[serde(rename = "City")]
    city: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "State Code")]
    state_code: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
}

/// 读取城市清单并筛出目标区域
///
/// 区域名取第一条匹配记录的州名，城市顺序与清单一致，
/// 断点下标以该顺序为准
pub fn load_region(path: &Path, region_code: &str) -> Result<TargetRegion, RepositoryError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut name: Option<String> = None;
    let mut cities = Vec::new();

    for row in reader.deserialize::<CityRow>() {
        let row = row?;
        if row.state_code != region_code {
            continue;
        }
        if name.is_none() {
            name = Some(row.state.clone());
        }
        cities.push(City {
            name: row.city,
            region: row.state,
            latitude: row.latitude,
            longitude: row.longitude,
        });
    }

    let Some(name) = name else {
        return Err(RepositoryError::NotFound(format!(
            "no cities for region code {}",
            region_code
        )));
    };

    info!(region = %region_code, cities = cities.len(), "City list loaded");
    Ok(TargetRegion {
        code: region_code.to_string(),
        name,
        cities,
    })
}
