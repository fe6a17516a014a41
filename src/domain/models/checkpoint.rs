// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 运行断点
///
/// 记录最后一个完整完成并落盘的城市下标。
/// 同一次运行内只会单调不减，重启后从其后一个城市继续。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    pub last_completed_index: usize,
    pub region_code: String,
    pub timestamp: String,
}
