// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 城市抓取任务所处阶段
///
/// 搜索或滚动失败直接进入 `Done`，带走已收集到的引用；
/// 抓取阶段的失败只影响单个商户，不改变城市的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStage {
    Idle,
    Searching,
    Scrolling,
    Fetching,
    Done,
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            CrawlStage::Idle => "idle",
            CrawlStage::Searching => "searching",
            CrawlStage::Scrolling => "scrolling",
            CrawlStage::Fetching => "fetching",
            CrawlStage::Done => "done",
        };
        write!(f, "{}", stage)
    }
}
