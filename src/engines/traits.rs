// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 渲染引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 页面元素句柄
///
/// 渲染引擎绑定必须满足的最小元素能力
#[async_trait]
pub trait RenderElement: Send + Sync {
    /// 读取元素可见文本
    async fn inner_text(&self) -> Result<Option<String>, EngineError>;

    /// 读取元素属性
    async fn attribute(&self, name: &str) -> Result<Option<String>, EngineError>;
}

/// 已渲染页面句柄
#[async_trait]
pub trait RenderPage: Send + Sync {
    /// 导航到目标地址，超过时限即失败
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    /// 等待选择器出现，超时返回 [`EngineError::Timeout`]
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), EngineError>;

    /// 查询单个元素，未找到返回 `None`
    async fn find(&self, selector: &str) -> Result<Option<Box<dyn RenderElement>>, EngineError>;

    /// 查询全部匹配元素
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn RenderElement>>, EngineError>;

    /// 读取可滚动区域的当前范围
    async fn scroll_extent(&self, selector: &str) -> Result<i64, EngineError>;

    /// 按当前范围向下扩大滚动
    async fn scroll_by_extent(&self, selector: &str) -> Result<(), EngineError>;

    /// 关闭页面
    async fn close(&self) -> Result<(), EngineError>;
}

/// 隔离的浏览上下文
///
/// 每个城市独占一个上下文，cookie 与页面状态互不干扰
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// 在本上下文中打开新页面
    async fn new_page(&self) -> Result<Box<dyn RenderPage>, EngineError>;

    /// 销毁上下文
    async fn close(&self) -> Result<(), EngineError>;
}

/// 渲染引擎特质
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// 预热顶层会话
    ///
    /// 在任何城市开抓之前对共享会话做一次只读预热，
    /// 失败不影响后续抓取
    async fn warm_up(&self) -> Result<(), EngineError>;

    /// 创建隔离的浏览上下文
    async fn new_context(&self) -> Result<Box<dyn RenderContext>, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
