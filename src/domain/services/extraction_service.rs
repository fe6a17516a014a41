// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::{BusinessRecord, UNKNOWN};
use crate::engines::traits::RenderPage;
use once_cell::sync::Lazy;
use regex::Regex;

/// 商户名标题
pub const NAME_SELECTOR: &str = "h1";
/// 地址控件
pub const ADDRESS_SELECTOR: &str = r#"button[data-item-id*="address"]"#;
/// 电话控件
pub const PHONE_SELECTOR: &str = r#"button[data-item-id*="phone"]"#;
/// 官网链接
pub const WEBSITE_SELECTOR: &str = r#"a[data-item-id*="authority"]"#;
/// 详情主面板，地址缺失时在这里兜底扫描
pub const MAIN_PANEL_SELECTOR: &str = "div[role='main']";

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?\d[\d\s().-]{8,}\d").unwrap());
static COORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").unwrap());

/// 地址行中可识别的街道类型词
const STREET_TOKENS: &[&str] = &["Street", "St", "Ave", "Road", "Rd", "Blvd", "Drive"];

/// 字段抽取服务
///
/// 把已渲染详情页的结构化元素转换为一条 [`BusinessRecord`]。
/// 每个字段独立容错：任何元素访问失败只会让对应字段落为
/// [`UNKNOWN`]，绝不会中断整条记录。
pub struct ExtractionService;

impl ExtractionService {
    /// 从详情页抽取一条商户记录
    pub async fn extract(page: &dyn RenderPage, reference: &str) -> BusinessRecord {
        let name = match Self::element_text(page, NAME_SELECTOR).await {
            Some(text) => text,
            None => name_from_reference(reference),
        };

        let mut address = Self::element_text(page, ADDRESS_SELECTOR)
            .await
            .unwrap_or_else(|| UNKNOWN.to_string());
        if address == UNKNOWN {
            address = Self::address_fallback(page).await;
        }

        let phone = match Self::element_text(page, PHONE_SELECTOR).await {
            Some(text) => first_phone(&text),
            None => UNKNOWN.to_string(),
        };

        let website = Self::element_attribute(page, WEBSITE_SELECTOR, "href")
            .await
            .unwrap_or_else(|| UNKNOWN.to_string());

        let (latitude, longitude) = coordinates_from_reference(reference);

        BusinessRecord {
            name,
            address,
            phone,
            website,
            email: UNKNOWN.to_string(),
            source_reference: reference.to_string(),
            latitude,
            longitude,
        }
    }

    async fn element_text(page: &dyn RenderPage, selector: &str) -> Option<String> {
        let element = page.find(selector).await.ok()??;
        let text = element.inner_text().await.ok()??;
        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    async fn element_attribute(page: &dyn RenderPage, selector: &str, name: &str) -> Option<String> {
        let element = page.find(selector).await.ok()??;
        element.attribute(name).await.ok()?
    }

    async fn address_fallback(page: &dyn RenderPage) -> String {
        match Self::element_text(page, MAIN_PANEL_SELECTOR).await {
            Some(text) => address_from_panel_text(&text),
            None => UNKNOWN.to_string(),
        }
    }
}

/// 从目标引用解码商户展示名
///
/// 取 `/place/<segment>/` 片段做URL反转义，`+` 还原为空格
pub fn name_from_reference(reference: &str) -> String {
    let Some(rest) = reference.split("/place/").nth(1) else {
        return UNKNOWN.to_string();
    };
    let segment = rest.split('/').next().unwrap_or("");
    if segment.is_empty() {
        return UNKNOWN.to_string();
    }
    match urlencoding::decode(segment) {
        Ok(decoded) => {
            let name = decoded.replace('+', " ").trim().to_string();
            if name.is_empty() {
                UNKNOWN.to_string()
            } else {
                name
            }
        }
        Err(_) => UNKNOWN.to_string(),
    }
}

/// 从目标引用解析内嵌坐标对
pub fn coordinates_from_reference(reference: &str) -> (String, String) {
    match COORDS_RE.captures(reference) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    }
}

/// 电话控件文本中的第一个合法号码
pub fn first_phone(text: &str) -> String {
    PHONE_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// 主面板文本中的地址行
///
/// 取第一行同时含逗号与街道类型词的文本
pub fn address_from_panel_text(text: &str) -> String {
    for line in text.lines() {
        if line.contains(',') && STREET_TOKENS.iter().any(|token| line.contains(token)) {
            return line.trim().to_string();
        }
    }
    UNKNOWN.to_string()
}
