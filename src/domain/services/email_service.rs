// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::business::UNKNOWN;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b").unwrap());
static MAILTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)mailto:([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap()
});
static NORMALIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w@.+-]").unwrap());

/// 模板商与建站器埋入的占位邮箱
///
/// 页面里只要出现其中任何一个，整站的候选全部放弃
static PLACEHOLDER_EMAILS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "user@domain.com",
        "hi@mystore.com",
        "your@email.com",
        "example@example.com",
        "info@mysite.com",
        "info@example.com",
        "hello@locmaps.com",
        "filler@godaddy.com",
        "contact@mysite.com",
        "name@example.com",
        "impallari@gmail.com",
        "someone@example.com",
        "info@indiantypefoundry.com",
        "team@latofonts.com",
        "hello@usmapsz.xyz",
        "support@glossgenius.com",
        "icon@2x.webp",
        "email@email.com",
    ])
});

/// 资源文件名里误匹配出来的伪邮箱特征
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".svg"];

/// 邮箱解析服务
///
/// 对候选官网做一次限时抓取，按启发式规则挑出联系邮箱。
/// 任何网络或解析失败都只返回 [`UNKNOWN`]，从不向上传播。
pub struct EmailService {
    client: reqwest::Client,
    timeout: Duration,
}

impl EmailService {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// 解析站点联系邮箱，失败返回 "NA"
    pub async fn resolve(&self, website: &str) -> String {
        if Url::parse(website).is_err() {
            return UNKNOWN.to_string();
        }
        match self.fetch_body(website).await {
            Some(body) => select_email(&body),
            None => UNKNOWN.to_string(),
        }
    }

    async fn fetch_body(&self, website: &str) -> Option<String> {
        let response = self
            .client
            .get(website)
            .timeout(self.timeout)
            .header(USER_AGENT, "Mozilla/5.0")
            .send()
            .await
            .ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        response.text().await.ok()
    }
}

/// 按优先级从页面内容中挑选邮箱
///
/// mailto 链接最可靠，命中即采用；否则取可见文本里的候选，
/// 依次过滤占位邮箱、资源文件名与疑似生成地址，返回第一个
/// 原始候选
pub fn select_email(content: &str) -> String {
    if let Some(caps) = MAILTO_RE.captures(content) {
        return caps[1].to_string();
    }

    let candidates: Vec<&str> = EMAIL_RE.find_iter(content).map(|m| m.as_str()).collect();
    if candidates.is_empty() {
        return UNKNOWN.to_string();
    }

    let normalized: Vec<String> = candidates.iter().map(|raw| normalize_email(raw)).collect();
    if normalized
        .iter()
        .any(|email| PLACEHOLDER_EMAILS.contains(email.as_str()))
    {
        return UNKNOWN.to_string();
    }

    let first = candidates[0].to_lowercase();
    let local_part = first.split('@').next().unwrap_or("");
    if IMAGE_EXTENSIONS.iter().any(|ext| local_part.ends_with(ext)) {
        return UNKNOWN.to_string();
    }

    // 本地部分数字占到一半及以上，视为哈希生成的地址
    let digits = local_part.chars().filter(|c| c.is_ascii_digit()).count();
    if digits * 2 >= local_part.len() && digits > 0 {
        return UNKNOWN.to_string();
    }

    candidates[0].to_string()
}

fn normalize_email(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace("mailto:", "");
    NORMALIZE_RE.replace_all(&lowered, "").into_owned()
}
