// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use mapleads::domain::services::email_service::EmailService;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service() -> EmailService {
    EmailService::new(reqwest::Client::new(), Duration::from_secs(3))
}

async fn server_with_body(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// mailto 链接优先于可见邮箱
#[tokio::test]
async fn resolves_the_mailto_link_first() {
    let server = server_with_body(
        r#"<p>visible@salon.example</p><a href="mailto:owner@salon.example">write us</a>"#,
    )
    .await;

    assert_eq!(service().resolve(&server.uri()).await, "owner@salon.example");
}

#[tokio::test]
async fn falls_back_to_visible_addresses() {
    let server = server_with_body("<footer>booking@salon.example</footer>").await;
    assert_eq!(service().resolve(&server.uri()).await, "booking@salon.example");
}

/// 非200状态一律返回 NA
#[tokio::test]
async fn non_success_status_yields_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(service().resolve(&server.uri()).await, "NA");
}

/// 页面只有占位邮箱时放弃整站
#[tokio::test]
async fn placeholder_page_yields_unknown() {
    let server = server_with_body("contact: info@example.com").await;
    assert_eq!(service().resolve(&server.uri()).await, "NA");
}

/// 非法网址不发请求，直接返回 NA
#[tokio::test]
async fn malformed_website_yields_unknown() {
    assert_eq!(service().resolve("not a url").await, "NA");
}
