//! Integration tests for alert dispatch against mock robot webhooks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use wechat_notify::{
    DeliveryError, Event, Group, MemoryConfigProvider, Notifier, NotifierSettings, Project,
    Template, WechatNotifier, URLS_OPTION,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: u64 = 7;

// =============================================================================
// Fixtures
// =============================================================================

fn group(ignored: bool) -> Group {
    Group {
        id: 3,
        project: PROJECT,
        absolute_url: "https://sentry.example/acme/backend/issues/3/".to_string(),
        ignored,
    }
}

fn event() -> Event {
    Event {
        id: "42".to_string(),
        message: "NullPointerException".to_string(),
        project: Project {
            id: PROJECT,
            slug: "backend".to_string(),
        },
        tags: HashMap::from([("level".to_string(), "error".to_string())]),
    }
}

fn notifier_with(urls: &str, settings: NotifierSettings) -> WechatNotifier {
    let provider = Arc::new(MemoryConfigProvider::new());
    provider.set(PROJECT, URLS_OPTION, urls);
    WechatNotifier::new(provider, settings).unwrap()
}

fn notifier(urls: &str) -> WechatNotifier {
    notifier_with(urls, NotifierSettings::default())
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_posts_markdown_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/webhook/send"))
        .and(query_param("key", "abc"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "msgtype": "markdown",
            "markdown": {
                "content": "#### New alert from backend \n > NullPointerException \
                            [href](https://sentry.example/acme/backend/issues/3/events/42/)"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier(&format!("{}/cgi-bin/webhook/send?key=abc", server.uri()));
    let results = notifier.deliver(&group(false), &event()).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_ok());
}

#[tokio::test]
async fn test_content_contains_message_and_event_link() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier(&format!("{}/hook?key=abc", server.uri()));
    notifier.notify(&group(false), &event()).await;

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let content = body["markdown"]["content"].as_str().unwrap();

    assert!(content.contains("NullPointerException"));
    assert!(content.contains("/events/42/"));
    assert!(requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ua| ua.starts_with("wechat-notify/")));
}

#[tokio::test]
async fn test_extended_template_includes_tags() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let settings = NotifierSettings {
        template: Template::Extended,
        ..NotifierSettings::default()
    };
    let notifier = notifier_with(&format!("{}/hook", server.uri()), settings);
    notifier.notify(&group(false), &event()).await;

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let content = body["markdown"]["content"].as_str().unwrap();

    assert!(content.contains("level: error"));
    assert!(content.contains("environment: n/a"));
}

#[tokio::test]
async fn test_ignored_group_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = notifier(&format!("{}/hook", server.uri()));
    assert!(notifier.deliver(&group(true), &event()).await.is_empty());
    notifier.notify(&group(true), &event()).await;
}

#[tokio::test]
async fn test_unconfigured_project_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = notifier(" \n\n ");
    assert!(!notifier.is_configured(PROJECT));
    assert!(notifier.deliver(&group(false), &event()).await.is_empty());

    // No option stored at all
    let empty = WechatNotifier::new(
        Arc::new(MemoryConfigProvider::new()),
        NotifierSettings::default(),
    )
    .unwrap();
    assert!(empty.deliver(&group(false), &event()).await.is_empty());
}

#[tokio::test]
async fn test_disabled_notifier_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = NotifierSettings {
        disabled: true,
        ..NotifierSettings::default()
    };
    let notifier = notifier_with(&format!("{}/hook", server.uri()), settings);
    notifier.notify(&group(false), &event()).await;
}

#[tokio::test]
async fn test_fan_out_continues_after_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/first"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let urls = format!("{0}/first\n{0}/second", server.uri());
    let notifier = notifier(&urls);
    let results = notifier.deliver(&group(false), &event()).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].0.ends_with("/first"));
    assert!(matches!(
        results[0].1,
        Err(DeliveryError::Status(status)) if status.as_u16() == 500
    ));
    assert!(results[1].0.ends_with("/second"));
    assert!(results[1].1.is_ok());
}

#[tokio::test]
async fn test_connection_failure_does_not_block_next_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let urls = format!("http://127.0.0.1:1/unreachable\n{}/hook", server.uri());
    let notifier = notifier(&urls);
    let results = notifier.deliver(&group(false), &event()).await;

    assert!(matches!(results[0].1, Err(DeliveryError::Http(_))));
    assert!(results[1].1.is_ok());

    // Same path through notify stays silent and still reaches /hook
    notifier.notify(&group(false), &event()).await;
}

#[tokio::test]
async fn test_duplicate_urls_each_receive_a_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let urls = format!("{0}/hook\n{0}/hook", server.uri());
    notifier(&urls).notify(&group(false), &event()).await;
}

#[tokio::test]
async fn test_timeout_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let settings = NotifierSettings {
        timeout: Duration::from_millis(200),
        ..NotifierSettings::default()
    };
    let notifier = notifier_with(&format!("{}/slow", server.uri()), settings);

    let results = notifier.deliver(&group(false), &event()).await;
    assert!(results[0].1.as_ref().is_err_and(DeliveryError::is_timeout));

    notifier.notify(&group(false), &event()).await;
}

#[tokio::test]
async fn test_server_error_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier(&format!("{}/hook", server.uri()));
    notifier.notify(&group(false), &event()).await;
}
