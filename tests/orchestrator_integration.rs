//! Integration tests for entity resolution and the strategy cascade.

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use support::fixtures::{ITEM_ID, context_for, detail_document, mock_config, page_with_state};
use support::mock_server::mock_server_or_skip;
use vidmeta_core::config::{FetchConfig, PacingConfig};
use vidmeta_core::orchestrator::{EntityId, MediaFormat, Orchestrator};
use vidmeta_core::strategy::{
    AttemptNotes, Payload, PayloadQuality, Strategy, StrategyContext, TerminalFallbackStrategy,
    WEB_DETAIL_PATH,
};
use vidmeta_core::transport::{ErrorKind, FetchError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// What a scripted strategy hands back.
#[derive(Clone)]
enum Script {
    Fail(FetchError),
    Nothing,
    Data(Value),
    Degraded,
}

/// Strategy with a fixed outcome that counts its invocations.
struct Scripted {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn boxed(name: &'static str, script: Script) -> (Box<dyn Strategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Self {
            name,
            script,
            calls: Arc::clone(&calls),
        };
        (Box::new(strategy), calls)
    }
}

#[async_trait]
impl Strategy for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn attempt(
        &self,
        _id: &EntityId,
        _ctx: &StrategyContext,
        _notes: &mut AttemptNotes,
    ) -> Result<Option<Payload>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Fail(error) => Err(error.clone()),
            Script::Nothing => Ok(None),
            Script::Data(value) => Ok(Some(Payload::genuine(value.clone()))),
            Script::Degraded => Ok(Some(Payload::degraded(detail_document(ITEM_ID)))),
        }
    }
}

fn offline_config() -> FetchConfig {
    mock_config("http://127.0.0.1:9")
}

fn offline_orchestrator(strategies: Vec<Box<dyn Strategy>>) -> Orchestrator {
    let config = offline_config();
    Orchestrator::with_context(context_for(&config), config.min_payload_bytes)
        .with_strategies(strategies)
}

#[tokio::test]
async fn test_cascade_stops_at_first_acceptable_payload() {
    let (first, first_calls) = Scripted::boxed(
        "first",
        Script::Fail(FetchError::Unavailable {
            url: "http://mock/".to_string(),
        }),
    );
    let (second, second_calls) = Scripted::boxed("second", Script::Nothing);
    let (third, third_calls) = Scripted::boxed("third", Script::Data(detail_document(ITEM_ID)));
    let (fourth, fourth_calls) = Scripted::boxed("fourth", Script::Data(detail_document("other")));
    let orchestrator = offline_orchestrator(vec![first, second, third, fourth]);

    let success = orchestrator.run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();

    assert_eq!(success.strategy, "third");
    assert_eq!(success.payload.quality, PayloadQuality::Genuine);
    assert_eq!(success.attempts.len(), 3);
    assert_eq!(success.attempts[0].error_kind, Some(ErrorKind::Unavailable));
    assert!(!success.attempts[1].success);
    assert!(success.attempts[2].success);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fourth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cascade_is_deterministic_across_runs() {
    let build = || {
        let (a, _) = Scripted::boxed("a", Script::Nothing);
        let (b, _) = Scripted::boxed("b", Script::Data(detail_document(ITEM_ID)));
        let (c, _) = Scripted::boxed("c", Script::Data(detail_document(ITEM_ID)));
        offline_orchestrator(vec![a, b, c])
    };

    for _ in 0..3 {
        let success = build().run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();
        assert_eq!(success.strategy, "b");
        let names: Vec<_> = success.attempts.iter().map(|a| a.strategy.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}

#[tokio::test]
async fn test_small_and_empty_payloads_are_rejected() {
    let (empty, _) = Scripted::boxed("empty", Script::Data(json!({})));
    let (small, _) = Scripted::boxed("small", Script::Data(json!({"status_code": 0})));
    let (big, _) = Scripted::boxed("big", Script::Data(detail_document(ITEM_ID)));
    let orchestrator = offline_orchestrator(vec![empty, small, big]);

    let success = orchestrator.run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();

    assert_eq!(success.strategy, "big");
    assert_eq!(success.attempts[0].message, "empty payload");
    assert!(success.attempts[1].message.contains("too small"));
}

#[tokio::test]
async fn test_exhaustion_reports_attempts_and_honors_delay() {
    let mut config = offline_config();
    config.pacing = PacingConfig {
        inter_strategy_delay_ms: 40,
        ..PacingConfig::immediate()
    };
    let strategies = (0..3)
        .map(|_| Scripted::boxed("nothing", Script::Nothing).0)
        .collect();
    let orchestrator = Orchestrator::with_context(context_for(&config), config.min_payload_bytes)
        .with_strategies(strategies);

    let started = Instant::now();
    let err = orchestrator
        .run_cascade(&EntityId::new(ITEM_ID))
        .await
        .unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(80));
    match err {
        FetchError::RetryExhausted { target, attempts } => {
            assert_eq!(target, ITEM_ID);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_degraded_payload_is_distinguishable() {
    let (fails, _) = Scripted::boxed("fails", Script::Nothing);
    let orchestrator = offline_orchestrator(vec![fails, Box::new(TerminalFallbackStrategy)]);

    let success = orchestrator.run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();

    assert_eq!(success.strategy, "terminal_fallback");
    assert_eq!(success.payload.quality, PayloadQuality::Degraded);
    assert_eq!(success.attempts[1].quality, Some(PayloadQuality::Degraded));
}

#[tokio::test]
async fn test_scripted_degraded_payload_keeps_its_quality() {
    let (degraded, _) = Scripted::boxed("degraded", Script::Degraded);
    let orchestrator = offline_orchestrator(vec![degraded]);

    let success = orchestrator.run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();

    assert_eq!(success.payload.quality, PayloadQuality::Degraded);
}

#[tokio::test]
async fn test_fallback_ignores_size_threshold() {
    let mut config = offline_config();
    config.min_payload_bytes = 1_000;
    let orchestrator = Orchestrator::with_context(context_for(&config), config.min_payload_bytes)
        .with_strategies(vec![Box::new(TerminalFallbackStrategy)]);

    let success = orchestrator.run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();

    assert_eq!(success.strategy, "terminal_fallback");
    assert_eq!(success.payload.quality, PayloadQuality::Degraded);
    assert!(success.payload.serialized_len() < 1_000);
    assert!(success.attempts[0].success);
}

#[tokio::test]
async fn test_genuine_payload_still_needs_threshold() {
    let mut config = offline_config();
    config.min_payload_bytes = 100_000;
    let (genuine, _) = Scripted::boxed("genuine", Script::Data(detail_document(ITEM_ID)));
    let orchestrator = Orchestrator::with_context(context_for(&config), config.min_payload_bytes)
        .with_strategies(vec![genuine, Box::new(TerminalFallbackStrategy)]);

    let success = orchestrator.run_cascade(&EntityId::new(ITEM_ID)).await.unwrap();

    assert_eq!(success.strategy, "terminal_fallback");
    assert!(success.attempts[0].message.contains("too small"));
}

#[test]
fn test_same_seed_draws_same_profiles() {
    let config = offline_config();
    let first = context_for(&config);
    let second = context_for(&config);

    for _ in 0..5 {
        assert_eq!(
            first.profiles.pick_fingerprint().user_agent,
            second.profiles.pick_fingerprint().user_agent
        );
        assert_eq!(
            first.profiles.pick_mobile_device().device_type,
            second.profiles.pick_mobile_device().device_type
        );
    }
}

#[tokio::test]
async fn test_full_pipeline_resolves_share_link_and_uses_web_api() {
    let Some(server) = mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/s/abc"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/video/{ITEM_ID}", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/video/{ITEM_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>item page</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/web/report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("msToken={}; Path=/", "k".repeat(120)))
                .set_body_string(r#"{"code":0}"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WEB_DETAIL_PATH))
        .and(query_param("aweme_id", ITEM_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_document(ITEM_ID)))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::open(&mock_config(&server.uri())).unwrap();
    let text = format!("Watch this, {}/s/abc copy the link", server.uri());
    let outcome = orchestrator.fetch(&text, MediaFormat::Webp).await.unwrap();

    assert_eq!(outcome.entity_id.as_str(), ITEM_ID);
    assert_eq!(outcome.strategy, "web_api");
    assert!(!outcome.is_degraded());
    assert_eq!(outcome.format, MediaFormat::Webp);
    assert_eq!(outcome.attempts.len(), 1);
    assert!(outcome.attempts[0].warnings.is_empty());
    assert_eq!(outcome.payload["aweme_detail"]["aweme_id"], ITEM_ID);

    let rendered = serde_json::to_value(&outcome).unwrap();
    assert_eq!(rendered["quality"], "genuine");
    assert_eq!(rendered["format"], "webp");
}

#[tokio::test]
async fn test_pipeline_falls_through_to_embedded_page() {
    let Some(server) = mock_server_or_skip().await else {
        return;
    };
    let state = json!({
        "loaderData": {
            "video_(id)/page": {
                "aweme_id": ITEM_ID,
                "desc": "evening market tour, part two",
                "author": {"nickname": "streetfood"},
                "statistics": {"digg_count": 42}
            }
        }
    });
    Mock::given(method("GET"))
        .and(path(format!("/video/{ITEM_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_with_state(&state)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WEB_DETAIL_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::open(&mock_config(&server.uri())).unwrap();
    let outcome = orchestrator
        .fetch(&format!("{}/video/{ITEM_ID}", server.uri()), MediaFormat::Png)
        .await
        .unwrap();

    assert_eq!(outcome.strategy, "embedded_page");
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[0].strategy, "web_api");
    assert_eq!(outcome.attempts[0].error_kind, Some(ErrorKind::Response));
    assert_eq!(
        outcome.attempts[0].warnings,
        vec![ErrorKind::SignatureSynthesisDegraded]
    );
    assert_eq!(outcome.payload, state);
}

#[tokio::test]
async fn test_pipeline_degrades_when_every_source_fails() {
    let Some(server) = mock_server_or_skip().await else {
        return;
    };
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::open(&mock_config(&server.uri())).unwrap();
    let outcome = orchestrator
        .fetch(&format!("{}/video/{ITEM_ID}", server.uri()), MediaFormat::Png)
        .await
        .unwrap();

    assert!(outcome.is_degraded());
    assert_eq!(outcome.strategy, "terminal_fallback");
    assert_eq!(outcome.entity_id.as_str(), ITEM_ID);
    assert_eq!(outcome.attempts.len(), 8);
    assert!(outcome.attempts[..7].iter().all(|attempt| !attempt.success));
    assert_eq!(outcome.payload["aweme_list"][0]["aweme_id"], ITEM_ID);
}

async fn share_link_landing_on(landing: ResponseTemplate) -> Option<Result<EntityId, FetchError>> {
    let server = mock_server_or_skip().await?;
    Mock::given(method("GET"))
        .and(path("/s/abc"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/video/{ITEM_ID}", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/video/{ITEM_ID}")))
        .respond_with(landing)
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::open(&mock_config(&server.uri())).unwrap();
    Some(
        orchestrator
            .resolve_entity_id(&format!("shared {}/s/abc", server.uri()))
            .await,
    )
}

#[tokio::test]
async fn test_share_link_resolves_when_landing_page_is_empty() {
    let Some(resolved) = share_link_landing_on(ResponseTemplate::new(200)).await else {
        return;
    };

    assert_eq!(resolved.unwrap().as_str(), ITEM_ID);
}

#[tokio::test]
async fn test_share_link_resolves_when_landing_page_is_blocked() {
    let landing = ResponseTemplate::new(403).set_body_string("forbidden");
    let Some(resolved) = share_link_landing_on(landing).await else {
        return;
    };

    assert_eq!(resolved.unwrap().as_str(), ITEM_ID);
}

#[tokio::test]
async fn test_note_links_resolve() {
    let Some(server) = mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/note/7300000000000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>note</html>"))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::open(&mock_config(&server.uri())).unwrap();
    let id = orchestrator
        .resolve_entity_id(&format!("{}/note/7300000000000000001", server.uri()))
        .await
        .unwrap();

    assert_eq!(id.as_str(), "7300000000000000001");
}

#[tokio::test]
async fn test_unknown_url_shape_is_id_not_found() {
    let Some(server) = mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/user/someone"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>profile</html>"))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::open(&mock_config(&server.uri())).unwrap();
    let err = orchestrator
        .fetch(&format!("{}/user/someone", server.uri()), MediaFormat::Png)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IdNotFound);
}

#[tokio::test]
async fn test_closed_orchestrator_fails_fast() {
    let orchestrator = Orchestrator::open(&offline_config()).unwrap();
    orchestrator.close();

    let err = orchestrator
        .fetch("https://v.douyin.com/abc/", MediaFormat::Png)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Closed));
}
