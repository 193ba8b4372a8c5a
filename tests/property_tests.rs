//! Property tests for the gateway pipeline.
//!
//! These run `RequestGate::inspect` directly on a current-thread runtime per
//! case, so no sockets or middleware are involved.

use agenda_gateway::config::GatewayConfig;
use agenda_gateway::gateway::{GateState, Outcome, RequestGate};
use axum::body::{to_bytes, Body};
use axum::http::Request;
use proptest::prelude::*;
use serde_json::{Map, Value};
use url::form_urlencoded;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn gate() -> RequestGate {
    RequestGate::from_config(&GatewayConfig::default()).unwrap()
}

fn build(method: &str, uri: &str, content_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap()
}

/// Forwarded body bytes, or `None` if the request was rejected.
fn forwarded_body(outcome: Outcome) -> Option<Vec<u8>> {
    match outcome {
        Outcome::Forward { request, .. } => Some(
            runtime()
                .block_on(to_bytes(request.into_body(), usize::MAX))
                .unwrap()
                .to_vec(),
        ),
        Outcome::Reject { .. } => None,
    }
}

// Strategy: Generate methods that carry a body
fn arb_body_method() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("POST"), Just("PUT"), Just("PATCH")]
}

// Strategy: Generate paths under the default exclusions
fn arb_excluded_path() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/auth/token".to_string()),
        Just("/auth/login".to_string()),
        prop::string::string_regex("/upload/[a-z0-9/]{0,20}").unwrap(),
        prop::string::string_regex("/event-requests/[a-z0-9/]{0,20}").unwrap(),
    ]
}

// Strategy: Generate strings the threat patterns flag
fn arb_threat() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("<script>x</script>"),
        Just("DROP TABLE t"),
        Just("union select"),
        Just("<iframe src=x></iframe>"),
        Just("javascript:alert"),
    ]
}

// Strategy: Generate container layers as (is_array, key, filler)
fn arb_layers() -> impl Strategy<Value = Vec<(bool, String, String)>> {
    prop::collection::vec((any::<bool>(), "[a-z]{1,8}", "[a-z]{0,10}"), 0..64)
}

/// Wrap `leaf` in one container per layer, innermost first.
fn nest(leaf: &str, layers: &[(bool, String, String)]) -> Value {
    layers
        .iter()
        .fold(Value::String(leaf.to_string()), |inner, (is_array, key, filler)| {
            if *is_array {
                Value::Array(vec![Value::String(filler.clone()), inner])
            } else {
                let mut map = Map::new();
                map.insert("_fill".to_string(), Value::String(filler.clone()));
                map.insert(key.clone(), inner);
                Value::Object(map)
            }
        })
}

proptest! {
    /// Property: Excluded paths are forwarded whatever they carry
    #[test]
    fn proptest_excluded_paths_always_forward(
        path in arb_excluded_path(),
        method in arb_body_method(),
        body in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let req = build(method, &path, "application/json", body.clone());
        let outcome = runtime().block_on(gate().inspect(req));

        prop_assert_eq!(outcome.state(), GateState::Excluded);
        prop_assert_eq!(forwarded_body(outcome), Some(body));
    }

    /// Property: Excluded paths forward threats in headers, query and body
    #[test]
    fn proptest_excluded_paths_forward_malicious_content(
        path in arb_excluded_path(),
        method in arb_body_method(),
        header_threat in arb_threat(),
        query_threat in arb_threat(),
        body_threat in arb_threat(),
    ) {
        let query: String = form_urlencoded::byte_serialize(query_threat.as_bytes()).collect();
        let body = serde_json::json!({ "note": body_threat }).to_string().into_bytes();
        let malicious = |path: &str| {
            Request::builder()
                .method(method)
                .uri(format!("{}?q={}", path, query))
                .header("content-type", "application/json")
                .header("x-note", header_threat)
                .body(Body::from(body.clone()))
                .unwrap()
        };

        let outcome = runtime().block_on(gate().inspect(malicious(&path)));
        prop_assert_eq!(outcome.state(), GateState::Excluded);
        prop_assert_eq!(forwarded_body(outcome), Some(body.clone()));

        let outcome = runtime().block_on(gate().inspect(malicious("/events")));
        prop_assert_eq!(outcome.state(), GateState::HeaderRejected);
    }

    /// Property: A threat string is found at any nesting depth below the ceiling
    #[test]
    fn proptest_threat_found_at_any_depth(
        threat in arb_threat(),
        layers in arb_layers(),
    ) {
        let tainted = nest(threat, &layers).to_string().into_bytes();
        let outcome = runtime().block_on(gate().inspect(build("POST", "/events", "application/json", tainted)));
        prop_assert_eq!(outcome.state(), GateState::BodyRejected);

        let clean = nest("Los Beatles", &layers).to_string().into_bytes();
        let outcome = runtime().block_on(gate().inspect(build("POST", "/events", "application/json", clean.clone())));
        prop_assert_eq!(outcome.state(), GateState::Accepted);
        prop_assert_eq!(forwarded_body(outcome), Some(clean));
    }

    /// Property: Any query value over 1000 characters is rejected
    #[test]
    fn proptest_long_query_value_rejected(
        key in prop::string::string_regex("[a-z]{1,10}").unwrap(),
        len in 1001usize..3000,
    ) {
        let uri = format!("/events?{}={}", key, "x".repeat(len));
        let req = build("GET", &uri, "text/plain", Vec::new());
        let outcome = runtime().block_on(gate().inspect(req));

        prop_assert_eq!(outcome.state(), GateState::QueryRejected);
    }

    /// Property: Accepted bodies reach the handler byte-for-byte
    #[test]
    fn proptest_accepted_body_replayed_identically(
        method in arb_body_method(),
        text in prop::string::string_regex("[a-zA-Z0-9,._-]{0,512}").unwrap(),
    ) {
        let body = text.into_bytes();
        let req = build(method, "/events/1", "text/plain", body.clone());
        let outcome = runtime().block_on(gate().inspect(req));

        prop_assert_eq!(outcome.state(), GateState::Accepted);
        prop_assert_eq!(forwarded_body(outcome), Some(body));
    }

    /// Property: Multipart bodies within the ceiling are never scanned
    #[test]
    fn proptest_multipart_binary_exempt(
        body in prop::collection::vec(any::<u8>(), 1..4096),
    ) {
        let req = build("POST", "/events/1/image", "multipart/form-data; boundary=b", body.clone());
        let outcome = runtime().block_on(gate().inspect(req));

        prop_assert_eq!(outcome.state(), GateState::Accepted);
        prop_assert_eq!(forwarded_body(outcome), Some(body));
    }
}
