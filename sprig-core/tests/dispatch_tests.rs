//! Dispatch through a bootstrapped route table, without sockets.

use parking_lot::Mutex;
use sprig_core::*;
use std::collections::BTreeMap;
use std::sync::Arc;

type CallLog = Arc<Mutex<Vec<String>>>;

struct UsersController {
    log: CallLog,
}

fn users(log: CallLog) -> ControllerDescriptor<UsersController> {
    ControllerDescriptor::with_factory("/v1/users", move || UsersController { log: log.clone() })
        .get("/get", vec![], |_c, ()| "Regular mapping is active!")
        .put(
            "/put",
            vec![Param::query("userId"), Param::query("userId2")],
            |c, (a, b): (String, String)| {
                c.log.lock().push(format!("put {} {}", a, b));
            },
        )
        .post(
            "/post",
            vec![
                Param::query("intParam"),
                Param::query("testParam"),
                Param::body(),
            ],
            |c, (n, s, body): (i32, String, Option<BTreeMap<String, String>>)| {
                let body = body.unwrap_or_default();
                c.log.lock().push(format!("post {} {} {:?}", n, s, body));
                body.into_values()
                    .map(|v| format!("{}:processed", v))
                    .collect::<Vec<_>>()
            },
        )
}

#[derive(Default)]
struct Counter {
    count: u32,
}

fn counter(prefix: &str, scope: InstanceScope) -> ControllerDescriptor<Counter> {
    ControllerDescriptor::<Counter>::new(prefix)
        .scope(scope)
        .get("/inc", vec![], |c, ()| {
            c.count += 1;
            c.count
        })
        .get("/peek", vec![], |c, ()| c.count)
}

#[derive(Default)]
struct Faulty;

fn faulty() -> ControllerDescriptor<Faulty> {
    ControllerDescriptor::<Faulty>::new("/faulty")
        .get("/fail", vec![], |_f, ()| -> std::result::Result<String, String> {
            Err("lookup failed".to_string())
        })
        .get("/panic", vec![], |_f, ()| -> String { panic!("controller bug") })
        .get("/ok", vec![Param::query("n")], |_f, (n,): (u8,)| n)
        .get("/echo", vec![Param::query("name")], |_f, (name,): (Option<String>,)| name)
}

fn entry(_args: Vec<String>) {}

fn build(log: CallLog) -> Application {
    Application::builder(
        AppDescriptor::new("dispatch-tests")
            .entry(entry)
            .base_namespace("dispatch_tests::no_registrations"),
    )
    .config(ServerConfig::default().with_port(0))
    .controller(users(log))
    .controller(counter("/single", InstanceScope::Singleton))
    .controller(counter("/proto", InstanceScope::Prototype))
    .controller(faulty())
    .build()
    .unwrap()
}

async fn send(app: &Application, request: HttpRequest) -> HttpResponse {
    match app.routes().resolve(&request.path) {
        Some(handler) => handler
            .handle(request)
            .await
            .unwrap_or_else(|err| HttpResponse::from_error(&err)),
        None => HttpResponse::text(404, NOT_FOUND_BODY),
    }
}

#[tokio::test]
async fn test_get_returns_json_quoted_string() {
    let app = build(CallLog::default());

    let res = send(&app, HttpRequest::new("GET", "/v1/users/get")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), "\"Regular mapping is active!\"");
    assert_eq!(
        res.headers.get("Content-Type").map(String::as_str),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn test_put_binds_query_and_reports_execution() {
    let log = CallLog::default();
    let app = build(log.clone());

    let res = send(
        &app,
        HttpRequest::new("PUT", "/v1/users/put?userId=alice&userId2=bob"),
    )
    .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), "Method executed successfully");
    assert_eq!(*log.lock(), vec!["put alice bob".to_string()]);
}

#[tokio::test]
async fn test_post_binds_query_and_body() {
    let log = CallLog::default();
    let app = build(log.clone());

    let res = send(
        &app,
        HttpRequest::new("POST", "/v1/users/post?intParam=5&testParam=hi")
            .with_body(r#"{"a":"x","b":"y"}"#),
    )
    .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), r#"["x:processed","y:processed"]"#);
    assert_eq!(
        *log.lock(),
        vec![r#"post 5 hi {"a": "x", "b": "y"}"#.to_string()]
    );
}

#[tokio::test]
async fn test_repeated_query_key_binds_first_value() {
    let log = CallLog::default();
    let app = build(log.clone());

    let res = send(
        &app,
        HttpRequest::new("PUT", "/v1/users/put?userId=alice&userId=eve&userId2=bob"),
    )
    .await;

    assert_eq!(res.status, 200);
    assert_eq!(*log.lock(), vec!["put alice bob".to_string()]);
}

#[tokio::test]
async fn test_optional_string_accepts_numeric_and_boolean_text() {
    let app = build(CallLog::default());

    for (query, expected) in [
        ("name=alice", "\"alice\""),
        ("name=123", "\"123\""),
        ("name=true", "\"true\""),
        ("other=1", "null"),
    ] {
        let res = send(&app, HttpRequest::new("GET", format!("/faulty/echo?{}", query))).await;
        assert_eq!(res.status, 200, "{}", query);
        assert_eq!(res.body_text(), expected, "{}", query);
    }
}

#[tokio::test]
async fn test_missing_int_param_binds_zero() {
    let log = CallLog::default();
    let app = build(log.clone());

    let res = send(
        &app,
        HttpRequest::new("POST", "/v1/users/post?testParam=hi").with_body(r#"{"a":"x"}"#),
    )
    .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), r#"["x:processed"]"#);
    assert_eq!(*log.lock(), vec![r#"post 0 hi {"a": "x"}"#.to_string()]);
}

#[tokio::test]
async fn test_missing_query_and_body_bind_zero_values() {
    let log = CallLog::default();
    let app = build(log.clone());

    let res = send(&app, HttpRequest::new("POST", "/v1/users/post")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), "[]");
    assert_eq!(*log.lock(), vec!["post 0  {}".to_string()]);
}

#[tokio::test]
async fn test_wrong_verb_is_405() {
    let log = CallLog::default();
    let app = build(log.clone());

    let res = send(&app, HttpRequest::new("GET", "/v1/users/put?userId=a")).await;
    assert_eq!(res.status, 405);
    assert_eq!(res.body_text(), "Method Not Allowed");
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_unknown_paths_are_404() {
    let app = build(CallLog::default());

    // No registered path is a prefix
    let res = send(&app, HttpRequest::new("GET", "/v2/users/get")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body_text(), "Method not found");

    // Prefix match, rejected by the dispatcher
    let res = send(&app, HttpRequest::new("GET", "/v1/users/get/extra")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body_text(), "Method not found");

    // Path check comes before the verb check
    let res = send(&app, HttpRequest::new("DELETE", "/v1/users/getx")).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_malformed_query_value_is_400() {
    let app = build(CallLog::default());

    let res = send(
        &app,
        HttpRequest::new("POST", "/v1/users/post?intParam=five&testParam=hi"),
    )
    .await;
    assert_eq!(res.status, 400);

    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("intParam"));

    let res = send(&app, HttpRequest::new("GET", "/faulty/ok?n=300")).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = build(CallLog::default());

    let res = send(
        &app,
        HttpRequest::new("POST", "/v1/users/post?intParam=1").with_body("{not json"),
    )
    .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_method_errors_are_500_and_serving_continues() {
    let app = build(CallLog::default());

    let res = send(&app, HttpRequest::new("GET", "/faulty/fail")).await;
    assert_eq!(res.status, 500);
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["error"], "Invocation error: lookup failed");

    let res = send(&app, HttpRequest::new("GET", "/faulty/panic")).await;
    assert_eq!(res.status, 500);

    let res = send(&app, HttpRequest::new("GET", "/faulty/ok?n=7")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), "7");
}

#[tokio::test]
async fn test_singleton_state_is_shared_across_routes() {
    let app = build(CallLog::default());

    for expected in ["1", "2", "3"] {
        let res = send(&app, HttpRequest::new("GET", "/single/inc")).await;
        assert_eq!(res.body_text(), expected);
    }

    let res = send(&app, HttpRequest::new("GET", "/single/peek")).await;
    assert_eq!(res.body_text(), "3");
}

#[tokio::test]
async fn test_prototype_gets_fresh_instance_after_each_call() {
    let app = build(CallLog::default());

    for _ in 0..3 {
        let res = send(&app, HttpRequest::new("GET", "/proto/inc")).await;
        assert_eq!(res.body_text(), "1");
    }

    // Each route rebinds independently
    let res = send(&app, HttpRequest::new("GET", "/proto/peek")).await;
    assert_eq!(res.body_text(), "1");
    let res = send(&app, HttpRequest::new("GET", "/proto/peek")).await;
    assert_eq!(res.body_text(), "0");
}

#[tokio::test]
async fn test_concurrent_singleton_calls_are_serialized() {
    let app = Arc::new(build(CallLog::default()));

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            send(&app, HttpRequest::new("GET", "/single/inc")).await.status
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), 200);
    }

    let res = send(&app, HttpRequest::new("GET", "/single/peek")).await;
    assert_eq!(res.body_text(), "50");
}

#[test]
fn test_custom_content_type() {
    let app = Application::builder(
        AppDescriptor::new("json-app")
            .entry(entry)
            .base_namespace("dispatch_tests::no_registrations"),
    )
    .config(
        ServerConfig::default()
            .with_port(0)
            .with_content_type("application/json"),
    )
    .controller(users(CallLog::default()))
    .build()
    .unwrap();

    let res = tokio_test::block_on(send(&app, HttpRequest::new("GET", "/v1/users/get")));
    assert_eq!(
        res.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
}
