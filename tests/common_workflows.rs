//! End-to-end tests: a bootstrapped application served over TCP.

use sprig::prelude::*;
use std::collections::BTreeMap;
use sprig::ServerHandle;

mod api {
    use sprig::prelude::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct UsersController {
        saved: Vec<String>,
    }

    register_controller!(
        UsersController,
        ControllerDescriptor::<UsersController>::new("/v1/users")
            .get("/get", vec![], |_c, ()| "Regular mapping is active!")
            .put(
                "/put",
                vec![Param::query("userId"), Param::query("userId2")],
                |c, (a, b): (String, String)| {
                    c.saved.push(a);
                    c.saved.push(b);
                },
            )
            .get("/saved", vec![], |c, ()| c.saved.clone())
            .post(
                "/post",
                vec![
                    Param::query("intParam"),
                    Param::query("testParam"),
                    Param::body(),
                ],
                |_c, (n, s, body): (i32, String, Option<BTreeMap<String, String>>)| {
                    let mut out: Vec<String> = body
                        .unwrap_or_default()
                        .into_values()
                        .map(|v| format!("{}:processed", v))
                        .collect();
                    out.push(format!("{}:{}", n, s));
                    out
                },
            )
    );
}

fn entry(_args: Vec<String>) {}

async fn serve() -> (ServerHandle, String) {
    let app = Application::builder(
        AppDescriptor::new("e2e")
            .entry(entry)
            .base_namespace("common_workflows::api"),
    )
    .config(ServerConfig::default().with_host("127.0.0.1").with_port(0))
    .build()
    .unwrap();

    let handle = app.start().await.unwrap();
    let base = format!("http://{}", handle.local_addr());
    (handle, base)
}

#[tokio::test]
async fn test_get_route_over_http() {
    let (handle, base) = serve().await;

    let res = reqwest::get(format!("{}/v1/users/get", base)).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(res.text().await.unwrap(), "\"Regular mapping is active!\"");

    assert!(handle.stop(1000).await);
}

#[tokio::test]
async fn test_put_then_read_singleton_state() {
    let (handle, base) = serve().await;
    let client = reqwest::Client::new();

    let res = client
        .put(format!("{}/v1/users/put?userId=alice&userId2=bob", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Method executed successfully");

    let saved: Vec<String> = client
        .get(format!("{}/v1/users/saved", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved, vec!["alice", "bob"]);

    handle.stop(1000).await;
}

#[tokio::test]
async fn test_post_with_query_and_json_body() {
    let (handle, base) = serve().await;
    let client = reqwest::Client::new();

    let mut body = BTreeMap::new();
    body.insert("a", "x");
    body.insert("b", "y");

    let res = client
        .post(format!("{}/v1/users/post?intParam=5&testParam=hi", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let values: Vec<String> = res.json().await.unwrap();
    assert_eq!(values, vec!["x:processed", "y:processed", "5:hi"]);

    let res = client
        .post(format!("{}/v1/users/post?testParam=hi", base))
        .send()
        .await
        .unwrap();
    let values: Vec<String> = res.json().await.unwrap();
    assert_eq!(values, vec!["0:hi"]);

    handle.stop(1000).await;
}

#[tokio::test]
async fn test_validation_and_error_responses() {
    let (handle, base) = serve().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/v1/users/get", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.text().await.unwrap(), "Method Not Allowed");

    let res = client.get(format!("{}/nothing", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "Method not found");

    let res = client
        .post(format!("{}/v1/users/post?intParam=abc", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let error: serde_json::Value = res.json().await.unwrap();
    assert_eq!(error["status"], 400);

    // Still serving after a failed request
    let res = client.get(format!("{}/v1/users/get", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);

    handle.stop(1000).await;
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let (handle, base) = serve().await;
    assert!(handle.stop(1000).await);

    let client = reqwest::Client::new();
    assert!(client.get(format!("{}/v1/users/get", base)).send().await.is_err());
}
