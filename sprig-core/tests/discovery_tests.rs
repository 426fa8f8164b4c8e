//! Bootstrap from compile-time registrations.

use sprig_core::*;

mod clean {
    use sprig_core::*;

    #[derive(Default)]
    pub struct Orders;

    register_controller!(
        Orders,
        ControllerDescriptor::<Orders>::new("/orders")
            .get("/list", vec![], |_o, ()| vec!["a", "b"])
            .post("/create", vec![Param::body()], |_o, (order,): (serde_json::Value,)| order)
    );

    pub mod admin {
        use sprig_core::*;

        #[derive(Default)]
        pub struct Audit;

        register_controller!(
            Audit,
            ControllerDescriptor::<Audit>::new("/admin").get("/audit", vec![], |_a, ()| true)
        );
    }
}

mod clash {
    pub mod first {
        use sprig_core::*;

        #[derive(Default)]
        pub struct First;

        register_controller!(
            First,
            ControllerDescriptor::<First>::new("/shared").get("/item", vec![], |_f, ()| 1)
        );
    }

    pub mod second {
        use sprig_core::*;

        #[derive(Default)]
        pub struct Second;

        register_controller!(
            Second,
            ControllerDescriptor::<Second>::new("/shared").put("/item", vec![], |_s, ()| 2)
        );
    }
}

fn entry(_args: Vec<String>) {}

fn bootstrap(namespace: &str) -> Result<Application> {
    Application::builder(AppDescriptor::new("discovery").entry(entry).base_namespace(namespace))
        .config(ServerConfig::default().with_port(0))
        .build()
}

#[test]
fn test_namespace_scan_includes_descendants() {
    let app = bootstrap("discovery_tests::clean").unwrap();
    assert_eq!(
        app.routes().paths(),
        vec!["/admin/audit", "/orders/create", "/orders/list"]
    );
}

#[test]
fn test_namespace_scan_is_scoped() {
    let app = bootstrap("discovery_tests::clean::admin").unwrap();
    assert_eq!(app.routes().paths(), vec!["/admin/audit"]);

    let app = bootstrap("discovery_tests::nowhere").unwrap();
    assert!(app.routes().is_empty());
}

#[test]
fn test_duplicate_registration_aborts_startup() {
    let err = bootstrap("discovery_tests::clash").unwrap_err();
    assert!(matches!(err, Error::DuplicateRoute(ref path) if path == "/shared/item"));
    assert!(err.is_configuration());
}

#[test]
fn test_discovered_and_manual_controllers_collide() {
    #[derive(Default)]
    struct Late;

    let err = Application::builder(
        AppDescriptor::new("discovery")
            .entry(entry)
            .base_namespace("discovery_tests::clean::admin"),
    )
    .config(ServerConfig::default().with_port(0))
    .controller(ControllerDescriptor::<Late>::new("/admin").get("/audit", vec![], |_l, ()| ()))
    .build()
    .unwrap_err();

    assert!(matches!(err, Error::DuplicateRoute(_)));
}

#[tokio::test]
async fn test_discovered_routes_dispatch() {
    let app = bootstrap("discovery_tests::clean").unwrap();

    let handler = app.routes().lookup("/orders/create").unwrap();
    let res = handler
        .handle(HttpRequest::new("POST", "/orders/create").with_body(r#"{"id":7}"#))
        .await
        .unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), r#"{"id":7}"#);

    let handler = app.routes().lookup("/orders/list").unwrap();
    let res = handler.handle(HttpRequest::new("GET", "/orders/list")).await.unwrap();
    assert_eq!(res.body_text(), r#"["a","b"]"#);
}
