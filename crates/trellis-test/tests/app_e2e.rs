//! A whole application driven through the test client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::{Method, StatusCode};
use serde_json::json;
use trellis::config::ConfigLoader;
use trellis::prelude::*;
use trellis_test::TestClient;

fn status_app(config: AppConfig) -> App {
    let mut app = App::from_config(config).unwrap();
    app.routes(|routes| {
        routes.get(
            "/status",
            HandlerRef::function(|_| async {
                Response::json(StatusCode::OK, &json!({ "status": "UP" }))
            }),
        )?;
        Ok(())
    });
    app
}

#[tokio::test]
async fn test_status_scenario() {
    let client = TestClient::new(status_app(AppConfig::default()).build().unwrap());

    let response = client.get("/status").send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!({ "status": "UP" }));
    assert!(response.request_id().is_some());

    client
        .post("/status")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED)
        .assert_allow(&["GET"])
        .assert_error_code("METHOD_NOT_ALLOWED");

    client
        .get("/unknown")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_code("NOT_FOUND");
}

#[tokio::test]
async fn test_blog_resource_with_named_middleware() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&log);
    let auth: Arc<dyn Middleware> = Arc::new(FnMiddleware::new("auth", move |request, next| {
        seen.lock().unwrap().push(request.uri().path().to_string());
        Box::pin(async move {
            if request.headers().contains_key("authorization") {
                next.handle(request).await
            } else {
                Err(TrellisError::http(StatusCode::UNAUTHORIZED, "sign in first"))
            }
        })
    }));

    let config = ConfigLoader::new()
        .with_string(
            r#"
            [app]
            base_path = "/blog"

            [routing]
            lazy_handlers = true
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let mut app = App::from_config(config).unwrap();
    app.bind("auth", auth)
        .action("PostsController", "index", |_| async {
            Response::json(StatusCode::OK, &json!(["hello world"]))
        })
        .action("PostsController", "show", |inv| async move {
            let id: u32 = inv.parse("id")?;
            Response::json(StatusCode::OK, &json!({ "id": id }))
        })
        .action("PostsController", "store", |_| async {
            Ok(Response::empty(StatusCode::CREATED))
        })
        .routes(|routes| {
            routes.resource(
                "/posts",
                "PostsController",
                &ResourceOptions::only(["index", "show"]),
            )?;
            routes.group(GroupParameters::new().middleware("auth"), |admin| {
                admin.post("/posts", "PostsController@store")?.set_name("posts.store")?;
                Ok(())
            })
        });

    let application = app.build().unwrap();
    assert_eq!(application.url_for("posts.show", &[("id", "7")]).unwrap(), "/blog/posts/7");
    assert_eq!(application.url_for("posts.store", &[]).unwrap(), "/blog/posts");

    let client = TestClient::new(application);
    client
        .get("/blog/posts")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_eq(&json!(["hello world"]));
    client
        .get("/blog/posts/7")
        .send()
        .await
        .assert_json_field("id", &json!(7));

    client
        .post("/blog/posts")
        .send()
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    client
        .post("/blog/posts")
        .header("authorization", "Bearer editor")
        .send()
        .await
        .assert_status(StatusCode::CREATED);

    // reads never pass through the admin group
    assert_eq!(*log.lock().unwrap(), vec!["/blog/posts", "/blog/posts"]);
}

#[tokio::test]
async fn test_global_middleware_wraps_router() {
    let mut app = status_app(AppConfig::default());
    app.add(Arc::new(FnMiddleware::new("powered-by", |request, next| {
        Box::pin(async move {
            let mut response = next.handle(request).await?;
            response
                .headers_mut()
                .insert("x-powered-by", http::HeaderValue::from_static("trellis"));
            Ok(response)
        })
    })) as Arc<dyn Middleware>);
    let client = TestClient::new(app.build().unwrap());

    client
        .get("/status")
        .send()
        .await
        .assert_header("x-powered-by", "trellis");
}

#[tokio::test]
async fn test_cors_preflight() {
    let mut config = AppConfig::default();
    config.http.cors.allowed_origins = vec!["https://blog.example.com".to_string()];
    let client = TestClient::new(status_app(config).build().unwrap());

    let response = client
        .options("/status")
        .origin("https://blog.example.com")
        .header("access-control-request-method", "GET")
        .send()
        .await;
    response
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header("access-control-allow-origin", "https://blog.example.com");

    client
        .options("/status")
        .origin("https://evil.example.com")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error_code("HTTP_ERROR");
}

#[tokio::test]
async fn test_request_timeout() {
    let mut config = AppConfig::default();
    config.http.request_timeout_ms = 20;
    let mut app = App::from_config(config).unwrap();
    app.routes(|routes| {
        routes.get(
            "/slow",
            HandlerRef::function(|_| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(Response::empty(StatusCode::OK))
            }),
        )?;
        Ok(())
    });
    let client = TestClient::new(app.build().unwrap());

    client
        .get("/slow")
        .send()
        .await
        .assert_status(StatusCode::GATEWAY_TIMEOUT)
        .assert_error_code("TIMEOUT");
}

#[tokio::test]
async fn test_incoming_request_id_trusted_when_configured() {
    let id = "0192f3a4-5b6c-7d8e-9f00-112233445566";

    let client = TestClient::new(status_app(AppConfig::default()).build().unwrap());
    let response = client.get("/status").header("x-request-id", id).send().await;
    assert_ne!(response.request_id(), Some(id));

    let mut config = AppConfig::default();
    config.http.trust_request_id = true;
    let client = TestClient::new(status_app(config).build().unwrap());
    client
        .get("/status")
        .header("x-request-id", id)
        .send()
        .await
        .assert_header("x-request-id", id);
}

#[tokio::test]
async fn test_unsupported_method_on_any_route() {
    let client = TestClient::new(status_app(AppConfig::default()).build().unwrap());
    client
        .request(Method::DELETE, "/status")
        .send()
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
