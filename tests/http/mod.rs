use std::collections::HashMap;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use dbml_refs::config::schema::load_config_from_string;
use dbml_refs::frontend::http::filters;
use dbml_refs::frontend::http_utils::INVALID_SCHEMA_SOURCE;
use dbml_refs::upstream::HttpSchemaSource;
use futures::Future;
use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::sync::oneshot::Sender;
use warp::hyper::body::to_bytes;
use warp::hyper::client::HttpConnector;
use warp::hyper::{Body, Client, Method, Request, Response, StatusCode};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{SHOP_SCHEMA, SHOP_SCHEMA_AUGMENTED};

/// Make an HTTP server that listens on a random free port and fetches schemas through
/// the given extraction service endpoint.
/// Returns the server's address, the actual server Future and a channel to stop the server
async fn make_http_server(
    endpoint: &str,
) -> (
    SocketAddr,
    Pin<Box<dyn Future<Output = ()> + Send>>,
    Sender<()>,
) {
    let config_text = format!(
        r#"
[upstream]
endpoint = "{endpoint}"
timeout_seconds = 2
"#
    );

    let config = load_config_from_string(&config_text, false).unwrap();
    let source = Arc::new(HttpSchemaSource::new(&config.upstream).unwrap());

    let filters = filters(source, &config.frontend.http);
    let (tx, rx) = oneshot::channel();
    let (addr, server) = warp::serve(filters).bind_with_graceful_shutdown(
        // Pass port :0 to pick a random free port
        "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        async {
            rx.await.ok();
        },
    );

    (addr, server.boxed(), tx)
}

/// Extraction service mock: knows a single project
async fn make_extraction_service() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/extract"))
        .and(query_param("url", "https://dbdocs.example.com/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_SCHEMA))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/extract"))
        .and(query_param("url", "https://dbdocs.example.com/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    // Anything else is unknown to the service
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

async fn response_json(response: Response<Body>) -> serde_json::Value {
    let body_bytes = to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

async fn post_url(
    client: &Client<HttpConnector>,
    uri: &str,
    url: Option<&str>,
) -> Response<Body> {
    let body = match url {
        Some(url) => serde_json::to_string(&HashMap::from([("url", url)])).unwrap(),
        None => "{}".to_string(),
    };

    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    client.request(req).await.unwrap()
}

#[tokio::test]
async fn test_http_server_augment() {
    let extraction_service = make_extraction_service().await;
    let (addr, server, terminate) =
        make_http_server(&format!("{}/extract", extraction_service.uri())).await;

    tokio::task::spawn(server);
    let client = Client::new();
    let uri = format!("http://{}/dbml", addr);

    // Known project: relationships get inferred
    let resp = post_url(&client, &uri, Some("https://dbdocs.example.com/shop")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(response_json(resp).await["dbml"], SHOP_SCHEMA_AUGMENTED);

    // No URL at all
    let resp = post_url(&client, &uri, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(resp).await["error"],
        "A schema source URL is required"
    );

    // The service doesn't know the project
    let resp = post_url(&client, &uri, Some("https://dbdocs.example.com/other")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(resp).await["error"], INVALID_SCHEMA_SOURCE);

    // The service knows it, but has nothing to say
    let resp = post_url(&client, &uri, Some("https://dbdocs.example.com/blank")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(resp).await["error"], INVALID_SCHEMA_SOURCE);

    // Stop the server
    terminate.send(()).unwrap();
}

#[tokio::test]
async fn test_http_server_unreachable_upstream() {
    // Grab a free port and release it so that nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/extract", listener.local_addr().unwrap());
    drop(listener);

    let (addr, server, terminate) = make_http_server(&endpoint).await;
    tokio::task::spawn(server);

    let client = Client::new();
    let resp = post_url(
        &client,
        &format!("http://{}/dbml", addr),
        Some("https://dbdocs.example.com/shop"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(resp).await["error"], INVALID_SCHEMA_SOURCE);

    terminate.send(()).unwrap();
}
