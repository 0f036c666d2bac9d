//! List loading against a mock HTTP server

use dnsync_core::traits::SourceLoader;
use dnsync_core::{DesiredSources, Error, Profile, RewriteRoute, SyncConfig};
use dnsync_source_http::HttpSourceLoader;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn lists_are_concatenated_in_source_order() {
    let server = MockServer::start().await;
    serve(&server, "/first.txt", "0.0.0.0 b.example\n10.0.0.1 nas.home\n").await;
    serve(&server, "/second.txt", "# second\n0.0.0.0 a.example\n").await;

    let loader = HttpSourceLoader::new().unwrap();
    let sources = vec![
        format!("{}/first.txt", server.uri()),
        format!("{}/second.txt", server.uri()),
    ];

    let domains = assert_ok!(loader.load_blocklist(&sources).await);

    assert_eq!(domains, vec!["b.example", "a.example"]);
}

#[tokio::test]
async fn override_lists_yield_routes() {
    let server = MockServer::start().await;
    serve(&server, "/override.txt", "10.0.0.1 nas.home\n0.0.0.0 ads.example\n").await;

    let loader = HttpSourceLoader::new().unwrap();
    let routes = assert_ok!(
        loader
            .load_rewrites(&[format!("{}/override.txt", server.uri())])
            .await
    );

    assert_eq!(
        routes,
        vec![RewriteRoute::new("10.0.0.1".parse().unwrap(), "nas.home")]
    );
}

#[tokio::test]
async fn failing_source_fails_the_load() {
    let server = MockServer::start().await;
    serve(&server, "/ok.txt", "0.0.0.0 a.example\n").await;
    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let loader = HttpSourceLoader::new().unwrap();
    let sources = vec![
        format!("{}/ok.txt", server.uri()),
        format!("{}/missing.txt", server.uri()),
    ];

    let err = assert_err!(loader.load_blocklist(&sources).await);
    assert!(matches!(err, Error::Source(ref msg) if msg.contains("404")));
}

#[tokio::test]
async fn desired_sources_skip_unconfigured_categories() {
    let server = MockServer::start().await;
    serve(&server, "/block.txt", "0.0.0.0 ads.example\n").await;

    let mut config = SyncConfig::new(vec![Profile::new("abc123", "key")]);
    config.block_sources = vec![format!("{}/block.txt", server.uri())];

    let loader = HttpSourceLoader::new().unwrap();
    let sources = assert_ok!(DesiredSources::load(&loader, &config).await);

    assert_eq!(sources.blocklist, Some(vec!["ads.example".to_string()]));
    assert!(sources.rewrites.is_none());
}
