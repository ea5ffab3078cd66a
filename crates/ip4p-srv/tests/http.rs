//! End-to-end tests against a live plain-HTTP listener.

use std::net::SocketAddr;
use std::time::Duration;

use ip4p_core::{Mapping, MappingTable};
use ip4p_srv::server::Server;
use ip4p_srv::{Router, StaticResolver};
use reqwest::{redirect::Policy, Client, StatusCode};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<ip4p_srv::Result<()>>,
}

async fn start() -> Running {
    let table = MappingTable::new([
        Mapping::new("u1", "example.com"),
        Mapping::new("v4only", "v4.example.com"),
        Mapping::new("broken", "broken.example.com"),
    ]);
    let resolver = StaticResolver::new()
        .with("example.com", ["203.0.113.9", "2001::1bbc:10b0:201e"])
        .with("v4.example.com", ["203.0.113.9"])
        .with("broken.example.com", ["2001::zzzz:10b0:201e"]);

    let server = Server::bind(
        "127.0.0.1:0".parse().unwrap(),
        Router::new(table, resolver),
        None,
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(async {
        let _ = stopped.await;
    }));

    Running { addr, stop, handle }
}

fn client() -> Client {
    Client::builder().redirect(Policy::none()).build().unwrap()
}

#[tokio::test]
async fn redirects_known_identifier() {
    let running = start().await;
    let client = client();

    let response = client
        .get(format!("http://{}/u1", running.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "https://16.176.32.30:7100"
    );

    let response = client
        .post(format!("http://{}/u1?ignored=1", running.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);

    drop(client);
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn classifies_failures() {
    let running = start().await;
    let client = client();
    let url = |path: &str| format!("http://{}/{path}", running.addr);

    let cases = [
        ("", StatusCode::BAD_REQUEST, "identifier required\n"),
        ("unknown", StatusCode::NOT_FOUND, "identifier not found\n"),
        (
            "v4only",
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to resolve address record\n",
        ),
        (
            "broken",
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to parse IP4P address\n",
        ),
    ];

    for (path, status, body) in cases {
        let response = client.get(url(path)).send().await.unwrap();
        assert_eq!(response.status(), status, "/{path}");
        assert!(response.headers().get("location").is_none());
        assert_eq!(response.text().await.unwrap(), body, "/{path}");
    }

    drop(client);
    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let running = start().await;
    let client = client();

    let response = client
        .get(format!("http://{}/u1", running.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);

    // The pooled connection stays open while the server stops.
    running.stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), running.handle)
        .await
        .expect("shutdown waited on an idle connection")
        .unwrap()
        .unwrap();

    drop(client);
}

#[tokio::test]
async fn bind_conflict_is_reported() {
    let running = start().await;

    let result = Server::bind(
        running.addr,
        Router::new(MappingTable::default(), StaticResolver::new()),
        None,
    )
    .await;
    assert!(matches!(result, Err(ip4p_srv::SrvError::Server(_))));

    running.stop.send(()).unwrap();
    running.handle.await.unwrap().unwrap();
}
