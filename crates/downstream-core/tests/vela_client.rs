//! `VelaClient` requests against a local mock Vela server.

use std::sync::Arc;

use mockito::{Matcher, Server};

use downstream_core::{
    parse_targets, BuildClient, BuildConfig, BuildEvent, ClientError, ListOptions, Orchestrator,
    VelaClient, VelaConfig,
};

const TOKEN: &str = "superSecretVelaToken";
const BUILDS_PATH: &str = "/api/v1/repos/go-vela/hello-world/builds";

fn client_for(server: &Server) -> VelaClient {
    VelaClient::new(VelaConfig::new(&server.url(), TOKEN)).expect("client")
}

fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

#[tokio::test]
async fn list_sends_filters_and_reads_next_page_from_link() {
    let mut server = Server::new_async().await;
    let link = format!(
        "<{}{BUILDS_PATH}?page=2&per_page=50>; rel=\"next\", <{}{BUILDS_PATH}?page=4&per_page=50>; rel=\"last\"",
        server.url(),
        server.url()
    );
    let mock = server
        .mock("GET", BUILDS_PATH)
        .match_header("authorization", bearer().as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("per_page".into(), "50".into()),
            Matcher::UrlEncoded("branch".into(), "main".into()),
            Matcher::UrlEncoded("event".into(), "pull_request".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("link", &link)
        .with_body(
            r#"[{"id":1,"number":7,"branch":"main","event":"pull_request","status":"success"},
                {"id":2,"number":6,"branch":"main","event":"pull_request","status":"failure"}]"#,
        )
        .create_async()
        .await;

    let opts = ListOptions {
        branch: Some("main".to_string()),
        event: Some(BuildEvent::PullRequest),
        page: 1,
        per_page: 50,
    };
    let page = client_for(&server)
        .list_builds("go-vela", "hello-world", &opts)
        .await
        .expect("list builds");

    mock.assert_async().await;
    assert_eq!(page.next_page, 2);
    let numbers: Vec<u64> = page.builds.iter().map(|b| b.number).collect();
    assert_eq!(numbers, vec![7, 6]);
    assert_eq!(page.builds[1].status, "failure");
}

#[tokio::test]
async fn list_without_link_header_is_the_last_page() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", BUILDS_PATH)
        .match_query(Matcher::UrlEncoded("page".into(), "3".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let opts = ListOptions {
        page: 3,
        ..ListOptions::first_page(100)
    };
    let page = client_for(&server)
        .list_builds("go-vela", "hello-world", &opts)
        .await
        .expect("list builds");

    mock.assert_async().await;
    assert!(page.builds.is_empty());
    assert_eq!(page.next_page, 0);
}

#[tokio::test]
async fn get_fetches_a_single_build() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/repos/go-vela/hello-world/builds/42")
        .match_header("authorization", bearer().as_str())
        .with_status(200)
        .with_body(r#"{"number":42,"branch":"main","event":"push","status":"running"}"#)
        .create_async()
        .await;

    let build = client_for(&server)
        .get_build("go-vela", "hello-world", 42)
        .await
        .expect("get build");

    mock.assert_async().await;
    assert_eq!(build.number, 42);
    assert_eq!(build.status, "running");
}

#[tokio::test]
async fn restart_posts_to_the_source_build() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/repos/go-vela/hello-world/builds/41")
        .match_header("authorization", bearer().as_str())
        .with_status(201)
        .with_body(r#"{"number":43,"branch":"main","event":"push","status":"pending"}"#)
        .expect(1)
        .create_async()
        .await;

    let created = client_for(&server)
        .restart_build("go-vela", "hello-world", 41)
        .await
        .expect("restart build");

    mock.assert_async().await;
    assert_eq!(created.number, 43);
    assert_eq!(created.status, "pending");
}

#[tokio::test]
async fn non_success_reply_becomes_status_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/repos/go-vela/hello-world/builds/9")
        .with_status(404)
        .with_body("build not found")
        .create_async()
        .await;

    let err = client_for(&server)
        .get_build("go-vela", "hello-world", 9)
        .await
        .unwrap_err();

    mock.assert_async().await;
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "build not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreadable_body_becomes_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/repos/go-vela/hello-world/builds/41")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client_for(&server)
        .restart_build("go-vela", "hello-world", 41)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn orchestrator_restarts_through_the_http_client() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", BUILDS_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("branch".into(), "main".into()),
            Matcher::UrlEncoded("event".into(), "push".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"[{"number":12,"branch":"main","event":"push","status":"running"},
                {"number":11,"branch":"main","event":"push","status":"success"}]"#,
        )
        .create_async()
        .await;
    let restart = server
        .mock("POST", "/api/v1/repos/go-vela/hello-world/builds/11")
        .with_status(200)
        .with_body(r#"{"number":13,"branch":"main","event":"push","status":"pending"}"#)
        .expect(1)
        .create_async()
        .await;

    let settings = BuildConfig::default().validate().expect("settings");
    let targets = parse_targets(&["go-vela/hello-world"], "main").unwrap();
    let triggers = Orchestrator::new(Arc::new(client_for(&server)), &settings)
        .run(&targets)
        .await
        .expect("run succeeds");

    list.assert_async().await;
    restart.assert_async().await;
    assert_eq!(triggers.get(&targets[0]), Some(13));
}
