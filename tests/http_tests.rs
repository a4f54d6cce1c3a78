//! The admin served over HTTP through axum

mod admin_harness;

use admin_harness::*;
use axum::http::{StatusCode, header};
use axum_test::TestServer;
use serde_json::json;
use stark::core::TEMPLATE_HEADER;
use stark::prelude::*;

fn create_test_server(config: HandlerConfig<Host>) -> (TestServer, InMemorySource<Host>) {
    let hosts = InMemorySource::with_rows(host_rows()).expect("seed hosts");
    let mut site = StarkSite::new();
    site.register_handler(StarkHandler::new(hosts.clone(), config), None)
        .expect("register host handler");
    let app = site.router().expect("build router");
    let server = TestServer::try_new(app).expect("Failed to create test server");
    (server, hosts)
}

#[tokio::test]
async fn test_list_is_served_as_json() {
    let (server, _) = create_test_server(
        HandlerConfig::new()
            .list_display(["name"])
            .search_list(["name__contains"]),
    );

    let response = server.get("/stark/app/host/list/?q=web").await;
    response.assert_status_ok();
    assert_eq!(response.header(TEMPLATE_HEADER), "stark/change_list.html");

    let body: Value = response.json();
    assert_eq!(body["header_list"], json!(["Host name"]));
    assert_eq!(body["body_list"], json!([["web-3"], ["web-2"], ["web-1"]]));
}

#[tokio::test]
async fn test_add_form_post_redirects() {
    let (server, hosts) = create_test_server(HandlerConfig::new());

    let response = server
        .post("/stark/app/host/add/?_filter=q%3Dweb")
        .form(&[("name", "web-4"), ("ip", "10.0.0.6")])
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header(header::LOCATION), "/stark/app/host/list/?q=web");
    assert_eq!(hosts.len(), 6);
}

#[tokio::test]
async fn test_redirect_restores_non_ascii_list_state() {
    let (server, hosts) = create_test_server(HandlerConfig::new());

    let response = server
        .post("/stark/app/host/add/?_filter=q%3D%C3%A9t%C3%A9")
        .form(&[("name", "web-4"), ("ip", "10.0.0.6")])
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        response.header(header::LOCATION),
        "/stark/app/host/list/?q=%C3%A9t%C3%A9"
    );
    assert_eq!(hosts.len(), 6);
}

#[tokio::test]
async fn test_invalid_form_post_rerenders() {
    let (server, hosts) = create_test_server(HandlerConfig::new());

    let response = server
        .post("/stark/app/host/add/")
        .form(&[("name", "web-4")])
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(TEMPLATE_HEADER), "stark/change.html");
    let body: Value = response.json();
    assert_eq!(body["form"]["fields"][1]["errors"], json!(["This field is required."]));
    assert_eq!(hosts.len(), 5);
}

#[tokio::test]
async fn test_bulk_action_over_http() {
    let (server, hosts) = create_test_server(
        HandlerConfig::new()
            .list_display(["name"])
            .action_list([BulkAction::multi_delete()]),
    );

    let response = server
        .post("/stark/app/host/list/")
        .form(&[("action", "action_multi_delete"), ("pk", "2"), ("pk", "4")])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["body_list"], json!([["web-3"], ["web-2"], ["web-1"]]));
    assert_eq!(hosts.len(), 3);
}

#[tokio::test]
async fn test_missing_row_message() {
    let (server, _) = create_test_server(HandlerConfig::new());

    let response = server.get("/stark/app/host/change/42/").await;
    response.assert_status_ok();
    assert_eq!(
        response.text(),
        "The record to edit does not exist, please choose again."
    );
}

#[tokio::test]
async fn test_unknown_path_is_a_json_404() {
    let (server, _) = create_test_server(HandlerConfig::new());

    let response = server.get("/stark/app/router/list/").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "ROUTE_NOT_FOUND");

    let response = server.get("/stark/app/host/change/abc/").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_PRIMARY_KEY");
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let (server, hosts) = create_test_server(HandlerConfig::new());

    let response = server.put("/stark/app/host/delete/1/").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json();
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    assert_eq!(hosts.len(), 5);
}
