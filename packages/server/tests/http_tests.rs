use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use oaipmh_provider::{MemoryRecordSource, MemoryTokenStore, Record, Repository, RepositoryConfig};
use oaipmh_server::handlers::XML_CONTENT_TYPE;
use oaipmh_server::{router, AppState};

async fn app() -> Router {
    let source = Arc::new(MemoryRecordSource::new());
    for id in 1..=3 {
        let created = Utc.with_ymd_and_hms(2024, 5, id as u32, 8, 0, 0).unwrap();
        source
            .insert(Record::new(id, created).with_value("dcterms:title", format!("Item {id}")))
            .await;
    }
    let config = RepositoryConfig::new("http://localhost/oai").with_namespace("example.org");
    let repository = Repository::from_config(config, source, Arc::new(MemoryTokenStore::new()))
        .await
        .unwrap();
    router(AppState::new(repository))
}

async fn send(request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app().await.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn error_codes(xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name("error"))
        .filter_map(|n| n.attribute("code"))
        .map(str::to_string)
        .collect()
}

fn identifiers(xml: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name("header"))
        .filter_map(|h| h.children().find(|c| c.has_tag_name("identifier")))
        .filter_map(|n| n.text())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_get_identify() {
    let request = Request::get("/oai?verb=Identify").body(Body::empty()).unwrap();
    let (status, content_type, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(XML_CONTENT_TYPE));
    assert!(error_codes(&body).is_empty());
    assert!(body.contains("<repositoryIdentifier>example.org</repositoryIdentifier>"));
}

#[tokio::test]
async fn test_post_list_identifiers() {
    let request = Request::post("/oai")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("verb=ListIdentifiers&metadataPrefix=oai_dc"))
        .unwrap();
    let (status, _, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        identifiers(&body),
        vec![
            "oai:example.org:1",
            "oai:example.org:2",
            "oai:example.org:3"
        ]
    );
}

#[tokio::test]
async fn test_protocol_errors_are_200() {
    let request = Request::get("/oai?verb=GetRecord&identifier=oai:example.org:99&metadataPrefix=oai_dc")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(error_codes(&body), vec!["idDoesNotExist"]);
}

#[tokio::test]
async fn test_other_method_reports_bad_argument() {
    let request = Request::put("/oai?verb=Identify").body(Body::empty()).unwrap();
    let (status, content_type, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(XML_CONTENT_TYPE));
    assert_eq!(error_codes(&body), vec!["badArgument"]);
}

#[tokio::test]
async fn test_health_without_database() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
