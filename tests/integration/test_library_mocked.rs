//! Library folder management against a mocked RIS backend

mod common;

use std::sync::Arc;

use common::create_mock_backend;
use pubmed_import_rs::{ImportError, LibraryManager};
use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn library_body() -> serde_json::Value {
    json!({
        "success": true,
        "folders": [
            {"id": "f1", "name": "Oncology", "parent": null, "expanded": true},
            {"id": "f2", "name": "Trials", "parent": "f1", "expanded": false},
            {"id": "f3", "name": "Phase III", "parent": "f2", "expanded": false},
            {"id": "f4", "name": "Cardiology", "parent": null, "expanded": false}
        ],
        "folderPublications": {"f1": ["p1"], "f3": ["p2", "p3"]}
    })
}

async fn loaded_manager(server: &MockServer) -> LibraryManager<pubmed_import_rs::RestBackend> {
    Mock::given(method("GET"))
        .and(path("/library"))
        .respond_with(ResponseTemplate::new(200).set_body_json(library_body()))
        .mount(server)
        .await;

    let mut manager = LibraryManager::new(Arc::new(create_mock_backend(server)));
    manager.load().await.expect("library should load");
    manager
}

#[tokio::test]
#[traced_test]
async fn test_load_builds_tree() {
    let server = MockServer::start().await;
    let manager = loaded_manager(&server).await;

    let tree = manager.tree();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.ancestors("f3"), vec!["f2", "f1"]);
    assert_eq!(tree.publications_in("f3"), vec!["p2", "p3"]);

    let names: Vec<String> = tree.visible_rows().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Cardiology", "Oncology", "Trials"]);
}

#[tokio::test]
#[traced_test]
async fn test_cycle_is_rejected_without_request() {
    let server = MockServer::start().await;
    let mut manager = loaded_manager(&server).await;

    let result = manager.move_folder("f1", Some("f3")).await;
    assert!(matches!(result, Err(ImportError::FolderCycleViolation { .. })));

    let writes = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() != "GET")
        .count();
    assert_eq!(writes, 0);
}

#[tokio::test]
#[traced_test]
async fn test_move_folder_round_trips() {
    let server = MockServer::start().await;
    let mut manager = loaded_manager(&server).await;

    Mock::given(method("PUT"))
        .and(path("/library"))
        .and(body_partial_json(json!({"action": "move", "folderId": "f2", "newParentId": "f4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    manager.move_folder("f2", Some("f4")).await.unwrap();
    assert_eq!(manager.tree().ancestors("f3"), vec!["f2", "f4"]);
}

#[tokio::test]
#[traced_test]
async fn test_create_folder_inherits_expanded() {
    let server = MockServer::start().await;
    let mut manager = loaded_manager(&server).await;

    Mock::given(method("POST"))
        .and(path("/library"))
        .and(body_partial_json(json!({"action": "createFolder", "name": "Reviews", "parentId": "f1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "folder": {"id": "f9", "name": "Reviews", "parent": "f1"}
        })))
        .mount(&server)
        .await;

    let folder = manager.create_folder("  Reviews ", Some("f1")).await.unwrap();
    assert_eq!(folder.id, "f9");
    assert!(folder.expanded);
    assert_eq!(manager.tree().children("f1").len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_delete_cascades_after_server_accepts() {
    let server = MockServer::start().await;
    let mut manager = loaded_manager(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/library"))
        .and(query_param("folderId", "f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let removed = manager.delete_folder("f1").await.unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(manager.tree().len(), 1);
    assert!(manager.tree().folders_containing("p2").is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_rejected_rename_leaves_tree() {
    let server = MockServer::start().await;
    let mut manager = loaded_manager(&server).await;

    Mock::given(method("PUT"))
        .and(path("/library"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"success": false, "error": "forbidden"})))
        .mount(&server)
        .await;

    let result = manager.rename("f4", "Heart").await;
    assert!(matches!(result, Err(ImportError::BackendError { status: 403, .. })));
    assert_eq!(manager.tree().get("f4").unwrap().name, "Cardiology");
}

#[tokio::test]
#[traced_test]
async fn test_move_publication_guards_duplicates() {
    let server = MockServer::start().await;
    let mut manager = loaded_manager(&server).await;

    assert!(!manager.can_move_publication("p2", "f3", "f3"));
    assert!(!manager.can_move_publication("p9", "f3", "f1"));

    Mock::given(method("POST"))
        .and(path("/library"))
        .and(body_partial_json(json!({
            "action": "movePublication",
            "publicationId": "p2",
            "fromFolderId": "f3",
            "toFolderId": "f1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    manager.move_publication("p2", "f3", "f1").await.unwrap();
    assert_eq!(manager.tree().publications_in("f1"), vec!["p1", "p2"]);
    assert_eq!(manager.tree().publications_in("f3"), vec!["p3"]);

    let result = manager.add_publication("f1", "p2").await;
    assert!(matches!(result, Err(ImportError::AlreadyFiled { .. })));
}
