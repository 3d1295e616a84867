//! End-to-end tests of the session and collection services against an
//! in-process mock of the REST API

mod mock_server;

use serde_json::{json, Value};
use std::sync::Arc;

use book_inventory_admin::{
    api::ApiClient,
    config::ApiConfig,
    error::StoreError,
    models::{BookDraft, ImageUpload},
    services::{
        navigation::Route,
        token_store::{FileTokenStore, TokenStore},
        Services,
    },
};
use mock_server::{Backend, MockApi, VALID_TOKEN};

fn catalog() -> Vec<Value> {
    vec![
        json!({"id": 3, "title": "The Hobbit", "author": "J.R.R. Tolkien", "genre": "Fantasy",
               "release_year": 1937, "description": "", "image": null}),
        json!({"id": 5, "title": "Dune", "author": "Frank Herbert", "genre": null,
               "release_year": 1965, "description": "Desert planet", "image": "/media/book_images/dune.jpg"}),
        json!({"id": 7, "title": "Emma", "author": "Jane Austen", "genre": "Romance",
               "release_year": 1815, "description": "", "image": null}),
    ]
}

/// Services wired to `base_url` with the token file under `dir`
fn services_for(base_url: &str, dir: &tempfile::TempDir, keep_token_on_network_error: bool) -> (Services, Arc<FileTokenStore>) {
    let client = Arc::new(
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
        .expect("Failed to build API client"),
    );
    let tokens = Arc::new(FileTokenStore::new(dir.path().join("session.json")));
    let services = Services::with_parts(client.clone(), client, tokens.clone(), keep_token_on_network_error);
    (services, tokens)
}

/// Token storage that can never be written, like a read-only config dir
struct ReadOnlyStore;

impl TokenStore for ReadOnlyStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn save(&self, _token: &str) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "/read-only/session.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

async fn signed_in(api: &MockApi, dir: &tempfile::TempDir) -> Services {
    let (services, tokens) = services_for(&api.base_url, dir, false);
    tokens.save(VALID_TOKEN).unwrap();
    let session = services.session.initialize().await;
    assert!(session.is_authenticated());
    services
}

#[tokio::test]
async fn test_login_persists_issued_token() {
    let api = mock_server::spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let (services, tokens) = services_for(&api.base_url, &dir, false);

    let session = services.session.initialize().await;
    assert_eq!(session.user, None);
    assert!(!session.loading);

    services.session.login("admin", "admin").await;

    let session = services.session.snapshot();
    assert_eq!(session.error, None);
    assert_eq!(session.user.map(|u| u.username).as_deref(), Some("admin"));
    assert_eq!(tokens.load().unwrap().as_deref(), Some(VALID_TOKEN));
    assert_eq!(services.navigation.take(), Some(Route::Books));
}

#[tokio::test]
async fn test_book_requests_use_session_token_when_it_cannot_be_stored() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let client = Arc::new(
        ApiClient::new(&ApiConfig {
            base_url: api.base_url.clone(),
            ..ApiConfig::default()
        })
        .unwrap(),
    );
    let services = Services::with_parts(client.clone(), client, Arc::new(ReadOnlyStore), false);
    services.session.initialize().await;

    services.session.login("admin", "admin").await;
    assert_eq!(services.session.token().as_deref(), Some(VALID_TOKEN));

    services.books.fetch_all().await.unwrap();
    services.books.delete(5).await.unwrap();

    let requests = api.requests();
    assert!(requests.contains(&format!("GET /books/ Bearer {}", VALID_TOKEN)));
    assert!(requests.contains(&format!("DELETE /books/5/ Bearer {}", VALID_TOKEN)));
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let api = mock_server::spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let (services, tokens) = services_for(&api.base_url, &dir, false);
    services.session.initialize().await;

    services.session.login("a", "wrong").await;

    let session = services.session.snapshot();
    assert_eq!(session.error.as_deref(), Some("bad credentials"));
    assert_eq!(session.user, None);
    assert_eq!(tokens.load().unwrap(), None);
    assert_eq!(services.navigation.take(), None);
}

#[tokio::test]
async fn test_initialize_restores_valid_session() {
    let api = mock_server::spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;

    assert_eq!(services.session.token().as_deref(), Some(VALID_TOKEN));
    assert_eq!(api.requests(), vec![format!("GET /me/ Bearer {}", VALID_TOKEN)]);
}

#[tokio::test]
async fn test_initialize_discards_rejected_token() {
    let api = mock_server::spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let (services, tokens) = services_for(&api.base_url, &dir, false);
    tokens.save("expired-token").unwrap();

    let session = services.session.initialize().await;
    assert_eq!(session.user, None);
    assert!(!session.loading);
    assert_eq!(tokens.load().unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_api_signs_out_by_default() {
    let base_url = mock_server::unreachable_url().await;
    let dir = tempfile::tempdir().unwrap();
    let (services, tokens) = services_for(&base_url, &dir, false);
    tokens.save(VALID_TOKEN).unwrap();

    let session = services.session.initialize().await;
    assert_eq!(session.user, None);
    assert!(!session.loading);
    assert_eq!(tokens.load().unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_api_can_keep_token() {
    let base_url = mock_server::unreachable_url().await;
    let dir = tempfile::tempdir().unwrap();
    let (services, tokens) = services_for(&base_url, &dir, true);
    tokens.save(VALID_TOKEN).unwrap();

    let session = services.session.initialize().await;
    assert_eq!(session.user, None);
    assert!(!session.loading);
    assert_eq!(tokens.load().unwrap().as_deref(), Some(VALID_TOKEN));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let api = mock_server::spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let (services, _) = services_for(&api.base_url, &dir, false);

    services.session.register("admin", "secret").await;
    assert_eq!(
        services.session.snapshot().error.as_deref(),
        Some("username: A user with that username already exists.")
    );

    services.session.register("librarian", "secret").await;
    assert!(services.session.is_authenticated());
    assert_eq!(services.navigation.take(), Some(Route::Books));
}

#[tokio::test]
async fn test_logout_clears_stored_token() {
    let api = mock_server::spawn(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;

    services.session.logout();
    services.session.logout();

    assert!(!services.session.is_authenticated());
    assert!(!dir.path().join("session.json").exists());
    assert_eq!(services.navigation.take(), Some(Route::Login));
}

#[tokio::test]
async fn test_fetch_and_filter() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;

    services.books.fetch_all().await.unwrap();

    let state = services.books.state();
    assert_eq!(state.books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 5, 7]);
    assert_eq!(state.books.get(5).unwrap().image.as_deref(), Some("/media/book_images/dune.jpg"));

    let hits = services.books.filter("tolkien");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 3);
    assert!(api.requests().contains(&format!("GET /books/ Bearer {}", VALID_TOKEN)));
}

#[tokio::test]
async fn test_create_reports_field_errors() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;

    let err = services
        .books
        .create(BookDraft {
            title: "X".to_string(),
            author: "Anon".to_string(),
            release_year: Some(2001),
            ..BookDraft::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation-failed");
    assert!(err.to_string().contains("title: too short"));
    assert_eq!(api.book_ids(), vec![3, 5, 7]);
}

#[tokio::test]
async fn test_create_uploads_multipart_with_image() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;

    let cover = dir.path().join("persuasion.png");
    std::fs::write(&cover, [0x89, b'P', b'N', b'G']).unwrap();

    let record = services
        .books
        .create(BookDraft {
            title: " Persuasion ".to_string(),
            author: "Jane Austen".to_string(),
            genre: Some("Romance".to_string()),
            release_year: Some(1817),
            description: None,
            image: Some(ImageUpload::from_path(&cover).await.unwrap()),
        })
        .await
        .unwrap();

    assert_eq!(record.id, 8);
    assert_eq!(record.image.as_deref(), Some("/media/book_images/persuasion.png"));
    assert!(record.created_at.is_some());

    let form = api.backend.lock().unwrap().last_form.clone();
    assert_eq!(form.get("title").map(String::as_str), Some("Persuasion"));
    assert_eq!(form.get("release_year").map(String::as_str), Some("1817"));
    assert_eq!(form.get("description").map(String::as_str), Some(""));
    assert_eq!(form.get("image_size").map(String::as_str), Some("4"));

    // Not inserted locally until the listing is fetched again
    assert!(!services.books.state().books.contains(8));
    services.books.fetch_all().await.unwrap();
    assert!(services.books.state().books.contains(8));
}

#[tokio::test]
async fn test_update_adopts_server_record() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;
    services.books.fetch_all().await.unwrap();

    let current = services.books.state().books.get(3).cloned().unwrap();
    let mut draft = BookDraft::from_record(&current);
    draft.title = "The Hobbit, or There and Back Again".to_string();
    draft.genre = None;

    let updated = services.books.update(3, draft).await.unwrap();

    let state = services.books.state();
    let local = state.books.get(3).unwrap();
    assert_eq!(local, &updated);
    assert_eq!(local.title, "The Hobbit, or There and Back Again");
    assert_eq!(local.genre, None);
    assert_eq!(local.release_year, Some(1937));
    assert_eq!(
        local.updated_at.map(|t| t.to_rfc3339()),
        Some("2024-06-01T12:30:00+00:00".to_string())
    );
    assert_eq!(state.notice.as_deref(), Some("Book updated successfully!"));
}

#[tokio::test]
async fn test_update_of_missing_book_resyncs() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;
    services.books.fetch_all().await.unwrap();

    // Someone else removed it server-side
    api.backend.lock().unwrap().books.retain(|b| b["id"] != 7);

    let draft = BookDraft::from_record(services.books.state().books.get(7).unwrap());
    let err = services.books.update(7, draft).await.unwrap_err();

    assert_eq!(err.kind(), "update-failed");
    assert!(!services.books.state().books.contains(7));
}

#[tokio::test]
async fn test_delete_removes_on_server() {
    let api = mock_server::spawn(Backend::with_books(catalog())).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;
    services.books.fetch_all().await.unwrap();

    services.books.delete(5).await.unwrap();

    assert_eq!(api.book_ids(), vec![3, 7]);
    assert!(!services.books.state().books.contains(5));
    assert!(api
        .requests()
        .contains(&format!("DELETE /books/5/ Bearer {}", VALID_TOKEN)));
}

#[tokio::test]
async fn test_failed_delete_is_rolled_back_by_refetch() {
    let mut backend = Backend::with_books(catalog());
    backend.fail_deletes = true;
    let api = mock_server::spawn(backend).await;
    let dir = tempfile::tempdir().unwrap();
    let services = signed_in(&api, &dir).await;
    services.books.fetch_all().await.unwrap();

    let err = services.books.delete(5).await.unwrap_err();

    assert_eq!(err.kind(), "delete-failed");
    let state = services.books.state();
    assert!(state.books.contains(5));
    assert_eq!(state.error.as_deref(), Some("Failed to delete book."));
}
