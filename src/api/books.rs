//! Book catalog endpoints

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::{error_from_response, read_json, with_bearer, ApiClient, BooksApi};
use crate::{
    error::ApiResult,
    models::{BookDraft, BookRecord},
};

/// Multipart body shared by create and replace.
///
/// Optional text fields go out as empty strings, the release year only when
/// set, and the image part only when a new file was picked.
fn book_form(draft: &BookDraft) -> ApiResult<Form> {
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("author", draft.author.clone())
        .text("genre", draft.genre.clone().unwrap_or_default())
        .text("description", draft.description.clone().unwrap_or_default());

    if let Some(year) = draft.release_year {
        form = form.text("release_year", year.to_string());
    }

    if let Some(image) = &draft.image {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)?;
        form = form.part("image", part);
    }

    Ok(form)
}

#[async_trait]
impl BooksApi for ApiClient {
    async fn list_books(&self, token: Option<&str>) -> ApiResult<Vec<BookRecord>> {
        tracing::debug!("GET books/");
        let response = with_bearer(self.http.get(self.url("books/")), token).send().await?;
        read_json(response).await
    }

    async fn create_book(&self, draft: &BookDraft, token: Option<&str>) -> ApiResult<BookRecord> {
        tracing::debug!("POST books/create/ title={:?}", draft.title);
        let request = self.http.post(self.url("books/create/")).multipart(book_form(draft)?);
        let response = with_bearer(request, token).send().await?;
        read_json(response).await
    }

    async fn update_book(&self, id: i64, draft: &BookDraft, token: Option<&str>) -> ApiResult<BookRecord> {
        tracing::debug!("PUT books/{}/", id);
        let request = self
            .http
            .put(self.url(&format!("books/{}/", id)))
            .multipart(book_form(draft)?);
        let response = with_bearer(request, token).send().await?;
        read_json(response).await
    }

    async fn delete_book(&self, id: i64, token: Option<&str>) -> ApiResult<()> {
        tracing::debug!("DELETE books/{}/", id);
        let request = self.http.delete(self.url(&format!("books/{}/", id)));
        let response = with_bearer(request, token).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}
