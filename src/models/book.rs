//! Book record model, edit form and the in-memory collection

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::validation::FieldErrors;

/// A book as stored by the API. The server owns every field; `id` never
/// changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    /// Absolute URL or server-relative media path
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BookRecord {
    /// Case-insensitive substring match on title or author.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .author
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(needle))
    }

    /// Cover image location, with relative media paths joined onto `media_base`
    pub fn image_url(&self, media_base: Option<&str>) -> Option<String> {
        let image = self.image.as_deref().filter(|i| !i.is_empty())?;
        if Url::parse(image).is_ok() {
            return Some(image.to_string());
        }
        match media_base.and_then(|base| Url::parse(base).ok()) {
            Some(base) => base.join(image).ok().map(String::from),
            None => Some(image.to_string()),
        }
    }
}

/// Cover image file attached to a create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cover".to_string());
        let mime = mime_for(path).to_string();
        Ok(Self { file_name, mime, bytes })
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Book form contents, submitted to the create and replace endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}

impl BookDraft {
    /// Pre-fill the form from an existing record (no new image)
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.clone().unwrap_or_default(),
            genre: record.genre.clone(),
            release_year: record.release_year,
            description: record.description.clone(),
            image: None,
        }
    }

    /// Trim text fields; blank optional fields become `None`
    pub fn normalized(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: optional(self.genre),
            release_year: self.release_year,
            description: optional(self.description),
            image: self.image,
        }
    }

    /// A new book needs title, author and release year
    pub fn validate_for_create(&self) -> Result<(), FieldErrors> {
        let mut errors = self.required_text();
        if self.release_year.is_none() {
            errors.add("release_year", "This field is required.");
        }
        errors.into_result()
    }

    /// An edit needs title and author
    pub fn validate_for_update(&self) -> Result<(), FieldErrors> {
        self.required_text().into_result()
    }

    fn required_text(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "This field is required.");
        }
        if self.author.trim().is_empty() {
            errors.add("author", "This field is required.");
        }
        errors
    }
}

/// Books in server order, at most one entry per id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookCollection {
    books: Vec<BookRecord>,
}

impl BookCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection. Later duplicates of an id are dropped.
    pub fn replace_all(&mut self, books: Vec<BookRecord>) {
        let mut seen = std::collections::HashSet::with_capacity(books.len());
        self.books = books
            .into_iter()
            .filter(|b| {
                let fresh = seen.insert(b.id);
                if !fresh {
                    tracing::warn!("Dropping duplicate book id={} from server listing", b.id);
                }
                fresh
            })
            .collect();
    }

    /// Swap in the record with the same id. Returns false if it is not held.
    pub fn replace(&mut self, record: BookRecord) -> bool {
        match self.books.iter_mut().find(|b| b.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> Option<BookRecord> {
        let pos = self.books.iter().position(|b| b.id == id)?;
        Some(self.books.remove(pos))
    }

    pub fn get(&self, id: i64) -> Option<&BookRecord> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// Records whose title or author contains `term`, ignoring case.
    /// An empty term matches everything.
    pub fn filter(&self, term: &str) -> Vec<&BookRecord> {
        let needle = term.to_lowercase();
        self.books.iter().filter(|b| b.matches(&needle)).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BookRecord> {
        self.books.iter()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl<'a> IntoIterator for &'a BookCollection {
    type Item = &'a BookRecord;
    type IntoIter = std::slice::Iter<'a, BookRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
