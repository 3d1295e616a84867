//! Data models for the book inventory admin client

pub mod book;
pub mod session;
pub mod user;
pub mod validation;

// Re-export commonly used types
pub use book::{BookCollection, BookDraft, BookRecord, ImageUpload};
pub use session::Session;
pub use user::{AuthResponse, Credentials, UserProfile};
pub use validation::FieldErrors;
