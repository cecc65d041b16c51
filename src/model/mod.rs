//! Records the scheduler reads from and writes back to storage

mod article;
mod hub;
mod status;

pub use article::{ArticleFields, ArticleRecord, AuthorLink, LogEntry, PendingArticle};
pub use hub::Hub;
pub use status::ParseStatus;
