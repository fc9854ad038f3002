//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` for standalone calls or `&mut PgConnection` for steps
//! that must share a caller's transaction.

pub mod content_version_repo;
pub mod page_repo;
pub mod snippet_repo;

pub use content_version_repo::ContentVersionRepo;
pub use page_repo::PageRepo;
pub use snippet_repo::SnippetRepo;
