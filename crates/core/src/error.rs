/// Domain errors raised by the versioning rules.
///
/// Lookups that find nothing return `Option::None` rather than an error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}
