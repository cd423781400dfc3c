use crate::resource::ResourceError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigExprError {
    #[error("provided configuration has an unexpected shape at leaf: {0}")]
    MalformedProvided(String),

    #[error("version comparison failed: {0}")]
    Comparison(#[from] ResourceError),
}
