#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("version string '{0}' is not in dot-separated-numeric form")]
    MalformedVersion(String),

    #[error("a comparator is already registered for resource '{0}'")]
    AlreadyRegistered(String),
}
