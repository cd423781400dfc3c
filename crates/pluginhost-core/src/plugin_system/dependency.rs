use std::fmt;

use serde::Serialize;

/// A declared dependency of one plugin spec on another, as read from the
/// `<dependency>` element of a spec file.
///
/// `version` is stored verbatim and displayed back to the user, but it is
/// never compared against the resolved dependency's actual version — a
/// dependency with an empty version and one with a mismatched version
/// resolve identically as long as a spec of that name exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDependency {
    pub name: String,
    pub version: String,
}

impl PluginDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
        }
    }
}

impl fmt::Display for PluginDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{} (any version)", self.name)
        } else {
            write!(f, "{} (version: {})", self.name, self.version)
        }
    }
}
