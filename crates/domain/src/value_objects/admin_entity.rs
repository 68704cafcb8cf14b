//! Administrative entity value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named administrative level (locality, municipality, region, ...)
/// together with the vendor identifier that came with it
///
/// The code is only ever the identifier found on the same response node as
/// the name. It is never derived from the name, so it stays `None` when the
/// vendor omitted it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminEntity {
    /// Vendor identifier (e.g. `"08019"`, `"ESP"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable name
    pub name: String,
}

impl AdminEntity {
    /// Create an entity with both code and name
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            name: name.into(),
        }
    }

    /// Create an entity for which the vendor sent no identifier
    #[must_use]
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            code: None,
            name: name.into(),
        }
    }

    /// Whether the identifier is present
    #[must_use]
    pub const fn has_code(&self) -> bool {
        self.code.is_some()
    }
}

impl fmt::Display for AdminEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
