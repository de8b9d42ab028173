use serde::{Deserialize, Serialize};

/// Railway station reference entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    /// Telecode used by the left-ticket endpoint, e.g. `BJP`
    pub code: String,
}

impl Station {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}
