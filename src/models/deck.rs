use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A deck picked by the selector. The name only shows up in log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl DeckRef {
    pub fn new(id: &str, name: &str) -> Self {
        DeckRef {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

impl Display for DeckRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
