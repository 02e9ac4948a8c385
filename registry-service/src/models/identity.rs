use serde::{Deserialize, Serialize};

use super::{Registrant, Role};

/// Authenticated caller, decoded from a session token on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Identity {
    pub fn is(&self, registrant_id: i64) -> bool {
        self.id == registrant_id
    }
}

impl From<&Registrant> for Identity {
    fn from(registrant: &Registrant) -> Self {
        Self {
            id: registrant.id,
            role: registrant.role,
            display_name: registrant.name.clone(),
        }
    }
}
