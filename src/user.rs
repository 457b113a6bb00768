use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Faculty,
    Student,
}

impl Role {
    /// Staff roles are the only ones permitted to modify rosters.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Faculty)
    }
}

#[derive(Debug, Deserialize)]
pub struct Credential {
    pub password: String,
    pub role: Role,
}

/// Read-only credential store, loaded once at startup.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Users(HashMap<String, Credential>);

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Users {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(LoadError::Io)?;

        serde_json::from_str(&contents).map_err(LoadError::Parse)
    }

    /// Passwords are compared as given - hashing is out of scope here.
    pub fn verify(&self, username: &str, password: &str) -> Option<Role> {
        let cred = self.0.get(username)?;

        (cred.password == password).then_some(cred.role)
    }
}
