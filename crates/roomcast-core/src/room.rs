//! Site-scoped room identifiers.
//!
//! A room is what the delivery server groups subscribers by. Every room is
//! prefixed with the site name so several sites can share one broker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A destination identifier on the delivery broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Room(String);

impl Room {
    /// Room for everyone watching a single document.
    pub fn doc(site: &str, doctype: &str, docname: &str) -> Self {
        Self(format!("{site}:doc:{doctype}/{docname}"))
    }

    /// Private room of one user.
    pub fn user(site: &str, user: &str) -> Self {
        Self(format!("{site}:user:{user}"))
    }

    /// Broadcast room for the whole site.
    pub fn site(site: &str) -> Self {
        Self(format!("{site}:all"))
    }

    /// Progress room of a background task.
    pub fn task_progress(site: &str, task_id: &str) -> Self {
        Self(format!("{site}:task_progress:{task_id}"))
    }

    /// Caller-named room.
    pub fn custom(site: &str, name: &str) -> Self {
        Self(format!("{site}:room:{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
