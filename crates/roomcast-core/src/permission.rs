//! Document permission checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{RealtimeError, RealtimeResult};
use crate::session::ADMINISTRATOR;

/// Kind of access being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionType {
    Read,
    Write,
    Create,
    Delete,
}

impl FromStr for PermissionType {
    type Err = RealtimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(PermissionType::Read),
            "write" => Ok(PermissionType::Write),
            "create" => Ok(PermissionType::Create),
            "delete" => Ok(PermissionType::Delete),
            other => Err(RealtimeError::InvalidPermissionType(other.to_string())),
        }
    }
}

/// Answers "may `user` do `ptype` on this document?".
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn has_permission(
        &self,
        user: &str,
        doctype: &str,
        docname: &str,
        ptype: PermissionType,
    ) -> RealtimeResult<bool>;
}

/// Doctypes a user may access, per permission type. `"*"` matches any doctype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPermissions {
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub create: Vec<String>,
    pub delete: Vec<String>,
}

impl UserPermissions {
    fn doctypes(&self, ptype: PermissionType) -> &[String] {
        match ptype {
            PermissionType::Read => &self.read,
            PermissionType::Write => &self.write,
            PermissionType::Create => &self.create,
            PermissionType::Delete => &self.delete,
        }
    }

    pub fn allows(&self, doctype: &str, ptype: PermissionType) -> bool {
        self.doctypes(ptype)
            .iter()
            .any(|d| d == "*" || d == doctype)
    }
}

/// Permission table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    users: HashMap<String, UserPermissions>,
}

impl StaticPermissions {
    pub fn new(users: HashMap<String, UserPermissions>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissions {
    async fn has_permission(
        &self,
        user: &str,
        doctype: &str,
        _docname: &str,
        ptype: PermissionType,
    ) -> RealtimeResult<bool> {
        if user == ADMINISTRATOR {
            return Ok(true);
        }
        Ok(self
            .users
            .get(user)
            .map(|perms| perms.allows(doctype, ptype))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StaticPermissions {
        let mut users = HashMap::new();
        users.insert(
            "jane@example.com".to_string(),
            UserPermissions {
                read: vec!["ToDo".to_string(), "Note".to_string()],
                write: vec!["ToDo".to_string()],
                ..Default::default()
            },
        );
        users.insert(
            "auditor@example.com".to_string(),
            UserPermissions {
                read: vec!["*".to_string()],
                ..Default::default()
            },
        );
        StaticPermissions::new(users)
    }

    #[tokio::test]
    async fn test_listed_doctype_allowed() {
        let perms = table();
        assert!(perms
            .has_permission("jane@example.com", "Note", "n1", PermissionType::Read)
            .await
            .unwrap());
        assert!(!perms
            .has_permission("jane@example.com", "Note", "n1", PermissionType::Write)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_wildcard_and_unknown_users() {
        let perms = table();
        assert!(perms
            .has_permission("auditor@example.com", "Invoice", "INV-1", PermissionType::Read)
            .await
            .unwrap());
        assert!(!perms
            .has_permission("nobody@example.com", "ToDo", "t", PermissionType::Read)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_administrator_always_allowed() {
        let perms = StaticPermissions::default();
        assert!(perms
            .has_permission(ADMINISTRATOR, "Anything", "x", PermissionType::Delete)
            .await
            .unwrap());
    }

    #[test]
    fn test_permission_type_parsing() {
        assert_eq!("READ".parse::<PermissionType>().unwrap(), PermissionType::Read);
        assert!("share".parse::<PermissionType>().is_err());
    }
}
