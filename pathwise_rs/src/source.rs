//! Command senders.

use std::collections::HashSet;

/// Whoever issued the command. Used for permission-filtered completion and
/// passed through to parsers and default providers.
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    fn has_permission(&self, permission: &str) -> bool;
}

/// Operator console; holds every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSource;

impl Source for ConsoleSource {
    fn name(&self) -> &str {
        "console"
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}

/// A named source with an explicit grant set.
///
/// `*` grants everything; `node.*` grants `node` and anything under it.
#[derive(Debug, Clone, Default)]
pub struct PermissionedSource {
    name: String,
    granted: HashSet<String>,
}

impl PermissionedSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            granted: HashSet::new(),
        }
    }

    pub fn grant(mut self, permission: impl Into<String>) -> Self {
        self.granted.insert(permission.into());
        self
    }
}

impl Source for PermissionedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        if self.granted.contains("*") || self.granted.contains(permission) {
            return true;
        }
        self.granted.iter().any(|grant| {
            grant.strip_suffix(".*").is_some_and(|prefix| {
                permission == prefix
                    || permission
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
        })
    }
}

/// True when `permission` is unset or held by `source`.
pub(crate) fn permits(source: &dyn Source, permission: Option<&str>) -> bool {
    permission.is_none_or(|p| source.has_permission(p))
}
