//! Root commands.

use crate::argument::Argument;
use crate::error::RegistrationError;
use crate::pathway::Pathway;
use crate::tree::{CommandTree, PathwayId};

/// A root command: label, aliases and the tree of its pathways.
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    permission: Option<String>,
    ignore_completion_permissions: bool,
    tree: CommandTree,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            permission: None,
            ignore_completion_permissions: false,
            pathways: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Name followed by aliases.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Completion lists every candidate regardless of the source's grants.
    pub fn ignores_completion_permissions(&self) -> bool {
        self.ignore_completion_permissions
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Add a pathway after construction. Leaves the command untouched on error.
    pub fn register_pathway(&mut self, pathway: Pathway) -> Result<PathwayId, RegistrationError> {
        self.tree.register_pathway(pathway)
    }

    pub fn usages(&self) -> Vec<String> {
        self.tree
            .pathways()
            .iter()
            .map(|p| p.format(&self.name))
            .collect()
    }
}

pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    permission: Option<String>,
    ignore_completion_permissions: bool,
    pathways: Vec<Pathway>,
}

impl CommandBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn ignore_completion_permissions(mut self) -> Self {
        self.ignore_completion_permissions = true;
        self
    }

    pub fn pathway(mut self, pathway: Pathway) -> Self {
        self.pathways.push(pathway);
        self
    }

    /// Build the tree, registering pathways in declaration order.
    pub fn build(self) -> Result<Command, RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName("command"));
        }
        let mut root = Argument::literal(self.name.clone());
        for alias in &self.aliases {
            root = root.alias(alias.clone());
        }
        if let Some(permission) = &self.permission {
            root = root.permission(permission.clone());
        }
        let mut tree = CommandTree::new(root);
        for pathway in self.pathways {
            tree.register_pathway(pathway)?;
        }
        Ok(Command {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            permission: self.permission,
            ignore_completion_permissions: self.ignore_completion_permissions,
            tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::StringType;

    #[test]
    fn test_builder_registers_pathways_in_order() {
        let command = Command::builder("msg")
            .alias("tell")
            .pathway(
                Pathway::builder()
                    .argument(Argument::value("player", Arc::new(StringType::word())))
                    .argument(Argument::value("text", Arc::new(StringType::greedy())))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(command.labels().collect::<Vec<_>>(), vec!["msg", "tell"]);
        assert_eq!(command.usages(), vec!["msg <player> <text...>"]);
    }

    #[test]
    fn test_failed_registration_keeps_command() {
        let mut command = Command::builder("ping")
            .pathway(Pathway::empty())
            .build()
            .unwrap();
        let before = command.tree().size();
        assert!(command.register_pathway(Pathway::empty()).is_err());
        assert_eq!(command.tree().size(), before);
        assert_eq!(command.usages(), vec!["ping"]);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Command::builder("  ").build().unwrap_err(),
            RegistrationError::EmptyName("command")
        );
    }
}
