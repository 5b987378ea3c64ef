use std::collections::BTreeMap;
use std::sync::Arc;

use super::{
    BooleanType, ChoiceType, DecimalType, DurationType, IntegerType, SharedType, StringType,
};
use crate::error::RegistrationError;

/// Name → type map handed to builders that describe arguments by type name.
///
/// Starts with the built-ins and their common aliases; front-ends add their
/// own types (choices, records) before building commands.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<String, SharedType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let word: SharedType = Arc::new(StringType::word());
        let text: SharedType = Arc::new(StringType::greedy());
        let integer: SharedType = Arc::new(IntegerType);
        let decimal: SharedType = Arc::new(DecimalType);
        registry.register_as(["string", "word"], word);
        registry.register_as(["text", "greedy"], text);
        registry.register_as(["integer", "int"], integer);
        registry.register_as(["decimal", "double", "float"], decimal);
        registry.register_as(["boolean", "bool"], Arc::new(BooleanType::with_variants()));
        registry.register("duration", Arc::new(DurationType));
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    /// Register or replace a type under `name` (stored lower-cased).
    pub fn register(&mut self, name: impl Into<String>, ty: SharedType) {
        self.types.insert(name.into().to_lowercase(), ty);
    }

    fn register_as<const N: usize>(&mut self, names: [&str; N], ty: SharedType) {
        for name in names {
            self.register(name, ty.clone());
        }
    }

    /// Register a [`ChoiceType`] named `name`.
    pub fn choice<I, S>(&mut self, name: &str, choices: I) -> SharedType
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ty: SharedType = Arc::new(ChoiceType::new(name, choices));
        self.register(name, ty.clone());
        ty
    }

    pub fn get(&self, name: &str) -> Option<SharedType> {
        self.types.get(&name.to_lowercase()).cloned()
    }

    pub fn resolve(&self, name: &str) -> Result<SharedType, RegistrationError> {
        self.get(name)
            .ok_or_else(|| RegistrationError::UnknownType(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_and_aliases() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.resolve("INT").unwrap().name(), "integer");
        assert_eq!(registry.resolve("greedy").unwrap().name(), "text");
        assert!(registry.resolve("text").unwrap().is_greedy());
        assert_eq!(
            registry.resolve("player").unwrap_err(),
            RegistrationError::UnknownType("player".into())
        );
    }

    #[test]
    fn test_choice_registration() {
        let mut registry = TypeRegistry::new();
        let mode = registry.choice("gamemode", ["survival", "creative"]);
        assert!(mode.matches_input("Survival"));
        assert!(registry.names().any(|n| n == "gamemode"));
    }
}
