//! Screen registration.
//!
//! Cache namespaces used to be string literals chosen by convention; nothing
//! stopped two screens from colliding on one key. The registry makes
//! uniqueness a checked property instead of a habit.

use std::collections::HashMap;
use tracing::debug;
use viewflow_protocol::{ScreenSpec, SpecError};

/// Validated set of screen specs, unique by namespace.
#[derive(Debug, Default)]
pub struct ScreenRegistry {
    screens: HashMap<String, ScreenSpec>,
}

impl ScreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a screen. Duplicate namespaces are rejected.
    pub fn register(&mut self, spec: ScreenSpec) -> Result<(), SpecError> {
        spec.validate()?;
        if self.screens.contains_key(&spec.namespace) {
            return Err(SpecError::DuplicateNamespace(spec.namespace));
        }
        debug!(namespace = %spec.namespace, fields = spec.fields.len(), "registered screen");
        self.screens.insert(spec.namespace.clone(), spec);
        Ok(())
    }

    pub fn get(&self, namespace: &str) -> Option<&ScreenSpec> {
        self.screens.get(namespace)
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScreenSpec> {
        self.screens.values()
    }
}
