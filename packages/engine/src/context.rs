//! Variable context for template resolution
//!
//! The form layer hands the engine a flat key → value map. Lookups never
//! fail: a missing key behaves like an empty string.
//!
//! # Loop Scope
//!
//! Inside `{{#each}}` bodies the resolver pushes a [`LoopFrame`] so that
//! `{{this}}` and `{{@index}}` refer to the current element. Frames shadow
//! only those two names; every other name still resolves against the
//! document context.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{check_input_size, Result};
use crate::types::Value;

/// Key → value map supplied by the form layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableContext {
    values: HashMap<String, Value>,
}

impl VariableContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Text for `{{name}}`; empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(Value::to_text).unwrap_or_default()
    }

    /// Truthiness for `{{#if name}}`; absent is falsy.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name).is_some_and(Value::is_truthy)
    }

    /// Elements for `{{#each name}}`; non-lists yield nothing.
    pub fn list(&self, name: &str) -> &[String] {
        self.get(name).and_then(Value::as_list).unwrap_or(&[])
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the context holds no variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a context from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        check_input_size(json, "Context")?;
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a context from a YAML mapping.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        check_input_size(yaml, "Context")?;
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a context file; `.json` files are read as JSON, everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }
}

impl<'de> Deserialize<'de> for VariableContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // `null` fields are treated as absent rather than as a value
        let raw: HashMap<String, Option<Value>> = HashMap::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        Ok(Self { values })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VariableContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

/// Current element of an `{{#each}}` expansion.
#[derive(Debug, Clone, Copy)]
pub struct LoopFrame<'a> {
    /// The element value (`{{this}}`)
    pub item: &'a str,
    /// 1-based position (`{{@index}}`)
    pub index: usize,
}

/// Name lookup used while rendering: loop frame first, then the context.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    context: &'a VariableContext,
    frame: Option<LoopFrame<'a>>,
}

impl<'a> Scope<'a> {
    /// Create a top-level scope.
    pub fn new(context: &'a VariableContext) -> Self {
        Self {
            context,
            frame: None,
        }
    }

    /// Create a child scope for one loop element.
    pub fn with_frame(&self, item: &'a str, index: usize) -> Self {
        Self {
            context: self.context,
            frame: Some(LoopFrame { item, index }),
        }
    }

    /// The document context behind this scope.
    pub fn context(&self) -> &'a VariableContext {
        self.context
    }

    /// Resolve a name to text. Returns `None` for loop names outside a loop.
    pub fn text(&self, name: &str) -> Option<String> {
        match (name, self.frame) {
            ("this", Some(frame)) => Some(frame.item.to_string()),
            ("@index", Some(frame)) => Some(frame.index.to_string()),
            ("this" | "@index", None) => None,
            _ => Some(self.context.text(name)),
        }
    }

    /// Truthiness of a name in this scope.
    pub fn is_truthy(&self, name: &str) -> bool {
        match (name, self.frame) {
            ("this", Some(frame)) => !frame.item.is_empty(),
            ("@index", Some(_)) => true,
            _ => self.context.is_truthy(name),
        }
    }
}
