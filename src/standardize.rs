//! Field standardization.
//!
//! Documents of the same entity type sometimes carry the same information
//! under different field names. A [`Standardizer`] fills a canonical field from
//! its known aliases after documents are read. Rules are configuration: the
//! read path only ever sees the trait.

use std::collections::HashMap;

use serde_json::{Map, Value};

// == Standardizer ==
/// Pure, deterministic document transform keyed by entity type.
pub trait Standardizer: Send + Sync {
    fn standardize(&self, entity_type: &str, doc: Map<String, Value>) -> Map<String, Value>;

    /// Applies [`standardize`](Self::standardize) to every JSON object in
    /// `value`, which may be a single object or an array of them.
    fn standardize_value(&self, entity_type: &str, value: Value) -> Value {
        match value {
            Value::Object(doc) => Value::Object(self.standardize(entity_type, doc)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.standardize_value(entity_type, item))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Entity type of a collection: its singular form.
///
/// `caseStudies` → `caseStudy`, `services` → `service`, `news` stays `news`.
pub fn entity_type(collection: &str) -> String {
    if let Some(stem) = collection.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if collection.ends_with("ss") || collection.ends_with("us") || collection.ends_with("news") {
        return collection.to_string();
    }
    collection
        .strip_suffix('s')
        .filter(|stem| !stem.is_empty())
        .unwrap_or(collection)
        .to_string()
}

// == Rules ==
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fallback {
    target: String,
    sources: Vec<String>,
}

/// Table of field fallbacks per entity type.
///
/// A fallback fills `target` from the first alias holding a usable value,
/// only when `target` is missing, `null` or an empty string. Aliases are
/// left in place.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    rules: HashMap<String, Vec<Fallback>>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback<I, S>(mut self, entity_type: &str, target: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .entry(entity_type.to_string())
            .or_default()
            .push(Fallback {
                target: target.to_string(),
                sources: sources.into_iter().map(Into::into).collect(),
            });
        self
    }

    /// Rules used by content sites built on this layer: case studies,
    /// solutions and services.
    pub fn content_defaults() -> Self {
        Self::new()
            .fallback("caseStudy", "problemStatement", ["challenge", "problem"])
            .fallback("caseStudy", "solution", ["approach"])
            .fallback("caseStudy", "outcome", ["results", "impact"])
            .fallback("solution", "description", ["summary", "overview"])
            .fallback("service", "description", ["summary", "details"])
            .fallback("service", "title", ["name"])
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Standardizer for FieldRules {
    fn standardize(&self, entity_type: &str, mut doc: Map<String, Value>) -> Map<String, Value> {
        let Some(fallbacks) = self.rules.get(entity_type) else {
            return doc;
        };

        for fallback in fallbacks {
            if doc.get(&fallback.target).is_some_and(is_present) {
                continue;
            }
            let replacement = fallback
                .sources
                .iter()
                .find_map(|source| doc.get(source).filter(|v| is_present(v)).cloned());
            if let Some(value) = replacement {
                doc.insert(fallback.target.clone(), value);
            }
        }
        doc
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
