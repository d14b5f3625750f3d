//! Vector feature model: attribute records, field schemas and
//! classification predicates.
//!
//! Attributes are stored positionally against a [`Fields`] schema so that
//! field names are resolved to indices once per pass instead of on every
//! feature.

use geo::Geometry;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Ordered field-name schema shared by all features of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    names: Vec<String>,
}

impl Fields {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of a field by name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Resolve a list of field names to positional indices.
    ///
    /// Fails with [`Error::FieldNotFound`] on the first unknown name.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|n| {
                self.lookup(n)
                    .ok_or_else(|| Error::FieldNotFound(n.clone()))
            })
            .collect()
    }
}

/// A road feature: stable id, positional attributes and an owned geometry.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: u64,
    pub attributes: Vec<AttributeValue>,
    pub geometry: Geometry<f64>,
}

impl Feature {
    pub fn new(id: u64, attributes: Vec<AttributeValue>, geometry: Geometry<f64>) -> Self {
        Self {
            id,
            attributes,
            geometry,
        }
    }

    pub fn attribute(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }
}

/// Grouping key: the attribute values at the given resolved indices.
///
/// Missing indices map to [`AttributeValue::Null`] so that features with
/// short attribute rows still group consistently.
pub fn attribute_key(attributes: &[AttributeValue], indices: &[usize]) -> Vec<AttributeValue> {
    indices
        .iter()
        .map(|&i| attributes.get(i).cloned().unwrap_or(AttributeValue::Null))
        .collect()
}

/// A classification predicate over a feature's attributes, prepared once
/// before a pass.
pub struct Predicate {
    f: Box<dyn Fn(&Feature) -> bool + Send + Sync>,
}

impl Predicate {
    /// Wrap an opaque callable.
    pub fn new(f: impl Fn(&Feature) -> bool + Send + Sync + 'static) -> Self {
        Self { f: Box::new(f) }
    }

    /// Predicate matching features whose `name` field equals `value`.
    ///
    /// The field index is resolved here, not per evaluation.
    pub fn field_equals(fields: &Fields, name: &str, value: AttributeValue) -> Result<Self> {
        let index = fields
            .lookup(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_string()))?;
        Ok(Self::new(move |feature: &Feature| {
            feature.attribute(index) == Some(&value)
        }))
    }

    pub fn evaluate(&self, feature: &Feature) -> bool {
        (self.f)(feature)
    }
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Predicate(..)")
    }
}
