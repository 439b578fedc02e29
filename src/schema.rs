use std::collections::HashMap;
use std::fmt;

use crate::data_type::DataType;
use crate::error::{Error, Result};

/// An attribute (column) in a relation heading: a name paired with a type.
/// Immutable value; equality is by both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
}

impl Attribute {
    /// Creates a new attribute.
    ///
    /// # Errors
    /// Returns an error if the name is empty.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::SchemaConstruction(
                "attribute name must not be empty".into(),
            ));
        }
        Ok(Self { name, data_type })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.name, self.data_type)
    }
}

/// The heading of a relation: an ordered list of uniquely-named, typed
/// attributes, with an index for lookup by name.
///
/// A schema is created once, at table construction or projection time, and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Schema {
    attributes: Vec<Attribute>,
    index_by_name: HashMap<String, usize>,
}

impl Schema {
    /// Creates a schema from an attribute list.
    ///
    /// # Errors
    /// Returns an error if the list is empty or contains a duplicate name.
    pub fn new(attributes: Vec<Attribute>) -> Result<Self> {
        if attributes.is_empty() {
            return Err(Error::SchemaConstruction(
                "schema must have at least one attribute".into(),
            ));
        }
        let mut index_by_name = HashMap::with_capacity(attributes.len());
        for (i, attr) in attributes.iter().enumerate() {
            if index_by_name.insert(attr.name.clone(), i).is_some() {
                return Err(Error::SchemaConstruction(format!(
                    "duplicate attribute name: {}",
                    attr.name
                )));
            }
        }
        Ok(Self {
            attributes,
            index_by_name,
        })
    }

    /// Number of attributes in the heading.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the schema has no attributes. Construction rejects
    /// empty headings, so this is false for every schema built via [Schema::new].
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The attributes in heading order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns true if an attribute with this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.index_by_name.contains_key(name)
    }

    /// Position of the named attribute.
    ///
    /// # Errors
    /// Returns an error if the attribute does not exist.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.index_by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }

    /// The attribute at a position, if in bounds.
    pub fn attribute(&self, idx: usize) -> Option<&Attribute> {
        self.attributes.get(idx)
    }

    /// The declared type of the named attribute.
    ///
    /// # Errors
    /// Returns an error if the attribute does not exist.
    pub fn type_of(&self, name: &str) -> Result<DataType> {
        Ok(self.attributes[self.index_of(name)?].data_type)
    }

    /// Two schemas are compatible for set operations if they have equal
    /// arity and positionally-equal types. Names play no role.
    pub fn is_compatible(&self, other: &Schema) -> bool {
        self.len() == other.len()
            && self
                .attributes
                .iter()
                .zip(other.attributes.iter())
                .all(|(a, b)| a.data_type == b.data_type)
    }

    /// Builds the projected schema for the given positions, in order.
    ///
    /// # Errors
    /// Returns an error if a position is out of bounds or the selection
    /// repeats an attribute (duplicate name in the output heading).
    pub fn project(&self, indices: &[usize]) -> Result<Schema> {
        let attrs = indices
            .iter()
            .map(|&i| {
                self.attributes.get(i).cloned().ok_or_else(|| {
                    Error::SchemaConstruction(format!("attribute index {i} out of bounds"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Schema::new(attrs)
    }

    /// Merges two headings for a join: left attributes followed by right
    /// attributes. A name present on both sides is a usage error surfaced
    /// here, never silently resolved.
    ///
    /// # Errors
    /// Returns an error if the concatenation contains a duplicate name.
    pub fn merge(left: &Schema, right: &Schema) -> Result<Schema> {
        let mut attrs = Vec::with_capacity(left.len() + right.len());
        attrs.extend_from_slice(&left.attributes);
        attrs.extend_from_slice(&right.attributes);
        Schema::new(attrs)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, attr) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{attr}")?;
        }
        write!(f, ")")
    }
}
