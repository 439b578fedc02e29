use crate::value::Value;

/// A single tuple of a relation: an insertion-ordered binding from attribute
/// names to values.
///
/// Rows are value objects. Updates go through [Row::with], which returns a
/// new row instead of mutating the original, so operators can freely share
/// and combine rows while building their outputs. Equality and hashing are
/// by full content, which is what set-operation de-duplication relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value by attribute name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns a new row with `name = value` applied. An existing binding is
    /// replaced in place; a new one is appended, preserving insertion order.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Row {
        let name = name.into();
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => entries.push((name, value)),
        }
        Row { entries }
    }

    /// Number of bindings in the row.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the row has no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row = row.with(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functional_update() {
        let r0 = Row::new();
        let r1 = r0.with("id", Value::Int(1));
        let r2 = r1.with("name", Value::Text("Alice".into()));

        // Originals are untouched
        assert!(r0.is_empty());
        assert_eq!(r1.len(), 1);
        assert!(r1.get("name").is_none());

        assert_eq!(r2.len(), 2);
        assert_eq!(r2.get("id"), Some(&Value::Int(1)));
        assert_eq!(r2.get("name"), Some(&Value::Text("Alice".into())));
    }

    #[test]
    fn test_with_replaces_existing_binding() {
        let r = Row::new()
            .with("id", Value::Int(1))
            .with("name", Value::Text("Alice".into()))
            .with("id", Value::Int(2));

        assert_eq!(r.len(), 2);
        assert_eq!(r.get("id"), Some(&Value::Int(2)));
        // Order preserved: a replacement does not move the binding
        let names: Vec<&str> = r.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[test]
    fn test_missing_attribute() {
        let r = Row::new().with("id", Value::Int(1));
        assert_eq!(r.get("age"), None);
    }

    #[test]
    fn test_content_equality() {
        let a = Row::new()
            .with("x", Value::Int(1))
            .with("y", Value::Null);
        let b = Row::new()
            .with("x", Value::Int(1))
            .with("y", Value::Null);
        let c = a.with("x", Value::Int(2));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hashing_in_set() {
        use std::collections::HashSet;

        let a = Row::new().with("x", Value::Int(1));
        let b = Row::new().with("x", Value::Int(1));
        let c = Row::new().with("x", Value::Double(1.0));

        let mut seen = HashSet::new();
        assert!(seen.insert(a));
        assert!(!seen.insert(b));
        assert!(seen.insert(c));
    }

    #[test]
    fn test_from_iterator() {
        let row: Row = vec![
            ("id".to_string(), Value::Int(7)),
            ("name".to_string(), Value::Text("Bob".into())),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
    }
}
