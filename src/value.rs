use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// The JSON-compatible result of evaluating a source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
    List(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    /// Name of the variant, as used in type mismatch messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "an integer",
            Value::Text(_) => "a string",
            Value::List(_) => "an array",
            Value::Mapping(_) => "a dict",
        }
    }

    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A string-keyed map that remembers the order keys were first inserted.
///
/// Re-inserting an existing key replaces its value in place. Lookups go
/// through a key index, so building a large dict stays linear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Mapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Mapping {
        [
            ("zeta".to_string(), Value::Integer(1)),
            ("alpha".to_string(), Value::Text("a".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut map = sample();
        let old = map.insert("zeta".to_string(), Value::Integer(2));
        assert_eq!(old, Some(Value::Integer(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(map.get("zeta"), Some(&Value::Integer(2)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_many_keys_with_overwrites() {
        let mut map = Mapping::new();
        for i in 0..10_000 {
            map.insert(format!("key_{i}"), Value::Integer(i));
        }
        for i in (0..10_000).step_by(2) {
            map.insert(format!("key_{i}"), Value::Integer(-i));
        }
        assert_eq!(map.len(), 10_000);
        assert_eq!(map.get("key_4"), Some(&Value::Integer(-4)));
        assert_eq!(map.get("key_5"), Some(&Value::Integer(5)));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map.keys().nth(4), Some("key_4"));
        assert_eq!(map.keys().last(), Some("key_9999"));
    }

    #[test]
    fn test_json_keeps_insertion_order() {
        let value = Value::Mapping(sample());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"a"}"#);
    }

    #[test]
    fn test_untagged_variants() {
        let value = Value::List(vec![
            Value::Integer(-3),
            Value::Text("тест".to_string()),
            Value::Mapping(Mapping::new()),
            Value::List(vec![]),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[-3,"тест",{},[]]"#);
    }

    #[test]
    fn test_display() {
        let mut map = Mapping::new();
        map.insert(
            "items".to_string(),
            Value::List(vec![Value::Integer(1), Value::Text("x".to_string())]),
        );
        assert_eq!(Value::Mapping(map).to_string(), r#"{"items": [1, "x"]}"#);
    }
}
