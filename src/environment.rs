use crate::value::{Mapping, Value};

/// Constants declared so far in one evaluation pass.
///
/// Bindings keep the order of first declaration; redeclaring a name replaces
/// its value for every later lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: Mapping,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, returning the value it shadowed, if any.
    pub fn bind(&mut self, name: String, value: Value) -> Option<Value> {
        self.bindings.insert(name, value)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_missing() {
        let env = Environment::new();
        assert!(env.lookup("anything").is_none());
        assert!(env.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut env = Environment::new();
        assert_eq!(env.bind("a".to_string(), Value::Integer(1)), None);
        env.bind("b".to_string(), Value::Integer(2));
        assert_eq!(
            env.bind("a".to_string(), Value::Integer(3)),
            Some(Value::Integer(1))
        );
        assert_eq!(env.lookup("a"), Some(&Value::Integer(3)));
        let names: Vec<&str> = env.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
