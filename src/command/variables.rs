//! Shared named-value store with change notification.
//!
//! One store is passed explicitly to every command and operation of a
//! performance. Values are untyped numbers or strings; a string's meaning
//! (scale name, play-mode name, pattern text) is decided by whoever reads it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(i64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Handle returned by [`VariableStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&str, &Value)>;

/// Named variables plus the listeners watching them.
#[derive(Default)]
pub struct VariableStore {
    values: HashMap<String, Value>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from declarations, without notifying anyone.
    pub fn from_declarations<I, K>(decls: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: decls.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or overwrite a variable and notify every listener.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value.clone());
        for (_, listener) in &mut self.listeners {
            listener(name, &value);
        }
    }

    /// Register a listener called with `(name, new_value)` on every `set`.
    pub fn subscribe(&mut self, listener: impl FnMut(&str, &Value) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if the subscription was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// A copy of the current values with no listeners attached.
    pub fn snapshot(&self) -> VariableStore {
        Self {
            values: self.values.clone(),
            ..Self::default()
        }
    }

    /// Variable names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for VariableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableStore")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn set_and_get() {
        let mut store = VariableStore::new();
        store.set("x", Value::Number(3));
        assert_eq!(store.get("x"), Some(&Value::Number(3)));
        assert!(store.get("y").is_none());
    }

    #[test]
    fn keys_are_unique() {
        let mut store = VariableStore::new();
        store.set("x", 1.into());
        store.set("x", "MINOR".into());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("x").and_then(Value::as_text), Some("MINOR"));
    }

    #[test]
    fn listeners_see_every_set() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = VariableStore::new();
        let sink = Rc::clone(&seen);
        store.subscribe(move |name, value| sink.borrow_mut().push((name.to_string(), value.clone())));

        store.set("a", 1.into());
        store.set("b", "DORIAN".into());

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("a".to_string(), Value::Number(1)));
        assert_eq!(seen[1], ("b".to_string(), Value::Text("DORIAN".into())));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let count = Rc::new(RefCell::new(0));
        let mut store = VariableStore::new();
        let c = Rc::clone(&count);
        let id = store.subscribe(move |_, _| *c.borrow_mut() += 1);

        store.set("a", 1.into());
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set("a", 2.into());

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn declarations_do_not_notify() {
        let store = VariableStore::from_declarations([("root", Value::Number(0))]);
        assert!(store.contains("root"));
        assert_eq!(store.names(), vec!["root"]);
    }

    #[test]
    fn value_deserializes_untagged() {
        let v: Value = serde_yaml::from_str("12").unwrap();
        assert_eq!(v, Value::Number(12));
        let v: Value = serde_yaml::from_str("lydian").unwrap();
        assert_eq!(v, Value::Text("lydian".into()));
    }

    #[test]
    fn snapshot_copies_values_not_listeners() {
        let count = Rc::new(RefCell::new(0));
        let mut store = VariableStore::new();
        store.set("x", 1.into());
        let c = Rc::clone(&count);
        store.subscribe(move |_, _| *c.borrow_mut() += 1);

        let mut copy = store.snapshot();
        copy.set("x", 9.into());
        assert_eq!(*count.borrow(), 0);
        assert_eq!(store.get("x"), Some(&Value::Number(1)));
        assert_eq!(copy.get("x"), Some(&Value::Number(9)));
    }
}
