//! The wrapped container and the change detection for its mutations.

use super::event::ChangeEvent;
use super::key::Key;
use crate::error::{ObservableError, Result};
use serde_json::{Map, Value};

pub(crate) enum Container {
    Record(Map<String, Value>),
    Sequence(Vec<Value>),
}

impl Container {
    pub(crate) fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Container::Record(map)),
            Value::Array(items) => Ok(Container::Sequence(items)),
            Value::Null => Err(ObservableError::NotAContainer("null")),
            Value::Bool(_) => Err(ObservableError::NotAContainer("boolean")),
            Value::Number(_) => Err(ObservableError::NotAContainer("number")),
            Value::String(_) => Err(ObservableError::NotAContainer("string")),
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Container::Record(map) => Value::Object(map.clone()),
            Container::Sequence(items) => Value::Array(items.clone()),
        }
    }

    pub(crate) fn is_sequence(&self) -> bool {
        matches!(self, Container::Sequence(_))
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&Value> {
        match self {
            Container::Record(map) => map.get(&key.to_string()),
            Container::Sequence(items) => key.as_index().and_then(|i| items.get(i)),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Container::Record(map) => map.len(),
            Container::Sequence(items) => items.len(),
        }
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        match self {
            Container::Record(map) => map.keys().cloned().collect(),
            Container::Sequence(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    pub(crate) fn values(&self) -> Vec<Value> {
        match self {
            Container::Record(map) => map.values().cloned().collect(),
            Container::Sequence(items) => items.clone(),
        }
    }

    /// Write `value` at `key`. Equal values are not reported.
    ///
    /// A sequence accepts indices up to its length; writing at the length appends.
    pub(crate) fn set(&mut self, key: &Key, value: Value) -> Result<Vec<ChangeEvent>> {
        match self {
            Container::Record(map) => {
                let name = key.to_string();
                if map.get(&name) == Some(&value) {
                    return Ok(Vec::new());
                }
                let old = map.insert(name.clone(), value.clone());
                Ok(vec![ChangeEvent::new(name, Some(value), old)])
            }
            Container::Sequence(items) => {
                let index = key
                    .as_index()
                    .filter(|i| *i <= items.len())
                    .ok_or_else(|| ObservableError::InvalidIndex(key.to_string()))?;
                let old = items.get(index).cloned();
                if old.as_ref() == Some(&value) {
                    return Ok(Vec::new());
                }
                if index < items.len() {
                    items[index] = value.clone();
                } else {
                    items.push(value.clone());
                }
                Ok(vec![ChangeEvent::new(index.to_string(), Some(value), old)])
            }
        }
    }

    /// Remove `key`. Absent keys are a no-op.
    ///
    /// Sequences have no holes, so deleting an index shifts the tail left.
    pub(crate) fn delete(&mut self, key: &Key) -> Result<(Option<Value>, Vec<ChangeEvent>)> {
        match self {
            Container::Record(map) => {
                let name = key.to_string();
                match map.remove(&name) {
                    Some(old) => {
                        let event = ChangeEvent::new(name, None, Some(old.clone()));
                        Ok((Some(old), vec![event]))
                    }
                    None => Ok((None, Vec::new())),
                }
            }
            Container::Sequence(_) => {
                let len = self.len();
                match key.as_index() {
                    Some(index) if index < len => {
                        self.mutate_sequence("delete", |items| Some(items.remove(index)))
                    }
                    _ => Ok((None, Vec::new())),
                }
            }
        }
    }

    /// Apply `op` to the sequence and report every index whose value changed.
    pub(crate) fn mutate_sequence<R>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Vec<Value>) -> R,
    ) -> Result<(R, Vec<ChangeEvent>)> {
        let Container::Sequence(items) = self else {
            return Err(ObservableError::NotASequence(operation));
        };
        let before = items.clone();
        let result = op(&mut *items);
        Ok((result, diff_sequences(&before, items)))
    }
}

/// Per-index comparison of two sequences, in ascending index order.
pub(crate) fn diff_sequences(before: &[Value], after: &[Value]) -> Vec<ChangeEvent> {
    (0..before.len().max(after.len()))
        .filter_map(|i| {
            let old = before.get(i);
            let new = after.get(i);
            (old != new).then(|| ChangeEvent::new(i.to_string(), new.cloned(), old.cloned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(key: &str, new: Option<Value>, old: Option<Value>) -> ChangeEvent {
        ChangeEvent::new(key, new, old)
    }

    #[test]
    fn test_from_value_rejects_scalars() {
        assert!(Container::from_value(json!({})).is_ok());
        assert!(Container::from_value(json!([])).is_ok());
        for (value, name) in [
            (json!(null), "null"),
            (json!(true), "boolean"),
            (json!(1), "number"),
            (json!("asd"), "string"),
        ] {
            match Container::from_value(value) {
                Err(ObservableError::NotAContainer(kind)) => assert_eq!(kind, name),
                _ => panic!("expected NotAContainer for {name}"),
            }
        }
    }

    #[test]
    fn test_record_set_reports_only_real_changes() {
        let mut container = Container::from_value(json!({ "a": 1 })).unwrap();

        assert!(container.set(&Key::from("a"), json!(1)).unwrap().is_empty());
        assert_eq!(
            container.set(&Key::from("a"), json!(2)).unwrap(),
            vec![event("a", Some(json!(2)), Some(json!(1)))]
        );
        assert_eq!(
            container.set(&Key::from("b"), Value::Null).unwrap(),
            vec![event("b", Some(Value::Null), None)]
        );
    }

    #[test]
    fn test_record_delete() {
        let mut container = Container::from_value(json!({ "a": 5 })).unwrap();

        let (removed, events) = container.delete(&Key::from("b")).unwrap();
        assert_eq!(removed, None);
        assert!(events.is_empty());

        let (removed, events) = container.delete(&Key::from("a")).unwrap();
        assert_eq!(removed, Some(json!(5)));
        assert_eq!(events, vec![event("a", None, Some(json!(5)))]);
        assert_eq!(container.len(), 0);
    }

    #[test]
    fn test_sequence_set_appends_at_length() {
        let mut container = Container::from_value(json!([1])).unwrap();
        let events = container.set(&Key::from(1usize), json!(2)).unwrap();
        assert_eq!(events, vec![event("1", Some(json!(2)), None)]);
        assert!(container.set(&Key::from("0"), json!(1)).unwrap().is_empty());
        assert_eq!(
            container.set(&Key::from("0"), json!(5)).unwrap(),
            vec![event("0", Some(json!(5)), Some(json!(1)))]
        );
        assert_eq!(container.to_value(), json!([5, 2]));
    }

    #[test]
    fn test_sequence_set_past_end_is_rejected() {
        let mut container = Container::from_value(json!([1, 2, 3])).unwrap();
        for key in [Key::Index(usize::MAX), Key::Index(4), Key::from("100000")] {
            assert!(matches!(
                container.set(&key, json!(1)),
                Err(ObservableError::InvalidIndex(_))
            ));
        }
        assert_eq!(container.to_value(), json!([1, 2, 3]));
    }

    #[test]
    fn test_sequence_rejects_named_keys() {
        let mut container = Container::from_value(json!([1])).unwrap();
        assert!(matches!(
            container.set(&Key::from("length"), json!(0)),
            Err(ObservableError::InvalidIndex(_))
        ));
        assert_eq!(container.get(&Key::from("length")), None);
        let (removed, events) = container.delete(&Key::from("length")).unwrap();
        assert!(removed.is_none() && events.is_empty());
    }

    #[test]
    fn test_sequence_delete_shifts_tail() {
        let mut container = Container::from_value(json!([1, 2, 3])).unwrap();
        let (removed, events) = container.delete(&Key::from(0usize)).unwrap();
        assert_eq!(removed, Some(json!(1)));
        assert_eq!(
            events,
            vec![
                event("0", Some(json!(2)), Some(json!(1))),
                event("1", Some(json!(3)), Some(json!(2))),
                event("2", None, Some(json!(3))),
            ]
        );
    }

    #[test]
    fn test_mutate_sequence_on_record_fails() {
        let mut container = Container::from_value(json!({})).unwrap();
        assert!(matches!(
            container.mutate_sequence("push", |items| items.push(json!(1))),
            Err(ObservableError::NotASequence("push"))
        ));
    }

    #[test]
    fn test_diff_skips_equal_neighbours() {
        let before = [json!(1), json!(1), json!(2)];
        let after = [json!(1), json!(2)];
        assert_eq!(
            diff_sequences(&before, &after),
            vec![
                event("1", Some(json!(2)), Some(json!(1))),
                event("2", None, Some(json!(2))),
            ]
        );
    }
}
