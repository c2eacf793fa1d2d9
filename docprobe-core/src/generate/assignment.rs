use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

use crate::model::{Parameter, ParameterLocation};

/// Identifies a parameter within an endpoint.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Slot {
    pub location: ParameterLocation,
    pub name: String,
}

impl Slot {
    pub fn of(param: &Parameter) -> Self {
        Self {
            location: param.location,
            name: param.name.clone(),
        }
    }
}

/// The concrete values that a test case sends, in parameter order.
///
/// A parameter without a value isn't sent at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignment(IndexMap<Slot, Value>);

impl Assignment {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, param: &Parameter, value: Value) {
        self.0.insert(Slot::of(param), value);
    }

    /// Returns a copy with `param` set to `value`, keeping
    /// parameter order.
    pub fn with(&self, param: &Parameter, value: Value) -> Self {
        let mut assignment = self.clone();
        assignment.insert(param, value);
        assignment
    }

    /// Returns a copy that doesn't send `param`.
    pub fn without(&self, param: &Parameter) -> Self {
        let mut assignment = self.clone();
        assignment.0.shift_remove(&Slot::of(param));
        assignment
    }

    pub fn get(&self, location: ParameterLocation, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(slot, _)| slot.location == location && slot.name == name)
            .map(|(_, value)| value)
    }

    #[inline]
    pub fn contains(&self, param: &Parameter) -> bool {
        self.0.contains_key(&Slot::of(param))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Slot, &Value)> {
        self.0.iter()
    }

    pub fn in_location(&self, location: ParameterLocation) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(move |(slot, _)| slot.location == location)
            .map(|(slot, value)| (slot.name.as_str(), value))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a string that's equal for two assignments exactly when
    /// they send the same values, regardless of order.
    pub fn fingerprint(&self) -> String {
        self.0
            .iter()
            .map(|(slot, value)| format!("{}:{}={value}", slot.location, slot.name))
            .sorted()
            .join("&")
    }
}

/// Serializes as `{"query": {"page": 1}, "body": {...}}`, omitting
/// locations without values.
impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups = ParameterLocation::ALL
            .into_iter()
            .map(|location| {
                let group: IndexMap<&str, &Value> = self.in_location(location).collect();
                (location, group)
            })
            .filter(|(_, group)| !group.is_empty())
            .collect_vec();
        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (location, group) in &groups {
            map.serialize_entry(location.as_str(), group)?;
        }
        map.end()
    }
}
