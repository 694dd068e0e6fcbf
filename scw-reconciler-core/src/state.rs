//! Declarative state and schema
//!
//! State is an ordered attribute map so two reads of an unchanged resource
//! serialize byte-identically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute name to JSON value.
pub type Attributes = BTreeMap<String, Value>;

/// Stored or configured state of one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Encoded composite ID; `None` before creation or after drift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal state carrying only an ID.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }
}

// ============ Schema ============

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrKind {
    String,
    Int { min: Option<i64>, max: Option<i64> },
    Bool,
    /// A lowercase slug from a closed set.
    Enum(&'static [&'static str]),
    /// RFC 3339 timestamp.
    Timestamp,
    /// A UUID that may carry a locality prefix (`fr-par/<uuid>`).
    LocalityId,
    List,
    /// A list whose element order carries no meaning.
    Set,
    Map,
}

/// Who supplies an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl Presence {
    /// May appear in configured state.
    pub fn configurable(self) -> bool {
        !matches!(self, Self::Computed)
    }

    /// May be filled in by the vendor.
    pub fn computed(self) -> bool {
        matches!(self, Self::Computed | Self::OptionalComputed)
    }
}

/// One attribute declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub kind: AttrKind,
    pub presence: Presence,
    /// A change forces destroy and recreate.
    pub force_new: bool,
    /// Redacted by the host; never re-read from the vendor.
    pub sensitive: bool,
    /// Accepted on create but never returned by reads; kept from prior state.
    pub write_only: bool,
}

impl Attribute {
    fn new(kind: AttrKind, presence: Presence) -> Self {
        Self {
            kind,
            presence,
            force_new: false,
            sensitive: false,
            write_only: false,
        }
    }

    pub fn required(kind: AttrKind) -> Self {
        Self::new(kind, Presence::Required)
    }

    pub fn optional(kind: AttrKind) -> Self {
        Self::new(kind, Presence::Optional)
    }

    pub fn computed(kind: AttrKind) -> Self {
        Self::new(kind, Presence::Computed)
    }

    pub fn optional_computed(kind: AttrKind) -> Self {
        Self::new(kind, Presence::OptionalComputed)
    }

    #[must_use]
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Value survives reads from prior state.
    pub fn preserved(&self) -> bool {
        self.sensitive || self.write_only
    }
}

/// Declarative description of a resource's attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attr(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(name, attr)| (*name, attr))
    }

    /// Names of attributes that force replacement on change.
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| name)
    }
}
