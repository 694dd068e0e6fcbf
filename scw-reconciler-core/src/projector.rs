//! State projection
//!
//! The only code that writes state attributes. Expands configured state into
//! typed vendor requests, flattens typed vendor objects back into state, and
//! merges fresh reads with prior state.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use scw_reconciler_provider::datetime::{parse_rfc3339, to_rfc3339};
use scw_reconciler_provider::{
    encode, parse_canonical_uuid, strip_locality, Locality, LocalityKind, ResourceId, SEPARATOR,
};

use crate::error::{CoreError, CoreResult};
use crate::state::{AttrKind, Attributes, Presence, ResourceState, Schema};

// ============ Validation ============

/// Validate configured state against the schema before any vendor call.
pub fn validate_config(
    resource_type: &str,
    schema: &Schema,
    configured: &ResourceState,
) -> CoreResult<()> {
    let invalid = |name: &str, reason: String| {
        CoreError::Validation(format!("[{resource_type}] {name}: {reason}"))
    };

    for name in configured.attributes.keys() {
        if schema.get(name).is_none() {
            return Err(invalid(name, "unknown attribute".to_string()));
        }
    }

    for (name, attr) in schema.iter() {
        let value = configured.get(name);
        match (attr.presence, value) {
            (Presence::Required, None) => {
                return Err(invalid(name, "required attribute is missing".to_string()));
            }
            (Presence::Computed, Some(_)) => {
                return Err(invalid(name, "computed attribute cannot be configured".to_string()));
            }
            (_, Some(value)) => check_kind(&attr.kind, value).map_err(|r| invalid(name, r))?,
            _ => {}
        }
    }
    Ok(())
}

fn check_kind(kind: &AttrKind, value: &Value) -> Result<(), String> {
    match kind {
        AttrKind::String => value
            .as_str()
            .map(|_| ())
            .ok_or_else(|| "expected a string".to_string()),
        AttrKind::Bool => value
            .as_bool()
            .map(|_| ())
            .ok_or_else(|| "expected a boolean".to_string()),
        AttrKind::Int { min, max } => {
            let n = value
                .as_i64()
                .ok_or_else(|| "expected an integer".to_string())?;
            if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                return Err(format!(
                    "{n} is out of range [{}, {}]",
                    min.map_or_else(|| "-inf".to_string(), |v| v.to_string()),
                    max.map_or_else(|| "+inf".to_string(), |v| v.to_string()),
                ));
            }
            Ok(())
        }
        AttrKind::Enum(values) => {
            let s = value
                .as_str()
                .ok_or_else(|| "expected a string".to_string())?;
            if values.iter().any(|v| *v == s) {
                Ok(())
            } else {
                Err(format!("'{s}' is not one of {}", values.join(", ")))
            }
        }
        AttrKind::Timestamp => {
            let s = value
                .as_str()
                .ok_or_else(|| "expected an RFC 3339 string".to_string())?;
            parse_rfc3339(s)
                .map(|_| ())
                .ok_or_else(|| format!("'{s}' is not an RFC 3339 timestamp"))
        }
        AttrKind::LocalityId => {
            let s = value
                .as_str()
                .ok_or_else(|| "expected an ID string".to_string())?;
            parse_canonical_uuid(strip_locality(s))
                .map(|_| ())
                .ok_or_else(|| format!("'{s}' is not a UUID or <locality>/<uuid>"))
        }
        AttrKind::List | AttrKind::Set => value
            .as_array()
            .map(|_| ())
            .ok_or_else(|| "expected a list".to_string()),
        AttrKind::Map => value
            .as_object()
            .map(|_| ())
            .ok_or_else(|| "expected a map".to_string()),
    }
}

/// First locality prefix found in a configured nested ID, if any.
pub fn embedded_locality(schema: &Schema, configured: &ResourceState) -> Option<Locality> {
    schema
        .iter()
        .filter(|(_, attr)| attr.kind == AttrKind::LocalityId)
        .filter_map(|(name, _)| configured.get_str(name))
        .find_map(|s| {
            s.split_once(SEPARATOR)
                .and_then(|(prefix, _)| prefix.parse::<Locality>().ok())
        })
}

// ============ Expand / Flatten ============

/// Build a typed vendor request from configured state.
///
/// Absent and null attributes are omitted, so optional request fields fall
/// back to their serde defaults. Nested IDs lose their locality prefix.
pub fn expand<T: DeserializeOwned>(schema: &Schema, configured: &ResourceState) -> CoreResult<T> {
    let mut object = Map::new();
    for (name, attr) in schema.iter() {
        if !attr.presence.configurable() {
            continue;
        }
        let Some(value) = configured.get(name) else {
            continue;
        };
        let value = match (&attr.kind, value) {
            (AttrKind::LocalityId, Value::String(s)) => Value::String(strip_locality(s).to_string()),
            _ => value.clone(),
        };
        object.insert(name.to_string(), value);
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|e| CoreError::Projection(format!("cannot build request: {e}")))
}

/// Flatten a typed vendor object into schema attributes.
///
/// Timestamps are normalized to RFC 3339 UTC; nested IDs are rewritten to
/// `locality`; fields outside the schema are dropped.
pub fn flatten<T: Serialize>(
    schema: &Schema,
    object: &T,
    locality: Locality,
) -> CoreResult<Attributes> {
    let value = serde_json::to_value(object)
        .map_err(|e| CoreError::Projection(format!("cannot flatten response: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(CoreError::Projection(
            "vendor object is not a JSON object".to_string(),
        ));
    };

    let mut attributes = Attributes::new();
    for (name, attr) in schema.iter() {
        let Some(value) = fields.get(name).filter(|v| !v.is_null()) else {
            continue;
        };
        attributes.insert(name.to_string(), normalize(&attr.kind, value, locality)?);
    }
    Ok(attributes)
}

fn normalize(kind: &AttrKind, value: &Value, locality: Locality) -> CoreResult<Value> {
    match (kind, value) {
        (AttrKind::Timestamp, Value::String(s)) => parse_rfc3339(s)
            .map(|dt| Value::String(to_rfc3339(&dt)))
            .ok_or_else(|| CoreError::Projection(format!("'{s}' is not an RFC 3339 timestamp"))),
        (AttrKind::LocalityId, Value::String(s)) => Ok(Value::String(qualify(s, locality))),
        _ => Ok(value.clone()),
    }
}

/// Rewrite a possibly-qualified nested ID onto `locality`.
pub fn qualify(id: &str, locality: Locality) -> String {
    encode(locality, &[strip_locality(id)])
}

// ============ Merge ============

/// State persisted right after a successful create, before any read.
///
/// Configured values are kept so a failed hydration still leaves a usable state.
pub fn seed_state(
    schema: &Schema,
    locality_kind: LocalityKind,
    id: &ResourceId,
    configured: &ResourceState,
    created: Attributes,
) -> ResourceState {
    let mut state = ResourceState::with_id(id.to_string());
    for (name, attr) in schema.iter() {
        if attr.presence.configurable() {
            if let Some(value) = configured.get(name) {
                state.set(name, value.clone());
            }
        }
    }
    state
        .attributes
        .extend(created.into_iter().filter(|(_, v)| !v.is_null()));
    set_locality(&mut state, locality_kind, id);
    state
}

/// State persisted right after a successful update, before the re-read.
///
/// Configured values replace prior ones, removed optionals are dropped and
/// attributes echoed by the vendor win over both.
pub fn apply_changes(
    schema: &Schema,
    prior: &ResourceState,
    configured: &ResourceState,
    returned: Attributes,
) -> ResourceState {
    let mut state = prior.clone();
    for (name, attr) in schema.iter() {
        if !attr.presence.configurable() {
            continue;
        }
        match configured.get(name) {
            Some(value) => state.set(name, value.clone()),
            None if attr.presence == Presence::Optional => {
                state.remove(name);
            }
            None => {}
        }
    }
    state
        .attributes
        .extend(returned.into_iter().filter(|(_, v)| !v.is_null()));
    state
}

/// Merge a fresh read into final state.
///
/// Sensitive and write-only values from `prior` are kept as-is. Fails when
/// any other required or computed attribute is missing.
pub fn finalize(
    resource_type: &str,
    schema: &Schema,
    locality_kind: LocalityKind,
    id: &ResourceId,
    fresh: Attributes,
    prior: Option<&ResourceState>,
) -> CoreResult<ResourceState> {
    let mut state = ResourceState::with_id(id.to_string());
    state.attributes = fresh.into_iter().filter(|(_, v)| !v.is_null()).collect();

    if let Some(prior) = prior {
        for (name, attr) in schema.iter() {
            if !attr.preserved() {
                continue;
            }
            if let Some(value) = prior.get(name) {
                state.set(name, value.clone());
            }
        }
    }

    set_locality(&mut state, locality_kind, id);

    for (name, attr) in schema.iter() {
        // Sensitive and write-only values may never be observable.
        let mandatory = matches!(attr.presence, Presence::Required | Presence::Computed)
            && !attr.preserved();
        if mandatory && state.get(name).is_none() {
            return Err(CoreError::Projection(format!(
                "[{resource_type}] attribute '{name}' missing after read"
            )));
        }
    }
    Ok(state)
}

fn set_locality(state: &mut ResourceState, kind: LocalityKind, id: &ResourceId) {
    let locality = id.locality();
    if let (Some(attribute), true) = (kind.attribute(), locality.kind() == kind) {
        state.set(attribute, locality.to_string());
    }
}

// ============ Diff ============

/// Attributes that differ between prior and configured state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub changed: Vec<String>,
    /// Some changed attribute is ForceNew.
    pub requires_replace: bool,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.changed.iter().any(|c| c == name)
    }
}

/// Compare configured state with prior state.
///
/// An absent optional-computed attribute means "keep the computed value"
/// and is never a change.
pub fn diff(schema: &Schema, prior: &ResourceState, configured: &ResourceState) -> Diff {
    let mut out = Diff::default();
    for (name, attr) in schema.iter() {
        if !attr.presence.configurable() {
            continue;
        }
        let changed = match (configured.get(name), prior.get(name)) {
            (Some(c), Some(p)) => !same_value(&attr.kind, c, p),
            (Some(_), None) => true,
            (None, Some(_)) => attr.presence == Presence::Optional,
            (None, None) => false,
        };
        if changed {
            out.requires_replace |= attr.force_new;
            out.changed.push(name.to_string());
        }
    }
    out
}

fn same_value(kind: &AttrKind, a: &Value, b: &Value) -> bool {
    match (kind, a, b) {
        (AttrKind::LocalityId, Value::String(a), Value::String(b)) => {
            strip_locality(a) == strip_locality(b)
        }
        (AttrKind::Timestamp, Value::String(a), Value::String(b)) => {
            match (parse_rfc3339(a), parse_rfc3339(b)) {
                (Some(a), Some(b)) => a == b,
                _ => a == b,
            }
        }
        (AttrKind::Set, Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && sorted_elements(a) == sorted_elements(b)
        }
        _ => a == b,
    }
}

fn sorted_elements(values: &[Value]) -> Vec<String> {
    let mut out: Vec<String> = values.iter().map(Value::to_string).collect();
    out.sort_unstable();
    out
}
