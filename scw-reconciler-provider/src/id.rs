//! Composite resource identifiers
//!
//! Every resource is addressed by a `/`-joined string combining an optional
//! locality with one or more sub-identifiers:
//!
//! | Shape | Format |
//! |-------|--------|
//! | [`IdShape::Bare`] | `<uuid>` |
//! | [`IdShape::Regional`] | `<region>/<uuid>` |
//! | [`IdShape::Zonal`] | `<zone>/<uuid>` |
//! | [`IdShape::RegionalNamed`] | `<region>/<parent-uuid>/<name>` |
//! | [`IdShape::ProjectScoped`] | `<project-uuid>/<sub-id>` |
//!
//! [`encode`] and [`decode`] are inverses for every valid input.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::locality::{Locality, LocalityKind, Region, UnknownLocality, Zone};

/// Separator between ID segments.
pub const SEPARATOR: char = '/';

/// Length of a canonical hyphenated UUID.
const UUID_LEN: usize = 36;

/// Expected layout of a composite ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdShape {
    /// A UUID with no locality.
    Bare,
    /// `region/uuid`.
    Regional,
    /// `zone/uuid`.
    Zonal,
    /// `region/parent-uuid/name`, for sub-objects keyed by name.
    RegionalNamed,
    /// `project-uuid/sub-id`.
    ProjectScoped,
}

impl IdShape {
    /// Number of `/`-separated segments.
    pub fn segments(self) -> usize {
        match self {
            Self::Bare => 1,
            Self::Regional | Self::Zonal | Self::ProjectScoped => 2,
            Self::RegionalNamed => 3,
        }
    }

    /// Locality kind carried by the leading segment.
    pub fn locality_kind(self) -> LocalityKind {
        match self {
            Self::Regional | Self::RegionalNamed => LocalityKind::Region,
            Self::Zonal => LocalityKind::Zone,
            Self::Bare | Self::ProjectScoped => LocalityKind::Global,
        }
    }

    /// Example rendering, used in error messages.
    pub fn example(self) -> &'static str {
        match self {
            Self::Bare => "<uuid>",
            Self::Regional => "<region>/<uuid>",
            Self::Zonal => "<zone>/<uuid>",
            Self::RegionalNamed => "<region>/<parent-uuid>/<name>",
            Self::ProjectScoped => "<project-uuid>/<sub-id>",
        }
    }
}

impl fmt::Display for IdShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.example())
    }
}

/// Why an ID string failed to decode.
///
/// These are configuration-level errors: they surface before any vendor call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The ID is empty.
    #[error("resource ID is empty")]
    Empty,

    /// A segment is empty (leading, trailing or duplicated `/`).
    #[error("resource ID '{id}' contains an empty segment")]
    EmptySegment {
        /// The offending ID.
        id: String,
    },

    /// Segment count does not match the expected shape.
    #[error("resource ID '{id}' does not match the expected format {shape}")]
    WrongShape {
        /// The offending ID.
        id: String,
        /// The expected shape.
        shape: IdShape,
    },

    /// The locality segment is not in the catalog.
    #[error("resource ID '{id}': {source}")]
    UnknownLocality {
        /// The offending ID.
        id: String,
        /// Underlying catalog error.
        source: UnknownLocality,
    },

    /// A segment that must be a UUID is not in canonical form.
    #[error("resource ID '{id}': '{segment}' is not a canonical UUID")]
    InvalidUuid {
        /// The offending ID.
        id: String,
        /// The segment that failed.
        segment: String,
    },
}

/// Parse a UUID in the canonical `8-4-4-4-12` hyphenated form.
///
/// `Uuid::parse_str` also accepts simple, braced and URN forms; those are rejected here.
pub fn parse_canonical_uuid(s: &str) -> Option<Uuid> {
    if s.len() != UUID_LEN {
        return None;
    }
    Uuid::parse_str(s).ok()
}

/// Join a locality and parts with `/`.
///
/// A global locality contributes no segment.
pub fn encode(locality: Locality, parts: &[&str]) -> String {
    let mut out = String::new();
    if locality != Locality::Global {
        out.push_str(&locality.to_string());
    }
    for part in parts {
        if !out.is_empty() {
            out.push(SEPARATOR);
        }
        out.push_str(part);
    }
    out
}

/// Split `s` according to `shape`, validating the locality and UUID segments.
///
/// Returns the locality (or [`Locality::Global`]) and the remaining parts.
pub fn decode(s: &str, shape: IdShape) -> Result<(Locality, Vec<String>), IdError> {
    let id = ResourceId::decode(s, shape)?;
    let parts = id.parts();
    Ok((id.locality(), parts))
}

/// Return the trailing segment of a locality-qualified ID, or the input when unqualified.
pub fn strip_locality(s: &str) -> &str {
    match s.split_once(SEPARATOR) {
        Some((prefix, rest)) if prefix.parse::<Locality>().is_ok() => rest,
        _ => s,
    }
}

/// A decoded composite resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// A bare UUID.
    Bare(Uuid),
    /// `region/uuid`.
    Regional {
        /// Region segment.
        region: Region,
        /// Resource UUID.
        id: Uuid,
    },
    /// `zone/uuid`.
    Zonal {
        /// Zone segment.
        zone: Zone,
        /// Resource UUID.
        id: Uuid,
    },
    /// `region/parent-uuid/name`.
    RegionalNamed {
        /// Region segment.
        region: Region,
        /// Parent resource UUID.
        parent: Uuid,
        /// Child name.
        name: String,
    },
    /// `project-uuid/sub-id`.
    ProjectScoped {
        /// Owning project UUID.
        project: Uuid,
        /// Project-local identifier (e.g. a task ID).
        sub_id: String,
    },
}

impl ResourceId {
    /// Decode `s`, requiring exactly `shape`.
    pub fn decode(s: &str, shape: IdShape) -> Result<Self, IdError> {
        Self::decode_with_fallback(s, shape, None)
    }

    /// Decode `s`, accepting a bare UUID for a regional/zonal shape when
    /// `fallback` supplies a locality of the matching kind.
    pub fn decode_with_fallback(
        s: &str,
        shape: IdShape,
        fallback: Option<Locality>,
    ) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        let segments: Vec<&str> = s.split(SEPARATOR).collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(IdError::EmptySegment { id: s.to_string() });
        }

        let wrong_shape = || IdError::WrongShape {
            id: s.to_string(),
            shape,
        };
        let uuid = |segment: &str| {
            parse_canonical_uuid(segment).ok_or_else(|| IdError::InvalidUuid {
                id: s.to_string(),
                segment: segment.to_string(),
            })
        };
        let unknown = |source: UnknownLocality| IdError::UnknownLocality {
            id: s.to_string(),
            source,
        };

        match (shape, segments.as_slice()) {
            (IdShape::Bare, &[id]) => Ok(Self::Bare(uuid(id)?)),
            (IdShape::Regional, &[region, id]) => Ok(Self::Regional {
                region: region.parse().map_err(unknown)?,
                id: uuid(id)?,
            }),
            (IdShape::Regional, &[id]) => match fallback.and_then(Locality::region) {
                Some(region) if fallback.map(Locality::kind) == Some(LocalityKind::Region) => {
                    Ok(Self::Regional {
                        region,
                        id: uuid(id)?,
                    })
                }
                _ => Err(wrong_shape()),
            },
            (IdShape::Zonal, &[zone, id]) => Ok(Self::Zonal {
                zone: zone.parse().map_err(unknown)?,
                id: uuid(id)?,
            }),
            (IdShape::Zonal, &[id]) => match fallback.and_then(Locality::zone) {
                Some(zone) => Ok(Self::Zonal {
                    zone,
                    id: uuid(id)?,
                }),
                None => Err(wrong_shape()),
            },
            (IdShape::RegionalNamed, &[region, parent, name]) => Ok(Self::RegionalNamed {
                region: region.parse().map_err(unknown)?,
                parent: uuid(parent)?,
                name: name.to_string(),
            }),
            (IdShape::ProjectScoped, &[project, sub_id]) => Ok(Self::ProjectScoped {
                project: uuid(project)?,
                sub_id: sub_id.to_string(),
            }),
            _ => Err(wrong_shape()),
        }
    }

    /// Shape of this ID.
    pub fn shape(&self) -> IdShape {
        match self {
            Self::Bare(_) => IdShape::Bare,
            Self::Regional { .. } => IdShape::Regional,
            Self::Zonal { .. } => IdShape::Zonal,
            Self::RegionalNamed { .. } => IdShape::RegionalNamed,
            Self::ProjectScoped { .. } => IdShape::ProjectScoped,
        }
    }

    /// Locality carried by this ID.
    pub fn locality(&self) -> Locality {
        match self {
            Self::Regional { region, .. } | Self::RegionalNamed { region, .. } => {
                Locality::Region(*region)
            }
            Self::Zonal { zone, .. } => Locality::Zone(*zone),
            Self::Bare(_) | Self::ProjectScoped { .. } => Locality::Global,
        }
    }

    /// Non-locality segments, in order.
    pub fn parts(&self) -> Vec<String> {
        match self {
            Self::Bare(id) | Self::Regional { id, .. } | Self::Zonal { id, .. } => {
                vec![id.to_string()]
            }
            Self::RegionalNamed { parent, name, .. } => vec![parent.to_string(), name.clone()],
            Self::ProjectScoped { project, sub_id } => vec![project.to_string(), sub_id.clone()],
        }
    }

    /// The primary UUID: the resource itself, the parent for named IDs, or the project.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Bare(id) | Self::Regional { id, .. } | Self::Zonal { id, .. } => *id,
            Self::RegionalNamed { parent, .. } => *parent,
            Self::ProjectScoped { project, .. } => *project,
        }
    }

    /// Re-home this ID onto `locality` when the kinds match; otherwise return it unchanged.
    #[must_use]
    pub fn with_locality(self, locality: Locality) -> Self {
        match (self, locality) {
            (Self::Regional { id, .. }, Locality::Region(region)) => Self::Regional { region, id },
            (Self::Zonal { id, .. }, Locality::Zone(zone)) => Self::Zonal { zone, id },
            (Self::RegionalNamed { parent, name, .. }, Locality::Region(region)) => {
                Self::RegionalNamed {
                    region,
                    parent,
                    name,
                }
            }
            (other, _) => other,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.parts();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        f.write_str(&encode(self.locality(), &parts))
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
