//! Locality catalog
//!
//! Regions and zones are closed sets shared by every resource. Anything
//! outside the catalog is rejected at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============ Region ============

/// A vendor region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    /// Paris, France.
    FrPar,
    /// Amsterdam, Netherlands.
    NlAms,
    /// Warsaw, Poland.
    PlWaw,
}

impl Region {
    /// Every known region, in catalog order.
    pub const ALL: [Region; 3] = [Region::FrPar, Region::NlAms, Region::PlWaw];

    /// Canonical slug (e.g. `"fr-par"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FrPar => "fr-par",
            Self::NlAms => "nl-ams",
            Self::PlWaw => "pl-waw",
        }
    }

    /// Zones contained in this region.
    pub fn zones(self) -> [Zone; 3] {
        [
            Zone { region: self, index: 1 },
            Zone { region: self, index: 2 },
            Zone { region: self, index: 3 },
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = UnknownLocality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownLocality(s.to_string()))
    }
}

// ============ Zone ============

/// A vendor availability zone, written `<region>-<digit>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Zone {
    region: Region,
    index: u8,
}

impl Zone {
    /// Highest zone index in any region.
    const MAX_INDEX: u8 = 3;

    /// Build a zone from its region and 1-based index.
    pub fn new(region: Region, index: u8) -> Result<Self, UnknownLocality> {
        if (1..=Self::MAX_INDEX).contains(&index) {
            Ok(Self { region, index })
        } else {
            Err(UnknownLocality(format!("{region}-{index}")))
        }
    }

    /// The region containing this zone.
    pub fn region(self) -> Region {
        self.region
    }

    /// 1-based index of the zone within its region.
    pub fn index(self) -> u8 {
        self.index
    }

    /// Every known zone, in catalog order.
    pub fn all() -> impl Iterator<Item = Zone> {
        Region::ALL.into_iter().flat_map(Region::zones)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.region, self.index)
    }
}

impl FromStr for Zone {
    type Err = UnknownLocality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownLocality(s.to_string());
        let (region, index) = s.rsplit_once('-').ok_or_else(unknown)?;
        if index.len() != 1 {
            return Err(unknown());
        }
        let region = region.parse::<Region>().map_err(|_| unknown())?;
        let index = index.parse::<u8>().map_err(|_| unknown())?;
        Zone::new(region, index).map_err(|_| unknown())
    }
}

// ============ Locality ============

/// The dimension along which a resource is partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalityKind {
    /// Partitioned per region.
    Region,
    /// Partitioned per zone.
    Zone,
    /// Not partitioned.
    Global,
}

impl LocalityKind {
    /// Name of the state attribute carrying this locality, if any.
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Region => Some("region"),
            Self::Zone => Some("zone"),
            Self::Global => None,
        }
    }
}

impl fmt::Display for LocalityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region => f.write_str("region"),
            Self::Zone => f.write_str("zone"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// A concrete locality value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    /// A region.
    Region(Region),
    /// A zone.
    Zone(Zone),
    /// No locality.
    Global,
}

impl Locality {
    /// The kind of this locality.
    pub fn kind(self) -> LocalityKind {
        match self {
            Self::Region(_) => LocalityKind::Region,
            Self::Zone(_) => LocalityKind::Zone,
            Self::Global => LocalityKind::Global,
        }
    }

    /// The region this locality lives in, if any. A zone reports its parent region.
    pub fn region(self) -> Option<Region> {
        match self {
            Self::Region(r) => Some(r),
            Self::Zone(z) => Some(z.region()),
            Self::Global => None,
        }
    }

    /// The zone, if this is a zonal locality.
    pub fn zone(self) -> Option<Zone> {
        match self {
            Self::Zone(z) => Some(z),
            _ => None,
        }
    }

    /// Parse a locality of the given kind.
    ///
    /// `Global` accepts only the empty string.
    pub fn parse_as(kind: LocalityKind, s: &str) -> Result<Self, UnknownLocality> {
        match kind {
            LocalityKind::Region => s.parse().map(Self::Region),
            LocalityKind::Zone => s.parse().map(Self::Zone),
            LocalityKind::Global if s.is_empty() => Ok(Self::Global),
            LocalityKind::Global => Err(UnknownLocality(s.to_string())),
        }
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region(r) => r.fmt(f),
            Self::Zone(z) => z.fmt(f),
            Self::Global => Ok(()),
        }
    }
}

impl FromStr for Locality {
    type Err = UnknownLocality;

    /// Zones are tried before regions since every zone slug extends a region slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Zone>()
            .map(Self::Zone)
            .or_else(|_| s.parse::<Region>().map(Self::Region))
    }
}

/// A locality string outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown locality '{0}'")]
pub struct UnknownLocality(pub String);

// ============ Serde ============

macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_str!(Region);
serde_via_str!(Zone);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parse_and_display() {
        for r in Region::ALL {
            assert_eq!(r.as_str().parse::<Region>(), Ok(r));
        }
        assert_eq!("nl-ams".parse::<Region>(), Ok(Region::NlAms));
    }

    #[test]
    fn region_unknown_rejected() {
        assert!("us-east".parse::<Region>().is_err());
        assert!("FR-PAR".parse::<Region>().is_err());
        assert!("".parse::<Region>().is_err());
    }

    #[test]
    fn zone_parse() {
        let z: Zone = "fr-par-2".parse().unwrap();
        assert_eq!(z.region(), Region::FrPar);
        assert_eq!(z.index(), 2);
        assert_eq!(z.to_string(), "fr-par-2");
    }

    #[test]
    fn zone_out_of_catalog_rejected() {
        assert!("fr-par-4".parse::<Zone>().is_err());
        assert!("fr-par-0".parse::<Zone>().is_err());
        assert!("fr-par-11".parse::<Zone>().is_err());
        assert!("fr-par".parse::<Zone>().is_err());
        assert!("xx-yyy-1".parse::<Zone>().is_err());
    }

    #[test]
    fn region_contains_its_zones() {
        for r in Region::ALL {
            for z in r.zones() {
                assert_eq!(z.region(), r);
            }
        }
        assert_eq!(Zone::all().count(), 9);
    }

    #[test]
    fn locality_prefers_zone() {
        assert!(matches!("pl-waw-1".parse::<Locality>(), Ok(Locality::Zone(_))));
        assert!(matches!("pl-waw".parse::<Locality>(), Ok(Locality::Region(Region::PlWaw))));
    }

    #[test]
    fn locality_parse_as_kind() {
        assert!(Locality::parse_as(LocalityKind::Region, "fr-par-1").is_err());
        assert!(Locality::parse_as(LocalityKind::Zone, "fr-par").is_err());
        assert_eq!(Locality::parse_as(LocalityKind::Global, ""), Ok(Locality::Global));
    }

    #[test]
    fn zone_locality_reports_parent_region() {
        let l = Locality::Zone("nl-ams-3".parse().unwrap());
        assert_eq!(l.region(), Some(Region::NlAms));
        assert_eq!(Locality::Global.region(), None);
    }

    #[test]
    fn region_serde_as_slug() {
        let json = serde_json::to_string(&Region::PlWaw).unwrap();
        assert_eq!(json, "\"pl-waw\"");
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Region::PlWaw);
        assert!(serde_json::from_str::<Region>("\"mars-1\"").is_err());
    }
}
