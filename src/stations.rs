//! Station names and the named groups they belong to.

use std::{collections::BTreeSet, fmt};

use crate::error::PlanError;

/// A station identifier, e.g. "CS002" or "DE601".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(String);

impl StationId {
    pub fn new<S: Into<String>>(name: S) -> StationId {
        StationId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Core stations sit in the central few kilometres.
    pub fn is_core(&self) -> bool {
        SUPERTERP.contains(&self.as_str()) || CORE_OUTSIDE_SUPERTERP.contains(&self.as_str())
    }

    pub fn is_remote(&self) -> bool {
        REMOTE.contains(&self.as_str())
    }

    /// Outside the Netherlands.
    pub fn is_international(&self) -> bool {
        INTERNATIONAL.contains(&self.as_str())
    }

    pub fn is_known(&self) -> bool {
        self.is_core() || self.is_remote() || self.is_international()
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered unique station identifiers. Cloning gives an independent copy.
pub type StationSet = BTreeSet<StationId>;

const SUPERTERP: &[&str] = &["CS002", "CS003", "CS004", "CS005", "CS006", "CS007"];

const CORE_OUTSIDE_SUPERTERP: &[&str] = &[
    "CS001", "CS011", "CS013", "CS017", "CS021", "CS024", "CS026", "CS028", "CS030", "CS031",
    "CS032", "CS101", "CS103", "CS201", "CS301", "CS302", "CS401", "CS501",
];

const REMOTE: &[&str] = &[
    "RS106", "RS205", "RS208", "RS210", "RS305", "RS306", "RS307", "RS310", "RS406", "RS407",
    "RS409", "RS503", "RS508", "RS509",
];

const INTERNATIONAL: &[&str] = &[
    "DE601", "DE602", "DE603", "DE604", "DE605", "FR606", "SE607", "UK608", "DE609", "PL610",
    "PL611", "PL612", "IE613",
];

/// Names of the groups [`station_group`] knows.
pub const STATION_GROUPS: &[&str] = &[
    "superterp",
    "core",
    "remote",
    "nl",
    "europe",
    "international",
    "all",
    "none",
];

fn to_set(groups: &[&[&str]]) -> StationSet {
    groups
        .iter()
        .flat_map(|g| g.iter())
        .map(|&s| StationId::new(s))
        .collect()
}

/// The stations in a named group, or `None` if the group isn't known.
pub fn station_group(name: &str) -> Option<StationSet> {
    let set = match name {
        "superterp" => to_set(&[SUPERTERP]),
        "core" => to_set(&[SUPERTERP, CORE_OUTSIDE_SUPERTERP]),
        "remote" => to_set(&[REMOTE]),
        "nl" => to_set(&[SUPERTERP, CORE_OUTSIDE_SUPERTERP, REMOTE]),
        "europe" | "international" => to_set(&[INTERNATIONAL]),
        "all" => to_set(&[SUPERTERP, CORE_OUTSIDE_SUPERTERP, REMOTE, INTERNATIONAL]),
        "none" => StationSet::new(),
        _ => return None,
    };
    Some(set)
}

/// Resolve a named group, add `include` and then drop `exclude`.
///
/// Fails if the group or an included station is unknown, or if nothing is
/// left of a group other than "none".
pub fn resolve_stations(
    group: &str,
    include: &[String],
    exclude: &[String],
) -> Result<StationSet, PlanError> {
    let mut stations = station_group(group).ok_or_else(|| {
        PlanError::InvalidStationSet(format!(
            "unknown station group '{group}'; choose one of: {}",
            STATION_GROUPS.join(", ")
        ))
    })?;
    for s in include {
        let station = StationId::new(s.as_str());
        if !station.is_known() {
            return Err(PlanError::InvalidStationSet(format!(
                "unknown station '{s}' in the include list"
            )));
        }
        stations.insert(station);
    }
    for s in exclude {
        stations.remove(&StationId::new(s.as_str()));
    }

    if stations.is_empty() && group != "none" {
        return Err(PlanError::InvalidStationSet(format!(
            "no stations left in group '{group}' after applying include/exclude lists"
        )));
    }
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_nest() {
        let superterp = station_group("superterp").unwrap();
        let core = station_group("core").unwrap();
        let nl = station_group("nl").unwrap();
        let all = station_group("all").unwrap();
        assert!(superterp.is_subset(&core));
        assert!(core.is_subset(&nl));
        assert!(nl.is_subset(&all));
        assert_eq!(superterp.len(), 6);
        assert!(station_group("mars").is_none());
    }

    #[test]
    fn include_and_exclude() {
        let stations = resolve_stations(
            "core",
            &["RS106".to_string()],
            &["CS002".to_string(), "CS003".to_string()],
        )
        .unwrap();
        assert!(stations.contains(&StationId::new("RS106")));
        assert!(!stations.contains(&StationId::new("CS002")));
        assert!(stations.contains(&StationId::new("CS004")));
    }

    #[test]
    fn bad_groups_fail() {
        assert!(matches!(
            resolve_stations("moon", &[], &[]),
            Err(PlanError::InvalidStationSet(_))
        ));
        let superterp: Vec<String> = SUPERTERP.iter().map(|s| s.to_string()).collect();
        assert!(matches!(
            resolve_stations("superterp", &[], &superterp),
            Err(PlanError::InvalidStationSet(_))
        ));
        assert!(resolve_stations("none", &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn provenance() {
        assert!(StationId::new("CS001").is_core());
        assert!(StationId::new("RS509").is_remote());
        assert!(StationId::new("UK608").is_international());
        let typo = StationId::new("CS02");
        assert!(!typo.is_core());
        assert!(!typo.is_international());
        assert!(!typo.is_known());
    }

    #[test]
    fn unknown_inclusions_fail() {
        let err = resolve_stations("core", &["CS02".to_string()], &[]).unwrap_err();
        match err {
            PlanError::InvalidStationSet(msg) => assert!(msg.contains("CS02"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
        // Excluding a station that isn't there is harmless.
        assert!(resolve_stations("core", &[], &["XX999".to_string()]).is_ok());
    }
}
