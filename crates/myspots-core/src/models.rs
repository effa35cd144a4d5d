//! Data models for MySpots
//!
//! Defines the records read from the record store: places and categories.
//! Both are read fresh from Airtable at the start of each run and never
//! persisted locally.

/// A status flag on a place
///
/// Flags drive export policy: `PermanentlyClosed` and `Lame` exclude a place
/// from export entirely, while `Favorite`/`Queued`/`Visited` select the
/// marker color. Flags outside the known vocabulary are kept as `Other` but
/// have no effect on export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    Visited,
    Queued,
    Favorite,
    Lame,
    PermanentlyClosed,
    Reviewed,
    Other(String),
}

impl Flag {
    /// Get the flag name as stored in the record store
    pub fn name(&self) -> &str {
        match self {
            Flag::Visited => "Visited",
            Flag::Queued => "Queued",
            Flag::Favorite => "Favorite",
            Flag::Lame => "Lame",
            Flag::PermanentlyClosed => "Permanently Closed",
            Flag::Reviewed => "Reviewed",
            Flag::Other(name) => name,
        }
    }
}

impl From<&str> for Flag {
    fn from(name: &str) -> Self {
        match name {
            "Visited" => Flag::Visited,
            "Queued" => Flag::Queued,
            "Favorite" => Flag::Favorite,
            "Lame" => Flag::Lame,
            "Permanently Closed" => Flag::PermanentlyClosed,
            "Reviewed" => Flag::Reviewed,
            other => Flag::Other(other.to_string()),
        }
    }
}

impl From<String> for Flag {
    fn from(name: String) -> Self {
        Flag::from(name.as_str())
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A category record from the record store
///
/// Categories form a tree via `parent_id`; the tree is rebuilt from these
/// flat records on every export run.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    /// Record store identifier (opaque, stable)
    pub id: String,
    /// Display name
    pub name: String,
    /// Google My Maps icon code (drives marker styling)
    pub icon_code: Option<String>,
    /// Parent category record id, if any
    pub parent_id: Option<String>,
}

/// A place record from the record store
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRecord {
    /// Record store identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Formatted address
    pub address: String,
    /// Website URL, if known
    pub website: Option<String>,
    /// Latitude in decimal degrees (WGS84)
    pub latitude: f64,
    /// Longitude in decimal degrees (WGS84)
    pub longitude: f64,
    /// Google place id (used for dedup on insert)
    pub google_place_id: String,
    /// Raw provider payload as JSON text
    pub google_json_data: String,
    /// Referenced category record ids
    pub category_ids: Vec<String>,
    /// Free-text tags
    pub tags: Vec<String>,
    /// Status flags
    pub flags: Vec<Flag>,
    /// Free-text notes
    pub notes: Option<String>,
}

impl PlaceRecord {
    /// Check whether this place carries the given flag
    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_round_trip() {
        for name in [
            "Visited",
            "Queued",
            "Favorite",
            "Lame",
            "Permanently Closed",
            "Reviewed",
        ] {
            let flag = Flag::from(name);
            assert!(!matches!(flag, Flag::Other(_)));
            assert_eq!(flag.name(), name);
        }
    }

    #[test]
    fn test_unknown_flag_preserved() {
        let flag = Flag::from("Brunch Spot");
        assert_eq!(flag, Flag::Other("Brunch Spot".to_string()));
        assert_eq!(flag.name(), "Brunch Spot");
    }

    #[test]
    fn test_flag_display() {
        assert_eq!(format!("{}", Flag::PermanentlyClosed), "Permanently Closed");
    }

    #[test]
    fn test_has_flag() {
        let place = PlaceRecord {
            id: "rec1".to_string(),
            name: "Tartine".to_string(),
            address: "600 Guerrero St".to_string(),
            website: None,
            latitude: 37.76,
            longitude: -122.42,
            google_place_id: "gp1".to_string(),
            google_json_data: "{}".to_string(),
            category_ids: vec![],
            tags: vec![],
            flags: vec![Flag::Visited, Flag::Favorite],
            notes: None,
        };
        assert!(place.has_flag(&Flag::Favorite));
        assert!(!place.has_flag(&Flag::Queued));
    }
}
