//! Clinical domain tags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One clinical activity category extracted from the source database.
///
/// The declaration order is the extraction order used by every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainTag {
    /// Procedures recorded on a procedure sheet
    Procedure,
    /// Individual consultations with their diagnoses
    Consultation,
    /// Dental attendances
    Odontology,
    /// Immunizations
    Vaccination,
    /// Procedures recorded on a dental attendance
    OdontoProcedure,
    /// Home visits with their diagnoses
    HomeVisit,
    /// Collective activities, one record per participant
    CollectiveActivity,
}

impl DomainTag {
    /// All domains in extraction order
    pub const ALL: [DomainTag; 7] = [
        DomainTag::Procedure,
        DomainTag::Consultation,
        DomainTag::Odontology,
        DomainTag::Vaccination,
        DomainTag::OdontoProcedure,
        DomainTag::HomeVisit,
        DomainTag::CollectiveActivity,
    ];

    /// Wire representation used in SQL literals and JSON payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainTag::Procedure => "PROCEDURE",
            DomainTag::Consultation => "CONSULTATION",
            DomainTag::Odontology => "ODONTOLOGY",
            DomainTag::Vaccination => "VACCINATION",
            DomainTag::OdontoProcedure => "ODONTO_PROCEDURE",
            DomainTag::HomeVisit => "HOME_VISIT",
            DomainTag::CollectiveActivity => "COLLECTIVE_ACTIVITY",
        }
    }

    /// Human readable label for progress messages
    pub fn label(&self) -> &'static str {
        match self {
            DomainTag::Procedure => "Procedures",
            DomainTag::Consultation => "Consultations",
            DomainTag::Odontology => "Odontology (Attendance)",
            DomainTag::Vaccination => "Vaccination",
            DomainTag::OdontoProcedure => "Odonto Procedures",
            DomainTag::HomeVisit => "Home Visits",
            DomainTag::CollectiveActivity => "Collective Activity",
        }
    }

    /// One-based position in the extraction order
    pub fn position(&self) -> usize {
        DomainTag::ALL
            .iter()
            .position(|tag| tag == self)
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DomainTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("Unknown domain tag: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_tags() {
        for tag in DomainTag::ALL {
            assert_eq!(DomainTag::from_str(tag.as_str()).unwrap(), tag);
        }
    }

    #[test]
    fn test_positions_follow_extraction_order() {
        assert_eq!(DomainTag::Procedure.position(), 1);
        assert_eq!(DomainTag::Vaccination.position(), 4);
        assert_eq!(DomainTag::CollectiveActivity.position(), 7);
    }

    #[test]
    fn test_serde_matches_wire_name() {
        let json = serde_json::to_string(&DomainTag::OdontoProcedure).unwrap();
        assert_eq!(json, "\"ODONTO_PROCEDURE\"");
    }

    #[test]
    fn test_unknown_tag() {
        assert!(DomainTag::from_str("LAB_RESULT").is_err());
    }
}
