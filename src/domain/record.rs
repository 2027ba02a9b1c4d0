//! Canonical record sent to the ingestion endpoint
//!
//! Every clinical domain is normalized into this single shape. Field names
//! follow the endpoint's JSON contract (camelCase).

use super::ids::ExternalId;
use super::tag::DomainTag;
use serde::{Deserialize, Serialize};

/// Normalized output unit of a sync cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// Stable identity used by the endpoint for upserts
    pub external_id: ExternalId,
    pub professional: Professional,
    pub patient: Patient,
    pub unit: Unit,
    pub procedure: Procedure,
    /// ISO date (`YYYY-MM-DD`), `null` when the source has none
    pub production_date: Option<String>,
}

/// Attending professional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub name: Option<String>,
    pub cns: Option<String>,
    /// CBO occupation code
    pub occupation_code: Option<String>,
}

/// Patient (citizen) data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: Option<String>,
    pub cns: Option<String>,
    pub sex: Option<String>,
    pub cpf: Option<String>,
    /// ISO date (`YYYY-MM-DD`), `null` when unknown
    pub birth_date: Option<String>,
}

/// Health facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// CNES facility code
    pub facility_code: Option<String>,
}

/// Procedure or activity performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub code: Option<String>,
    pub name: Option<String>,
    pub domain: DomainTag,
    pub cid: Option<String>,
    pub ciap: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::FichaId;

    #[test]
    fn test_wire_shape() {
        let record = CanonicalRecord {
            external_id: ExternalId::from_ficha(&FichaId::new("F1").unwrap()).with_suffix("C1"),
            professional: Professional {
                name: Some("ANA".to_string()),
                cns: Some("700000000000001".to_string()),
                occupation_code: Some("225142".to_string()),
            },
            patient: Patient {
                name: Some("JOAO".to_string()),
                cns: None,
                sex: Some("MASCULINO".to_string()),
                cpf: None,
                birth_date: None,
            },
            unit: Unit {
                facility_code: Some("2345678".to_string()),
            },
            procedure: Procedure {
                code: Some("C1".to_string()),
                name: Some("CURATIVO".to_string()),
                domain: DomainTag::Procedure,
                cid: None,
                ciap: None,
            },
            production_date: Some("2024-02-12".to_string()),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["externalId"], "F1_C1");
        assert_eq!(json["professional"]["occupationCode"], "225142");
        assert_eq!(json["unit"]["facilityCode"], "2345678");
        assert_eq!(json["procedure"]["domain"], "PROCEDURE");
        assert_eq!(json["productionDate"], "2024-02-12");
        assert!(json["patient"]["birthDate"].is_null());
    }
}
