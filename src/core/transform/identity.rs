//! External identity rules
//!
//! The endpoint upserts by `externalId`, so the id must be stable across runs
//! and distinct for sub-events that share one ficha.

use crate::domain::{DomainTag, ExternalId, FichaId, RawRow};

/// Placeholder used when a collective activity participant has no CNS
pub const NO_CNS: &str = "NOCNS";

/// Non-blank value of an optional column
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Derive the external id of a row
///
/// - procedures and dental procedures with a code: `<ficha>_<code>`
/// - collective activity: `<ficha>_<patient CNS or NOCNS>`
/// - home visit: `<ficha>[_<CID>][_<CIAP>]`
/// - everything else: the ficha itself
pub fn external_id(ficha: &FichaId, row: &RawRow) -> ExternalId {
    let base = ExternalId::from_ficha(ficha);

    match row.domain {
        DomainTag::Procedure | DomainTag::OdontoProcedure => match present(&row.procedure_code) {
            Some(code) => base.with_suffix(code),
            None => base,
        },
        DomainTag::CollectiveActivity => {
            base.with_suffix(present(&row.patient_cns).unwrap_or(NO_CNS))
        }
        DomainTag::HomeVisit => [present(&row.cid_code), present(&row.ciap_code)]
            .into_iter()
            .flatten()
            .fold(base, |id, code| id.with_suffix(code)),
        DomainTag::Consultation | DomainTag::Odontology | DomainTag::Vaccination => base,
    }
}
