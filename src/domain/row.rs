//! Raw rows returned by domain extraction queries

use super::tag::DomainTag;
use chrono::NaiveDate;

/// Column aliases every composed extraction query projects, in order.
///
/// Rows are decoded by alias, never by position.
pub const ROW_COLUMNS: [&str; 16] = [
    "ficha_uuid",
    "professional_name",
    "professional_cns",
    "occupation_code",
    "patient_name",
    "patient_cns",
    "patient_sex",
    "patient_cpf",
    "birth_date",
    "facility_code",
    "procedure_code",
    "procedure_name",
    "production_date",
    "domain_tag",
    "cid_code",
    "ciap_code",
];

/// One row of a domain extraction query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub ficha_uuid: Option<String>,
    pub professional_name: Option<String>,
    pub professional_cns: Option<String>,
    pub occupation_code: Option<String>,
    pub patient_name: Option<String>,
    pub patient_cns: Option<String>,
    pub patient_sex: Option<String>,
    pub patient_cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub facility_code: Option<String>,
    pub procedure_code: Option<String>,
    pub procedure_name: Option<String>,
    pub production_date: Option<NaiveDate>,
    pub domain: DomainTag,
    pub cid_code: Option<String>,
    pub ciap_code: Option<String>,
}

impl RawRow {
    /// A row carrying only the ficha and domain; every other column is null
    pub fn new(ficha_uuid: impl Into<String>, domain: DomainTag) -> Self {
        Self {
            ficha_uuid: Some(ficha_uuid.into()),
            professional_name: None,
            professional_cns: None,
            occupation_code: None,
            patient_name: None,
            patient_cns: None,
            patient_sex: None,
            patient_cpf: None,
            birth_date: None,
            facility_code: None,
            procedure_code: None,
            procedure_name: None,
            production_date: None,
            domain,
            cid_code: None,
            ciap_code: None,
        }
    }

    pub fn with_procedure(mut self, code: &str, name: &str) -> Self {
        self.procedure_code = Some(code.to_string());
        self.procedure_name = Some(name.to_string());
        self
    }

    pub fn with_patient_cns(mut self, cns: &str) -> Self {
        self.patient_cns = Some(cns.to_string());
        self
    }

    pub fn with_diagnosis(mut self, cid: Option<&str>, ciap: Option<&str>) -> Self {
        self.cid_code = cid.map(str::to_string);
        self.ciap_code = ciap.map(str::to_string);
        self
    }

    pub fn with_production_date(mut self, date: NaiveDate) -> Self {
        self.production_date = Some(date);
        self
    }
}
