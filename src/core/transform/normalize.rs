//! Row to canonical record mapping

use super::identity::external_id;
use crate::domain::{CanonicalRecord, DomainTag, FichaId, Patient, Procedure, Professional, RawRow, Unit};
use chrono::NaiveDate;

/// Render a date as `YYYY-MM-DD`
fn iso_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Map one row into a canonical record
///
/// Returns `None` when the row has no usable ficha UUID: such a row has no
/// stable identity and cannot be upserted.
pub fn normalize_row(row: RawRow) -> Option<CanonicalRecord> {
    let ficha = FichaId::new(row.ficha_uuid.clone()?).ok()?;
    let external_id = external_id(&ficha, &row);

    Some(CanonicalRecord {
        external_id,
        professional: Professional {
            name: row.professional_name,
            cns: row.professional_cns,
            occupation_code: row.occupation_code,
        },
        patient: Patient {
            name: row.patient_name,
            cns: row.patient_cns,
            sex: row.patient_sex,
            cpf: row.patient_cpf,
            birth_date: iso_date(row.birth_date),
        },
        unit: Unit {
            facility_code: row.facility_code,
        },
        procedure: Procedure {
            code: row.procedure_code,
            name: row.procedure_name,
            domain: row.domain,
            cid: row.cid_code,
            ciap: row.ciap_code,
        },
        production_date: iso_date(row.production_date),
    })
}

/// Result of normalizing a cycle's rows
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Records in extraction order
    pub records: Vec<CanonicalRecord>,
    /// Rows dropped for lacking a ficha, per domain
    pub skipped: Vec<(DomainTag, usize)>,
}

impl Normalized {
    pub fn skipped_total(&self) -> usize {
        self.skipped.iter().map(|(_, count)| count).sum()
    }
}

/// Map every row, keeping extraction order and counting dropped rows
pub fn normalize_rows(rows: impl IntoIterator<Item = RawRow>) -> Normalized {
    let mut normalized = Normalized::default();

    for row in rows {
        let domain = row.domain;
        match normalize_row(row) {
            Some(record) => normalized.records.push(record),
            None => match normalized.skipped.iter_mut().find(|(tag, _)| *tag == domain) {
                Some((_, count)) => *count += 1,
                None => normalized.skipped.push((domain, 1)),
            },
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_every_field() {
        let mut row = RawRow::new("F1", DomainTag::Procedure)
            .with_procedure("0301010072", "CONSULTA MEDICA")
            .with_production_date(NaiveDate::from_ymd_opt(2024, 2, 12).unwrap());
        row.professional_name = Some("ANA".to_string());
        row.professional_cns = Some("700000000000001".to_string());
        row.occupation_code = Some("225142".to_string());
        row.patient_name = Some("JOAO".to_string());
        row.patient_cpf = Some("12345678900".to_string());
        row.patient_sex = Some("MASCULINO".to_string());
        row.birth_date = NaiveDate::from_ymd_opt(1990, 1, 5);
        row.facility_code = Some("2345678".to_string());

        let record = normalize_row(row).unwrap();

        assert_eq!(record.external_id.as_str(), "F1_0301010072");
        assert_eq!(record.professional.occupation_code.as_deref(), Some("225142"));
        assert_eq!(record.patient.birth_date.as_deref(), Some("1990-01-05"));
        assert_eq!(record.patient.cpf.as_deref(), Some("12345678900"));
        assert_eq!(record.unit.facility_code.as_deref(), Some("2345678"));
        assert_eq!(record.procedure.domain, DomainTag::Procedure);
        assert_eq!(record.production_date.as_deref(), Some("2024-02-12"));
    }

    #[test]
    fn test_missing_dates_are_absent_not_empty() {
        let record = normalize_row(RawRow::new("F1", DomainTag::Odontology)).unwrap();
        assert_eq!(record.patient.birth_date, None);
        assert_eq!(record.production_date, None);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["productionDate"].is_null());
    }

    #[test]
    fn test_rows_without_ficha_are_skipped() {
        let mut no_ficha = RawRow::new("x", DomainTag::Vaccination);
        no_ficha.ficha_uuid = None;
        let blank = RawRow::new("  ", DomainTag::Vaccination);
        let good = RawRow::new("F9", DomainTag::Consultation);

        let normalized = normalize_rows(vec![no_ficha, blank, good]);

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].external_id.as_str(), "F9");
        assert_eq!(normalized.skipped, vec![(DomainTag::Vaccination, 2)]);
        assert_eq!(normalized.skipped_total(), 2);
    }
}
