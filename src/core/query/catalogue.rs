//! Static per-domain descriptors

use crate::domain::DomainTag;

pub const VACCINE_ITEM_TABLE: &str = "tb_fat_vacinacao_vacina";
pub const HOME_VISIT_TABLE: &str = "tb_fat_atendimento_domiciliar";
pub const HOME_VISIT_DIAGNOSIS_TABLE: &str = "tb_fat_atend_dom_prob_cond";
pub const COLLECTIVE_TABLE: &str = "tb_fat_atividade_coletiva";
pub const COLLECTIVE_PARTICIPANT_TABLE: &str = "tb_fat_atvdd_coletiva_part";

/// Extraction descriptor for one clinical domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSpec {
    /// Domain this spec extracts
    pub tag: DomainTag,

    /// Fact table the extraction is rooted at
    pub fact_table: &'static str,

    /// Tables whose columns decide optional fragments
    pub probes: &'static [&'static str],
}

/// Every domain, in extraction order
pub const CATALOGUE: [DomainSpec; 7] = [
    DomainSpec {
        tag: DomainTag::Procedure,
        fact_table: "tb_fat_proced_atend_proced",
        probes: &[],
    },
    DomainSpec {
        tag: DomainTag::Consultation,
        fact_table: "tb_fat_atendimento_individual",
        probes: &[],
    },
    DomainSpec {
        tag: DomainTag::Odontology,
        fact_table: "tb_fat_atendimento_odonto",
        probes: &[],
    },
    DomainSpec {
        tag: DomainTag::Vaccination,
        fact_table: "tb_fat_vacinacao",
        probes: &[VACCINE_ITEM_TABLE],
    },
    DomainSpec {
        tag: DomainTag::OdontoProcedure,
        fact_table: "tb_fat_atend_odonto_proced",
        probes: &[],
    },
    DomainSpec {
        tag: DomainTag::HomeVisit,
        fact_table: HOME_VISIT_TABLE,
        probes: &[HOME_VISIT_TABLE, HOME_VISIT_DIAGNOSIS_TABLE],
    },
    DomainSpec {
        tag: DomainTag::CollectiveActivity,
        fact_table: COLLECTIVE_TABLE,
        probes: &[COLLECTIVE_TABLE, COLLECTIVE_PARTICIPANT_TABLE],
    },
];

impl DomainSpec {
    /// Descriptor of a domain
    pub fn of(tag: DomainTag) -> &'static DomainSpec {
        // CATALOGUE follows DomainTag::ALL, so the position always indexes it.
        &CATALOGUE[tag.position() - 1]
    }
}

/// Every table any domain probes, deduplicated, in catalogue order
pub fn probed_tables() -> Vec<&'static str> {
    let mut tables: Vec<&'static str> = Vec::new();
    for table in CATALOGUE.iter().flat_map(|spec| spec.probes.iter().copied()) {
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_follows_extraction_order() {
        let tags: Vec<DomainTag> = CATALOGUE.iter().map(|spec| spec.tag).collect();
        assert_eq!(tags, DomainTag::ALL.to_vec());

        for tag in DomainTag::ALL {
            assert_eq!(DomainSpec::of(tag).tag, tag);
        }
    }

    #[test]
    fn test_probed_tables_are_unique() {
        assert_eq!(
            probed_tables(),
            vec![
                VACCINE_ITEM_TABLE,
                HOME_VISIT_TABLE,
                HOME_VISIT_DIAGNOSIS_TABLE,
                COLLECTIVE_TABLE,
                COLLECTIVE_PARTICIPANT_TABLE,
            ]
        );
    }
}
