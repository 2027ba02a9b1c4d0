//! Query composition per domain

use super::catalogue::{
    DomainSpec, COLLECTIVE_PARTICIPANT_TABLE, COLLECTIVE_TABLE, HOME_VISIT_DIAGNOSIS_TABLE,
    HOME_VISIT_TABLE, VACCINE_ITEM_TABLE,
};
use super::fragments::{
    resolve_collective, resolve_home_visit_diagnosis, resolve_vaccination_detail,
    CollectiveShape, DiagnosisLink, COLLECTIVE_PROFESSIONAL_PLACEHOLDER,
};
use super::select::SelectShape;
use crate::core::schema::SchemaProfile;
use crate::domain::DomainTag;

/// Outcome of composing one domain's extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposedQuery {
    /// Statement ready to run with the window start bound to `$1`
    Ready(String),
    /// Domain cannot run on this installation
    Skip(String),
}

/// Composed query plus any degradation notices raised while resolving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub domain: DomainTag,
    pub query: ComposedQuery,
    pub warnings: Vec<String>,
}

/// Fact-table column names for the standard dimension joins
struct FactColumns<'a> {
    alias: &'a str,
    professional: &'a str,
    occupation: &'a str,
    facility: &'a str,
}

impl FactColumns<'_> {
    /// Columns of the attendance fact tables, which carry `_1` suffixed links
    fn attendance(alias: &str) -> FactColumns<'_> {
        FactColumns {
            alias,
            professional: "co_dim_profissional_1",
            occupation: "co_dim_cbo_1",
            facility: "co_dim_unidade_saude_1",
        }
    }

    fn plain(alias: &str) -> FactColumns<'_> {
        FactColumns {
            alias,
            professional: "co_dim_profissional",
            occupation: "co_dim_cbo",
            facility: "co_dim_unidade_saude",
        }
    }

    /// Professional, occupation, citizen, facility, time and sex joins plus
    /// the columns they feed
    fn apply(&self, shape: SelectShape) -> SelectShape {
        let a = self.alias;
        shape
            .join(format!(
                "LEFT JOIN tb_dim_profissional prof ON {a}.{} = prof.co_seq_dim_profissional",
                self.professional
            ))
            .join(format!(
                "LEFT JOIN tb_dim_cbo cbo ON {a}.{} = cbo.co_seq_dim_cbo",
                self.occupation
            ))
            .join(format!(
                "LEFT JOIN tb_fat_cidadao_pec cid ON {a}.co_fat_cidadao_pec = cid.co_seq_fat_cidadao_pec"
            ))
            .join(format!(
                "LEFT JOIN tb_dim_unidade_saude unid ON {a}.{} = unid.co_seq_dim_unidade_saude",
                self.facility
            ))
            .join(format!(
                "LEFT JOIN tb_dim_tempo tempo ON {a}.co_dim_tempo = tempo.co_seq_dim_tempo"
            ))
            .join(format!(
                "LEFT JOIN tb_dim_sexo sex ON {a}.co_dim_sexo = sex.co_seq_dim_sexo"
            ))
            .column("ficha_uuid", format!("{a}.nu_uuid_ficha"))
            .column("professional_name", "prof.no_profissional")
            .column("professional_cns", "prof.nu_cns")
            .column("occupation_code", "cbo.nu_cbo")
            .column("patient_name", "cid.no_cidadao")
            .column("patient_cns", "cid.nu_cns")
            .column("patient_sex", "sex.ds_sexo")
            .column("patient_cpf", "cid.nu_cpf_cidadao")
            .column("birth_date", format!("{a}.dt_nascimento"))
            .column("facility_code", "unid.nu_cnes")
            .column("production_date", "tempo.dt_registro")
    }
}

const PROCEDURE_JOIN: &str = "co_dim_procedimento = proc.co_seq_dim_procedimento";

/// Builds extraction statements from a schema snapshot
pub struct QueryComposer<'a> {
    profile: &'a SchemaProfile,
}

impl<'a> QueryComposer<'a> {
    pub fn new(profile: &'a SchemaProfile) -> Self {
        Self { profile }
    }

    /// Compose the extraction for one domain
    pub fn compose(&self, spec: &DomainSpec) -> Composition {
        let mut warnings = Vec::new();
        let query = match spec.tag {
            DomainTag::Procedure => ComposedQuery::Ready(procedures(spec)),
            DomainTag::Consultation => ComposedQuery::Ready(consultations(spec)),
            DomainTag::Odontology => ComposedQuery::Ready(odontology(spec)),
            DomainTag::Vaccination => ComposedQuery::Ready(self.vaccination(spec)),
            DomainTag::OdontoProcedure => ComposedQuery::Ready(odonto_procedures(spec)),
            DomainTag::HomeVisit => ComposedQuery::Ready(self.home_visits(spec, &mut warnings)),
            DomainTag::CollectiveActivity => self.collective(spec, &mut warnings),
        };

        Composition {
            domain: spec.tag,
            query,
            warnings,
        }
    }

    fn vaccination(&self, spec: &DomainSpec) -> String {
        let detail = resolve_vaccination_detail(self.profile.columns(VACCINE_ITEM_TABLE));
        tracing::debug!(detail = ?detail, "Resolved vaccination detail columns");

        let mut shape = FactColumns::plain("vac")
            .apply(SelectShape::from(spec.fact_table, "vac"))
            .join(format!(
                "JOIN {VACCINE_ITEM_TABLE} vac_item ON vac.co_seq_fat_vacinacao = vac_item.co_fat_vacinacao"
            ))
            .join("LEFT JOIN tb_dim_imunobiologico imuno ON vac_item.co_dim_imunobiologico = imuno.co_seq_dim_imunobiologico")
            .join("LEFT JOIN tb_dim_dose_imunobiologico dose ON vac_item.co_dim_dose_imunobiologico = dose.co_seq_dim_dose_imunobiologico");
        for join in detail.joins() {
            shape = shape.join(join);
        }

        shape
            .column("procedure_code", "imuno.nu_identificador")
            .column(
                "procedure_name",
                format!(
                    "CONCAT(imuno.no_imunobiologico, ' - ', dose.no_dose_imunobiologico{})",
                    detail.description_suffix()
                ),
            )
            .literal("domain_tag", spec.tag.as_str())
            .render()
    }

    fn home_visits(&self, spec: &DomainSpec, warnings: &mut Vec<String>) -> String {
        let link = resolve_home_visit_diagnosis(
            self.profile.columns(HOME_VISIT_TABLE),
            self.profile.columns(HOME_VISIT_DIAGNOSIS_TABLE),
        );

        let mut shape = FactColumns::attendance("fad")
            .apply(SelectShape::from(spec.fact_table, "fad"))
            .literal("procedure_code", "DOMICILIAR")
            .literal("procedure_name", "VISITA DOMICILIAR")
            .literal("domain_tag", spec.tag.as_str());

        match link {
            DiagnosisLink::Linked {
                parent_pk,
                child_fk,
            } => {
                shape = shape
                    .join(format!(
                        "LEFT JOIN {HOME_VISIT_DIAGNOSIS_TABLE} adpc ON fad.{parent_pk} = adpc.{child_fk}"
                    ))
                    .join("LEFT JOIN tb_dim_cid dim_cid ON adpc.co_dim_cid = dim_cid.co_seq_dim_cid")
                    .join("LEFT JOIN tb_dim_ciap dim_ciap ON adpc.co_dim_ciap = dim_ciap.co_seq_dim_ciap")
                    .column("cid_code", "dim_cid.nu_cid")
                    .column("ciap_code", "dim_ciap.nu_ciap");
            }
            DiagnosisLink::NoChildTable => {}
            DiagnosisLink::Unresolved { available } => {
                warnings.push(format!(
                    "Skipping Home Visit diagnoses: link column not found. Available: {}",
                    available.join(", ")
                ));
            }
        }

        shape.render()
    }

    fn collective(&self, spec: &DomainSpec, warnings: &mut Vec<String>) -> ComposedQuery {
        let shape = resolve_collective(
            self.profile.columns(COLLECTIVE_TABLE),
            self.profile.columns(COLLECTIVE_PARTICIPANT_TABLE),
        );

        let (activity_pk, participant_fk, professional_column, procedure_column) = match shape {
            CollectiveShape::Missing { tables } => {
                return ComposedQuery::Skip(format!("missing table(s): {}", tables.join(", ")));
            }
            CollectiveShape::Available {
                activity_pk,
                participant_fk,
                professional_column,
                procedure_column,
            } => (activity_pk, participant_fk, professional_column, procedure_column),
        };

        let mut select = SelectShape::from(spec.fact_table, "fac")
            .join(format!(
                "JOIN {COLLECTIVE_PARTICIPANT_TABLE} part ON fac.{activity_pk} = part.{participant_fk}"
            ))
            .join("LEFT JOIN tb_fat_cidadao_pec cid ON part.co_fat_cidadao_pec = cid.co_seq_fat_cidadao_pec")
            .join("LEFT JOIN tb_dim_tempo tempo ON fac.co_dim_tempo = tempo.co_seq_dim_tempo")
            .join("LEFT JOIN tb_dim_sexo sex ON cid.co_dim_sexo = sex.co_seq_dim_sexo")
            .join("LEFT JOIN tb_dim_tempo tempo_nasc ON cid.co_dim_tempo_nascimento = tempo_nasc.co_seq_dim_tempo")
            .column("ficha_uuid", "fac.nu_uuid_ficha")
            .column("patient_name", "cid.no_cidadao")
            .column("patient_cns", "cid.nu_cns")
            .column("patient_sex", "sex.ds_sexo")
            .column("patient_cpf", "cid.nu_cpf_cidadao")
            .column("birth_date", "tempo_nasc.dt_registro")
            .column("production_date", "tempo.dt_registro")
            .literal("domain_tag", spec.tag.as_str());

        match professional_column {
            Some(col) => {
                select = select
                    .join(format!(
                        "LEFT JOIN tb_dim_profissional prof ON fac.{col} = prof.co_seq_dim_profissional"
                    ))
                    .column("professional_name", "prof.no_profissional")
                    .column("professional_cns", "prof.nu_cns");
            }
            None => {
                warnings.push(
                    "Collective Activity: professional column not found, sending placeholder professional"
                        .to_string(),
                );
                select = select.literal("professional_name", COLLECTIVE_PROFESSIONAL_PLACEHOLDER);
            }
        }

        select = match procedure_column {
            Some(col) => select
                .join(format!("LEFT JOIN tb_dim_procedimento proc ON fac.{col} = proc.co_seq_dim_procedimento"))
                .column("procedure_code", "COALESCE(proc.co_proced, 'ATIV_COLETIVA')")
                .column("procedure_name", "COALESCE(proc.ds_proced, 'ATIVIDADE COLETIVA')"),
            None => select
                .literal("procedure_code", "ATIV_COLETIVA")
                .literal("procedure_name", "ATIVIDADE COLETIVA"),
        };

        ComposedQuery::Ready(select.render())
    }
}

fn procedures(spec: &DomainSpec) -> String {
    FactColumns::plain("pap")
        .apply(SelectShape::from(spec.fact_table, "pap"))
        .join(format!("LEFT JOIN tb_dim_procedimento proc ON pap.{PROCEDURE_JOIN}"))
        .column("procedure_code", "proc.co_proced")
        .column("procedure_name", "proc.ds_proced")
        .literal("domain_tag", spec.tag.as_str())
        .render()
}

fn consultations(spec: &DomainSpec) -> String {
    FactColumns::attendance("fai")
        .apply(SelectShape::from(spec.fact_table, "fai"))
        .join("LEFT JOIN tb_fat_atd_ind_problemas prob ON fai.co_seq_fat_atd_ind = prob.co_fat_atd_ind")
        .join("LEFT JOIN tb_dim_cid dim_cid ON prob.co_dim_cid = dim_cid.co_seq_dim_cid")
        .join("LEFT JOIN tb_dim_ciap dim_ciap ON prob.co_dim_ciap = dim_ciap.co_seq_dim_ciap")
        .literal("procedure_code", "CONSULTA")
        .literal("procedure_name", "ATENDIMENTO INDIVIDUAL")
        .literal("domain_tag", spec.tag.as_str())
        .column("cid_code", "dim_cid.nu_cid")
        .column("ciap_code", "dim_ciap.nu_ciap")
        .render()
}

fn odontology(spec: &DomainSpec) -> String {
    FactColumns::attendance("fao")
        .apply(SelectShape::from(spec.fact_table, "fao"))
        .literal("procedure_code", "ODONTO")
        .literal("procedure_name", "ATENDIMENTO ODONTOLOGICO")
        .literal("domain_tag", spec.tag.as_str())
        .render()
}

fn odonto_procedures(spec: &DomainSpec) -> String {
    // Rooted at the procedure table; dimensions come from the parent attendance.
    let shape = SelectShape::from(spec.fact_table, "faop")
        .join("JOIN tb_fat_atendimento_odonto fao ON faop.co_fat_atd_odnt = fao.co_seq_fat_atd_odnt")
        .join(format!("LEFT JOIN tb_dim_procedimento proc ON faop.{PROCEDURE_JOIN}"));

    FactColumns::attendance("fao")
        .apply(shape)
        .column("procedure_code", "proc.co_proced")
        .column("procedure_name", "proc.ds_proced")
        .literal("domain_tag", spec.tag.as_str())
        .render()
}
