//! Optional query fragments
//!
//! Each resolver is a pure function from discovered columns to a tagged
//! choice. The composer turns the choice into joins and select expressions.

use std::collections::BTreeSet;

/// Route column candidates on the vaccine item table, in preference order
pub const ROUTE_COLUMNS: [&str; 2] = ["co_dim_via_adm_vacina", "co_dim_via_administracao"];

/// Application-site column on the vaccine item table
pub const SITE_COLUMN: &str = "co_dim_local_apl_vacina";

/// Default primary key of the home visit fact table
pub const HOME_VISIT_DEFAULT_PK: &str = "co_seq_fat_atendimento_domiciliar";

/// Known names of the diagnosis table's link to the home visit, in preference order
pub const HOME_VISIT_FK_CANDIDATES: [&str; 3] = [
    "co_fat_atendimento_domiciliar",
    "co_fat_atd_dom",
    "co_fat_atd_domiciliar",
];

/// Professional column candidates on the collective activity table
pub const COLLECTIVE_PROFESSIONAL_CANDIDATES: [&str; 3] = [
    "co_dim_profissional_responsavel",
    "co_dim_profissional_1",
    "co_dim_profissional",
];

/// Professional name sent when no professional column resolves
pub const COLLECTIVE_PROFESSIONAL_PLACEHOLDER: &str = "PROFISSIONAL NAO IDENTIFICADO";

const SEQUENCE_PREFIX: &str = "co_seq_";

/// Which optional details the vaccination description carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaccinationDetail {
    /// Neither route nor site columns exist
    Absent,
    /// Only an administration-route column exists
    RouteOnly { route_column: String },
    /// Only the application-site column exists
    SiteOnly { site_column: String },
    /// Both exist
    Both {
        route_column: String,
        site_column: String,
    },
}

impl VaccinationDetail {
    /// Extra joins from the vaccine item table (`vac_item`)
    pub fn joins(&self) -> Vec<String> {
        let route = |col: &str| {
            format!(
                "LEFT JOIN tb_dim_via_administracao via ON vac_item.{col} = via.co_seq_dim_via_administracao"
            )
        };
        let site = |col: &str| {
            format!(
                "LEFT JOIN tb_dim_local_apl_vacina local ON vac_item.{col} = local.co_seq_dim_local_apl_vacina"
            )
        };

        match self {
            VaccinationDetail::Absent => Vec::new(),
            VaccinationDetail::RouteOnly { route_column } => vec![route(route_column)],
            VaccinationDetail::SiteOnly { site_column } => vec![site(site_column)],
            VaccinationDetail::Both {
                route_column,
                site_column,
            } => vec![route(route_column), site(site_column)],
        }
    }

    /// Arguments appended to the description `CONCAT(...)`, route before site
    pub fn description_suffix(&self) -> &'static str {
        match self {
            VaccinationDetail::Absent => "",
            VaccinationDetail::RouteOnly { .. } => {
                ", ' (', COALESCE(via.no_via_administracao, '?'), ')'"
            }
            VaccinationDetail::SiteOnly { .. } => {
                ", ' (', COALESCE(local.ds_local_apl_vacina, '?'), ')'"
            }
            VaccinationDetail::Both { .. } => {
                ", ' (', COALESCE(via.no_via_administracao, '?'), ' / ', COALESCE(local.ds_local_apl_vacina, '?'), ')'"
            }
        }
    }
}

/// Pick the vaccination detail shape from the vaccine item table's columns
pub fn resolve_vaccination_detail(item_columns: &BTreeSet<String>) -> VaccinationDetail {
    let route = ROUTE_COLUMNS
        .iter()
        .find(|col| item_columns.contains(**col))
        .map(|col| col.to_string());
    let site = item_columns
        .contains(SITE_COLUMN)
        .then(|| SITE_COLUMN.to_string());

    match (route, site) {
        (None, None) => VaccinationDetail::Absent,
        (Some(route_column), None) => VaccinationDetail::RouteOnly { route_column },
        (None, Some(site_column)) => VaccinationDetail::SiteOnly { site_column },
        (Some(route_column), Some(site_column)) => VaccinationDetail::Both {
            route_column,
            site_column,
        },
    }
}

/// How home visit rows reach their diagnosis codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisLink {
    /// Join `parent.<parent_pk> = child.<child_fk>`
    Linked { parent_pk: String, child_fk: String },
    /// The diagnosis table does not exist
    NoChildTable,
    /// The diagnosis table exists but no link column was recognised
    Unresolved { available: Vec<String> },
}

/// First `co_seq_*` column, in sorted order
fn sequence_column(columns: &BTreeSet<String>) -> Option<&String> {
    columns.iter().find(|col| col.starts_with(SEQUENCE_PREFIX))
}

/// Resolve the home visit diagnosis join
///
/// The parent key is the first `co_seq_*` column of the parent table, or
/// [`HOME_VISIT_DEFAULT_PK`]. The child link is the first known candidate,
/// then any column mentioning `fat` and `dom` or `atd` that is not the
/// child's own sequence key.
pub fn resolve_home_visit_diagnosis(
    parent_columns: &BTreeSet<String>,
    child_columns: &BTreeSet<String>,
) -> DiagnosisLink {
    if child_columns.is_empty() {
        return DiagnosisLink::NoChildTable;
    }

    let parent_pk = sequence_column(parent_columns)
        .cloned()
        .unwrap_or_else(|| HOME_VISIT_DEFAULT_PK.to_string());

    let known = HOME_VISIT_FK_CANDIDATES
        .iter()
        .find(|col| child_columns.contains(**col))
        .map(|col| col.to_string());

    let child_fk = known.or_else(|| {
        let child_pk = sequence_column(child_columns);
        child_columns
            .iter()
            .find(|col| {
                Some(*col) != child_pk
                    && col.contains("fat")
                    && (col.contains("dom") || col.contains("atd"))
            })
            .cloned()
    });

    match child_fk {
        Some(child_fk) => DiagnosisLink::Linked {
            parent_pk,
            child_fk,
        },
        None => DiagnosisLink::Unresolved {
            available: child_columns.iter().cloned().collect(),
        },
    }
}

/// Resolved shape of the collective activity extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectiveShape {
    /// One of the two tables is missing
    Missing { tables: Vec<&'static str> },
    /// Both tables exist
    Available {
        activity_pk: String,
        participant_fk: String,
        /// `None` projects [`COLLECTIVE_PROFESSIONAL_PLACEHOLDER`] as the name
        professional_column: Option<String>,
        /// `None` projects the placeholder procedure
        procedure_column: Option<String>,
    },
}

/// Resolve the collective activity join and optional columns
pub fn resolve_collective(
    activity_columns: &BTreeSet<String>,
    participant_columns: &BTreeSet<String>,
) -> CollectiveShape {
    let mut missing = Vec::new();
    if activity_columns.is_empty() {
        missing.push(super::catalogue::COLLECTIVE_TABLE);
    }
    if participant_columns.is_empty() {
        missing.push(super::catalogue::COLLECTIVE_PARTICIPANT_TABLE);
    }
    if !missing.is_empty() {
        return CollectiveShape::Missing { tables: missing };
    }

    let activity_pk = if activity_columns.contains("co_seq_fat_atvdd_coletiva") {
        "co_seq_fat_atvdd_coletiva"
    } else {
        "co_seq_fat_atividade_coletiva"
    };
    let participant_fk = if participant_columns.contains("co_fat_atvdd_coletiva") {
        "co_fat_atvdd_coletiva"
    } else {
        "co_fat_atividade_coletiva"
    };

    let professional_column = COLLECTIVE_PROFESSIONAL_CANDIDATES
        .iter()
        .find(|col| activity_columns.contains(**col))
        .map(|col| col.to_string());
    let procedure_column = activity_columns
        .contains("co_dim_procedimento")
        .then(|| "co_dim_procedimento".to_string());

    CollectiveShape::Available {
        activity_pk: activity_pk.to_string(),
        participant_fk: participant_fk.to_string(),
        professional_column,
        procedure_column,
    }
}
