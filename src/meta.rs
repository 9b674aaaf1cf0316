//! Type models of the portal's document types.
//!
//! Every centric index stores the same facts nested at different depths: in
//! the donor-centric view a mutation lives under `gene.ssm`, in the
//! gene-centric view under `donor.ssm`, and in the mutation-centric view at
//! the top level. A [`TypeModel`] maps the public aliases PQL uses onto the
//! document paths of one view and answers nesting questions about them.
//!
//! Models are built once per process and shared read-only:
//!
//! ```text
//! let model = meta::type_model(DocType::DonorCentric);
//! model.field("mutation.type")?;          // "gene.ssm.mutation_type"
//! model.nested_path("gene.ssm.mutation_type")?; // Some("gene.ssm")
//! ```

mod donor;
pub mod field;
mod file;
mod gene;
mod mutation;
mod observation;
mod project;
mod type_model;

pub use type_model::{Definition, FieldInfo, TypeModel, has_field_alias, is_path_under};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const GENE_PATHWAY_ID: &str = "gene.pathwayId";
pub const GENE_SET_ID: &str = "gene.geneSetId";
pub const GENE_GO_TERM_ID: &str = "gene.goTermId";
pub const GENE_CURATED_SET_ID: &str = "gene.curatedSetId";
pub const GENE_COMPOUND_ID: &str = "gene.compoundId";
pub const GENE_LOCATION: &str = "gene.location";
pub const MUTATION_LOCATION: &str = "mutation.location";
pub const SCORE: &str = "_score";

pub const MOLECULAR_FUNCTION: &str = "go_term.molecular_function";
pub const BIOLOGICAL_PROCESS: &str = "go_term.biological_process";
pub const CELLULAR_COMPONENT: &str = "go_term.cellular_component";

pub const LOOKUP_INDEX: &str = "lookup.index";
pub const LOOKUP_PATH: &str = "lookup.path";
pub const LOOKUP_TYPE: &str = "lookup.type";

/// Document types a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocType {
    DonorCentric,
    GeneCentric,
    MutationCentric,
    ObservationCentric,
    Project,
    File,
}

impl DocType {
    pub const ALL: [DocType; 6] = [
        DocType::DonorCentric,
        DocType::GeneCentric,
        DocType::MutationCentric,
        DocType::ObservationCentric,
        DocType::Project,
        DocType::File,
    ];

    /// Index type name, as sent to the search engine.
    pub fn id(self) -> &'static str {
        match self {
            DocType::DonorCentric => "donor-centric",
            DocType::GeneCentric => "gene-centric",
            DocType::MutationCentric => "mutation-centric",
            DocType::ObservationCentric => "observation-centric",
            DocType::Project => "project",
            DocType::File => "file",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            DocType::DonorCentric => "donor",
            DocType::GeneCentric => "gene",
            DocType::MutationCentric => "mutation",
            DocType::ObservationCentric => "observation",
            DocType::Project => "project",
            DocType::File => "file",
        }
    }

    /// Terms-lookup type holding entity sets of this type. Projects are
    /// never saved as entity sets.
    pub fn lookup_type(self) -> Option<&'static str> {
        match self {
            DocType::DonorCentric => Some("donor-ids"),
            DocType::GeneCentric => Some("gene-ids"),
            DocType::MutationCentric | DocType::ObservationCentric => Some("mutation-ids"),
            DocType::File => Some("file-ids"),
            DocType::Project => None,
        }
    }

    /// The view whose own entity has this prefix.
    pub fn by_prefix(prefix: &str) -> Option<DocType> {
        DocType::ALL.into_iter().find(|t| t.prefix() == prefix)
    }

    pub fn type_model(self) -> &'static TypeModel {
        type_model(self)
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocType::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| format!("unknown document type '{s}'"))
    }
}

static DONOR_CENTRIC: LazyLock<TypeModel> = LazyLock::new(|| TypeModel::new(donor::definition()));
static GENE_CENTRIC: LazyLock<TypeModel> = LazyLock::new(|| TypeModel::new(gene::definition()));
static MUTATION_CENTRIC: LazyLock<TypeModel> = LazyLock::new(|| TypeModel::new(mutation::definition()));
static OBSERVATION_CENTRIC: LazyLock<TypeModel> =
    LazyLock::new(|| TypeModel::new(observation::definition()));
static PROJECT: LazyLock<TypeModel> = LazyLock::new(|| TypeModel::new(project::definition()));
static FILE: LazyLock<TypeModel> = LazyLock::new(|| TypeModel::new(file::definition()));

/// The process wide model of `doc_type`.
pub fn type_model(doc_type: DocType) -> &'static TypeModel {
    match doc_type {
        DocType::DonorCentric => &DONOR_CENTRIC,
        DocType::GeneCentric => &GENE_CENTRIC,
        DocType::MutationCentric => &MUTATION_CENTRIC,
        DocType::ObservationCentric => &OBSERVATION_CENTRIC,
        DocType::Project => &PROJECT,
        DocType::File => &FILE,
    }
}

/// Synthetic fields every centric view declares. The resolvers rewrite them
/// into real fields before anything reads the document.
pub(crate) fn synthetic_fields() -> Vec<field::FieldModel> {
    use field::string;

    vec![
        string(GENE_GO_TERM_ID).alias(GENE_GO_TERM_ID),
        string(GENE_SET_ID).alias(GENE_SET_ID),
        string(GENE_LOCATION).alias(GENE_LOCATION),
        string(MUTATION_LOCATION).alias(MUTATION_LOCATION),
    ]
}

/// The `go_term` object shared by every gene representation.
pub(crate) fn go_term() -> field::FieldModel {
    use field::{array_of_strings, object};

    object(
        "go_term",
        vec![
            array_of_strings("biological_process"),
            array_of_strings("cellular_component"),
            array_of_strings("molecular_function"),
        ],
    )
    .alias("gene.GoTerm")
}

/// Internal aliases of the three ontology fields under `gene_path`.
pub(crate) fn go_term_aliases(gene_path: &str) -> Vec<(&'static str, String)> {
    [BIOLOGICAL_PROCESS, CELLULAR_COMPONENT, MOLECULAR_FUNCTION]
        .into_iter()
        .map(|alias| match gene_path {
            "" => (alias, alias.to_string()),
            path => (alias, format!("{path}.{alias}")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_type_ids_round_trip() {
        for doc_type in DocType::ALL {
            assert_eq!(doc_type.id().parse::<DocType>(), Ok(doc_type));
        }
        assert!("gene-set".parse::<DocType>().is_err());
    }

    #[test]
    fn test_public_fields_resolve() {
        for doc_type in DocType::ALL {
            let model = type_model(doc_type);
            for alias in model.aliases() {
                assert!(model.field(alias).is_ok(), "{doc_type}: {alias}");
            }
            for facet in model.facets() {
                assert!(model.field(facet).is_ok(), "{doc_type}: {facet}");
            }
        }
    }

    #[test]
    fn test_project_view_is_flat() {
        let model = type_model(DocType::Project);
        assert_eq!(model.field("project.id").unwrap(), "_project_id");
        assert_eq!(model.field("state").unwrap(), "_summary._state");
        assert!(model.facets().iter().all(|f| !model.is_nested(f).unwrap()));
        assert!(model.internal_field(LOOKUP_TYPE).is_err());
    }

    #[test]
    fn test_go_term_internal_paths() {
        let model = type_model(DocType::MutationCentric);
        assert_eq!(
            model.internal_field(CELLULAR_COMPONENT).unwrap(),
            "transcript.gene.go_term.cellular_component"
        );
    }
}
