use super::field::*;
use super::{Definition, DocType};

pub(super) fn definition() -> Definition {
    Definition {
        doc_type: DocType::Project,
        fields: vec![
            string("_project_id").aliases(&["id", "donor.projectId"]),
            string("icgc_id").alias("icgcId"),
            string("primary_site").aliases(&["primarySite", "donor.primarySite"]),
            string("project_name").aliases(&["name", "donor.projectName"]),
            string("tumour_type").alias("tumourType"),
            string("tumour_subtype").alias("tumourSubtype"),
            array_of_strings("primary_countries").alias("primaryCountries"),
            array_of_strings("partner_countries").alias("partnerCountries"),
            array_of_strings("pubmed_ids").alias("pubmedIds"),
            summary(),
        ],
        internal_aliases: Vec::new(),
        public_fields: vec![
            "id",
            "icgcId",
            "primarySite",
            "name",
            "tumourType",
            "tumourSubtype",
            "primaryCountries",
            "partnerCountries",
            "availableDataTypes",
            "ssmTestedDonorCount",
            "cnsmTestedDonorCount",
            "stsmTestedDonorCount",
            "sgvTestedDonorCount",
            "methSeqTestedDonorCount",
            "methArrayTestedDonorCount",
            "expSeqTestedDonorCount",
            "expArrayTestedDonorCount",
            "pexpTestedDonorCount",
            "mirnaSeqTestedDonorCount",
            "jcnTestedDonorCount",
            "totalDonorCount",
            "totalLiveDonorCount",
            "affectedDonorCount",
            "experimentalAnalysisPerformedDonorCounts",
            "experimentalAnalysisPerformedSampleCounts",
            "pubmedIds",
            "repository",
            "state",
        ],
        facets: vec!["primaryCountries", "primarySite", "availableDataTypes", "state", "tumourType"],
        include_fields: vec![
            "_summary.experimental_analysis_performed_sample_count",
            "_summary.experimental_analysis_performed_donor_count",
        ],
    }
}

/// Per-project counters kept under `_summary`.
fn summary() -> FieldModel {
    object(
        "_summary",
        vec![
            array_of_strings("_available_data_type").alias("availableDataTypes"),
            long("_ssm_tested_donor_count").alias("ssmTestedDonorCount"),
            long("_cnsm_tested_donor_count").alias("cnsmTestedDonorCount"),
            long("_stsm_tested_donor_count").alias("stsmTestedDonorCount"),
            long("_sgv_tested_donor_count").alias("sgvTestedDonorCount"),
            long("_meth_seq_tested_donor_count").alias("methSeqTestedDonorCount"),
            long("_meth_array_tested_donor_count").alias("methArrayTestedDonorCount"),
            long("_exp_seq_tested_donor_count").alias("expSeqTestedDonorCount"),
            long("_exp_array_tested_donor_count").alias("expArrayTestedDonorCount"),
            long("_pexp_tested_donor_count").alias("pexpTestedDonorCount"),
            long("_mirna_seq_tested_donor_count").alias("mirnaSeqTestedDonorCount"),
            long("_jcn_tested_donor_count").alias("jcnTestedDonorCount"),
            long("_total_donor_count").alias("totalDonorCount"),
            long("_total_live_donor_count").alias("totalLiveDonorCount"),
            long("_affected_donor_count").alias("affectedDonorCount"),
            string("_state").alias("state"),
            object("experimental_analysis_performed_donor_count", Vec::new())
                .alias("experimentalAnalysisPerformedDonorCounts"),
            object("experimental_analysis_performed_sample_count", Vec::new())
                .alias("experimentalAnalysisPerformedSampleCounts"),
            array_of_strings("repository").alias("repository"),
        ],
    )
}
