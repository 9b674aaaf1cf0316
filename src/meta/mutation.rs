use super::field::*;
use super::{go_term, go_term_aliases, synthetic_fields, Definition, DocType, SCORE};

pub(super) fn definition() -> Definition {
    let mut fields = vec![
        string("assembly_version").alias("assemblyVersion"),
        string("chromosome").aliases(&["chromosome", "mutation.chromosome"]),
        long("chromosome_start").aliases(&["start", "mutation.start"]),
        long("chromosome_end").aliases(&["end", "mutation.end"]),
        identifiable_string("_mutation_id").alias("id"),
        string("mutation").alias("mutation"),
        string("mutation_type").alias("type"),
        string("reference_genome_allele").alias("referenceGenomeAllele"),
        ssm_occurrence(),
        transcript(),
        object(
            "_summary",
            vec![
                long("_affected_donor_count").alias("affectedDonorCountTotal"),
                string("_tested_donor_count").alias("testedDonorCount"),
                string("_affected_project_count").alias("affectedProjectCount"),
                array_of_strings("_affected_project_ids").alias("affectedProjectIds"),
            ],
        ),
        string(SCORE).aliases(&[SCORE, "affectedDonorCountFiltered"]),
    ];
    fields.extend(synthetic_fields());

    Definition {
        doc_type: DocType::MutationCentric,
        fields,
        internal_aliases: go_term_aliases("transcript.gene"),
        public_fields: vec![
            "id",
            "mutation",
            "type",
            "chromosome",
            "start",
            "end",
            "affectedDonorCountTotal",
            "testedDonorCount",
            "consequenceType",
            "platform",
            "verificationStatus",
            "assemblyVersion",
            "referenceGenomeAllele",
            "affectedProjectCount",
            "affectedProjectIds",
            "affectedDonorCountFiltered",
            "transcriptId",
            "functionalImpact",
            "mutation.location",
            "sequencingStrategy",
        ],
        facets: vec![
            "type",
            "consequenceType",
            "platform",
            "verificationStatus",
            "functionalImpact",
            "sequencingStrategy",
        ],
        include_fields: vec!["transcript", "ssm_occurrence"],
    }
}

fn transcript() -> FieldModel {
    nested_array_of_objects(
        "transcript",
        element(vec![
            string("id").alias("transcriptId"),
            string("functional_impact_prediction_summary").alias("functionalImpact"),
            object("consequence", vec![string("consequence_type").alias("consequenceType")]),
            object(
                "gene",
                vec![
                    identifiable_string("_gene_id").alias("gene.id"),
                    string("biotype").alias("gene.type"),
                    string("chromosome").alias("gene.chromosome"),
                    long("end").alias("gene.end"),
                    long("start").alias("gene.start"),
                    string("symbol").alias("gene.symbol"),
                    array_of_strings("pathway").alias("gene.pathwayId"),
                    array_of_strings("curated_set").alias("gene.curatedSetId"),
                    array_of_strings("drug").alias("gene.compoundId"),
                    go_term(),
                ],
            ),
        ]),
    )
    .aliases(&["transcripts", "consequences"])
}

fn ssm_occurrence() -> FieldModel {
    nested_array_of_objects(
        "ssm_occurrence",
        element(vec![
            object(
                "donor",
                vec![
                    identifiable_string("_donor_id").alias("donor.id"),
                    string("donor_sex").alias("donor.gender"),
                    string("donor_tumour_stage_at_diagnosis").alias("donor.tumourStageAtDiagnosis"),
                    string("donor_vital_status").alias("donor.vitalStatus"),
                    string("disease_status_last_followup").alias("donor.diseaseStatusLastFollowup"),
                    string("donor_relapse_type").alias("donor.relapseType"),
                    object(
                        "_summary",
                        vec![
                            string("_age_at_diagnosis_group").alias("donor.ageAtDiagnosisGroup"),
                            string("_state").alias("donor.state"),
                            array_of_strings("_available_data_type").alias("donor.availableDataTypes"),
                            array_of_strings("_studies").alias("donor.studies"),
                            array_of_strings("experimental_analysis_performed").alias("donor.analysisTypes"),
                        ],
                    ),
                ],
            ),
            object(
                "project",
                vec![
                    string("_project_id").alias("donor.projectId"),
                    string("primary_site").alias("donor.primarySite"),
                    string("project_name").alias("donor.projectName"),
                ],
            ),
            nested_array_of_objects(
                "observation",
                element(vec![
                    string("platform").alias("platform"),
                    string("verification_status").alias("verificationStatus"),
                    string("sequencing_strategy").alias("sequencingStrategy"),
                ]),
            ),
        ]),
    )
    .alias("occurrences")
}
