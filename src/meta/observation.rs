use super::field::*;
use super::{go_term, go_term_aliases, synthetic_fields, Definition, DocType, SCORE};

pub(super) fn definition() -> Definition {
    let mut fields = vec![
        nested_object(
            "ssm",
            vec![
                gene(),
                identifiable_string("_mutation_id").aliases(&["mutation.id", "mutationId"]),
                string("mutation_type").alias("mutation.type"),
                nested_array_of_objects(
                    "observation",
                    element(vec![
                        string("platform").alias("mutation.platform"),
                        string("sequencing_strategy").alias("mutation.sequencingStrategy"),
                        string("verification_status").alias("mutation.verificationStatus"),
                    ]),
                )
                .alias("observation"),
                string("chromosome").aliases(&["mutation.chromosome", "chromosome"]),
                long("chromosome_start").aliases(&["mutation.start", "start"]),
                long("chromosome_end").aliases(&["mutation.end", "end"]),
                string("mutation").alias("mutation"),
            ],
        ),
        nested_object(
            "project",
            vec![
                string("_project_id").aliases(&["donor.projectId", "projectId"]),
                string("primary_site").alias("donor.primarySite"),
            ],
        ),
        nested_object(
            "donor",
            vec![
                identifiable_string("_donor_id").aliases(&["donor.id", "donorId"]),
                string("donor_sex").alias("donor.gender"),
                string("donor_tumour_stage_at_diagnosis").alias("donor.tumourStageAtDiagnosis"),
                string("donor_vital_status").alias("donor.vitalStatus"),
                string("disease_status_last_followup").alias("donor.diseaseStatusLastFollowup"),
                string("donor_relapse_type").alias("donor.relapseType"),
                string("_summary._state").alias("donor.state"),
                array_of_strings("_summary._studies").alias("donor.studies"),
                object(
                    "_summary",
                    vec![
                        string("_age_at_diagnosis_group").alias("donor.ageAtDiagnosisGroup"),
                        string("_available_data_type").alias("donor.availableDataTypes"),
                        string("experimental_analysis_performed").alias("donor.analysisTypes"),
                    ],
                ),
            ],
        ),
        string(SCORE).alias(SCORE),
    ];
    fields.extend(synthetic_fields());

    Definition {
        doc_type: DocType::ObservationCentric,
        fields,
        internal_aliases: go_term_aliases("ssm.gene"),
        public_fields: vec![
            "chromosome",
            "donor.primarySite",
            "donorId",
            "end",
            "mutation",
            "mutationId",
            "observation",
            "projectId",
            "start",
            "gene.id",
            "mutation.consequenceType",
            "gene",
        ],
        facets: Vec::new(),
        include_fields: vec!["ssm.gene.consequence", "ssm.observation", "ssm.gene"],
    }
}

fn gene() -> FieldModel {
    nested_array_of_objects(
        "gene",
        element(vec![
            identifiable_string("_gene_id").alias("gene.id"),
            string("biotype").alias("gene.type"),
            array_of_strings("pathway").alias("gene.pathwayId"),
            string("chromosome").alias("gene.chromosome"),
            long("start").alias("gene.start"),
            long("end").alias("gene.end"),
            string("curated_set").alias("gene.curatedSetId"),
            go_term(),
            nested_array_of_objects(
                "consequence",
                element(vec![
                    string("consequence_type").alias("mutation.consequenceType"),
                    string("functional_impact_prediction_summary").alias("mutation.functionalImpact"),
                ]),
            )
            .alias("consequences"),
        ]),
    )
    .alias("gene")
}
