use super::field::*;
use super::{go_term, go_term_aliases, synthetic_fields, Definition, DocType, SCORE};

pub(super) fn definition() -> Definition {
    let mut fields = vec![
        identifiable_string("_gene_id").alias("id"),
        string("symbol").alias("symbol"),
        string("name").alias("name"),
        string("biotype").alias("type"),
        string("chromosome").aliases(&["chromosome", "gene.chromosome"]),
        long("start").aliases(&["start", "gene.start"]),
        long("end").aliases(&["end", "gene.end"]),
        long("strand").alias("strand"),
        donor(),
        string("description").alias("description"),
        array_of_strings("synonyms").alias("synonyms"),
        object("external_db_ids", vec![array_of_strings("entrez_gene")]).alias("externalDbIds"),
        object(
            "_summary",
            vec![
                long("_affected_donor_count").alias("affectedDonorCountTotal"),
                long("_affected_project_count"),
                array_of_strings("_affected_transcript_id").alias("affectedTranscriptIds"),
                long("_total_mutation_count"),
                long("_unique_mutation_count"),
            ],
        ),
        array_of_objects("project", element(Vec::new())).alias("projects"),
        array_of_strings("pathway").aliases(&["pathways", "pathwayId", "gene.pathwayId"]),
        array_of_strings("curated_set").aliases(&["curatedSetId", "gene.curatedSetId"]),
        array_of_strings("drug").alias("gene.compoundId"),
        array_of_objects("transcripts", element(Vec::new())).alias("transcripts"),
        go_term(),
        string(SCORE).aliases(&[SCORE, "affectedDonorCountFiltered"]),
        array_of_objects("sets", element(Vec::new())).alias("sets"),
    ];
    fields.extend(synthetic_fields());

    Definition {
        doc_type: DocType::GeneCentric,
        fields,
        internal_aliases: go_term_aliases(""),
        public_fields: vec![
            "id",
            "symbol",
            "name",
            "type",
            "chromosome",
            "start",
            "end",
            "strand",
            "description",
            "synonyms",
            "externalDbIds",
            "affectedDonorCountTotal",
            "affectedDonorCountFiltered",
            "affectedTranscriptIds",
            "gene.location",
            "pathwayId",
            "pathways",
            "sets",
        ],
        facets: vec!["type"],
        include_fields: vec!["transcripts", "external_db_ids", "project"],
    }
}

fn donor() -> FieldModel {
    nested_array_of_objects(
        "donor",
        element(vec![
            identifiable_string("_donor_id").alias("donor.id"),
            object(
                "_summary",
                vec![
                    string("_age_at_diagnosis_group").alias("donor.ageAtDiagnosisGroup"),
                    string("_available_data_type").alias("donor.availableDataTypes"),
                    string("experimental_analysis_performed").alias("donor.analysisTypes"),
                ],
            ),
            string("disease_status_last_followup").alias("donor.diseaseStatusLastFollowup"),
            string("donor_relapse_type").alias("donor.relapseType"),
            string("donor_sex").alias("donor.gender"),
            string("donor_tumour_stage_at_diagnosis").alias("donor.tumourStageAtDiagnosis"),
            string("donor_vital_status").alias("donor.vitalStatus"),
            string("_summary._state").alias("donor.state"),
            array_of_strings("_summary._studies").alias("donor.studies"),
            object(
                "project",
                vec![
                    string("_project_id").alias("donor.projectId"),
                    string("primary_site").alias("donor.primarySite"),
                    string("project_name").alias("donor.projectName"),
                ],
            ),
            ssm(),
        ]),
    )
}

fn ssm() -> FieldModel {
    nested_array_of_objects(
        "ssm",
        element(vec![
            identifiable_string("_mutation_id").alias("mutation.id"),
            string("mutation_type").alias("mutation.type"),
            string("chromosome").alias("mutation.chromosome"),
            long("chromosome_end").alias("mutation.end"),
            long("chromosome_start").alias("mutation.start"),
            nested_array_of_objects(
                "consequence",
                element(vec![
                    string("consequence_type").alias("mutation.consequenceType"),
                    string("functional_impact_prediction_summary").alias("mutation.functionalImpact"),
                ]),
            ),
            nested_array_of_objects(
                "observation",
                element(vec![
                    string("platform").alias("mutation.platform"),
                    string("sequencing_strategy").alias("mutation.sequencingStrategy"),
                    string("verification_status").alias("mutation.verificationStatus"),
                ]),
            ),
        ]),
    )
}
