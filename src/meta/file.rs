use super::field::*;
use super::{Definition, DocType};

pub(super) fn definition() -> Definition {
    Definition {
        doc_type: DocType::File,
        fields: vec![
            identifiable_string("id").aliases(&["id", "fileId", "file.id"]),
            string("object_id").aliases(&["fileObjectId", "fileUuid", "objectId"]),
            string("access").alias("access"),
            string("study").alias("study"),
            object(
                "data_categorization",
                vec![
                    string("data_type").alias("dataType"),
                    string("experimental_strategy").alias("experimentalStrategy"),
                ],
            )
            .alias("dataCategorization"),
            object("data_bundle", vec![string("data_bundle_id").alias("dataBundleId")]).alias("dataBundle"),
            file_copies(),
            donors(),
            object(
                "analysis_method",
                vec![
                    string("analysis_type").alias("analysisType"),
                    string("software").alias("software"),
                ],
            )
            .alias("analysisMethod"),
            object(
                "reference_genome",
                vec![
                    string("reference_name").alias("referenceName"),
                    string("genome_build").alias("genomeBuild"),
                    string("download_url").alias("downloadUrl"),
                ],
            )
            .alias("referenceGenome"),
        ],
        internal_aliases: Vec::new(),
        public_fields: vec![
            "objectId",
            "fileUuid",
            "id",
            "fileId",
            "fileCopies",
            "donors",
            "analysisMethod",
            "study",
            "access",
            "referenceGenome",
            "dataCategorization",
        ],
        facets: vec![
            "projectCode",
            "primarySite",
            "specimenType",
            "repoName",
            "dataType",
            "experimentalStrategy",
            "study",
            "fileFormat",
            "access",
            "donorStudy",
            "software",
        ],
        include_fields: vec![
            "id",
            "object_id",
            "study",
            "access",
            "analysis_method",
            "data_bundle.data_bundle_id",
            "file_copies",
            "donors",
            "data_categorization",
            "reference_genome",
        ],
    }
}

fn file_copies() -> FieldModel {
    nested_array_of_objects(
        "file_copies",
        element(vec![
            string("repo_code").alias("repoCode"),
            string("repo_org").alias("repoOrg"),
            string("repo_name").alias("repoName"),
            string("repo_type").alias("repoType"),
            string("repo_country").alias("repoCountry"),
            string("repo_base_url").alias("repoBaseUrl"),
            string("repo_data_path").alias("repoDataPath"),
            string("repo_metadata_path").alias("repoMetadataPath"),
            object(
                "index_file",
                vec![
                    string("id").alias("indexFile.id"),
                    string("object_id").alias("indexFile.objectId"),
                    string("file_name").alias("indexFile.fileName"),
                    string("file_format").alias("indexFile.fileFormat"),
                    string("file_md5sum").alias("indexFile.fileMd5sum"),
                    long("file_size").alias("indexFile.fileSize"),
                ],
            )
            .alias("indexFile"),
            string("file_name").alias("fileName"),
            string("file_format").alias("fileFormat"),
            string("file_md5sum").alias("fileMd5sum"),
            long("file_size").alias("fileSize"),
            long("last_modified").aliases(&["lastModified", "lastUpdated"]),
        ]),
    )
    .alias("fileCopies")
}

fn donors() -> FieldModel {
    nested_array_of_objects(
        "donors",
        element(vec![
            identifiable_string("donor_id").aliases(&["donorId", "donor.id"]),
            string("program").alias("program"),
            string("primary_site").alias("primarySite"),
            string("project_code").alias("projectCode"),
            string("study").alias("donorStudy"),
            string("sample_id").alias("sampleId"),
            string("specimen_id").alias("specimenId"),
            string("specimen_type").alias("specimenType"),
            string("submitted_donor_id").alias("submittedDonorId"),
            string("submitted_sample_id").alias("submittedSampleId"),
            string("submitted_specimen_id").alias("submittedSpecimenId"),
            string("matched_control_sample_id").alias("matchedControlSampleId"),
            object(
                "other_identifiers",
                vec![
                    string("tcga_sample_barcode").alias("tcgaSampleBarcode"),
                    string("tcga_aliquot_barcode").alias("tcgaAliquotBarcode"),
                    string("tcga_participant_barcode").alias("tcgaParticipantBarcode"),
                ],
            )
            .alias("otherIdentifiers"),
        ]),
    )
    .alias("donors")
}
