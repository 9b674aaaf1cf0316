//! Portal JSON filters to PQL.
//!
//! The portal describes a search as a JSON object keyed by entity:
//!
//! ```text
//! {"donor": {"gender": {"is": ["female"]}}, "gene": {"hasPathway": true}}
//! ```
//!
//! Every field is a condition on the entity's public alias (`donor.gender`).
//! Entities other than the one the target view is centred on live in nested
//! documents, so the conversion groups conditions by nesting path, nests
//! sibling paths under their closest common parent, and emits one
//! `nested(...)` group per parent. Negated conditions are grouped separately
//! and each group is wrapped in a single `not(...)`.

use crate::ast::Value;
use crate::error::{CompileError, Result};
use crate::meta::{DocType, GENE_SET_ID, TypeModel, has_field_alias, is_path_under};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::debug;

const MISSING_VALUE: &str = "_missing";
const ENTITY_SET_ID: &str = "entitySetId";

const VALID_ENTITIES: [&str; 5] = ["donor", "gene", "mutation", "project", "file"];

/// The only filters the project view honours; everything else is dropped.
const VALID_PROJECT_FILTERS: [&str; 6] = [
    "id",
    "primarySite",
    "primaryCountries",
    "availableDataTypes",
    "state",
    "tumourType",
];

/// Fields whose nesting depends on the view rather than the type model.
const SPECIAL_FIELDS_NESTING: [&str; 7] = [
    "gene.goTermId",
    "gene.hasPathway",
    "gene.hasCompound",
    GENE_SET_ID,
    ENTITY_SET_ID,
    "mutation.location",
    "gene.location",
];

/// Mutation fields the mutation-centric view stores in nested documents
/// under unprefixed aliases.
const NESTED_FIELDS: [&str; 5] = [
    "consequenceType",
    "functionalImpact",
    "platform",
    "sequencingStrategy",
    "verificationStatus",
];

/// Fields of the pathway and compound families. A family with both its id
/// and its `has*` condition present is OR-ed together.
const GENE_FACET_FIELDS: [&str; 4] = ["hasPathway", "hasCompound", "pathwayId", "compoundId"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    Is,
    Not,
    All,
    Has,
}

impl Operation {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "is" => Some(Operation::Is),
            "not" => Some(Operation::Not),
            "all" => Some(Operation::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Array(Vec<Value>),
}

impl FieldValue {
    fn contains_missing(&self) -> bool {
        let missing = Value::string(MISSING_VALUE);
        match self {
            FieldValue::Single(value) => *value == missing,
            FieldValue::Array(values) => values.contains(&missing),
        }
    }

    fn has_value(&self) -> bool {
        match self {
            FieldValue::Single(Value::String(s)) => !s.is_empty(),
            FieldValue::Single(_) => true,
            FieldValue::Array(values) => !values.is_empty(),
        }
    }

    fn is_true(&self) -> bool {
        matches!(self, FieldValue::Single(Value::Boolean(true)))
    }
}

/// One condition of the portal filters.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    /// Entity the field belongs to (`donor`)
    pub prefix: String,
    pub name: String,
    pub operation: Operation,
    pub value: FieldValue,
}

impl FilterField {
    /// Negation is applied to the whole group, so the field itself is
    /// rendered as a positive condition.
    fn without_not(&self) -> FilterField {
        let mut field = self.clone();
        if field.operation == Operation::Not {
            field.operation = Operation::Is;
        }
        field
    }
}

/// Parsed portal filters, entities and fields in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortalFilters {
    pub entities: Vec<(String, Vec<FilterField>)>,
}

impl PortalFilters {
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(entities) = json else {
            return Err(CompileError::bad_query(format!("Filters must be a JSON object: {json}")));
        };
        if let Some(unknown) = entities.keys().find(|k| !VALID_ENTITIES.contains(&k.as_str())) {
            return Err(CompileError::bad_query(format!("Node has no valid types. Unknown type '{unknown}'")));
        }

        let mut parsed = Vec::new();
        for (entity, fields) in entities {
            debug!(entity, %fields, "parsing filter fields");
            let serde_json::Value::Object(fields) = fields else {
                return Err(invalid_structure(fields));
            };
            let mut entity_fields = Vec::new();
            for (name, value) in fields {
                if let Some(field) = parse_field(entity, name, value)? {
                    entity_fields.push(field);
                }
            }
            if !entity_fields.is_empty() {
                parsed.push((entity.clone(), entity_fields));
            }
        }
        Ok(PortalFilters { entities: parsed })
    }
}

impl FromStr for PortalFilters {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self> {
        let json: serde_json::Value =
            serde_json::from_str(s).map_err(|e| CompileError::bad_query(format!("Invalid filters JSON: {e}")))?;
        PortalFilters::from_json(&json)
    }
}

fn invalid_structure(json: &serde_json::Value) -> CompileError {
    CompileError::bad_query(format!("Invalid input value or structure: {json}"))
}

fn scalar(json: &serde_json::Value) -> Result<Value> {
    Value::from_json(json).ok_or_else(|| invalid_structure(json))
}

fn parse_field(entity: &str, name: &str, json: &serde_json::Value) -> Result<Option<FilterField>> {
    let field = |operation, value| FilterField {
        prefix: entity.to_string(),
        name: name.to_string(),
        operation,
        value,
    };

    if name.starts_with("has") {
        let value = FieldValue::Single(scalar(json)?);
        return Ok(value.has_value().then(|| field(Operation::Has, value)));
    }

    let serde_json::Value::Object(operations) = json else {
        return Err(invalid_structure(json));
    };
    if operations.len() > 1 {
        return Err(CompileError::bad_query(format!("More than one operation detected. {json}")));
    }
    let Some((name, raw)) = operations.iter().next() else {
        return Ok(None);
    };
    let operation = Operation::from_name(name)
        .ok_or_else(|| CompileError::bad_query(format!("Invalid operation '{name}'")))?;
    let value = match raw {
        serde_json::Value::Array(items) => FieldValue::Array(items.iter().map(scalar).collect::<Result<_>>()?),
        other => FieldValue::Single(scalar(other)?),
    };
    Ok(value.has_value().then(|| field(operation, value)))
}

/// Ordered multimap: keys in first-insertion order, values in insertion
/// order.
type Groups<T> = Vec<(String, Vec<T>)>;

fn push_group<T>(groups: &mut Groups<T>, key: &str, value: T) {
    match groups.iter_mut().find(|(k, _)| k == key) {
        Some((_, values)) => values.push(value),
        None => groups.push((key.to_string(), vec![value])),
    }
}

fn group<'a, T>(groups: &'a Groups<T>, key: &str) -> &'a [T] {
    groups
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, values)| values.as_slice())
        .unwrap_or(&[])
}

/// Convert portal filters to a PQL filter list for `doc_type`.
pub fn convert_filters(filters: &PortalFilters, doc_type: DocType) -> Result<String> {
    let cleaned;
    let filters = if doc_type == DocType::Project {
        cleaned = project_filters(filters);
        &cleaned
    } else {
        filters
    };

    let positive = group_fields(filters, doc_type, |f| f.operation != Operation::Not)?;
    let negative = group_fields(filters, doc_type, |f| f.operation == Operation::Not)?;

    let mut pql = grouped_filters(&positive, doc_type, false)?;
    pql.extend(grouped_filters(&negative, doc_type, true)?);
    Ok(pql.join(","))
}

/// Keep only the `project` entity's supported fields.
fn project_filters(filters: &PortalFilters) -> PortalFilters {
    let entities = filters
        .entities
        .iter()
        .filter(|(entity, _)| entity == DocType::Project.prefix())
        .map(|(entity, fields)| {
            let fields = fields
                .iter()
                .filter(|f| VALID_PROJECT_FILTERS.contains(&f.name.as_str()))
                .cloned()
                .collect();
            (entity.clone(), fields)
        })
        .collect();
    PortalFilters { entities }
}

/// Parse `json` and convert it, see [`convert_filters`].
pub fn filters_to_pql(json: &str, doc_type: DocType) -> Result<String> {
    convert_filters(&json.parse()?, doc_type)
}

fn group_fields(
    filters: &PortalFilters,
    doc_type: DocType,
    keep: impl Fn(&FilterField) -> bool,
) -> Result<Groups<FilterField>> {
    let mut grouped = Vec::new();
    for (prefix, fields) in &filters.entities {
        let fields: Vec<FilterField> = fields.iter().filter(|f| keep(f)).map(FilterField::without_not).collect();
        if fields.is_empty() {
            continue;
        }
        for (path, field) in group_by_nested_path(prefix, fields, doc_type)? {
            push_group(&mut grouped, &path, field);
        }
    }
    Ok(grouped)
}

fn grouped_filters(fields_by_path: &Groups<FilterField>, doc_type: DocType, negated: bool) -> Result<Vec<String>> {
    if fields_by_path.is_empty() {
        return Ok(Vec::new());
    }

    let paths: Vec<&str> = fields_by_path.iter().map(|(path, _)| path.as_str()).collect();
    let groups = group_nested_paths(&paths, doc_type.type_model());
    debug!(?groups, negated, "grouped nested paths");

    groups
        .iter()
        .map(|(parent, paths)| {
            let descending: Vec<&str> = paths
                .iter()
                .map(String::as_str)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .rev()
                .collect();
            let filter = filter_by_nested_path(doc_type, fields_by_path, &descending, negated)?;
            let filter = if is_enclose_with_common_parent(paths) {
                format!("nested({parent},{filter})")
            } else {
                filter
            };
            Ok(if negated { format!("not({filter})") } else { filter })
        })
        .collect()
}

/// Paths that share no path among themselves that prefixes all of them
/// need an explicit enclosing `nested`.
fn is_enclose_with_common_parent(paths: &[String]) -> bool {
    paths.len() > 1 && !has_common_parent(paths)
}

fn has_common_parent(paths: &[String]) -> bool {
    match paths.iter().min() {
        Some(first) => paths.iter().all(|path| path.starts_with(first.as_str())),
        None => true,
    }
}

/// Group nesting paths under the closest parent they can be nested at.
fn group_nested_paths(paths: &[&str], model: &TypeModel) -> Groups<String> {
    let sorted: Vec<&str> = paths.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let mut groups = Vec::new();

    if let [path] = sorted.as_slice() {
        push_group(&mut groups, path, path.to_string());
        return groups;
    }

    let mut parent = String::new();
    for (i, current) in sorted.iter().copied().enumerate() {
        if current.is_empty() {
            push_group(&mut groups, &parent, current.to_string());
            continue;
        }

        let resolved = model.parent_nested_path(current);
        let next_starts_with = |prefix: &str| sorted.get(i + 1).is_some_and(|next| next.starts_with(prefix));

        if parent.is_empty() && next_starts_with(current) {
            // [gene.ssm, gene.ssm.observation]
            parent = current.to_string();
        } else if current.starts_with(resolved) && parent.is_empty() && next_starts_with(resolved) {
            // [gene.ssm.consequence, gene.ssm.observation]
            parent = resolved.to_string();
        } else if current.starts_with(resolved) && !current.starts_with(parent.as_str()) {
            parent = current.to_string();
        } else if parent.is_empty() {
            // [ssm_occurrence, transcript]
            parent = current.to_string();
        }
        push_group(&mut groups, &parent, current.to_string());
    }
    groups
}

/// Filters of every path in `descending` (deepest first), each nested at
/// its path, folded outwards.
fn filter_by_nested_path(
    doc_type: DocType,
    fields: &Groups<FilterField>,
    descending: &[&str],
    negated: bool,
) -> Result<String> {
    let Some((first, rest)) = descending.split_first() else {
        return Ok(String::new());
    };

    let first_filter = type_filter(group(fields, first), doc_type)?;
    let mut value = if first.is_empty() {
        first_filter
    } else {
        format!("nested({},{first_filter})", view_nested_path(first, doc_type))
    };

    let mut previous = *first;
    for path in rest {
        let filter = type_filter(group(fields, path), doc_type)?;
        value = if path.is_empty() {
            format!("{filter},{value}")
        } else if is_path_under(previous, path) {
            let join = if negated { "or" } else { "and" };
            format!("nested({},{join}({value},{filter}))", view_nested_path(path, doc_type))
        } else {
            format!("nested({path},{filter}),{value}")
        };
        previous = *path;
    }
    Ok(value)
}

/// The `gene` path of the portal is stored as `transcript` in the
/// mutation-centric view.
fn view_nested_path(path: &str, doc_type: DocType) -> &str {
    match (path, doc_type) {
        ("gene", DocType::MutationCentric) => "transcript",
        _ => path,
    }
}

/// Conditions of one nesting level, with the pathway and compound families
/// merged.
fn type_filter(fields: &[FilterField], doc_type: DocType) -> Result<String> {
    // family -> [id condition, has condition]
    let mut families: BTreeMap<String, [Option<&FilterField>; 2]> = BTreeMap::new();
    let mut remaining: Vec<&FilterField> = Vec::new();

    for field in fields {
        if GENE_FACET_FIELDS.contains(&field.name.as_str()) {
            let slot = usize::from(field.operation == Operation::Has);
            families.entry(gene_facet_family(&field.name)).or_default()[slot] = Some(field);
        } else {
            remaining.push(field);
        }
    }

    let mut family_filters = Vec::new();
    for members in families.values() {
        let members: Vec<&FilterField> = members.iter().flatten().copied().collect();
        if members.len() > 1 {
            family_filters.push(format!("or({})", pql_filters(&members, doc_type)?));
        } else {
            remaining.extend(members);
        }
    }

    let mut parts = Vec::new();
    if !remaining.is_empty() {
        parts.push(pql_filters(&remaining, doc_type)?);
    }
    if !family_filters.is_empty() {
        parts.push(family_filters.join(","));
    }
    Ok(parts.join(","))
}

/// `hasPathway` and `pathwayId` are both of the `pathway` family.
fn gene_facet_family(name: &str) -> String {
    let name = name.strip_prefix("has").unwrap_or(name);
    let name = name.strip_suffix("Id").unwrap_or(name);
    name.to_lowercase()
}

fn pql_filters(fields: &[&FilterField], doc_type: DocType) -> Result<String> {
    let filters = fields
        .iter()
        .map(|field| create_filter(field, doc_type))
        .collect::<Result<Vec<_>>>()?;
    Ok(filters.join(","))
}

fn create_filter(field: &FilterField, doc_type: DocType) -> Result<String> {
    if field.operation == Operation::Has {
        let alias = has_field_alias(&field.name).ok_or_else(|| {
            CompileError::bad_query(format!("Field {} is not defined in the type model", field.name))
        })?;
        let op = if field.value.is_true() { "exists" } else { "missing" };
        return Ok(format!("{op}({alias})"));
    }

    let name = field_name(field, doc_type);
    if field.operation == Operation::All {
        let FieldValue::Array(values) = &field.value else {
            return Err(CompileError::bad_query(format!("Operation 'all' on {name} requires an array")));
        };
        let filters: Vec<String> = values.iter().map(|v| format!("in({name},{v})")).collect();
        return Ok(format!("and({})", filters.join(",")));
    }

    if field.value.contains_missing() {
        return Ok(missing_filter(field, &name));
    }

    let filter = match &field.value {
        FieldValue::Array(values) => format!("in({name},{})", join_values(values.iter())),
        FieldValue::Single(value) if field.operation == Operation::Is => format!("eq({name},{value})"),
        FieldValue::Single(value) => format!("ne({name},{value})"),
    };
    Ok(match (&field.operation, &field.value) {
        (Operation::Not, FieldValue::Array(_)) => format!("not({filter})"),
        _ => filter,
    })
}

fn missing_filter(field: &FilterField, name: &str) -> String {
    let missing = format!("missing({name})");
    let FieldValue::Array(values) = &field.value else {
        return missing;
    };

    let rest: Vec<&Value> = values.iter().filter(|v| v.as_str() != Some(MISSING_VALUE)).collect();
    let filter = if rest.is_empty() {
        missing
    } else {
        format!("or({missing},in({name},{}))", join_values(rest.into_iter()))
    };
    match field.operation {
        Operation::Not => format!("not({filter})"),
        _ => filter,
    }
}

fn join_values<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values.map(Value::to_string).collect::<Vec<_>>().join(",")
}

/// Public PQL alias of a field.
fn field_name(field: &FilterField, doc_type: DocType) -> String {
    if doc_type == DocType::MutationCentric && NESTED_FIELDS.contains(&field.name.as_str()) {
        field.name.clone()
    } else {
        format!("{}.{}", field.prefix, field.name)
    }
}

/// Split an entity's fields by the nesting path they live at in `doc_type`.
fn group_by_nested_path(
    prefix: &str,
    fields: Vec<FilterField>,
    doc_type: DocType,
) -> Result<Vec<(String, FilterField)>> {
    if is_type_match(prefix, doc_type) {
        return Ok(fields.into_iter().map(|f| (String::new(), f)).collect());
    }

    let mut result = Vec::with_capacity(fields.len());
    let fields = if doc_type == DocType::MutationCentric && prefix == "mutation" {
        let (nested, flat): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .partition(|f| NESTED_FIELDS.contains(&f.name.as_str()));
        result.extend(flat.into_iter().map(|f| (String::new(), f)));
        nested
    } else {
        fields
    };

    let model = doc_type.type_model();
    for field in fields {
        let path = resolve_nested_path(&field, model)?;
        result.push((path, field));
    }
    Ok(result)
}

/// Fields of the view's own entity are never nested, except in the
/// mutation-centric view where some mutation fields are.
fn is_type_match(prefix: &str, doc_type: DocType) -> bool {
    doc_type != DocType::MutationCentric && doc_type.id().starts_with(prefix)
}

fn resolve_nested_path(field: &FilterField, model: &TypeModel) -> Result<String> {
    let doc_type = model.doc_type();
    let name = field_name(field, doc_type);

    if SPECIAL_FIELDS_NESTING.contains(&name.as_str()) || SPECIAL_FIELDS_NESTING.contains(&field.name.as_str()) {
        return special_nested_path(&name, doc_type).map(str::to_string);
    }
    Ok(model.nested_path(&name)?.unwrap_or_default().to_string())
}

fn special_nested_path(name: &str, doc_type: DocType) -> Result<&'static str> {
    let is_gene = name.starts_with("gene");
    let is_donor_set = name == "donor.entitySetId";
    let path = match doc_type {
        DocType::DonorCentric if is_gene => "gene",
        DocType::DonorCentric if is_donor_set => "",
        DocType::DonorCentric => "gene.ssm",
        DocType::GeneCentric if is_gene => "",
        DocType::GeneCentric if is_donor_set => "donor",
        DocType::GeneCentric => "donor.ssm",
        DocType::MutationCentric if is_gene => "transcript",
        DocType::MutationCentric if is_donor_set => "ssm_occurrence",
        DocType::MutationCentric => "",
        DocType::ObservationCentric if is_gene => "ssm.gene",
        DocType::ObservationCentric => "ssm",
        DocType::Project | DocType::File => {
            return Err(CompileError::bad_query(format!(
                "Could not resolve nested path for field {name} in type {doc_type}"
            )));
        }
    };
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_gene_facet_family() {
        assert_eq!(gene_facet_family("hasPathway"), "pathway");
        assert_eq!(gene_facet_family("compoundId"), "compound");
    }

    #[test]
    fn test_group_nested_paths_common_parent() {
        let model = DocType::DonorCentric.type_model();
        let groups = group_nested_paths(&["gene.ssm.observation", "gene.ssm.consequence"], model);
        assert_eq!(
            groups,
            vec![("gene.ssm".to_string(), paths(&["gene.ssm.consequence", "gene.ssm.observation"]))]
        );
    }

    #[test]
    fn test_group_nested_paths_unrelated() {
        let model = DocType::MutationCentric.type_model();
        let groups = group_nested_paths(&["transcript", "ssm_occurrence", "ssm_occurrence.observation"], model);
        assert_eq!(
            groups,
            vec![
                ("ssm_occurrence".to_string(), paths(&["ssm_occurrence", "ssm_occurrence.observation"])),
                ("transcript".to_string(), paths(&["transcript"])),
            ]
        );
    }

    #[test]
    fn test_enclose_with_common_parent() {
        assert!(!is_enclose_with_common_parent(&paths(&["gene", "gene.ssm"])));
        assert!(is_enclose_with_common_parent(&paths(&["gene.ssm.consequence", "gene.ssm.observation"])));
        assert!(!is_enclose_with_common_parent(&paths(&[
            "gene",
            "gene.ssm.consequence",
            "gene.ssm.observation"
        ])));
    }

    #[test]
    fn test_empty_operation_is_skipped() {
        let filters: PortalFilters = r#"{"donor": {"id": {}}}"#.parse().unwrap();
        assert!(filters.entities.is_empty());
    }
}
