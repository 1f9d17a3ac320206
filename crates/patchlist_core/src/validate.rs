use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::assets::{AssetInventory, AssetKind};
use crate::catalog::Catalog;
use crate::entry::{Entry, Field, FieldValue, PLACEHOLDER_AUTHOR};
use crate::error::CatalogError;

/// Word characters or dots, nothing else.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.]+$").expect("tag pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsagePool {
    Authors,
    Tags,
}

impl UsagePool {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    Unreferenced {
        asset: AssetKind,
        filename: String,
    },
    CaseDisagreement {
        pool: UsagePool,
        variants: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreferenced { asset, filename } => write!(
                f,
                "{}/{} is not referenced by any patch",
                asset.label(),
                filename
            ),
            Self::CaseDisagreement { pool, variants } => write!(
                f,
                "case disagreement in {}: {}",
                pool.as_str(),
                variants.join(" / ")
            ),
        }
    }
}

/// Usage of one author or tag, grouped case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageCount {
    /// First spelling seen in the catalog.
    pub value: String,
    pub count: usize,
    /// Distinct spellings in first-seen order.
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub entries: usize,
    pub warnings: Vec<Warning>,
    /// Patch files on disk that no entry's `file` references, in scan order.
    pub uncovered_patches: Vec<String>,
    pub authors: Vec<UsageCount>,
    pub tags: Vec<UsageCount>,
}

/// Run every consistency rule in order. The first failing rule aborts.
pub fn validate(
    catalog: &Catalog,
    assets: &AssetInventory,
) -> Result<ValidationReport, CatalogError> {
    let entries = &catalog.entries;

    tracing::debug!("validating required fields");
    check_required(entries)?;
    tracing::debug!("validating field types");
    check_field_types(entries)?;
    tracing::debug!("validating no placeholders remain");
    check_placeholders(entries)?;
    tracing::debug!("validating unique names");
    check_unique_names(entries)?;
    tracing::debug!("validating unique files");
    let files = check_unique_files(entries)?;
    tracing::debug!("validating patches are present");
    check_patch_files(entries, assets)?;
    tracing::debug!("validating extras are present");
    check_references(entries, assets, AssetKind::Extra)?;
    tracing::debug!("validating screenshots are present");
    check_references(entries, assets, AssetKind::Screenshot)?;

    let mut warnings = unreferenced_assets(entries, assets, AssetKind::Screenshot);
    warnings.extend(unreferenced_assets(entries, assets, AssetKind::Extra));

    tracing::debug!("validating tags");
    check_tags(entries)?;

    let mut authors = usage(entries, Field::Authors);
    let mut tags = usage(entries, Field::Tags);
    warnings.extend(case_disagreements(UsagePool::Authors, &authors));
    warnings.extend(case_disagreements(UsagePool::Tags, &tags));
    sort_usage(&mut authors);
    sort_usage(&mut tags);

    let uncovered_patches = assets
        .patches
        .iter()
        .filter(|patch| !files.contains(patch.as_str()))
        .cloned()
        .collect();

    Ok(ValidationReport {
        entries: entries.len(),
        warnings,
        uncovered_patches,
        authors,
        tags,
    })
}

fn check_required(entries: &[Entry]) -> Result<(), CatalogError> {
    for entry in entries {
        let missing = Field::REQUIRED
            .into_iter()
            .filter(|field| entry.get(*field).is_none())
            .map(Field::as_str)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(CatalogError::MissingFields {
                entry: entry.label(),
                fields: missing,
            });
        }
    }
    Ok(())
}

fn check_field_types(entries: &[Entry]) -> Result<(), CatalogError> {
    for entry in entries {
        for item in &entry.fields {
            let is_list = matches!(item.value, FieldValue::List(_));
            if item.field.is_list() && !is_list {
                return Err(CatalogError::NotAList {
                    entry: entry.label(),
                    field: item.field.as_str(),
                    actual: item.value.type_name(),
                });
            }
            if !item.field.is_list() && (is_list || matches!(item.value, FieldValue::Other(_))) {
                return Err(CatalogError::NotAScalar {
                    entry: entry.label(),
                    field: item.field.as_str(),
                    actual: item.value.type_name(),
                });
            }
        }
    }
    Ok(())
}

fn check_placeholders(entries: &[Entry]) -> Result<(), CatalogError> {
    match entries.iter().find(|entry| {
        entry
            .list(Field::Authors)
            .iter()
            .any(|author| author == PLACEHOLDER_AUTHOR)
    }) {
        Some(entry) => Err(CatalogError::UnresolvedPlaceholder {
            entry: entry.label(),
        }),
        None => Ok(()),
    }
}

fn check_unique_names(entries: &[Entry]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.name()) {
            return Err(CatalogError::DuplicateName {
                entry: entry.label(),
            });
        }
    }
    Ok(())
}

fn check_unique_files(entries: &[Entry]) -> Result<HashSet<&str>, CatalogError> {
    let mut seen = HashSet::new();
    for entry in entries {
        let file = entry.text(Field::File).unwrap_or_default();
        if !seen.insert(file) {
            return Err(CatalogError::DuplicateFile {
                entry: entry.label(),
                file: file.to_string(),
            });
        }
    }
    Ok(seen)
}

fn check_patch_files(entries: &[Entry], assets: &AssetInventory) -> Result<(), CatalogError> {
    for entry in entries {
        let file = entry.text(Field::File).unwrap_or_default();
        if !assets.contains(AssetKind::Patch, file) {
            return Err(CatalogError::MissingPatch {
                entry: entry.label(),
                file: file.to_string(),
            });
        }
    }
    Ok(())
}

fn reference_field(kind: AssetKind) -> Field {
    match kind {
        AssetKind::Patch => Field::File,
        AssetKind::Screenshot => Field::Screenshots,
        AssetKind::Extra => Field::Extras,
    }
}

fn check_references(
    entries: &[Entry],
    assets: &AssetInventory,
    kind: AssetKind,
) -> Result<(), CatalogError> {
    for entry in entries {
        for item in entry.list(reference_field(kind)) {
            if assets.contains(kind, item) {
                continue;
            }
            return Err(match kind {
                AssetKind::Screenshot => CatalogError::MissingScreenshot {
                    entry: entry.label(),
                    screenshot: item.clone(),
                },
                _ => CatalogError::MissingExtra {
                    entry: entry.label(),
                    extra: item.clone(),
                },
            });
        }
    }
    Ok(())
}

fn unreferenced_assets(
    entries: &[Entry],
    assets: &AssetInventory,
    kind: AssetKind,
) -> Vec<Warning> {
    let field = reference_field(kind);
    let referenced = entries
        .iter()
        .flat_map(|entry| entry.list(field))
        .map(String::as_str)
        .collect::<HashSet<_>>();
    assets
        .files(kind)
        .iter()
        .filter(|filename| !referenced.contains(filename.as_str()))
        .map(|filename| Warning::Unreferenced {
            asset: kind,
            filename: filename.clone(),
        })
        .collect()
}

fn check_tags(entries: &[Entry]) -> Result<(), CatalogError> {
    for entry in entries {
        if let Some(tag) = entry
            .list(Field::Tags)
            .iter()
            .find(|tag| !TAG_PATTERN.is_match(tag))
        {
            return Err(CatalogError::InvalidTag {
                entry: entry.label(),
                tag: tag.clone(),
            });
        }
    }
    Ok(())
}

fn usage(entries: &[Entry], field: Field) -> Vec<UsageCount> {
    let mut groups: Vec<UsageCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for value in entries.iter().flat_map(|entry| entry.list(field)) {
        let slot = *index.entry(value.to_lowercase()).or_insert_with(|| {
            groups.push(UsageCount {
                value: value.clone(),
                count: 0,
                variants: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.count += 1;
        if !group.variants.contains(value) {
            group.variants.push(value.clone());
        }
    }
    groups
}

fn case_disagreements(pool: UsagePool, groups: &[UsageCount]) -> Vec<Warning> {
    groups
        .iter()
        .filter(|group| group.variants.len() > 1)
        .map(|group| Warning::CaseDisagreement {
            pool,
            variants: group.variants.clone(),
        })
        .collect()
}

fn sort_usage(groups: &mut [UsageCount]) {
    groups.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.value.cmp(&right.value))
    });
}
