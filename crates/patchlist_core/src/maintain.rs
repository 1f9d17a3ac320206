use anyhow::Result;
use serde::Serialize;
use similar::TextDiff;

use crate::assets::scan_inventory;
use crate::catalog::{Catalog, load_catalog};
use crate::normalize::{normalize, write_catalog};
use crate::runtime::{ResolvedPaths, normalize_for_display};
use crate::validate::{ValidationReport, Warning, validate};

#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    pub dry_run: bool,
    pub diff: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetCounts {
    pub patches: usize,
    pub screenshots: usize,
    pub extras: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub catalog_path: String,
    pub assets: AssetCounts,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub catalog_path: String,
    pub entries: usize,
    pub added_placeholders: Vec<String>,
    pub warnings: Vec<Warning>,
    pub changed: bool,
    pub wrote: bool,
    pub diff: Option<String>,
}

/// Scan, parse and validate without touching the catalog.
pub fn check_catalog(paths: &ResolvedPaths) -> Result<CheckReport> {
    let (_, _, report) = load_and_validate(paths)?;
    Ok(report)
}

/// The full maintenance pass: validate, then rewrite the catalog in canonical form.
pub fn sort_catalog(paths: &ResolvedPaths, options: &SortOptions) -> Result<SortReport> {
    let (original, catalog, check) = load_and_validate(paths)?;
    let validation = check.validation;

    for filename in &validation.uncovered_patches {
        tracing::info!(file = %filename, "patch missing from catalog; adding placeholder");
    }
    let rendered = normalize(&catalog, &validation.uncovered_patches);
    let changed = rendered != original;

    let diff = (options.diff && changed).then(|| {
        TextDiff::from_lines(original.as_str(), rendered.as_str())
            .unified_diff()
            .context_radius(3)
            .header(&check.catalog_path, &check.catalog_path)
            .to_string()
    });

    let wrote = !options.dry_run;
    if wrote {
        write_catalog(&paths.catalog_path, &rendered)?;
    }

    Ok(SortReport {
        catalog_path: check.catalog_path,
        entries: catalog.entries.len() + validation.uncovered_patches.len(),
        added_placeholders: validation.uncovered_patches,
        warnings: validation.warnings,
        changed,
        wrote,
        diff,
    })
}

fn load_and_validate(paths: &ResolvedPaths) -> Result<(String, Catalog, CheckReport)> {
    let assets = scan_inventory(paths)?;
    let (original, catalog) = load_catalog(&paths.catalog_path)?;
    let validation = validate(&catalog, &assets)?;

    let report = CheckReport {
        catalog_path: normalize_for_display(&paths.catalog_path),
        assets: AssetCounts {
            patches: assets.patches.len(),
            screenshots: assets.screenshots.len(),
            extras: assets.extras.len(),
        },
        validation,
    };
    Ok((original, catalog, report))
}
