use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::CatalogError;
use crate::runtime::{ResolvedPaths, normalize_for_display};

const PATCH_EXTENSIONS: [&str; 2] = ["ips", "bps"];
const SCREENSHOT_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Patch,
    Screenshot,
    Extra,
}

impl AssetKind {
    /// Directory label used in diagnostics, e.g. `patches/readme.txt`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Patch => "patches",
            Self::Screenshot => "screenshots",
            Self::Extra => "extras",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Screenshot => "screenshot",
            Self::Extra => "extra",
        }
    }

    fn extensions(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Patch => Some(&PATCH_EXTENSIONS[..]),
            Self::Screenshot => Some(&SCREENSHOT_EXTENSIONS[..]),
            Self::Extra => None,
        }
    }

    /// Suffix match only; file contents are never inspected.
    pub fn accepts(self, filename: &str) -> bool {
        let Some(extensions) = self.extensions() else {
            return true;
        };
        let Some((_, extension)) = filename.rsplit_once('.') else {
            return false;
        };
        extensions
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetInventory {
    pub patches: Vec<String>,
    pub screenshots: Vec<String>,
    pub extras: Vec<String>,
}

impl AssetInventory {
    pub fn files(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Patch => &self.patches,
            AssetKind::Screenshot => &self.screenshots,
            AssetKind::Extra => &self.extras,
        }
    }

    pub fn contains(&self, kind: AssetKind, filename: &str) -> bool {
        self.files(kind).iter().any(|name| name == filename)
    }
}

/// Scan all three asset directories. The first disallowed filename aborts the scan.
pub fn scan_inventory(paths: &ResolvedPaths) -> Result<AssetInventory> {
    Ok(AssetInventory {
        patches: scan_assets(&paths.patches_dir, AssetKind::Patch)?,
        screenshots: scan_assets(&paths.screenshots_dir, AssetKind::Screenshot)?,
        extras: scan_assets(&paths.extras_dir, AssetKind::Extra)?,
    })
}

pub fn scan_assets(dir: &Path, kind: AssetKind) -> Result<Vec<String>> {
    let names = list_dir(dir)?;
    if let Some(offender) = names.iter().find(|name| !kind.accepts(name)) {
        return Err(CatalogError::NotAnAsset {
            label: kind.label(),
            noun: kind.noun(),
            filename: offender.clone(),
        }
        .into());
    }
    tracing::debug!(kind = kind.label(), count = names.len(), "scanned asset directory");
    Ok(names)
}

/// Sorted names of every entry directly inside `dir`.
pub fn list_dir(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        bail!("asset directory not found: {}", normalize_for_display(dir));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    Ok(names)
}
