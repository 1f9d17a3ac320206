use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{DEFAULT_CATALOG, load_config};

pub const CONFIG_FILENAME: &str = "patchlist.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Heuristic,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub cwd: PathBuf,
    pub executable_dir: Option<PathBuf>,
}

impl ResolutionContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("failed to read current directory")?;
        let executable_dir = env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));
        Ok(Self {
            cwd,
            executable_dir,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub catalog_path: PathBuf,
    pub patches_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub extras_dir: PathBuf,
    pub root_source: ValueSource,
    pub config_source: ValueSource,
    pub catalog_source: ValueSource,
}

#[derive(Debug, Clone)]
pub struct RuntimeStatus {
    pub project_root_exists: bool,
    pub config_exists: bool,
    pub catalog_exists: bool,
    pub catalog_size_bytes: Option<u64>,
    pub patches_dir_exists: bool,
    pub screenshots_dir_exists: bool,
    pub extras_dir_exists: bool,
    pub warnings: Vec<String>,
}

impl ResolvedPaths {
    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={} ({})\nconfig_path={} ({})\ncatalog_path={} ({})\npatches_dir={}\nscreenshots_dir={}\nextras_dir={}",
            normalize_for_display(&self.project_root),
            self.root_source.as_str(),
            normalize_for_display(&self.config_path),
            self.config_source.as_str(),
            normalize_for_display(&self.catalog_path),
            self.catalog_source.as_str(),
            normalize_for_display(&self.patches_dir),
            normalize_for_display(&self.screenshots_dir),
            normalize_for_display(&self.extras_dir),
        )
    }
}

pub fn inspect_runtime(paths: &ResolvedPaths) -> Result<RuntimeStatus> {
    let catalog_exists = paths.catalog_path.is_file();
    let catalog_size_bytes = if catalog_exists {
        let metadata = std::fs::metadata(&paths.catalog_path)
            .with_context(|| format!("failed to inspect {}", paths.catalog_path.display()))?;
        Some(metadata.len())
    } else {
        None
    };
    let patches_dir_exists = paths.patches_dir.is_dir();
    let screenshots_dir_exists = paths.screenshots_dir.is_dir();
    let extras_dir_exists = paths.extras_dir.is_dir();

    let mut warnings = Vec::new();
    if !catalog_exists {
        warnings.push(format!(
            "catalog is missing: {}",
            normalize_for_display(&paths.catalog_path)
        ));
    }
    for (exists, dir) in [
        (patches_dir_exists, &paths.patches_dir),
        (screenshots_dir_exists, &paths.screenshots_dir),
        (extras_dir_exists, &paths.extras_dir),
    ] {
        if !exists {
            warnings.push(format!(
                "asset directory is missing: {}",
                normalize_for_display(dir)
            ));
        }
    }

    Ok(RuntimeStatus {
        project_root_exists: paths.project_root.exists(),
        config_exists: paths.config_path.exists(),
        catalog_exists,
        catalog_size_bytes,
        patches_dir_exists,
        screenshots_dir_exists,
        extras_dir_exists,
        warnings,
    })
}

pub fn resolve_paths(
    context: &ResolutionContext,
    overrides: &PathOverrides,
) -> Result<ResolvedPaths> {
    resolve_paths_with_lookup(context, overrides, |key| env::var(key).ok())
}

pub(crate) fn resolve_paths_with_lookup<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: F,
) -> Result<ResolvedPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let (project_root, root_source) = resolve_project_root(context, overrides, &lookup_env);

    let (config_path, config_source) = if let Some(path) = overrides.config.as_deref() {
        (absolutize(path, &project_root), ValueSource::Flag)
    } else if let Some(value) = non_empty_env(&lookup_env, "PATCHLIST_CONFIG") {
        (
            absolutize(Path::new(&value), &project_root),
            ValueSource::Env,
        )
    } else {
        (project_root.join(CONFIG_FILENAME), ValueSource::Default)
    };
    let config = load_config(&config_path).context("failed to load patchlist config")?;

    let (catalog_path, catalog_source) = if let Some(path) = overrides.catalog.as_deref() {
        (absolutize(path, &context.cwd), ValueSource::Flag)
    } else if let Some(value) = non_empty_env(&lookup_env, "PATCHLIST_CATALOG") {
        (
            absolutize(Path::new(&value), &project_root),
            ValueSource::Env,
        )
    } else if config.has_catalog_override() {
        (
            absolutize(Path::new(config.catalog()), &project_root),
            ValueSource::Config,
        )
    } else {
        (project_root.join(DEFAULT_CATALOG), ValueSource::Default)
    };

    Ok(ResolvedPaths {
        patches_dir: absolutize(Path::new(config.patches_dir()), &project_root),
        screenshots_dir: absolutize(Path::new(config.screenshots_dir()), &project_root),
        extras_dir: absolutize(Path::new(config.extras_dir()), &project_root),
        project_root,
        config_path,
        catalog_path,
        root_source,
        config_source,
        catalog_source,
    })
}

fn non_empty_env<F>(lookup_env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_env(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_project_root<F>(
    context: &ResolutionContext,
    overrides: &PathOverrides,
    lookup_env: &F,
) -> (PathBuf, ValueSource)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = overrides.project_root.as_deref() {
        return (absolutize(path, &context.cwd), ValueSource::Flag);
    }

    if let Some(value) = non_empty_env(lookup_env, "PATCHLIST_PROJECT_ROOT") {
        return (
            absolutize(Path::new(&value), &context.cwd),
            ValueSource::Env,
        );
    }

    let root = detect_project_root_heuristic(&context.cwd, context.executable_dir.as_deref());
    (root, ValueSource::Heuristic)
}

fn detect_project_root_heuristic(cwd: &Path, executable_dir: Option<&Path>) -> PathBuf {
    let mut seen = HashSet::new();
    for candidate in candidate_roots(cwd, executable_dir) {
        let key = normalize_for_display(&candidate);
        if !seen.insert(key) {
            continue;
        }
        if candidate.join(CONFIG_FILENAME).exists() || candidate.join(DEFAULT_CATALOG).exists() {
            return candidate;
        }
    }
    cwd.to_path_buf()
}

fn candidate_roots(cwd: &Path, executable_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut out = cwd.ancestors().map(Path::to_path_buf).collect::<Vec<_>>();
    if let Some(exe_dir) = executable_dir {
        out.extend(exe_dir.ancestors().map(Path::to_path_buf));
    }
    out
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
