use std::collections::HashSet;
use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use serde::Serialize;

use crate::assets::{AssetKind, list_dir};
use crate::catalog::load_catalog;
use crate::entry::{Entry, Field};
use crate::normalize::{file_stem, list_field, render_entry, text_field, write_catalog};
use crate::runtime::{ResolvedPaths, normalize_for_display};

#[derive(Debug, Clone, Serialize)]
pub struct AppendedEntry {
    pub name: String,
    pub file: String,
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppendReport {
    pub catalog_path: String,
    pub added: Vec<AppendedEntry>,
}

/// Prompt for every patch file the catalog does not mention and append an entry for it.
///
/// Nothing is validated or reordered. Running out of input aborts before the
/// catalog is touched.
pub fn append_missing_patches<R, W>(
    paths: &ResolvedPaths,
    input: &mut R,
    output: &mut W,
) -> Result<AppendReport>
where
    R: BufRead,
    W: Write,
{
    let (original, catalog) = load_catalog(&paths.catalog_path)?;
    let referenced = catalog
        .entries
        .iter()
        .filter_map(|entry| entry.text(Field::File))
        .collect::<HashSet<_>>();

    let patches = list_dir(&paths.patches_dir)?
        .into_iter()
        .filter(|name| AssetKind::Patch.accepts(name) && !referenced.contains(name.as_str()))
        .collect::<Vec<_>>();

    let mut added = Vec::with_capacity(patches.len());
    let mut blocks = Vec::with_capacity(patches.len());
    for patch in patches {
        writeln!(output, "\n{patch}")?;
        let mut name = prompt(input, output, "name: ")?;
        let desc = prompt(input, output, "Description: ")?;
        let authors = split_authors(&prompt(input, output, "authors (comma separated):")?);
        if name.is_empty() {
            name = file_stem(&patch);
        }

        let entry = Entry {
            line: 0,
            fields: vec![
                text_field(Field::Name, &name),
                text_field(Field::File, &patch),
                text_field(Field::Desc, &desc),
                list_field(Field::Authors, authors.clone()),
                text_field(Field::Yt, ""),
            ],
        };
        blocks.push(render_entry(&entry));
        added.push(AppendedEntry {
            name,
            file: patch,
            authors,
        });
    }

    let catalog_path = normalize_for_display(&paths.catalog_path);
    if blocks.is_empty() {
        tracing::info!(path = %catalog_path, "every patch already has an entry");
        return Ok(AppendReport {
            catalog_path,
            added,
        });
    }

    let mut text = original.trim_end().to_string();
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(&blocks.join("\n\n"));
    text.push('\n');
    write_catalog(&paths.catalog_path, &text)?;

    Ok(AppendReport {
        catalog_path,
        added,
    })
}

fn prompt<R, W>(input: &mut R, output: &mut W, label: &str) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{label}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input ended while waiting for `{}`", label.trim_end_matches([':', ' ']));
    }
    Ok(line.trim().to_string())
}

fn split_authors(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|author| !author.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{append_missing_patches, split_authors};
    use crate::catalog::parse_catalog;
    use crate::entry::{Field, FieldValue};
    use crate::runtime::{ResolvedPaths, ValueSource};

    fn paths(project_root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            config_path: project_root.join("patchlist.toml"),
            catalog_path: project_root.join("patches.yaml"),
            patches_dir: project_root.join("patches"),
            screenshots_dir: project_root.join("screenshots"),
            extras_dir: project_root.join("extras"),
            project_root: project_root.to_path_buf(),
            root_source: ValueSource::Flag,
            config_source: ValueSource::Default,
            catalog_source: ValueSource::Default,
        }
    }

    fn seed(root: &Path, catalog: &str, patches: &[&str]) -> ResolvedPaths {
        let paths = paths(root);
        fs::create_dir_all(&paths.patches_dir).expect("patches dir");
        for name in patches {
            fs::write(paths.patches_dir.join(name), b"PATCH").expect("patch");
        }
        fs::write(&paths.catalog_path, catalog).expect("catalog");
        paths
    }

    #[test]
    fn appends_prompted_entries_after_existing_text() {
        let temp = tempdir().expect("tempdir");
        let paths = seed(
            temp.path(),
            "- name: Old\n  file: old.bps\n  authors: [X]\n\n\n",
            &["old.bps", "new.ips", "notes.txt"],
        );
        let mut input = Cursor::new("New Hack\nDoes things: well\nAnn,  Bob ,\n");
        let mut output = Vec::new();

        let report = append_missing_patches(&paths, &mut input, &mut output).expect("append");
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].authors, vec!["Ann", "Bob"]);

        let transcript = String::from_utf8(output).expect("utf8");
        assert_eq!(
            transcript,
            "\nnew.ips\nname: Description: authors (comma separated):"
        );

        let written = fs::read_to_string(&paths.catalog_path).expect("read");
        assert_eq!(
            written,
            "- name: Old\n  file: old.bps\n  authors: [X]\n\n- name: New Hack\n  file: new.ips\n  authors:\n  - Ann\n  - Bob\n  yt:\n  desc: 'Does things: well'\n"
        );

        let catalog = parse_catalog(&written).expect("reparse");
        let entry = &catalog.entries[1];
        assert_eq!(entry.text(Field::Desc), Some("Does things: well"));
        assert_eq!(entry.get(Field::Yt), Some(&FieldValue::Empty));
    }

    #[test]
    fn blank_name_falls_back_to_file_stem() {
        let temp = tempdir().expect("tempdir");
        let paths = seed(temp.path(), "", &["quest.bps"]);
        let mut input = Cursor::new("\n\nSomeone\n");
        let mut output = Vec::new();

        append_missing_patches(&paths, &mut input, &mut output).expect("append");
        let catalog =
            parse_catalog(&fs::read_to_string(&paths.catalog_path).expect("read")).expect("parse");
        assert_eq!(catalog.entries[0].name(), "quest");
        assert_eq!(catalog.entries[0].get(Field::Desc), Some(&FieldValue::Empty));
    }

    #[test]
    fn end_of_input_writes_nothing() {
        let temp = tempdir().expect("tempdir");
        let original = "# header\n";
        let paths = seed(temp.path(), original, &["a.bps", "b.bps"]);
        let mut input = Cursor::new("Alpha\nfirst\nAnn\nBeta\n");
        let mut output = Vec::new();

        let error = append_missing_patches(&paths, &mut input, &mut output).expect_err("eof");
        assert!(error.to_string().contains("Description"));
        assert_eq!(fs::read_to_string(&paths.catalog_path).expect("read"), original);
    }

    #[test]
    fn nothing_to_add_leaves_catalog_alone() {
        let temp = tempdir().expect("tempdir");
        let original = "- name: A\n  file: a.bps\n";
        let paths = seed(temp.path(), original, &["a.bps"]);
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        let report = append_missing_patches(&paths, &mut input, &mut output).expect("append");
        assert!(report.added.is_empty());
        assert!(output.is_empty());
        assert_eq!(fs::read_to_string(&paths.catalog_path).expect("read"), original);
    }

    #[test]
    fn authors_split_on_commas() {
        assert_eq!(split_authors(" a , b,,c "), vec!["a", "b", "c"]);
        assert!(split_authors("   ").is_empty());
    }
}
