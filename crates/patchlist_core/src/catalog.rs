use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_yaml::Value;

use crate::entry::{Entry, EntryField, Field, FieldValue};
use crate::error::CatalogError;

/// Parsed catalog: every column-0 comment line plus the entries in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub header: Vec<String>,
    pub entries: Vec<Entry>,
}

#[derive(Debug)]
struct Fragment {
    line: usize,
    text: String,
}

/// Read and parse the catalog, returning the source text alongside it.
pub fn load_catalog(path: &Path) -> Result<(String, Catalog)> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let catalog = parse_catalog(&text)?;
    tracing::debug!(
        path = %path.display(),
        entries = catalog.entries.len(),
        "parsed catalog"
    );
    Ok((text, catalog))
}

pub fn parse_catalog(text: &str) -> Result<Catalog, CatalogError> {
    let text = text.replace("\r\n", "\n");
    let (header, fragments) = split_fragments(&text)?;
    let entries = fragments
        .iter()
        .map(parse_fragment)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Catalog { header, entries })
}

fn is_fragment_start(line: &str) -> bool {
    line.starts_with("- ") || line == "-"
}

fn split_fragments(text: &str) -> Result<(Vec<String>, Vec<Fragment>), CatalogError> {
    let mut header = Vec::new();
    let mut fragments: Vec<Fragment> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        // Column-0 comments anywhere in the file belong to the header.
        if !fragments.is_empty() && line.starts_with('#') {
            header.push(line.trim_end().to_string());
            continue;
        }
        if is_fragment_start(line) {
            fragments.push(Fragment {
                line: index + 1,
                text: String::new(),
            });
        }
        match fragments.last_mut() {
            Some(fragment) => {
                fragment.text.push_str(line);
                fragment.text.push('\n');
            }
            None => {
                let trimmed = line.trim();
                if trimmed.starts_with('#') {
                    header.push(trimmed.to_string());
                } else if !trimmed.is_empty() {
                    return Err(CatalogError::UnexpectedContent { line: index + 1 });
                }
            }
        }
    }

    Ok((header, fragments))
}

fn parse_fragment(fragment: &Fragment) -> Result<Entry, CatalogError> {
    let parse_error = |message: String| CatalogError::Parse {
        line: fragment.line,
        message,
    };

    let decoded: Vec<Value> =
        serde_yaml::from_str(&fragment.text).map_err(|error| parse_error(error.to_string()))?;
    let [Value::Mapping(mapping)] = decoded.as_slice() else {
        return Err(parse_error("expected a single mapping".to_string()));
    };

    let label = match mapping.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => format!("entry at line {}", fragment.line),
    };

    let mut decoded_fields = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let Value::String(key) = key else {
            return Err(parse_error(format!("non-text key {key:?}")));
        };
        let field = Field::from_key(key).ok_or_else(|| CatalogError::UnknownField {
            entry: label.clone(),
            field: key.clone(),
        })?;
        decoded_fields.push((key.as_str(), field, FieldValue::from_yaml(value)));
    }

    let segments = segment_fields(&fragment.text);
    let aligned = segments.len() == decoded_fields.len()
        && segments
            .iter()
            .zip(&decoded_fields)
            .all(|((segment_key, _), (key, _, _))| segment_key == key);
    if !aligned {
        return Err(parse_error(
            "unable to align fields with source text".to_string(),
        ));
    }

    let fields = segments
        .into_iter()
        .zip(decoded_fields)
        .map(|((_, raw), (_, field, value))| EntryField { field, value, raw })
        .collect();

    Ok(Entry {
        line: fragment.line,
        fields,
    })
}

/// Split a fragment into `(key, raw text after the colon)` pairs.
///
/// A field starts on the fragment's first line (`- key:`) or on a line indented
/// by exactly two spaces (`  key:`). Every other line belongs to the field above.
fn segment_fields(text: &str) -> Vec<(&str, String)> {
    let mut segments: Vec<(&str, String)> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let candidate = if index == 0 {
            line.strip_prefix("- ")
        } else {
            line.strip_prefix("  ")
                .filter(|rest| rest.starts_with(|ch: char| ch.is_ascii_lowercase()))
        };
        if let Some((key, rest)) = candidate.and_then(split_key) {
            segments.push((key, rest.to_string()));
            continue;
        }
        if let Some((_, raw)) = segments.last_mut() {
            raw.push('\n');
            raw.push_str(line);
        }
    }
    for (_, raw) in &mut segments {
        let trimmed_len = raw.trim_end().len();
        raw.truncate(trimmed_len);
    }
    segments
}

fn split_key(line: &str) -> Option<(&str, &str)> {
    let key_len = line
        .find(|ch: char| !ch.is_ascii_lowercase())
        .unwrap_or(line.len());
    if key_len == 0 {
        return None;
    }
    let rest = line[key_len..].strip_prefix(':')?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some((&line[..key_len], rest))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{load_catalog, parse_catalog, segment_fields};
    use crate::entry::{Field, FieldValue};
    use crate::error::CatalogError;

    const SAMPLE: &str = "# Example entry:\n# - name: Example\n#   file: example.bps\n\n- name: Beta Hack\n  file: beta.bps\n  authors:\n    - Jane Doe\n  desc: |\n    First line.\n\n    Second paragraph.\n  tags: [platformer, v1.0]\n\n- file: alpha.ips\n  name: Alpha\n  authors: [Someone]\n  date:\n";

    #[test]
    fn parse_keeps_header_and_entries() {
        let catalog = parse_catalog(SAMPLE).expect("parse");
        assert_eq!(
            catalog.header,
            vec![
                "# Example entry:",
                "# - name: Example",
                "#   file: example.bps"
            ]
        );
        assert_eq!(catalog.entries.len(), 2);

        let beta = &catalog.entries[0];
        assert_eq!(beta.line, 5);
        assert_eq!(beta.name(), "Beta Hack");
        assert_eq!(beta.list(Field::Authors), ["Jane Doe".to_string()]);
        assert_eq!(
            beta.list(Field::Tags),
            ["platformer".to_string(), "v1.0".to_string()]
        );
        assert_eq!(
            beta.text(Field::Desc),
            Some("First line.\n\nSecond paragraph.\n")
        );

        let alpha = &catalog.entries[1];
        assert_eq!(alpha.get(Field::Date), Some(&FieldValue::Empty));
        assert_eq!(alpha.get(Field::Link), None);
        assert_eq!(alpha.fields[0].field, Field::File);
    }

    #[test]
    fn raw_text_is_kept_per_field() {
        let catalog = parse_catalog(SAMPLE).expect("parse");
        let beta = &catalog.entries[0];
        let desc = beta
            .fields
            .iter()
            .find(|item| item.field == Field::Desc)
            .expect("desc");
        assert_eq!(desc.raw, " |\n    First line.\n\n    Second paragraph.");
        let date = catalog.entries[1]
            .fields
            .iter()
            .find(|item| item.field == Field::Date)
            .expect("date");
        assert_eq!(date.raw, "");
    }

    #[test]
    fn segment_fields_ignores_nested_keys() {
        let segments = segment_fields("- name: A\n  desc: |\n    note: not a key\n  file: a.bps\n");
        let keys = segments.iter().map(|(key, _)| *key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["name", "desc", "file"]);
        assert_eq!(segments[1].1, " |\n    note: not a key");
    }

    #[test]
    fn unknown_field_is_fatal() {
        let error = parse_catalog("- name: A\n  file: a.bps\n  rating: 5\n").expect_err("fail");
        assert_eq!(
            error,
            CatalogError::UnknownField {
                entry: "A".to_string(),
                field: "rating".to_string(),
            }
        );
    }

    #[test]
    fn content_before_first_entry_is_rejected() {
        let error = parse_catalog("# header\n---\n- name: A\n").expect_err("fail");
        assert_eq!(error, CatalogError::UnexpectedContent { line: 2 });
    }

    #[test]
    fn malformed_yaml_names_the_entry_line() {
        let error =
            parse_catalog("- name: A\n  file: a.bps\n\n- name: [broken\n").expect_err("fail");
        match error {
            CatalogError::Parse { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn flow_mapping_entries_cannot_be_aligned() {
        let error = parse_catalog("- {name: A, file: a.bps}\n").expect_err("fail");
        assert!(error.to_string().contains("unable to align fields"));
    }

    #[test]
    fn empty_text_is_an_empty_catalog() {
        let catalog = parse_catalog("").expect("parse");
        assert!(catalog.header.is_empty());
        assert!(catalog.entries.is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let catalog = parse_catalog("- name: A\r\n  file: a.bps\r\n").expect("parse");
        assert_eq!(catalog.entries[0].text(Field::File), Some("a.bps"));
    }

    #[test]
    fn load_catalog_reads_from_disk() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("patches.yaml");
        fs::write(&path, SAMPLE).expect("write");
        let (text, catalog) = load_catalog(&path).expect("load");
        assert_eq!(text, SAMPLE);
        assert_eq!(catalog.entries.len(), 2);

        let error = load_catalog(&temp.path().join("absent.yaml")).expect_err("missing");
        assert!(error.to_string().contains("absent.yaml"));
    }

    #[test]
    fn comments_between_entries_join_the_header() {
        let catalog = parse_catalog(
            "# head\n- name: B\n  authors: [X]\n# section two\n- name: A\n  desc: hi\n# after desc\n  authors: [Y]\n",
        )
        .expect("parse");
        assert_eq!(
            catalog.header,
            vec!["# head", "# section two", "# after desc"]
        );
        assert_eq!(catalog.entries[0].list(Field::Authors), ["X".to_string()]);
        let desc = catalog.entries[1]
            .fields
            .iter()
            .find(|item| item.field == Field::Desc)
            .expect("desc");
        assert_eq!(desc.raw, " hi");
        assert_eq!(catalog.entries[1].list(Field::Authors), ["Y".to_string()]);
    }
}
