use thiserror::Error;

/// Fatal catalog conditions. Each one stops the run before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{label}/{filename} not a {noun}")]
    NotAnAsset {
        label: &'static str,
        noun: &'static str,
        filename: String,
    },

    #[error("line {line}: unexpected content before the first entry")]
    UnexpectedContent { line: usize },

    #[error("entry at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{entry}: unknown field {field}")]
    UnknownField { entry: String, field: String },

    #[error("{entry} missing information: {}", .fields.join(", "))]
    MissingFields {
        entry: String,
        fields: Vec<&'static str>,
    },

    #[error("{entry}: {field} should be list, not {actual}")]
    NotAList {
        entry: String,
        field: &'static str,
        actual: &'static str,
    },

    #[error("{entry}: {field} should be text, not {actual}")]
    NotAScalar {
        entry: String,
        field: &'static str,
        actual: &'static str,
    },

    #[error("{entry} needs info")]
    UnresolvedPlaceholder { entry: String },

    #[error("{entry} duplicate!")]
    DuplicateName { entry: String },

    #[error("{entry} references duplicate {file}")]
    DuplicateFile { entry: String, file: String },

    #[error("{entry} missing {file}")]
    MissingPatch { entry: String, file: String },

    #[error("{entry} missing extra {extra}")]
    MissingExtra { entry: String, extra: String },

    #[error("{entry} missing screenshot {screenshot}")]
    MissingScreenshot { entry: String, screenshot: String },

    #[error("{entry}: invalid tag {tag}")]
    InvalidTag { entry: String, tag: String },
}

#[cfg(test)]
mod tests {
    use super::CatalogError;

    #[test]
    fn messages_name_entry_and_value() {
        let error = CatalogError::MissingScreenshot {
            entry: "Super Hack".to_string(),
            screenshot: "missing.png".to_string(),
        };
        assert_eq!(error.to_string(), "Super Hack missing screenshot missing.png");

        let error = CatalogError::NotAnAsset {
            label: "patches",
            noun: "patch",
            filename: "readme.txt".to_string(),
        };
        assert_eq!(error.to_string(), "patches/readme.txt not a patch");
    }

    #[test]
    fn missing_fields_lists_every_field() {
        let error = CatalogError::MissingFields {
            entry: "Alpha".to_string(),
            fields: vec!["file", "authors"],
        };
        assert_eq!(error.to_string(), "Alpha missing information: file, authors");
    }
}
