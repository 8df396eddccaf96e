//! Local policy definitions and the documents they point at.
//!

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal text substitutions applied to a document before it's parsed.
/// Applied in insertion order.
pub type Replacements = IndexMap<String, String>;

/// A named policy and the file holding its document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    /// Unique, human-assigned policy name
    pub name: String,
    /// File name, resolved relative to the policy directory
    pub file: PathBuf,
}

impl PolicyDefinition {
    /// Basic constructor
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, file: P) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }

    /// Where this definition's document lives under `dir`.
    pub fn path_in<P: AsRef<Path>>(&self, dir: P) -> PathBuf {
        dir.as_ref().join(&self.file)
    }
}

/// The ordered set of policies managed together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet(pub Vec<PolicyDefinition>);

impl PolicySet {
    /// Iterate the definitions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PolicyDefinition> {
        self.0.iter()
    }

    /// Just the names, in order.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|d| d.name.to_owned()).collect()
    }
}

impl Default for PolicySet {
    /// The four course policies: storage, streaming, data catalog and
    /// temporary credentials.
    fn default() -> Self {
        PolicySet(vec![
            PolicyDefinition::new("CourseLab-S3", "policy_s3.json"),
            PolicyDefinition::new("CourseLab-Streaming", "policy_streaming.json"),
            PolicyDefinition::new("CourseLab-Glue", "policy_glue.json"),
            PolicyDefinition::new("CourseLab-IAM-STS", "policy_iam_sts.json"),
        ])
    }
}

impl<'a> IntoIterator for &'a PolicySet {
    type Item = &'a PolicyDefinition;
    type IntoIter = std::slice::Iter<'a, PolicyDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A parsed permission document. Its contents are never interpreted here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument(pub serde_json::Value);

impl PolicyDocument {
    /// The compact JSON text sent to the remote service.
    pub fn to_json(&self) -> String {
        self.0.to_string()
    }
}

/// Problems reading a local policy document.
#[derive(Debug, Error)]
pub enum PolicyFileError {
    /// The file isn't there
    #[error("missing policy file: {}", .0.display())]
    Missing(PathBuf),
    /// The file exists but couldn't be read
    #[error("failed to read policy file {}: {source}", .path.display())]
    Read {
        /// Offending file
        path: PathBuf,
        /// Underlying io error
        source: std::io::Error,
    },
    /// The substituted text isn't valid JSON
    #[error("failed to load policy JSON {}: {source}", .path.display())]
    Malformed {
        /// Offending file
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },
}

/// Apply each replacement, in order, as a literal find-and-replace.
pub fn apply_replacements(raw: &str, replacements: &Replacements) -> String {
    replacements
        .iter()
        .fold(raw.to_owned(), |text, (from, to)| text.replace(from, to))
}

/// Read a policy file, substitute, then parse it.
pub fn load_document<P: AsRef<Path>>(
    path: P,
    replacements: &Replacements,
) -> Result<PolicyDocument, PolicyFileError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PolicyFileError::Missing(path.to_owned()));
    }
    let raw = fs::read_to_string(path).map_err(|source| PolicyFileError::Read {
        path: path.to_owned(),
        source,
    })?;
    let text = apply_replacements(&raw, replacements);
    serde_json::from_str(&text)
        .map(PolicyDocument)
        .map_err(|source| PolicyFileError::Malformed {
            path: path.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn default_set_has_the_four_course_policies() {
        assert_eq!(
            PolicySet::default().names(),
            vec![
                "CourseLab-S3",
                "CourseLab-Streaming",
                "CourseLab-Glue",
                "CourseLab-IAM-STS"
            ]
        );
    }

    #[test]
    fn replacements_are_literal_and_ordered() {
        let mut r = Replacements::new();
        r.insert("${BUCKET}".to_owned(), "lab-bucket".to_owned());
        r.insert("lab-".to_owned(), "course-".to_owned());
        assert_eq!(
            apply_replacements("arn:aws:s3:::${BUCKET}/*", &r),
            "arn:aws:s3:::course-bucket/*"
        );
    }

    #[test]
    fn load_document_substitutes_before_parsing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("policy_s3.json");
        fs::write(
            &path,
            r#"{"Version": "2012-10-17", "Statement": [{"Effect": "Allow", "Action": "s3:*", "Resource": "${ACCOUNT}"}]}"#,
        )?;
        let mut r = Replacements::new();
        r.insert("${ACCOUNT}".to_owned(), "123456789012".to_owned());

        let doc = load_document(&path, &r)?;
        assert_eq!(doc.0["Statement"][0]["Resource"], json!("123456789012"));
        Ok(())
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path().join("nope.json"), &Replacements::new()).unwrap_err();
        assert!(matches!(err, PolicyFileError::Missing(_)));
    }

    #[test]
    fn malformed_document_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy_glue.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_document(&path, &Replacements::new()).unwrap_err();
        assert!(matches!(err, PolicyFileError::Malformed { .. }));
        assert!(err.to_string().contains("policy_glue.json"));
    }

    #[test]
    fn substitution_can_break_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy_iam_sts.json");
        fs::write(&path, r#"{"Resource": "X"}"#).unwrap();
        let mut r = Replacements::new();
        r.insert("\"X\"".to_owned(), "X".to_owned());
        assert!(matches!(
            load_document(&path, &r),
            Err(PolicyFileError::Malformed { .. })
        ));
    }
}
