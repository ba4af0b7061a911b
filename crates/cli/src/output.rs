//! Decision reporting: the JSON stream on stdout and the CI output file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use semrel_release_tools::ReleaseDecision;

/// One stdout line per decision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct DecisionLine<'a> {
    new_release: bool,
    version: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
    message: &'a str,
}

/// Serializes a decision to its JSON line.
pub fn decision_line(decision: &ReleaseDecision) -> anyhow::Result<String> {
    let message = match (&decision.note, decision.new_release) {
        (Some(note), _) => note.as_str(),
        (None, true) => "new release found",
        (None, false) => "no new release",
    };

    let line = DecisionLine {
        new_release: decision.new_release,
        version: decision.next_version.to_string(),
        branch: &decision.branch,
        project: decision.project.as_deref(),
        message,
    };

    Ok(serde_json::to_string(&line)?)
}

/// The `key=value` file CI systems pick outputs up from, named by the
/// `GITHUB_OUTPUT` environment variable.
pub struct CiFile {
    file: std::fs::File,
}

/// Uppercases a decision scope and maps non-alphanumerics to `_`:
/// `main` becomes `MAIN`, `release/2.x` + `foo` becomes `RELEASE_2_X_FOO`.
fn scope_of(decision: &ReleaseDecision) -> String {
    let raw = match &decision.project {
        Some(project) => format!("{}_{project}", decision.branch),
        None => decision.branch.clone(),
    };

    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

impl CiFile {
    /// Opens the CI output file when `GITHUB_OUTPUT` names one.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        match std::env::var_os("GITHUB_OUTPUT") {
            Some(path) if !path.is_empty() => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(Path::new(&path))
                    .with_context(|| format!("cannot open CI output file {path:?}"))?;
                Ok(Some(Self { file }))
            }
            _ => Ok(None),
        }
    }

    /// Appends the `<SCOPE>_SEMVER` and `<SCOPE>_NEW_RELEASE` pairs for a
    /// decision.
    pub fn emit(&mut self, decision: &ReleaseDecision, prefix: &str) -> anyhow::Result<()> {
        let scope = scope_of(decision);
        writeln!(self.file, "{scope}_SEMVER={prefix}{}", decision.next_version)?;
        writeln!(self.file, "{scope}_NEW_RELEASE={}", decision.new_release)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semrel_semver_tools::Version;

    fn decision(branch: &str, project: Option<&str>, new_release: bool) -> ReleaseDecision {
        ReleaseDecision {
            branch: branch.to_string(),
            project: project.map(str::to_string),
            prior_version: Version::zero(),
            next_version: Version::parse("1.2.3").unwrap(),
            new_release,
            commit_id: new_release.then(|| "c0ffee".to_string()),
            note: None,
        }
    }

    #[test]
    fn test_decision_line_shape() {
        let line = decision_line(&decision("main", None, true)).unwrap();
        assert_eq!(
            line,
            r#"{"new-release":true,"version":"1.2.3","branch":"main","message":"new release found"}"#
        );

        let line = decision_line(&decision("main", Some("foo"), false)).unwrap();
        assert_eq!(
            line,
            r#"{"new-release":false,"version":"1.2.3","branch":"main","project":"foo","message":"no new release"}"#
        );
    }

    #[test]
    fn test_scope_uppercases_and_sanitizes() {
        assert_eq!(scope_of(&decision("main", None, true)), "MAIN");
        assert_eq!(scope_of(&decision("release/2.x", Some("foo"), true)), "RELEASE_2_X_FOO");
    }
}
