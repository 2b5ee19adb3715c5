//! Template file loading.
//!
//! Plain templates are read from disk. Executable templates are handed to a
//! [`TemplateHost`], an external collaborator that evaluates the file with
//! the slots in scope and returns the markup it printed.

use crate::slots::Slots;
use markupkit_common::{MarkupKitError, OptionExt, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Evaluates an executable template and returns its markup output.
pub trait TemplateHost {
    fn render(&self, path: &Path, slots: &Slots) -> Result<String>;
}

/// Runs an external program as the template host.
///
/// The program is invoked as `program [args...] <template path>`, receives
/// the slots as a JSON object on stdin, and must write markup to stdout.
/// A non-zero exit status is an error carrying the program's stderr.
#[derive(Debug, Clone)]
pub struct CommandHost {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandHost {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument placed before the template path.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl TemplateHost for CommandHost {
    fn render(&self, path: &Path, slots: &Slots) -> Result<String> {
        debug!(program = %self.program.display(), template = %path.display(), "running template host");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                MarkupKitError::template_host_with_source(
                    format!("failed to start {}", self.program.display()),
                    e,
                )
            })?;

        let input = slots.to_json_value().to_string();
        if let Some(mut stdin) = child.stdin.take() {
            // A host that ignores its input may close stdin early.
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                debug!(error = %e, "template host did not read slots");
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, template = %path.display(), "template host failed");
            return Err(MarkupKitError::template_host(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            MarkupKitError::template_host_with_source("template host wrote invalid UTF-8", e)
        })
    }
}

/// Resolve a template path, failing with `TemplateNotFound` when no file
/// exists there.
pub fn locate(path: &Path) -> Result<&Path> {
    path.is_file().then_some(path).ok_or_not_found(path)
}

/// Read a plain template file.
pub fn load_template(path: &Path) -> Result<String> {
    let path = locate(path)?;
    let text = std::fs::read_to_string(path)?;
    debug!(template = %path.display(), bytes = text.len(), "loaded template");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>{{x}}</p>").unwrap();
        assert_eq!(load_template(&path).unwrap(), "<p>{{x}}</p>");
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.html");
        let err = load_template(&path).unwrap_err();
        match err {
            MarkupKitError::TemplateNotFound { path: reported } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
        // A directory is not a template.
        assert!(matches!(
            load_template(dir.path()),
            Err(MarkupKitError::TemplateNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_host_receives_slots_and_path() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.sh");
        fs::write(&template, "ignored").unwrap();

        // `sh -c script argv0 path`: echo the path's file name and the stdin JSON.
        let host = CommandHost::new("sh")
            .arg("-c")
            .arg(r#"printf '<p data-file="%s">' "$(basename "$1")"; cat; printf '</p>'"#)
            .arg("host");
        let slots = Slots::new().with("a", "1");
        let output = host.render(&template, &slots).unwrap();
        assert_eq!(output, r#"<p data-file="page.sh">{"a":"1"}</p>"#);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_host_failure() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("page.sh");
        fs::write(&template, "").unwrap();
        let host = CommandHost::new("sh")
            .arg("-c")
            .arg("echo broken >&2; exit 3")
            .arg("host");
        let err = host.render(&template, &Slots::new()).unwrap_err();
        assert_eq!(err.category(), "template_host");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_command_host_missing_program() {
        let host = CommandHost::new("/nonexistent/markupkit-host");
        let err = host
            .render(Path::new("x.tpl"), &Slots::new())
            .unwrap_err();
        assert!(matches!(err, MarkupKitError::TemplateHost { source: Some(_), .. }));
    }
}
