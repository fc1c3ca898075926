use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::naming::pascal_case;
use crate::pipeline::error::{PipelineError, Result};

pub const LOCATORS_DIR: &str = "locators";
pub const PAGES_DIR: &str = "pages";
pub const FEATURES_DIR: &str = "features";
pub const SPECS_DIR: &str = "specs";
pub const REPORTS_DIR: &str = "reports";

const ARTIFACT_DIRS: [&str; 5] = [LOCATORS_DIR, PAGES_DIR, FEATURES_DIR, SPECS_DIR, REPORTS_DIR];

/// Where each stage's artifacts live, rooted at one output directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so an
/// artifact is either complete or absent.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn locators_path(&self, subject: &str) -> PathBuf {
        self.root
            .join(LOCATORS_DIR)
            .join(format!("{}_locators.json", subject))
    }

    pub fn page_object_path(&self, subject: &str) -> PathBuf {
        self.root
            .join(PAGES_DIR)
            .join(format!("{}_page.ts", subject))
    }

    pub fn feature_path(&self, subject: &str) -> PathBuf {
        self.root
            .join(FEATURES_DIR)
            .join(format!("{}.feature", pascal_case(subject)))
    }

    pub fn spec_path(&self, subject: &str) -> PathBuf {
        self.root
            .join(SPECS_DIR)
            .join(format!("{}.spec.ts", subject))
    }

    pub fn report_dir(&self, subject: &str) -> PathBuf {
        self.root.join(REPORTS_DIR).join(subject)
    }

    /// Module specifier a spec file uses to import the subject's page object.
    pub fn page_object_import(&self, subject: &str) -> String {
        format!("../{}/{}_page", PAGES_DIR, subject)
    }

    pub fn write_text(&self, path: &Path, contents: &str) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::persistence(parent, e))?;
        }

        let tmp = temp_sibling(path);
        if let Err(e) = fs::write(&tmp, contents) {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::persistence(path, e));
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(PipelineError::persistence(path, e));
        }

        Ok(path.to_path_buf())
    }

    /// Serialize `value` as indented JSON and write it. Returns the written text.
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<String> {
        let json = serde_json::to_string_pretty(value).map_err(|e| PipelineError::Serialize {
            context: path.display().to_string(),
            source: e,
        })?;
        self.write_text(path, &json)?;
        Ok(json)
    }

    /// Delete generated files from every artifact directory, keeping
    /// `preserve` if it lives there. Missing directories are created.
    /// Returns the number of files removed.
    pub fn clear(&self, preserve: Option<&Path>) -> std::io::Result<usize> {
        let preserve = preserve.and_then(|p| p.canonicalize().ok());
        let mut removed = 0;

        for dir in ARTIFACT_DIRS {
            let dir_path = self.root.join(dir);
            if !dir_path.exists() {
                fs::create_dir_all(&dir_path)?;
                continue;
            }
            removed += clear_dir(&dir_path, preserve.as_deref())?;
        }

        Ok(removed)
    }
}

fn clear_dir(dir: &Path, preserve: Option<&Path>) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if preserve.is_some_and(|keep| path.canonicalize().is_ok_and(|p| p == keep)) {
            continue;
        }
        if path.is_dir() {
            removed += clear_dir(&path, preserve)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
            }
        } else {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
