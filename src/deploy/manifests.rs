// ABOUTME: Loads Kubernetes manifests from a service directory and renders them for apply.
// ABOUTME: The image placeholder is the only text that substitution touches.

use nonempty::NonEmpty;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest directory {} not found", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no manifests found in {}", .0.display())]
    Empty(PathBuf),

    #[error("failed to read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no manifest in {} references {placeholder}; the published image would not be deployed", .dir.display())]
    PlaceholderMissing { dir: PathBuf, placeholder: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub path: PathBuf,
    pub content: String,
}

/// Every manifest for one service, in file-name order.
#[derive(Debug, Clone)]
pub struct ManifestSet {
    dir: PathBuf,
    files: NonEmpty<ManifestFile>,
}

impl ManifestSet {
    /// Read every regular, non-hidden file in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        if !dir.is_dir() {
            return Err(ManifestError::DirectoryNotFound(dir.to_path_buf()));
        }

        let read_err = |source| ManifestError::Read {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type().map_err(read_err)?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
                path: path.clone(),
                source,
            })?;
            files.push(ManifestFile { path, content });
        }

        let files =
            NonEmpty::from_vec(files).ok_or_else(|| ManifestError::Empty(dir.to_path_buf()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    pub fn files(&self) -> &NonEmpty<ManifestFile> {
        &self.files
    }

    /// `${KEY}` as it appears in manifest text.
    pub fn placeholder(key: &str) -> String {
        format!("${{{key}}}")
    }

    /// Replace `${key}` with `value` everywhere. At least one file must reference it.
    pub fn substitute(self, key: &str, value: &str) -> Result<Self, ManifestError> {
        let placeholder = Self::placeholder(key);
        if !self.files.iter().any(|f| f.content.contains(&placeholder)) {
            return Err(ManifestError::PlaceholderMissing {
                dir: self.dir,
                placeholder,
            });
        }

        let files = self.files.map(|f| ManifestFile {
            content: f.content.replace(&placeholder, value),
            path: f.path,
        });
        Ok(Self {
            dir: self.dir,
            files,
        })
    }

    /// One multi-document YAML stream.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, file) in self.files.iter().enumerate() {
            if i > 0 {
                out.push_str("---\n");
            }
            out.push_str(&file.content);
            if !file.content.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_files_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "service.yaml", "kind: Service\n");
        write(dir.path(), "deployment.yaml", "kind: Deployment\n");
        write(dir.path(), ".notes", "ignored");
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let set = ManifestSet::load(dir.path()).unwrap();
        let names: Vec<_> = set
            .files()
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["deployment.yaml", "service.yaml"]);
        assert_eq!(
            set.render(),
            "kind: Deployment\n---\nkind: Service\n"
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestSet::load(&dir.path().join("manifests")).unwrap_err();
        assert!(matches!(err, ManifestError::DirectoryNotFound(_)));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestSet::load(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Empty(_)));
    }

    #[test]
    fn substitution_requires_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "deployment.yaml", "image: nginx\n");
        let err = ManifestSet::load(dir.path())
            .unwrap()
            .substitute("SERVICE_API_IMAGE_NAME", "acr.io/app:1")
            .unwrap_err();
        assert!(err.to_string().contains("${SERVICE_API_IMAGE_NAME}"));
    }
}
