//! Cross-platform data path resolution.
//!
//! Determines where the configuration document lives based on platform
//! conventions and Docker detection.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the configuration document inside a data directory.
const DOCUMENT_FILE_NAME: &str = "klang.json";

/// Resolved location of the configuration document.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Path to the configuration document
    pub document_path: PathBuf,
}

/// Configuration for path resolution.
#[derive(Debug, Default)]
pub struct PathConfig {
    /// Explicit data directory (the document will be inside)
    pub data_dir: Option<PathBuf>,
    /// Explicit path to the configuration document
    pub document_path: Option<PathBuf>,
}

impl DataPaths {
    /// Resolve the document path based on configuration.
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit document_path if provided
    /// 2. Explicit data_dir if provided
    /// 3. Default directory (platform-specific or Docker-detected)
    pub fn resolve(config: PathConfig) -> anyhow::Result<Self> {
        if let Some(path) = config.document_path {
            info!("Using custom configuration path: {}", path.display());
            Self::check_legacy_file(&path);
            return Ok(Self {
                document_path: path,
            });
        }

        let base_dir = match config.data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };

        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir)?;
            info!("Created data directory: {}", base_dir.display());
        }

        let document_path = base_dir.join(DOCUMENT_FILE_NAME);
        Self::check_legacy_file(&document_path);

        info!("Configuration document: {}", document_path.display());

        Ok(Self { document_path })
    }

    /// Determine the default data directory based on platform and environment.
    fn default_data_dir() -> anyhow::Result<PathBuf> {
        // Check if running in Docker
        if Self::is_docker() {
            info!("Docker environment detected, using ./data/ for storage");
            return Ok(PathBuf::from("./data"));
        }

        // Use platform-specific user data directory
        if let Some(proj_dirs) = ProjectDirs::from("", "", "klang") {
            let data_dir = proj_dirs.data_dir().to_path_buf();
            info!(
                "Using platform-specific data directory: {}",
                data_dir.display()
            );
            Ok(data_dir)
        } else {
            // Fallback to current directory if ProjectDirs fails
            warn!("Could not determine user data directory, falling back to ./data/");
            Ok(PathBuf::from("./data"))
        }
    }

    /// Detect if running inside a Docker container.
    fn is_docker() -> bool {
        // Check for /.dockerenv file (standard Docker indicator)
        if Path::new("/.dockerenv").exists() {
            return true;
        }

        // Check for Docker-specific cgroup entries
        if let Ok(cgroup) = std::fs::read_to_string("/proc/self/cgroup") {
            if cgroup.contains("docker") || cgroup.contains("containerd") {
                return true;
            }
        }

        false
    }

    /// Warn when a document in the current directory is being shadowed.
    fn check_legacy_file(document_path: &Path) {
        let cwd_document = Path::new("./klang.json");

        if cwd_document.exists()
            && cwd_document.canonicalize().ok() != document_path.canonicalize().ok()
        {
            warn!(
                "Found klang.json in current directory, but using: {}",
                document_path.display()
            );
            warn!("Consider moving your configuration or using --document to specify the location");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir() {
        let data_dir = DataPaths::default_data_dir().unwrap();
        // Should return a valid path
        assert!(!data_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_resolve_with_explicit_path() {
        let config = PathConfig {
            data_dir: None,
            document_path: Some(PathBuf::from("/custom/klang.json")),
        };

        let paths = DataPaths::resolve(config).unwrap();
        assert_eq!(paths.document_path, PathBuf::from("/custom/klang.json"));
    }

    #[test]
    fn test_resolve_with_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = PathConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            document_path: None,
        };

        let paths = DataPaths::resolve(config).unwrap();
        assert_eq!(paths.document_path, temp_dir.path().join("klang.json"));
    }

    #[test]
    fn test_explicit_path_overrides_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = PathConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            document_path: Some(PathBuf::from("/override/klang.json")),
        };

        let paths = DataPaths::resolve(config).unwrap();
        assert_eq!(paths.document_path, PathBuf::from("/override/klang.json"));
    }
}
