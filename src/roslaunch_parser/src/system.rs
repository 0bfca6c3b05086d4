//! External collaborators: file access, package lookup, environment
//!
//! The interpreter never touches the file system or the process environment
//! directly. Production implementations live here next to in-memory doubles
//! used by tests and embedders.

use crate::error::{ErrorKind, LaunchError, Result};
use std::{
    collections::{HashMap, VecDeque},
    fs,
    path::{Component, Path, PathBuf},
};

pub trait FileAccess {
    /// Resolve a file reference, relative ones against `base_dir`
    fn resolve_path(&self, reference: &str, base_dir: Option<&Path>) -> Result<PathBuf> {
        let reference = Path::new(reference.trim());
        let joined = match base_dir {
            Some(base) if reference.is_relative() => base.join(reference),
            _ => reference.to_path_buf(),
        };
        Ok(normalize_path(&joined))
    }

    fn read(&self, path: &Path) -> Result<String>;

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        self.read(path).map(String::into_bytes)
    }
}

pub trait PackageLookup {
    fn find_package(&self, name: &str) -> Option<PathBuf>;
}

pub trait EnvironmentAccess {
    fn get(&self, name: &str) -> Option<String>;
}

/// Lexically remove `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn not_found(path: &Path, err: impl ToString) -> LaunchError {
    ErrorKind::FileNotFound {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

/// Reads files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileAccess for LocalFileSystem {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| not_found(path, e))
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| not_found(path, e))
    }
}

/// Finds packages by crawling `ROS_PACKAGE_PATH` for `package.xml` manifests
#[derive(Debug, Clone, Default)]
pub struct RosPackagePath {
    roots: Vec<PathBuf>,
}

const MAX_CRAWL_DEPTH: usize = 6;

impl RosPackagePath {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn from_environment(env: &dyn EnvironmentAccess) -> Self {
        let roots = env
            .get("ROS_PACKAGE_PATH")
            .map(|value| {
                std::env::split_paths(&value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self::new(roots)
    }

    fn crawl(&self, root: &Path, package: &str) -> Option<PathBuf> {
        let mut queue = VecDeque::from([(root.to_path_buf(), 0usize)]);
        while let Some((dir, depth)) = queue.pop_front() {
            let manifest = dir.join("package.xml");
            if manifest.is_file() {
                if manifest_name(&manifest).as_deref() == Some(package) {
                    return Some(dir);
                }
                // Packages do not nest
                continue;
            }
            if depth >= MAX_CRAWL_DEPTH {
                continue;
            }
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .filter(|path| {
                    !path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with('.'))
                })
                .collect();
            children.sort();
            queue.extend(children.into_iter().map(|child| (child, depth + 1)));
        }
        None
    }
}

fn manifest_name(manifest: &Path) -> Option<String> {
    let content = fs::read_to_string(manifest).ok()?;
    let doc = roxmltree::Document::parse(&content).ok()?;
    doc.root_element()
        .children()
        .find(|n| n.has_tag_name("name"))
        .and_then(|n| n.text())
        .map(|name| name.trim().to_string())
}

impl PackageLookup for RosPackagePath {
    fn find_package(&self, name: &str) -> Option<PathBuf> {
        self.roots.iter().find_map(|root| self.crawl(root, name))
    }
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentAccess for ProcessEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory file tree
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(normalize_path(path.as_ref()), contents.into());
        self
    }
}

impl FileAccess for MemoryFiles {
    fn read(&self, path: &Path) -> Result<String> {
        let bytes = self.read_binary(path)?;
        String::from_utf8(bytes).map_err(|e| not_found(path, e))
    }

    fn read_binary(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| not_found(path, "no such file"))
    }
}

/// Fixed package table
#[derive(Debug, Clone, Default)]
pub struct StaticPackages {
    packages: HashMap<String, PathBuf>,
}

impl StaticPackages {
    pub fn with_package(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.to_string(), path.into());
        self
    }
}

impl PackageLookup for StaticPackages {
    fn find_package(&self, name: &str) -> Option<PathBuf> {
        self.packages.get(name).cloned()
    }
}

/// Fixed environment
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
}

impl StaticEnvironment {
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl EnvironmentAccess for StaticEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_reference() {
        let files = MemoryFiles::new();
        let resolved = files
            .resolve_path("../config/a.launch", Some(Path::new("/ws/src/pkg/launch")))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/ws/src/pkg/config/a.launch"));

        let absolute = files.resolve_path("/abs/b.launch", Some(Path::new("/x"))).unwrap();
        assert_eq!(absolute, PathBuf::from("/abs/b.launch"));
    }

    #[test]
    fn test_memory_files() {
        let files = MemoryFiles::new().with_file("/a/./b.yaml", "x: 1");
        assert_eq!(files.read(Path::new("/a/b.yaml")).unwrap(), "x: 1");
        let err = files.read(Path::new("/missing")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));
    }

    #[test]
    fn test_local_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        fs::write(&path, "rate: 10\n").unwrap();
        assert_eq!(LocalFileSystem.read(&path).unwrap(), "rate: 10\n");
        assert!(LocalFileSystem.read(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_ros_package_path_crawl() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("src").join("my_robot");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.xml"),
            "<package format=\"2\"><name>my_robot_description</name></package>",
        )
        .unwrap();

        let env = StaticEnvironment::default()
            .with_var("ROS_PACKAGE_PATH", &dir.path().display().to_string());
        let lookup = RosPackagePath::from_environment(&env);
        assert_eq!(lookup.find_package("my_robot_description"), Some(pkg));
        assert_eq!(lookup.find_package("my_robot"), None);
    }
}
