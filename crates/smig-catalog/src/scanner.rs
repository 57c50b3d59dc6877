//! Owner tree scanner.
//!
//! The scan runs in two passes. Discovery walks the whole tree and validates
//! every name without touching the disk; only then are files renamed one by
//! one, each rename finishing before its task is appended. A malformed name
//! therefore aborts the scan before anything has been renamed.
//!
//! Scanning is single-shot per tree: already-renamed files are not
//! recognised and would be renamed again under a fresh token.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use smig_models::{validate_field, Task, Token};

use crate::error::{CatalogError, CatalogResult};

/// Housekeeping entries skipped by exact name match.
pub const DEFAULT_SKIP_NAMES: &[&str] = &[".DS_Store"];

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory holding one subdirectory per owner
    pub root_dir: PathBuf,
    /// Entry names ignored inside owner directories
    pub skip_names: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("mainnet"),
            skip_names: DEFAULT_SKIP_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    /// Create a config for the given root with the default skip list.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root_dir: std::env::var("MIGRATE_ROOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.root_dir),
            skip_names: std::env::var("MIGRATE_SKIP_NAMES")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.skip_names),
        }
    }

    /// Add a name to the skip list.
    pub fn with_skip_name(mut self, name: impl Into<String>) -> Self {
        self.skip_names.push(name.into());
        self
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip_names.iter().any(|s| s == name)
    }
}

/// A discovered file that has passed validation but is not yet renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub owner: String,
    pub path: PathBuf,
    pub extension: String,
}

/// Split a file name on its first dot into `(stem, extension)`.
///
/// Returns `None` when there is no dot or either side is empty.
pub fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    let (stem, extension) = file_name.split_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some((stem, extension))
}

/// Scanner that converts an owner tree into migration tasks.
pub struct CatalogScanner {
    config: ScanConfig,
}

impl CatalogScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the tree, rename every file to `<token>.<ext>`, and return one
    /// task per file in owner/file name order.
    pub async fn scan(&self) -> CatalogResult<Vec<Task>> {
        let planned = self.discover().await?;
        info!(
            root = %self.config.root_dir.display(),
            files = planned.len(),
            "Discovered files to migrate"
        );

        let mut tasks = Vec::with_capacity(planned.len());
        let mut seen = HashSet::with_capacity(planned.len());

        for file in planned {
            let token = Token::generate();
            if !seen.insert(token.clone()) {
                return Err(CatalogError::DuplicateToken(token.to_string()));
            }

            let task = Task::new(file.owner.as_str(), token, file.extension.as_str())
                .map_err(|e| CatalogError::invalid_field(&file.path, e))?;
            let target = task.source_path(&self.config.root_dir);

            ensure_absent(&target).await?;

            fs::rename(&file.path, &target)
                .await
                .map_err(|source| CatalogError::Rename {
                    from: file.path.clone(),
                    to: target.clone(),
                    renamed: tasks.len(),
                    source,
                })?;

            debug!(
                owner = %task.owner,
                token = %task.token,
                from = %file.path.display(),
                "Renamed file"
            );
            tasks.push(task);
        }

        info!(tasks = tasks.len(), "Scan complete");
        Ok(tasks)
    }

    /// Walk the tree and validate every eligible file without renaming.
    pub async fn discover(&self) -> CatalogResult<Vec<PlannedFile>> {
        let root = &self.config.root_dir;
        let root_meta = fs::metadata(root)
            .await
            .map_err(|e| CatalogError::read_dir(root, e))?;
        if !root_meta.is_dir() {
            return Err(CatalogError::NotADirectory(root.clone()));
        }

        let mut planned = Vec::new();
        for (owner, owner_dir) in self.owner_dirs().await? {
            let before = planned.len();
            self.discover_owner(&owner, &owner_dir, &mut planned).await?;
            debug!(owner = %owner, files = planned.len() - before, "Scanned owner directory");
        }

        Ok(planned)
    }

    async fn owner_dirs(&self) -> CatalogResult<Vec<(String, PathBuf)>> {
        let root = &self.config.root_dir;
        let mut owners = Vec::new();

        for (name, path, is_dir) in read_sorted(root).await? {
            if name.as_deref().is_some_and(|n| self.config.is_skipped(n)) {
                debug!(entry = %path.display(), "Skipping housekeeping entry at scan root");
                continue;
            }
            if !is_dir {
                debug!(entry = %path.display(), "Ignoring non-directory entry at scan root");
                continue;
            }
            let name = name.ok_or_else(|| CatalogError::NonUtf8Name(path.clone()))?;
            validate_field("owner", &name).map_err(|e| CatalogError::invalid_field(&path, e))?;
            owners.push((name, path));
        }

        Ok(owners)
    }

    async fn discover_owner(
        &self,
        owner: &str,
        owner_dir: &Path,
        planned: &mut Vec<PlannedFile>,
    ) -> CatalogResult<()> {
        for (name, path, is_dir) in read_sorted(owner_dir).await? {
            let name = name.ok_or_else(|| CatalogError::NonUtf8Name(path.clone()))?;

            if self.config.is_skipped(&name) {
                debug!(entry = %path.display(), "Skipping housekeeping entry");
                continue;
            }
            if is_dir {
                warn!(entry = %path.display(), "Ignoring nested directory inside owner directory");
                continue;
            }

            let (_, extension) = split_extension(&name)
                .ok_or_else(|| CatalogError::UnsupportedFileName(path.clone()))?;
            validate_field("extension", extension)
                .map_err(|e| CatalogError::invalid_field(&path, e))?;

            planned.push(PlannedFile {
                owner: owner.to_string(),
                extension: extension.to_string(),
                path,
            });
        }

        Ok(())
    }
}

/// Fail unless `target` is known not to exist. An error while checking is
/// reported rather than taken as absence, since a rename would replace it.
async fn ensure_absent(target: &Path) -> CatalogResult<()> {
    match fs::try_exists(target).await {
        Ok(false) => Ok(()),
        Ok(true) => Err(CatalogError::TargetExists(target.to_path_buf())),
        Err(e) => Err(CatalogError::inspect(target, e)),
    }
}

/// Read a directory and return `(utf8 name, path, is_dir)` sorted by name.
async fn read_sorted(dir: &Path) -> CatalogResult<Vec<(Option<String>, PathBuf, bool)>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| CatalogError::read_dir(dir, e))?;

    let mut out = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CatalogError::read_dir(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| CatalogError::read_dir(&path, e))?;
        let name = entry.file_name().into_string().ok();
        out.push((name, path, file_type.is_dir()));
    }

    out.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "alice/a.mp4", b"alice-a");
        write(dir.path(), "alice/b.mov", b"alice-b");
        write(dir.path(), "alice/.DS_Store", b"junk");
        write(dir.path(), "bob/c.mp4", b"bob-c");
        dir
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.mp4"), Some(("a", "mp4")));
        assert_eq!(split_extension("clip.final.mov"), Some(("clip", "final.mov")));
        assert_eq!(split_extension("noext"), None);
        assert_eq!(split_extension(".hidden"), None);
        assert_eq!(split_extension("trailing."), None);
    }

    #[tokio::test]
    async fn test_scan_renames_and_emits_tasks() {
        let dir = fixture();
        let scanner = CatalogScanner::new(ScanConfig::new(dir.path()));

        let tasks = scanner.scan().await.unwrap();

        assert_eq!(tasks.len(), 3);
        let summary: Vec<(&str, &str)> = tasks
            .iter()
            .map(|t| (t.owner.as_str(), t.extension.as_str()))
            .collect();
        assert_eq!(summary, vec![("alice", "mp4"), ("alice", "mov"), ("bob", "mp4")]);

        for task in &tasks {
            let renamed = task.source_path(dir.path());
            assert!(renamed.exists(), "missing {}", renamed.display());
        }
        assert_eq!(
            std::fs::read(tasks[2].source_path(dir.path())).unwrap(),
            b"bob-c"
        );
        assert!(!dir.path().join("alice/a.mp4").exists());
        assert!(dir.path().join("alice/.DS_Store").exists());
    }

    #[tokio::test]
    async fn test_tokens_are_unique_within_a_scan() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            write(dir.path(), &format!("owner{}/clip{}.mp4", i % 5, i), b"x");
        }

        let tasks = CatalogScanner::new(ScanConfig::new(dir.path()))
            .scan()
            .await
            .unwrap();

        let tokens: HashSet<_> = tasks.iter().map(|t| t.token.clone()).collect();
        assert_eq!(tasks.len(), 50);
        assert_eq!(tokens.len(), 50);
    }

    #[tokio::test]
    async fn test_empty_root_yields_no_tasks() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("carol")).unwrap();

        let tasks = CatalogScanner::new(ScanConfig::new(dir.path()))
            .scan()
            .await
            .unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_file_without_extension_aborts_before_any_rename() {
        let dir = fixture();
        write(dir.path(), "bob/README", b"no extension");

        let err = CatalogScanner::new(ScanConfig::new(dir.path()))
            .scan()
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::UnsupportedFileName(_)));
        assert!(dir.path().join("alice/a.mp4").exists());
        assert!(dir.path().join("bob/c.mp4").exists());
    }

    #[tokio::test]
    async fn test_owner_with_delimiter_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "smith,john/a.mp4", b"x");

        let err = CatalogScanner::new(ScanConfig::new(dir.path()))
            .scan()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidField { .. }));
    }

    #[tokio::test]
    async fn test_custom_skip_names_and_loose_entries() {
        let dir = fixture();
        write(dir.path(), "bob/Thumbs.db", b"junk");
        write(dir.path(), "loose.txt", b"root-level file");
        std::fs::create_dir_all(dir.path().join("bob/nested")).unwrap();

        let config = ScanConfig::new(dir.path()).with_skip_name("Thumbs.db");
        let planned = CatalogScanner::new(config).discover().await.unwrap();

        assert_eq!(planned.len(), 3);
        assert!(planned.iter().all(|p| p.owner == "alice" || p.owner == "bob"));
    }

    #[tokio::test]
    async fn test_skip_names_apply_at_root() {
        let dir = fixture();
        write(dir.path(), "@eaDir/a.mp4", b"index");

        let config = ScanConfig::new(dir.path()).with_skip_name("@eaDir");
        let tasks = CatalogScanner::new(config).scan().await.unwrap();

        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.owner != "@eaDir"));
        assert!(dir.path().join("@eaDir/a.mp4").exists());
    }

    #[tokio::test]
    async fn test_ensure_absent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "alice/taken.mp4", b"x");

        ensure_absent(&dir.path().join("alice/free.mp4")).await.unwrap();

        let err = ensure_absent(&dir.path().join("alice/taken.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::TargetExists(_)));

        // A path through a regular file cannot be checked (ENOTDIR).
        let err = ensure_absent(&dir.path().join("alice/taken.mp4/child.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Inspect { .. }));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = CatalogScanner::new(ScanConfig::new(dir.path().join("absent")))
            .scan()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ReadDir { .. }));
    }

    #[tokio::test]
    async fn test_discover_does_not_rename() {
        let dir = fixture();
        let planned = CatalogScanner::new(ScanConfig::new(dir.path()))
            .discover()
            .await
            .unwrap();

        assert_eq!(planned.len(), 3);
        assert_eq!(planned[1].extension, "mov");
        assert!(dir.path().join("alice/b.mov").exists());
    }
}
