//! Static default-exclusion policy.
//!
//! Unlike ignore-file rules, entries excluded by this policy are never
//! materialized in the tree at all: binary blobs, archives, media and the
//! usual dependency/build directories carry no value in an LLM artifact and
//! would only bloat the model. The lists are plain configuration so a
//! settings layer can override them wholesale.

use serde::{Deserialize, Serialize};

fn default_excluded_extensions() -> Vec<String> {
    [
        // archives
        "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar",
        // compiled binaries
        "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "jar", "war", "pyc", "wasm",
        // media
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "mp3", "wav", "flac", "ogg",
        "mp4", "avi", "mov", "mkv", "webm",
        // fonts
        "ttf", "otf", "woff", "woff2", "eot",
        // office documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_excluded_names() -> Vec<String> {
    [
        ".git",
        ".svn",
        ".hg",
        ".idea",
        ".vscode",
        "node_modules",
        "bower_components",
        "__pycache__",
        ".pytest_cache",
        ".mypy_cache",
        ".tox",
        "target",
        "build",
        "dist",
        "out",
        ".gradle",
        ".next",
        ".nuxt",
        "coverage",
        ".DS_Store",
        "Thumbs.db",
        "package-lock.json",
        "yarn.lock",
        "Cargo.lock",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Directory names that identify Python virtual environments. Only consulted
/// when `include_virtual_envs` is false.
const VIRTUAL_ENV_NAMES: &[&str] = &["venv", ".venv", "virtualenv", "env"];

/// The static exclusion lists plus the virtual-environment opt-in flag.
///
/// Passed in at construction time; the engine treats it as opaque
/// configuration and never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionPolicy {
    /// File extensions (lowercase, without the dot) that are never ingested.
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    /// Entry names (files or directories) that are never ingested.
    #[serde(default = "default_excluded_names")]
    pub excluded_names: Vec<String>,

    /// When true, virtual-environment directories are walked like any other.
    #[serde(default)]
    pub include_virtual_envs: bool,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            excluded_extensions: default_excluded_extensions(),
            excluded_names: default_excluded_names(),
            include_virtual_envs: false,
        }
    }
}

impl ExclusionPolicy {
    /// Whether an entry with this basename should be dropped outright.
    pub fn excludes(&self, name: &str, is_directory: bool) -> bool {
        if self.excluded_names.iter().any(|n| n == name) {
            return true;
        }
        if is_directory {
            if !self.include_virtual_envs && VIRTUAL_ENV_NAMES.contains(&name) {
                return true;
            }
            return false;
        }
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.excluded_extensions.iter().any(|e| *e == ext)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_excludes_binaries_and_vcs() {
        let policy = ExclusionPolicy::default();
        assert!(policy.excludes("photo.PNG", false));
        assert!(policy.excludes("app.exe", false));
        assert!(policy.excludes(".git", true));
        assert!(policy.excludes("node_modules", true));
        assert!(!policy.excludes("main.rs", false));
        assert!(!policy.excludes("src", true));
    }

    #[test]
    fn test_virtual_envs_gated_by_flag() {
        let mut policy = ExclusionPolicy::default();
        assert!(policy.excludes(".venv", true));
        assert!(policy.excludes("venv", true));
        policy.include_virtual_envs = true;
        assert!(!policy.excludes(".venv", true));
    }

    #[test]
    fn test_venv_names_only_apply_to_directories() {
        let policy = ExclusionPolicy::default();
        assert!(!policy.excludes("venv", false));
    }

    #[test]
    fn test_dotfiles_are_not_treated_as_extensions() {
        let policy = ExclusionPolicy::default();
        // ".gitignore" has no stem, so no extension check applies.
        assert!(!policy.excludes(".gitignore", false));
        assert!(!policy.excludes(".env", false));
    }

    #[test]
    fn test_policy_round_trips_through_serde_defaults() {
        let policy: ExclusionPolicy = toml::from_str("").unwrap();
        assert!(!policy.include_virtual_envs);
        assert!(policy.excluded_extensions.iter().any(|e| e == "zip"));
        assert!(policy.excluded_names.iter().any(|n| n == ".git"));
    }
}
