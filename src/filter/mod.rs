//! Ignore-rule evaluation.
//!
//! A [`PatternMatcher`] holds two ordered rule sets: a fixed global set that
//! is always active (VCS metadata, build outputs, caches, OS cruft) and a
//! local set parsed from a single ignore file's text. Local rules follow the
//! familiar ignore-file convention: rules are evaluated in file order and the
//! last matching rule wins, so a later `!pattern` re-includes what an earlier
//! pattern excluded.
//!
//! Global rules are a safety floor and cannot be negated by local rules. An
//! LLM artifact should never pick up `.git` internals because a repository's
//! ignore file happened to say `!*`.
//!
//! The glob dialect is deliberately small: `*.ext` matches a suffix, `name*`
//! matches a prefix, and any other embedded `*` splits the pattern into
//! ordered substrings. Character classes and `**` are not supported.

pub mod policy;

pub use policy::ExclusionPolicy;

/// A single parsed ignore rule.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub pattern: String,
    /// Leading `!`: a match re-includes instead of excluding.
    pub negated: bool,
    /// Trailing `/`: the rule names a directory. It still applies to files
    /// *inside* that directory via path-segment matching.
    pub directory_only: bool,
    pub global: bool,
}

impl IgnoreRule {
    fn parse(line: &str, global: bool) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (negated, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (directory_only, pattern) = match rest.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => (true, stripped),
            _ => (false, rest),
        };
        if pattern.is_empty() {
            return None;
        }
        Some(IgnoreRule {
            pattern: pattern.to_string(),
            negated,
            directory_only,
            global,
        })
    }

    /// Whether this rule matches `path`.
    ///
    /// `is_directory` refers to the final path component; intermediate
    /// segments are directories by construction, which is how a
    /// directory-only rule like `node_modules/` matches the file
    /// `node_modules/foo.js`.
    fn matches(&self, path: &str, is_directory: bool) -> bool {
        let basename = path.rsplit('/').next().unwrap_or(path);

        if self.pattern.contains('*') {
            if glob_match(&self.pattern, basename) || glob_match(&self.pattern, path) {
                // A directory-only glob may not claim a file via its final
                // component.
                if self.directory_only && !is_directory && glob_match(&self.pattern, basename) {
                    return self.ancestor_segment_matches(path);
                }
                return true;
            }
            if self.directory_only {
                return self.ancestor_segment_matches(path);
            }
            return false;
        }

        // Literal rules: basename or whole path.
        if self.pattern == basename || self.pattern == path {
            if !self.directory_only || is_directory {
                return true;
            }
            // Directory rule naming a file: only an ancestor segment counts.
            return self.ancestor_segment_matches(path);
        }

        // Directory rules additionally match any ancestor path segment, so
        // everything beneath an ignored directory is covered.
        if self.directory_only {
            return self.ancestor_segment_matches(path);
        }
        false
    }

    /// Does any non-final segment of `path` match the pattern?
    fn ancestor_segment_matches(&self, path: &str) -> bool {
        let mut segments: Vec<&str> = path.split('/').collect();
        segments.pop(); // final component handled separately
        segments
            .iter()
            .any(|seg| glob_match(&self.pattern, seg) || self.pattern == *seg)
    }
}

/// Minimal glob matching: split on `*`, anchor the first and last pieces,
/// require the middle pieces as ordered substrings.
fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !text.starts_with(first) {
        return false;
    }
    if !text.ends_with(last) {
        return false;
    }
    if text.len() < first.len() + last.len() {
        return false;
    }
    let mut cursor = first.len();
    let end = text.len() - last.len();
    for middle in &parts[1..parts.len() - 1] {
        if middle.is_empty() {
            continue;
        }
        match text[cursor..end].find(middle) {
            Some(offset) => cursor += offset + middle.len(),
            None => return false,
        }
    }
    true
}

/// Built-in rules that are always active: VCS metadata, dependency and build
/// outputs, caches, OS cruft.
const GLOBAL_RULES: &[&str] = &[
    ".git/",
    ".svn/",
    ".hg/",
    "node_modules/",
    "bower_components/",
    "__pycache__/",
    ".pytest_cache/",
    ".mypy_cache/",
    ".cache/",
    "target/",
    "build/",
    "dist/",
    "out/",
    ".gradle/",
    ".idea/",
    ".vscode/",
    ".DS_Store",
    "Thumbs.db",
    "*.log",
    "*.pyc",
    "*.swp",
];

/// Glob-style ignore-rule evaluator.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    global_rules: Vec<IgnoreRule>,
    local_rules: Vec<IgnoreRule>,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher {
    /// A matcher with only the built-in global rules active.
    pub fn new() -> Self {
        let global_rules = GLOBAL_RULES
            .iter()
            .filter_map(|line| IgnoreRule::parse(line, true))
            .collect();
        Self {
            global_rules,
            local_rules: Vec::new(),
        }
    }

    /// Parse one ignore file's text into the local rule set, replacing any
    /// previously loaded local rules. Absence of an ignore file simply means
    /// this is never called and the local set stays empty.
    pub fn load_rules(&mut self, text: &str) {
        self.local_rules = text
            .lines()
            .filter_map(|line| IgnoreRule::parse(line, false))
            .collect();
        tracing::debug!(rules = self.local_rules.len(), "loaded local ignore rules");
    }

    pub fn local_rule_count(&self) -> usize {
        self.local_rules.len()
    }

    /// Evaluate `path` (slash-separated, relative to the repository root)
    /// against the global pass first, then the local rules with
    /// last-match-wins semantics.
    pub fn should_ignore(&self, path: &str, is_directory: bool) -> bool {
        for rule in &self.global_rules {
            if rule.matches(path, is_directory) {
                return true;
            }
        }

        let mut ignored = false;
        for rule in &self.local_rules {
            if rule.matches(path, is_directory) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_rules_cover_vcs_and_logs() {
        let matcher = PatternMatcher::new();
        assert!(matcher.should_ignore(".git", true));
        assert!(matcher.should_ignore(".git/config", false));
        assert!(matcher.should_ignore("a.log", false));
        assert!(matcher.should_ignore("logs/a.log", false));
        assert!(!matcher.should_ignore("src/main.rs", false));
    }

    #[test]
    fn test_directory_rule_matches_descendant_file() {
        let matcher = PatternMatcher::new();
        assert!(matcher.should_ignore("node_modules/foo.js", false));
        assert!(matcher.should_ignore("pkg/node_modules/deep/bar.js", false));
    }

    #[test]
    fn test_directory_rule_does_not_match_plain_file_of_same_name() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("vendor/\n");
        assert!(matcher.should_ignore("vendor", true));
        assert!(!matcher.should_ignore("vendor", false));
        assert!(matcher.should_ignore("vendor/lib.rs", false));
    }

    #[test]
    fn test_last_matching_rule_wins() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("*.txt\n!keep.txt\n");
        assert!(!matcher.should_ignore("keep.txt", false));
        assert!(matcher.should_ignore("other.txt", false));
    }

    #[test]
    fn test_negation_then_reexclusion() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("*.md\n!README.md\nREADME.md\n");
        assert!(matcher.should_ignore("README.md", false));
    }

    #[test]
    fn test_global_rule_is_not_negatable_locally() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("!a.log\n!.git/\n");
        assert!(matcher.should_ignore("a.log", false));
        assert!(matcher.should_ignore(".git/config", false));
    }

    #[test]
    fn test_suffix_prefix_and_substring_globs() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("*.min.js\ntemp*\na*b*c\n");
        assert!(matcher.should_ignore("bundle.min.js", false));
        assert!(matcher.should_ignore("temporary.txt", false));
        assert!(matcher.should_ignore("axxbyyc", false));
        assert!(!matcher.should_ignore("acb", false));
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("# a comment\n\n  \nsecret.txt\n");
        assert_eq!(matcher.local_rule_count(), 1);
        assert!(matcher.should_ignore("secret.txt", false));
    }

    #[test]
    fn test_full_path_literal_rule() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("docs/internal.md\n");
        assert!(matcher.should_ignore("docs/internal.md", false));
        assert!(!matcher.should_ignore("internal.md", false));
    }

    #[test]
    fn test_reload_replaces_local_rules() {
        let mut matcher = PatternMatcher::new();
        matcher.load_rules("*.txt\n");
        assert!(matcher.should_ignore("a.txt", false));
        matcher.load_rules("*.rs\n");
        assert!(!matcher.should_ignore("a.txt", false));
        assert!(matcher.should_ignore("a.rs", false));
    }

    #[test]
    fn test_glob_match_edges() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("*.rs", "lib.rs"));
        assert!(!glob_match("*.rs", "lib.rson"));
        assert!(glob_match("lib*", "lib.rs"));
        assert!(!glob_match("ab", "abc"));
        assert!(!glob_match("a*a", "a"));
    }
}
