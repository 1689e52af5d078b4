use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Exclusion filter compiled from shell-glob patterns.
///
/// A relative path is excluded when any pattern matches either the whole path
/// (where `*` does not cross `/`) or any single segment of it. So `.git`
/// excludes `.git/config` and `lib/.git/HEAD`, `*.pyc` excludes `pkg/mod.pyc`,
/// and `build/*.log` only excludes logs directly under a top-level `build`.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    set: GlobSet,
    patterns: Vec<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| FilterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }
        let set = builder.build().map_err(|source| FilterError::InvalidPattern {
            pattern: kept.join(", "),
            source,
        })?;
        Ok(Self {
            set,
            patterns: kept,
        })
    }

    /// A filter that excludes nothing.
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `relative` (relative to the local root) must be skipped.
    /// The root itself (empty path) is never excluded.
    pub fn is_excluded<P: AsRef<Path>>(&self, relative: P) -> bool {
        let relative = relative.as_ref();
        if self.set.is_empty() || relative.as_os_str().is_empty() {
            return false;
        }
        if self.set.is_match(relative) {
            return true;
        }
        relative.components().any(|component| match component {
            Component::Normal(segment) => self.set.is_match(Path::new(segment)),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(patterns: &[&str]) -> ExclusionFilter {
        ExclusionFilter::new(patterns).expect("patterns compile")
    }

    #[test]
    fn segment_match_excludes_whole_subtree() {
        let f = filter(&[".git", "__pycache__"]);
        assert!(f.is_excluded(".git"));
        assert!(f.is_excluded(".git/objects/ab/cdef"));
        assert!(f.is_excluded("vendor/lib/.git/HEAD"));
        assert!(f.is_excluded("app/__pycache__/views.cpython-311.pyc"));
        assert!(!f.is_excluded(".gitignore"));
        assert!(!f.is_excluded("src/git.py"));
    }

    #[test]
    fn wildcard_matches_file_name_at_any_depth() {
        let f = filter(&["*.pyc"]);
        assert!(f.is_excluded("mod.pyc"));
        assert!(f.is_excluded("pkg/sub/mod.pyc"));
        assert!(!f.is_excluded("pkg/sub/mod.py"));
    }

    #[test]
    fn path_pattern_does_not_cross_separators() {
        let f = filter(&["build/*.log"]);
        assert!(f.is_excluded("build/out.log"));
        assert!(!f.is_excluded("build/nested/out.log"));
        assert!(!f.is_excluded("other/build/out.log"));
    }

    #[test]
    fn double_star_spans_directories() {
        let f = filter(&["static/**/*.map"]);
        assert!(f.is_excluded("static/js/vendor/app.js.map"));
        assert!(!f.is_excluded("static/js/app.js"));
    }

    #[test]
    fn root_and_empty_filter_exclude_nothing() {
        assert!(!filter(&["*"]).is_excluded(""));
        let none = ExclusionFilter::empty();
        assert!(!none.is_excluded("anything/at/all.txt"));
        assert!(none.patterns().is_empty());
    }

    #[test]
    fn invalid_pattern_is_rejected_with_its_text() {
        let err = ExclusionFilter::new(["ok", "[unclosed"]).unwrap_err();
        assert!(err.to_string().contains("[unclosed"), "got: {err}");
    }
}
