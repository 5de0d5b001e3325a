//! Path policy configuration and enforcement.
//!
//! Tool calls supply arbitrary path strings; nothing stops a confused
//! model from asking for `../../etc/passwd`. The policy vets every
//! filesystem touch before it happens. The default confines reads and
//! writes to the process working directory.

use crate::{Access, Error, PathRequest, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Policy configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Path patterns that are allowed.
    #[serde(default)]
    pub allow: AllowRules,
}

/// Allowed path patterns per access kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllowRules {
    /// Readable path patterns.
    #[serde(default)]
    pub read: Vec<String>,

    /// Writable path patterns.
    #[serde(default)]
    pub write: Vec<String>,
}

/// Result of a path check.
#[derive(Debug, Clone)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl Policy {
    /// Load policy from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse policy from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }

    /// The default policy: read and write anywhere inside the working
    /// directory, nothing outside it.
    pub fn workspace_only() -> Self {
        Self {
            allow: AllowRules {
                read: vec![".".to_string()],
                write: vec![".".to_string()],
            },
        }
    }

    /// Check whether a path request is allowed.
    ///
    /// Paths are normalized lexically first: a path that is absolute or
    /// climbs out of the working directory via `..` is denied unless a
    /// `*` pattern allows it.
    pub fn check(&self, request: &PathRequest) -> Decision {
        let allowlist = match request.access {
            Access::Read => &self.allow.read,
            Access::Write => &self.allow.write,
        };

        if allowlist.iter().any(|p| p == "*") {
            return Decision::Allow;
        }

        let Some(normalized) = normalize(&request.path) else {
            return Decision::Deny {
                reason: format!("path escapes the workspace: {}", request.path),
            };
        };

        if self.path_allowed(allowlist, &normalized) {
            Decision::Allow
        } else {
            Decision::Deny {
                reason: format!("{:?} access to {} not in allowlist", request.access, request.path),
            }
        }
    }

    fn path_allowed(&self, allowlist: &[String], path: &str) -> bool {
        for pattern in allowlist {
            // "." allows everything that stayed inside the workspace.
            if pattern == "." || pattern == "./" {
                return true;
            }
            let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
            if path == pattern {
                return true;
            }
            // foo/* matches foo/bar but not foo/bar/baz
            if let Some(prefix) = pattern.strip_suffix("/*") {
                if let Some(rest) = path.strip_prefix(&format!("{prefix}/")) {
                    if !rest.is_empty() && !rest.contains('/') {
                        return true;
                    }
                }
                continue;
            }
            // foo/** matches foo and anything under it
            if let Some(prefix) = pattern.strip_suffix("/**") {
                if path == prefix || path.starts_with(&format!("{prefix}/")) {
                    return true;
                }
                continue;
            }
            if path.starts_with(&format!("{pattern}/")) {
                return true;
            }
        }
        false
    }
}

/// Lexically normalize a workspace-relative path.
///
/// Returns `None` for absolute paths and for `..` sequences that pop past
/// the workspace root. Does not consult the filesystem, so symlinks are
/// out of scope here (host permissions still apply).
fn normalize(path: &str) -> Option<String> {
    if path.starts_with('/') || path.starts_with('\\') {
        return None;
    }
    // Windows drive prefixes are absolute too.
    if path.len() >= 2 && path.as_bytes()[1] == b':' {
        return None;
    }

    let mut stack: Vec<&str> = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return None;
                }
            }
            other => stack.push(other),
        }
    }
    Some(stack.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_only_allows_relative_paths() {
        let policy = Policy::workspace_only();
        assert!(policy.check(&PathRequest::read("src/main.rs")).is_allowed());
        assert!(policy.check(&PathRequest::write("./notes.txt")).is_allowed());
        assert!(policy.check(&PathRequest::read("a/../b.txt")).is_allowed());
    }

    #[test]
    fn workspace_only_denies_escapes() {
        let policy = Policy::workspace_only();
        assert!(!policy.check(&PathRequest::read("../../etc/passwd")).is_allowed());
        assert!(!policy.check(&PathRequest::read("/etc/passwd")).is_allowed());
        assert!(!policy.check(&PathRequest::write("src/../../other")).is_allowed());
    }

    #[test]
    fn parse_toml_patterns() {
        let toml = r#"
[allow]
read = ["src/**", "Cargo.toml"]
write = ["src/*"]
"#;
        let policy = Policy::parse(toml).unwrap();

        assert!(policy.check(&PathRequest::read("src/deep/mod.rs")).is_allowed());
        assert!(policy.check(&PathRequest::read("Cargo.toml")).is_allowed());
        assert!(!policy.check(&PathRequest::read("README.md")).is_allowed());

        assert!(policy.check(&PathRequest::write("src/lib.rs")).is_allowed());
        assert!(!policy.check(&PathRequest::write("src/deep/mod.rs")).is_allowed());
    }

    #[test]
    fn star_pattern_allows_anything() {
        let policy = Policy::parse("[allow]\nread = [\"*\"]\nwrite = []").unwrap();
        assert!(policy.check(&PathRequest::read("/etc/hosts")).is_allowed());
        assert!(!policy.check(&PathRequest::write("x.txt")).is_allowed());
    }
}
