//! Repository descriptors and the targets parsed from them.
//!
//! A descriptor is `org/repo` or `org/repo@branch`. Descriptors without an
//! embedded branch take the configured default branch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DownstreamError, DownstreamResult};

/// One downstream repository to restart a build in.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    org: String,
    repo: String,
    branch: String,
}

impl Target {
    /// Parse a single descriptor, falling back to `default_branch`.
    pub fn parse(descriptor: &str, default_branch: &str) -> DownstreamResult<Self> {
        let malformed = || DownstreamError::MalformedDescriptor {
            descriptor: descriptor.to_string(),
        };

        let parts: Vec<&str> = descriptor.split('/').collect();
        if parts.len() != 2 {
            return Err(malformed());
        }
        let org = parts[0];
        let (repo, branch) = if parts[1].contains('@') {
            let repo_parts: Vec<&str> = parts[1].split('@').collect();
            if repo_parts.len() != 2 {
                return Err(malformed());
            }
            (repo_parts[0], repo_parts[1])
        } else {
            (parts[1], "")
        };

        if org.is_empty() || repo.is_empty() {
            return Err(malformed());
        }

        let branch = if branch.is_empty() {
            default_branch
        } else {
            branch
        };

        Ok(Self {
            org: org.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `org/repo`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.org, self.repo, self.branch)
    }
}

/// Parse every descriptor in order. The first malformed one fails the batch.
pub fn parse_targets<S: AsRef<str>>(
    descriptors: &[S],
    default_branch: &str,
) -> DownstreamResult<Vec<Target>> {
    descriptors
        .iter()
        .map(|d| Target::parse(d.as_ref(), default_branch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_descriptors_keeps_order() {
        let targets =
            parse_targets(&["go-vela/hello-world@test", "go-vela/hello-world"], "main").unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].org(), "go-vela");
        assert_eq!(targets[0].repo(), "hello-world");
        assert_eq!(targets[0].branch(), "test");
        assert_eq!(targets[1].org(), "go-vela");
        assert_eq!(targets[1].repo(), "hello-world");
        assert_eq!(targets[1].branch(), "main");
    }

    #[test]
    fn test_full_name_is_org_and_repo() {
        let target = Target::parse("go-vela/hello-world@dev", "main").unwrap();
        assert_eq!(target.full_name(), "go-vela/hello-world");
        assert_eq!(target.to_string(), "go-vela/hello-world@dev");
    }

    #[test]
    fn test_rejects_wrong_separator_count() {
        for bad in ["hello-world", "go-vela/hello/world", "a/b/c@main", ""] {
            let err = Target::parse(bad, "main").unwrap_err();
            match err {
                DownstreamError::MalformedDescriptor { descriptor } => assert_eq!(descriptor, bad),
                other => panic!("expected malformed error for {bad:?}, got {other}"),
            }
        }
    }

    #[test]
    fn test_rejects_multiple_branch_separators() {
        assert!(Target::parse("go-vela/hello-world@a@b", "main").is_err());
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(Target::parse("/hello-world", "main").is_err());
        assert!(Target::parse("go-vela/", "main").is_err());
        assert!(Target::parse("go-vela/@dev", "main").is_err());
    }

    #[test]
    fn test_empty_embedded_branch_uses_default() {
        let target = Target::parse("go-vela/hello-world@", "main").unwrap();
        assert_eq!(target.branch(), "main");
    }

    #[test]
    fn test_batch_fails_on_first_malformed() {
        let err = parse_targets(&["org/a", "bad", "org/b"], "main").unwrap_err();
        assert!(err.to_string().contains("bad"));
    }
}
