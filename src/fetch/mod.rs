//! Repository acquisition
//!
//! The grader never talks to a forge directly; it asks a `RepositoryFetcher`
//! to materialize a repository into a directory. `GitCli` is the production
//! fetcher, tests substitute their own.

pub mod git;

use crate::domain::{GraderError, GraderResult};
use async_trait::async_trait;
use std::path::Path;

pub use git::GitCli;

/// Placeholder written in place of credentials in any diagnostic text
const REDACTED: &str = "***";

/// Fetches a remote repository into a local directory
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Clone `url` into `destination`, which exists and is empty.
    /// Failures are reported as `CloneFailed` with the tool's diagnostics.
    async fn fetch(&self, url: &str, destination: &Path) -> GraderResult<()>;
}

/// Embed an access token into an https repository URL as `oauth2:<token>@`
pub fn authenticated_url(repo_url: &str, token: &str) -> GraderResult<String> {
    if token.is_empty() {
        return Err(GraderError::invalid_request("access token must not be empty"));
    }

    let rest = repo_url.trim().strip_prefix("https://").ok_or_else(|| {
        GraderError::clone_failed(format!(
            "unsupported repository URL '{}': only https URLs are accepted",
            redact(repo_url, token)
        ))
    })?;

    let (authority, path) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, ""),
    };
    // Drop any credentials already present in the URL
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    if host.is_empty() {
        return Err(GraderError::clone_failed("repository URL has no host"));
    }

    Ok(format!("https://oauth2:{}@{}{}", encode_userinfo(token), host, path))
}

/// Replace every occurrence of the token (raw or URL-encoded) in `text`
pub fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }

    let encoded = encode_userinfo(token);
    let mut redacted = text.replace(token, REDACTED);
    if encoded != token {
        redacted = redacted.replace(&encoded, REDACTED);
    }
    redacted
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_userinfo(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
