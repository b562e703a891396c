use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Service;

/// Upload-path pattern: CI-provider tag, URL-encoded owner/repo slug
/// (tolerates `.`, `@`, `:`, `_`, `/`, `-`, `~` and percent escapes),
/// and an optional 40-hex commit sha behind `/commits`.
static UPLOAD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/upload/(\w+)/([\w.@:_/\-~%]+)/commits(?:/([a-f0-9]{40}))?")
        .expect("upload path pattern is valid")
});

/// What an untrusted request path claims about the upload target. Valid
/// for the current request only; nothing here is trusted until the slug
/// resolves against stored state.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenlessClaim {
    pub service: Service,
    pub slug: String,
    pub commitid: Option<String>,
}

/// Parses the request path to recover the target repository and
/// optional commit, independent of any token.
#[derive(Debug, Default)]
pub struct TokenlessPathResolver;

impl TokenlessPathResolver {
    pub fn new() -> Self {
        Self
    }

    /// `None` on any parse failure: missing segment, unknown provider
    /// tag, or undecodable slug. Callers collapse all of these into one
    /// uniform denial.
    pub fn resolve(&self, path: &str) -> Option<TokenlessClaim> {
        let caps = UPLOAD_PATH_RE.captures(path)?;

        let service: Service = caps[1].parse().ok()?;
        let slug = urlencoding::decode(&caps[2]).ok()?.into_owned();
        let commitid = caps.get(3).map(|m| m.as_str().to_string());

        Some(TokenlessClaim {
            service,
            slug,
            commitid,
        })
    }
}
