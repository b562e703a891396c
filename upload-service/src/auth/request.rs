use std::collections::HashMap;

use http::Method;

/// The slice of an inbound HTTP request the authentication chain
/// consumes: method, path, bearer/query credential (if any), and the
/// raw body for the tokenless branch lookup.
///
/// Built once per request and discarded with it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    method: Method,
    path: String,
    authorization: Option<String>,
    query: HashMap<String, String>,
    body: Vec<u8>,
}

impl UploadRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            query: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Credential following a specific keyword, e.g. `Repotoken <key>`.
    pub fn keyword_credential(&self, keyword: &str) -> Option<&str> {
        let value = self.authorization.as_deref()?.trim();
        let (kw, rest) = value.split_once(char::is_whitespace)?;
        if kw.eq_ignore_ascii_case(keyword) {
            let rest = rest.trim();
            (!rest.is_empty()).then_some(rest)
        } else {
            None
        }
    }

    /// Bearer-style credential: `Bearer <tok>`, `Token <tok>`, or a
    /// bare header value. A header carrying any other keyword (such as
    /// `Repotoken`) is not a bearer credential.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.authorization.as_deref()?.trim();
        match value.split_once(char::is_whitespace) {
            None => (!value.is_empty()).then_some(value),
            Some((kw, rest)) => {
                if kw.eq_ignore_ascii_case("bearer") || kw.eq_ignore_ascii_case("token") {
                    let rest = rest.trim();
                    (!rest.is_empty()).then_some(rest)
                } else {
                    None
                }
            }
        }
    }

    /// Legacy query-string credential surface (`?token=<uuid>`). An
    /// empty value is no credential at all.
    pub fn query_token(&self) -> Option<&str> {
        self.query
            .get("token")
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Whether the caller supplied any credential at all, on either
    /// surface. Gates the tokenless strategy and picks the user-facing
    /// failure message.
    pub fn has_credential(&self) -> bool {
        self.authorization.as_deref().is_some_and(|v| !v.trim().is_empty())
            || self.query_token().is_some()
    }

    /// `branch` field of a JSON body. A malformed body is tolerated as
    /// "branch unknown", not a hard failure.
    pub fn body_branch(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        value.get("branch")?.as_str().map(str::to_string)
    }
}
