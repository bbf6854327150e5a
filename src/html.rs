//! Small helpers shared by the HTML renderers.

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn attr(s: &str) -> String {
    escape(s).replace('"', "&quot;")
}

/// Builds links that carry the navigation token, since the gate runs on
/// every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nav {
    token: String,
}

impl Nav {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `path?token=...`, attribute-escaped.
    pub fn href(&self, path: &str) -> String {
        attr(&format!("{}?token={}", path, urlencoding::encode(&self.token)))
    }
}
