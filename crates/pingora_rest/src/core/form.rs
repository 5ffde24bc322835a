use std::collections::HashMap;

use http::Method;

use crate::core::Request;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Error produced when the query string or a url-encoded body cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum FormParseError {
    #[error("invalid semicolon separator in form data")]
    Semicolon,
    #[error("invalid percent escape at byte {offset}")]
    InvalidEscape { offset: usize },
    #[error("malformed form data: {0}")]
    Decode(#[from] serde_urlencoded::de::Error),
}

/// Multi-valued form parameters gathered from the query string and,
/// for POST, PUT and PATCH, a url-encoded body.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Form {
    values: HashMap<String, Vec<String>>,
}

impl Form {
    /// Parse the form of a request. Body values come before query values
    /// under the same name.
    pub fn parse(req: &Request) -> Result<Self, FormParseError> {
        let mut form = Form::default();
        if carries_form_body(req) {
            form.extend_from(req.body())?;
        }
        if let Some(query) = req.query() {
            form.extend_from(query.as_bytes())?;
        }
        Ok(form)
    }

    fn extend_from(&mut self, raw: &[u8]) -> Result<(), FormParseError> {
        validate(raw)?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)?;
        for (name, value) in pairs {
            self.values.entry(name).or_default().push(value);
        }
        Ok(())
    }

    /// First value under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn carries_form_body(req: &Request) -> bool {
    if !matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
        return false;
    }
    req.headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

// serde_urlencoded decodes leniently; reject what a strict parser would.
fn validate(raw: &[u8]) -> Result<(), FormParseError> {
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b';' => return Err(FormParseError::Semicolon),
            b'%' => {
                let escape = raw.get(i + 1..i + 3);
                if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                    return Err(FormParseError::InvalidEscape { offset: i });
                }
                i += 3;
            }
            _ => i += 1,
        }
    }
    Ok(())
}
