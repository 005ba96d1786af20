use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Top-level field selecting the outbound verb. Optional; anything other
/// than a case-insensitive "PUT" falls back to POST.
const METHOD_FIELD: &str = "httpRequest";

/// Top-level field carrying the path appended to the downstream base URL.
/// Required, but the empty string is a valid suffix.
const URL_SUFFIX_FIELD: &str = "urlSuffix";

/// Decode failures are permanent: redelivering the same bytes can never
/// succeed, so these payloads must not go back on the queue.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not well-formed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload has no string-valued `urlSuffix` field")]
    MissingUrlSuffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Put,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Put => f.write_str("PUT"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// A decoded inbound payload, ready to be forwarded. The body is the whole
/// inbound document, so the routing fields travel with it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub method: HttpMethod,
    pub url_suffix: String,
    body: Value,
}

impl RequestEnvelope {
    /// Decode raw payload bytes. Pure; no I/O.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let document: Value = serde_json::from_slice(payload)?;

        let url_suffix = document
            .get(URL_SUFFIX_FIELD)
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingUrlSuffix)?
            .to_owned();

        let method = match document.get(METHOD_FIELD).and_then(Value::as_str) {
            Some(name) if name.eq_ignore_ascii_case("PUT") => HttpMethod::Put,
            _ => HttpMethod::Post,
        };

        Ok(Self {
            method,
            url_suffix,
            body: document,
        })
    }

    /// The full inbound document, re-serialized as the outbound request body.
    pub fn body(&self) -> &Value {
        &self.body
    }
}
