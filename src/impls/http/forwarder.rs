use crate::{AttemptOutcome, Forwarder, HttpMethod, RequestEnvelope};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Replays an envelope as a PUT or POST against one base URL, with the whole
/// original document as the JSON body.
pub struct HttpForwarder {
    base_url: String,
}

impl HttpForwarder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    // One client per attempt; nothing is pooled across messages.
    fn request(
        &self,
        envelope: &RequestEnvelope,
    ) -> Result<reqwest::RequestBuilder, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        let url = format!("{}{}", self.base_url, envelope.url_suffix);
        let builder = match envelope.method {
            HttpMethod::Put => client.put(&url),
            HttpMethod::Post => client.post(&url),
        };
        Ok(builder.json(envelope.body()))
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        envelope: &RequestEnvelope,
        cancel: &CancellationToken,
    ) -> AttemptOutcome {
        let request = match self.request(envelope) {
            Ok(request) => request,
            Err(err) => return AttemptOutcome::Failed(err.to_string()),
        };
        let response = tokio::select! {
            () = cancel.cancelled() => {
                return AttemptOutcome::Failed("attempt abandoned at shutdown".into());
            }
            response = request.send() => response,
        };
        match response {
            Ok(response) if response.status().is_success() => AttemptOutcome::Delivered,
            Ok(response) => AttemptOutcome::Rejected(response.status().as_u16()),
            Err(err) => AttemptOutcome::Failed(err.to_string()),
        }
    }
}
