//! Response classification and failure diagnostics.

use tracing::warn;

use crate::document::Document;
use crate::endpoint::DiagnosticPolicy;
use crate::error::ClientError;
use crate::http::HttpResponse;

/// Map a completed exchange to a document or a failure.
///
/// Transport errors pass through unchanged. A status outside 2xx becomes
/// `ClientError::Api` carrying the raw body. A 2xx body must parse as a JSON
/// object.
pub fn classify(exchange: Result<HttpResponse, ClientError>) -> Result<Document, ClientError> {
    let response = exchange?;
    if !response.is_success() {
        return Err(ClientError::Api {
            status: response.status,
            body: response.body,
        });
    }
    Document::parse(&response.body)
}

/// Emit the diagnostic for a failed call, unless the policy silences it.
pub fn report(endpoint: &str, policy: DiagnosticPolicy, error: &ClientError) {
    if policy == DiagnosticPolicy::Silent {
        return;
    }
    match error {
        ClientError::Api { status, body } => {
            warn!(endpoint, status, body = %body, "request failed");
        }
        other => {
            warn!(endpoint, error = %other, "request failed");
        }
    }
}
