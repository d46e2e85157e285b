//! JSON text form of [`SignalEnvelope`] for relays that carry strings.

use crate::SignalEnvelope;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode signal: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode signal: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode(envelope: &SignalEnvelope) -> Result<String, CodecError> {
    serde_json::to_string(envelope).map_err(CodecError::Encode)
}

pub fn decode(text: &str) -> Result<SignalEnvelope, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}
