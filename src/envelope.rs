//! Decoding of the `{success, data}` envelope every server response uses.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Error;

const DEFAULT_REJECTION_MESSAGE: &str = "the server did not give a reason";

/// The application level outcome of a server call.
///
/// The HTTP status code is ignored by the server API, `success` is the only
/// indicator of whether the call worked. On failure the server puts its
/// error message in either `error` or `data`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    /// Whether the server carried out the request.
    pub success: bool,
    /// The payload on success, sometimes the error message on failure.
    #[serde(default)]
    pub data: Value,
    /// The error message on failure.
    #[serde(default)]
    pub error: Option<Value>,
}

impl Envelope {
    /// A successful envelope carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// A failed envelope carrying the error `message`.
    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(Value::String(message.to_owned())),
        }
    }

    /// Decode a parsed response body.
    ///
    /// # Errors
    /// Returns [Error::MalformedResponse] if the body has no boolean
    /// `success` field.
    pub fn from_value(body: Value) -> Result<Self, Error> {
        serde_json::from_value(body).map_err(|error| Error::MalformedResponse(error.to_string()))
    }

    /// The server's explanation for a failed call.
    pub fn failure_message(&self) -> String {
        let message = self.error.as_ref().unwrap_or(&self.data);

        match message {
            Value::String(message) => message.clone(),
            Value::Null => DEFAULT_REJECTION_MESSAGE.to_owned(),
            Value::Object(object) => match object.get("message") {
                Some(Value::String(message)) => message.clone(),
                _ => message.to_string(),
            },
            other => other.to_string(),
        }
    }

    /// Check that the call succeeded, discarding the payload.
    ///
    /// # Errors
    /// Returns [Error::Rejected] if `success` is false.
    pub fn into_success(self) -> Result<(), Error> {
        if self.success {
            Ok(())
        } else {
            Err(Error::Rejected(self.failure_message()))
        }
    }

    /// Check that the call succeeded and decode the payload as `T`.
    ///
    /// # Errors
    /// - [Error::Rejected] if `success` is false.
    /// - [Error::MalformedResponse] if the payload is not a `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, Error> {
        if !self.success {
            return Err(Error::Rejected(self.failure_message()));
        }

        serde_json::from_value(self.data).map_err(|error| Error::MalformedResponse(error.to_string()))
    }
}
