//! Defines the crate level error type.

/// The errors that may occur while talking to the server or driving the page.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// A controller was constructed without the element it manages.
    ///
    /// This is a programming error in the caller, e.g. a missing container
    /// in the page template, and is raised immediately at construction.
    #[error("invalid element: {0} is missing")]
    InvalidElement(&'static str),

    /// A CSS selector used to look up an element could not be parsed.
    #[error("invalid selector \"{0}\"")]
    InvalidSelector(String),

    /// The client configuration is not usable, e.g. a malformed base URL.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request data could not be encoded into a query string.
    #[error("could not encode request data: {0}")]
    InvalidRequestData(String),

    /// The request never completed, e.g. the connection was refused.
    ///
    /// The HTTP status of a completed exchange is never reported through this
    /// variant, the response envelope carries the outcome instead.
    #[error("the request could not be completed: {0}")]
    Transport(String),

    /// The server responded with a body that is not JSON.
    #[error("the response body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The response is JSON but does not have the shape the caller expected.
    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),

    /// The server answered with `success: false`.
    ///
    /// Holds the error message the server sent back.
    #[error("the server rejected the request: {0}")]
    Rejected(String),

    /// A timestamp was not in the form `YYYY-MM-DD HH:MM:SS`.
    #[error("\"{0}\" is not a date-time in the form YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),
}
