//! The HTTP request wrapper every server call goes through.
//!
//! A request is described declaratively by [RequestOptions]. GET requests
//! carry their data in the query string, every other method sends it as a
//! multipart form body. The HTTP status of a completed exchange is not
//! interpreted: the JSON body is handed back as is and the caller inspects
//! the response envelope.

use reqwest::{header::ACCESS_CONTROL_ALLOW_ORIGIN, multipart::Form};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{
    Error,
    logging::{log_request, log_response},
};

/// The HTTP methods the server API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Data is sent in the query string.
    Get,
    /// Data is sent as a multipart body.
    Post,
    /// Data is sent as a multipart body.
    Put,
    /// Data is sent as a multipart body.
    Delete,
}

impl Method {
    /// The method name as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Ordered key/value pairs sent with a request.
///
/// Keys are unique. Inserting a key that is already present replaces its
/// value but keeps the position of the first insertion, so serialization
/// always follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestData {
    pairs: Vec<(String, String)>,
}

impl RequestData {
    /// Empty request data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to the string form of `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();

        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Builder style [RequestData::insert].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// The value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// The pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode the pairs as `application/x-www-form-urlencoded`, e.g. `a=1&b=2`.
    ///
    /// # Errors
    /// Returns [Error::InvalidRequestData] if the encoder rejects the data.
    pub fn to_query_string(&self) -> Result<String, Error> {
        serde_urlencoded::to_string(&self.pairs)
            .map_err(|error| Error::InvalidRequestData(error.to_string()))
    }
}

impl<K, V> FromIterator<(K, V)> for RequestData
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = RequestData::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

/// A declarative description of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// The HTTP method, which also decides how `data` is encoded.
    pub method: Method,
    /// The URL without the query string.
    pub url: String,
    /// The data to send, empty if there is none.
    pub data: RequestData,
}

impl RequestOptions {
    /// Options for a request without data.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: RequestData::new(),
        }
    }

    /// Attach `data` to the request.
    pub fn with_data(mut self, data: RequestData) -> Self {
        self.data = data;
        self
    }

    /// The URL the request is sent to.
    ///
    /// For GET requests the data is appended as a query string: the first
    /// pair follows `?`, the others follow `&`. Other methods use `url`
    /// unchanged.
    ///
    /// # Errors
    /// Returns [Error::InvalidRequestData] if the data cannot be encoded.
    pub fn request_url(&self) -> Result<String, Error> {
        if self.method != Method::Get || self.data.is_empty() {
            return Ok(self.url.clone());
        }

        Ok(format!("{}?{}", self.url, self.data.to_query_string()?))
    }
}

/// Sends [RequestOptions] to the server and decodes the JSON response.
///
/// Cloning is cheap, clones share the underlying connection pool.
#[derive(Debug, Clone, Default)]
pub struct RequestClient {
    http: reqwest::Client,
}

impl RequestClient {
    /// A client with a default connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the request and parse the response body as JSON.
    ///
    /// Every request asks for permissive cross-origin access. Responses are
    /// parsed regardless of their status code.
    ///
    /// # Errors
    /// - [Error::InvalidRequestData] if the query string cannot be encoded.
    /// - [Error::Transport] if the exchange did not complete.
    /// - [Error::InvalidJson] if the body is not JSON.
    pub async fn send(&self, options: RequestOptions) -> Result<Value, Error> {
        let url = options.request_url()?;
        log_request(options.method, &url, &options.data);

        let mut request = self
            .http
            .request(options.method.into(), &url)
            .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*");

        if options.method != Method::Get {
            let form = options
                .data
                .iter()
                .fold(Form::new(), |form, (key, value)| {
                    form.text(key.to_owned(), value.to_owned())
                });
            request = request.multipart(form);
        }

        let response = request.send().await.map_err(|error| {
            tracing::warn!("{} {url} failed: {error}", options.method.as_str());
            Error::Transport(error.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| Error::Transport(error.to_string()))?;
        log_response(status.as_u16(), &url, &body);

        serde_json::from_str(&body).map_err(|error| Error::InvalidJson(error.to_string()))
    }

    /// Send the request in the background and hand the outcome to `callback`.
    ///
    /// `callback` is invoked exactly once, with either the parsed body or the
    /// error [RequestClient::send] would have returned. Must be called from
    /// within a tokio runtime.
    pub fn dispatch<F>(&self, options: RequestOptions, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Value, Error>) + Send + 'static,
    {
        let client = self.clone();

        tokio::spawn(async move { callback(client.send(options).await) })
    }
}
