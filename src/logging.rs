//! Logging for outgoing requests and the subscriber setup for binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::request::{Method, RequestData};

/// Bodies longer than this many bytes are truncated in `info` logs.
///
/// The full body is still logged at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Install a pretty, stderr-only `tracing` subscriber.
///
/// The log level is read from `RUST_LOG` and defaults to `info`.
/// Stdout is left to the program's own output.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Log a request before it is sent.
///
/// Form fields that hold passwords are redacted.
pub(crate) fn log_request(method: Method, url: &str, data: &RequestData) {
    let url = redact_passwords(url);

    if method == Method::Get {
        tracing::info!("Sending request: {} {url}", method.as_str());
        return;
    }

    let body = match data.to_query_string() {
        Ok(body) => redact_passwords(&body),
        Err(error) => format!("<unencodable: {error}>"),
    };
    log_body(&format!("Sending request: {} {url}", method.as_str()), &body);
}

/// Log a response once its body has been read.
pub(crate) fn log_response(status: u16, url: &str, body: &str) {
    log_body(
        &format!("Received response: {status} from {}", redact_passwords(url)),
        body,
    );
}

fn log_body(message: &str, body: &str) {
    match truncate(body, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated) => {
            tracing::info!("{message}\nbody: {truncated}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{message}\nbody: {body:?}"),
    }
}

/// The longest prefix of `text` that fits in `limit` bytes, or `None` if the
/// whole text fits.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    if text.len() <= limit {
        return None;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    Some(&text[..end])
}

fn redact_passwords(form_text: &str) -> String {
    let text = redact_password(form_text, "password");
    redact_password(&text, "confirm_password")
}

fn redact_password(form_text: &str, field_name: &str) -> String {
    let mut redacted = String::with_capacity(form_text.len());

    for (index, pair) in form_text.split('&').enumerate() {
        if index > 0 {
            redacted.push('&');
        }

        // The first pair of a URL is preceded by the path and `?`.
        let (prefix, field) = match pair.rfind('?') {
            Some(position) => pair.split_at(position + 1),
            None => ("", pair),
        };
        redacted.push_str(prefix);

        match field.split_once('=') {
            Some((name, _)) if name == field_name => {
                redacted.push_str(name);
                redacted.push_str("=********");
            }
            _ => redacted.push_str(field),
        }
    }

    redacted
}
