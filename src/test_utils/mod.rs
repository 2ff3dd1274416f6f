#![allow(missing_docs)]

pub(crate) mod api;
pub(crate) mod confirm;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use api::{ApiCall, FakeApi, transaction_json};
pub(crate) use confirm::ScriptedConfirm;
pub(crate) use html::{assert_valid_html, attribute_values, parse_html_fragment, texts};
pub(crate) use http::spawn_server;
