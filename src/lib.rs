//! Ledgerline drives the account pages of a personal finance server.
//!
//! The crate holds the client side controllers of the application: a request
//! wrapper around the JSON API, forms that submit without navigating, the
//! create transaction form and the transactions page of an account. The
//! controllers write to their elements through small traits, so the same
//! code runs against the in-memory documents of the terminal front end and
//! the tests.

#![warn(missing_docs)]

mod api;
mod config;
mod document;
mod envelope;
mod error;
mod events;
mod form;
mod logging;
mod models;
mod page;
mod request;
mod transaction_form;
mod view;

#[cfg(test)]
mod test_utils;

pub use api::{ACCOUNT_ROUTE, FinanceApi, HttpApi, TRANSACTION_ROUTE};
pub use config::{ClientConfig, Config};
pub use document::{ButtonTarget, HtmlForm, HtmlPage, SelectOption};
pub use envelope::Envelope;
pub use error::Error;
pub use events::{AppEvent, EventBus};
pub use form::{
    AsyncForm, FormData, FormElement, NoopSubmit, SubmitEvent, SubmitHandler, SubmitOutcome,
    collect_data,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, setup_logging};
pub use models::{
    Account, AccountSummary, EntityId, PageQuery, TransactionItem, TransactionKind, User,
};
pub use page::{
    ActionOutcome, Confirm, PageView, REMOVE_ACCOUNT_PROMPT, REMOVE_TRANSACTION_PROMPT,
    RegionOutcome, RenderOutcome, TransactionsPage,
};
pub use request::{Method, RequestClient, RequestData, RequestOptions};
pub use transaction_form::{CreateTransaction, CreateTransactionForm};
pub use view::{
    account_options_view, create_transaction_form_view, format_amount, format_date, page_view,
    transaction_view, transactions_view,
};
