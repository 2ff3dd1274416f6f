//! The entities exchanged with the server.
//!
//! These are read-only on the client: they are decoded from response
//! envelopes and rendered, never mutated.

use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize};

use crate::request::RequestData;

/// The ID of a server-side entity such as an account or a transaction.
///
/// The server may send IDs either as JSON numbers or strings, both are
/// accepted and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an ID from its textual form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as it is sent to the server.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(id) => Self::from(id),
            RawId::Text(id) => Self(id),
        })
    }
}

/// The signed-in user, sent along when listing the user's accounts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// The user's ID.
    pub id: EntityId,
    /// The user's display name.
    pub name: String,
}

impl User {
    /// The user as request data, `id` first.
    pub fn to_request_data(&self) -> RequestData {
        RequestData::new()
            .with("id", self.id.as_str())
            .with("name", &self.name)
    }
}

/// An account as returned by `Account.list` and `Account.get`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Account {
    /// The account ID.
    pub id: EntityId,
    /// The name shown in the page title and the account select.
    pub name: String,
}

/// The payload of `Account.get`, only the name is needed to render a title.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountSummary {
    /// The account name.
    pub name: String,
}

/// Whether a transaction adds money to or takes money from an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionKind {
    /// The lowercase name used by the server and in CSS class names.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// A single income or expense entry of an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionItem {
    /// The transaction ID, carried by the delete trigger.
    pub id: EntityId,
    /// Income or expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The user supplied description.
    pub name: String,
    /// The unsigned amount, the sign comes from `kind`.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub sum: f64,
    /// When the transaction was created, as `YYYY-MM-DD HH:MM:SS`.
    pub created_at: String,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSum {
        Number(f64),
        Text(String),
    }

    match RawSum::deserialize(deserializer)? {
        RawSum::Number(sum) => Ok(sum),
        RawSum::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("\"{text}\" is not a number"))),
    }
}

/// The account context a transactions page renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// The account whose transactions are shown.
    pub account_id: EntityId,
}

impl PageQuery {
    /// A query for the account `account_id`.
    pub fn new(account_id: impl Into<EntityId>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }

    /// The query as request data for `Transaction.list`.
    pub fn to_request_data(&self) -> RequestData {
        RequestData::new().with("account_id", self.account_id.as_str())
    }
}
