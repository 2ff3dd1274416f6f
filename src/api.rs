//! The server API surface the controllers consume.
//!
//! [FinanceApi] is the seam between the controllers and the network: the
//! controllers only ever see [Envelope]s, [HttpApi] produces them from real
//! HTTP calls.

use async_trait::async_trait;
use reqwest::Url;

use crate::{
    Error,
    envelope::Envelope,
    models::{EntityId, PageQuery, User},
    request::{Method, RequestClient, RequestData, RequestOptions},
};

/// The route for account operations.
pub const ACCOUNT_ROUTE: &str = "/account";
/// The route for transaction operations.
pub const TRANSACTION_ROUTE: &str = "/transaction";

/// The `Account` and `Transaction` operations of the server.
///
/// Implementations return `Ok` for every exchange that produced an envelope,
/// including envelopes with `success: false`. `Err` is reserved for calls that
/// did not produce an envelope at all.
#[async_trait]
pub trait FinanceApi: Send + Sync {
    /// `Account.list`: the accounts of `user`.
    async fn list_accounts(&self, user: &User) -> Result<Envelope, Error>;

    /// `Account.get`: a single account, used for its name.
    async fn get_account(&self, account_id: &EntityId) -> Result<Envelope, Error>;

    /// `Account.remove`: delete an account and its transactions.
    async fn remove_account(&self, account_id: &EntityId) -> Result<Envelope, Error>;

    /// `Transaction.list`: the transactions matching `query`.
    async fn list_transactions(&self, query: &PageQuery) -> Result<Envelope, Error>;

    /// `Transaction.create`: create a transaction from form data.
    async fn create_transaction(&self, data: RequestData) -> Result<Envelope, Error>;

    /// `Transaction.remove`: delete a single transaction.
    async fn remove_transaction(&self, transaction_id: &EntityId) -> Result<Envelope, Error>;
}

/// [FinanceApi] over JSON/HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: RequestClient,
    base_url: String,
}

impl HttpApi {
    /// An API client rooted at `base_url`, e.g. `http://localhost:8000`.
    pub fn new(client: RequestClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    /// The URL of `route` followed by `id` as a percent-encoded path segment.
    fn entity_url(&self, route: &str, id: &EntityId) -> Result<String, Error> {
        let invalid = |reason: String| Error::InvalidConfig(format!("base URL: {reason}"));

        let mut url = Url::parse(&self.url(route)).map_err(|error| invalid(error.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("{} cannot have a path", self.base_url)))?
            .push(id.as_str());

        Ok(url.into())
    }

    async fn call(&self, options: RequestOptions) -> Result<Envelope, Error> {
        let body = self.client.send(options).await?;
        Envelope::from_value(body)
    }
}

#[async_trait]
impl FinanceApi for HttpApi {
    async fn list_accounts(&self, user: &User) -> Result<Envelope, Error> {
        self.call(
            RequestOptions::new(Method::Get, self.url(ACCOUNT_ROUTE))
                .with_data(user.to_request_data()),
        )
        .await
    }

    async fn get_account(&self, account_id: &EntityId) -> Result<Envelope, Error> {
        let url = self.entity_url(ACCOUNT_ROUTE, account_id)?;
        self.call(RequestOptions::new(Method::Get, url)).await
    }

    async fn remove_account(&self, account_id: &EntityId) -> Result<Envelope, Error> {
        self.call(
            RequestOptions::new(Method::Delete, self.url(ACCOUNT_ROUTE))
                .with_data(RequestData::new().with("id", account_id)),
        )
        .await
    }

    async fn list_transactions(&self, query: &PageQuery) -> Result<Envelope, Error> {
        self.call(
            RequestOptions::new(Method::Get, self.url(TRANSACTION_ROUTE))
                .with_data(query.to_request_data()),
        )
        .await
    }

    async fn create_transaction(&self, data: RequestData) -> Result<Envelope, Error> {
        self.call(RequestOptions::new(Method::Put, self.url(TRANSACTION_ROUTE)).with_data(data))
            .await
    }

    async fn remove_transaction(&self, transaction_id: &EntityId) -> Result<Envelope, Error> {
        self.call(
            RequestOptions::new(Method::Delete, self.url(TRANSACTION_ROUTE))
                .with_data(RequestData::new().with("id", transaction_id)),
        )
        .await
    }
}
