use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::{
    Error,
    api::FinanceApi,
    envelope::Envelope,
    models::{EntityId, PageQuery, User},
    request::RequestData,
};

/// A call made against [FakeApi].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    ListAccounts(EntityId),
    GetAccount(EntityId),
    RemoveAccount(EntityId),
    ListTransactions(EntityId),
    CreateTransaction(RequestData),
    RemoveTransaction(EntityId),
}

#[derive(Debug, Clone)]
enum MutationBehaviour {
    Succeed,
    Reject(String),
    Fail,
}

impl MutationBehaviour {
    fn respond(&self) -> Result<Envelope, Error> {
        match self {
            MutationBehaviour::Succeed => Ok(Envelope::success(Value::Null)),
            MutationBehaviour::Reject(message) => Ok(Envelope::rejected(message)),
            MutationBehaviour::Fail => Err(Error::Transport("connection refused".to_owned())),
        }
    }
}

/// An in-memory server that records every call.
///
/// Unknown accounts are rejected, unknown transaction lists are empty.
pub(crate) struct FakeApi {
    accounts: Mutex<Vec<(EntityId, String)>>,
    account_list: Mutex<Option<Result<Envelope, Error>>>,
    transactions: Mutex<HashMap<EntityId, Envelope>>,
    held_transactions: Mutex<HashMap<EntityId, Arc<Notify>>>,
    removals: Mutex<MutationBehaviour>,
    creates: Mutex<MutationBehaviour>,
    calls: Mutex<Vec<ApiCall>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            account_list: Mutex::new(None),
            transactions: Mutex::new(HashMap::new()),
            held_transactions: Mutex::new(HashMap::new()),
            removals: Mutex::new(MutationBehaviour::Succeed),
            creates: Mutex::new(MutationBehaviour::Succeed),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_account(self, id: i64, name: &str) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .push((EntityId::from(id), name.to_owned()));
        self
    }

    /// Answer `Account.list` with `response` instead of the known accounts.
    pub(crate) fn with_account_list(self, response: Result<Envelope, Error>) -> Self {
        self.set_account_list(response);
        self
    }

    pub(crate) fn set_account_list(&self, response: Result<Envelope, Error>) {
        *self.account_list.lock().unwrap() = Some(response);
    }

    pub(crate) fn with_transactions(self, account_id: i64, response: Envelope) -> Self {
        self.set_transactions(account_id, response);
        self
    }

    pub(crate) fn set_transactions(&self, account_id: i64, response: Envelope) {
        self.transactions
            .lock()
            .unwrap()
            .insert(EntityId::from(account_id), response);
    }

    pub(crate) fn rejecting_removals(self, message: &str) -> Self {
        *self.removals.lock().unwrap() = MutationBehaviour::Reject(message.to_owned());
        self
    }

    pub(crate) fn failing_removals(self) -> Self {
        *self.removals.lock().unwrap() = MutationBehaviour::Fail;
        self
    }

    pub(crate) fn rejecting_creates(self, message: &str) -> Self {
        *self.creates.lock().unwrap() = MutationBehaviour::Reject(message.to_owned());
        self
    }

    /// Make the next transaction list of `account_id` wait until the returned
    /// [Notify] is notified.
    pub(crate) fn hold_transactions(&self, account_id: i64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.held_transactions
            .lock()
            .unwrap()
            .insert(EntityId::from(account_id), gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FinanceApi for FakeApi {
    async fn list_accounts(&self, user: &User) -> Result<Envelope, Error> {
        self.record(ApiCall::ListAccounts(user.id.clone()));

        let scripted = self.account_list.lock().unwrap().clone();
        if let Some(response) = scripted {
            return response;
        }

        let accounts: Vec<Value> = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect();
        Ok(Envelope::success(Value::Array(accounts)))
    }

    async fn get_account(&self, account_id: &EntityId) -> Result<Envelope, Error> {
        self.record(ApiCall::GetAccount(account_id.clone()));

        let name = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == account_id)
            .map(|(_, name)| name.clone());

        Ok(match name {
            Some(name) => Envelope::success(json!({"id": account_id, "name": name})),
            None => Envelope::rejected("Account not found"),
        })
    }

    async fn remove_account(&self, account_id: &EntityId) -> Result<Envelope, Error> {
        self.record(ApiCall::RemoveAccount(account_id.clone()));
        let behaviour = self.removals.lock().unwrap().clone();
        behaviour.respond()
    }

    async fn list_transactions(&self, query: &PageQuery) -> Result<Envelope, Error> {
        self.record(ApiCall::ListTransactions(query.account_id.clone()));

        let gate = self
            .held_transactions
            .lock()
            .unwrap()
            .remove(&query.account_id);
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let response = self
            .transactions
            .lock()
            .unwrap()
            .get(&query.account_id)
            .cloned();
        Ok(response.unwrap_or_else(|| Envelope::success(json!([]))))
    }

    async fn create_transaction(&self, data: RequestData) -> Result<Envelope, Error> {
        self.record(ApiCall::CreateTransaction(data));
        let behaviour = self.creates.lock().unwrap().clone();
        behaviour.respond()
    }

    async fn remove_transaction(&self, transaction_id: &EntityId) -> Result<Envelope, Error> {
        self.record(ApiCall::RemoveTransaction(transaction_id.clone()));
        let behaviour = self.removals.lock().unwrap().clone();
        behaviour.respond()
    }
}

/// A transaction as the server sends it.
pub(crate) fn transaction_json(id: i64, kind: &str, name: &str, sum: i64) -> Value {
    json!({
        "id": id,
        "type": kind,
        "name": name,
        "sum": sum,
        "created_at": "2019-03-10 03:20:41",
    })
}
