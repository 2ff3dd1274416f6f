//! The page that shows the transactions of one account.
//!
//! The page remembers the query it last rendered so it can re-render itself
//! after a mutation without being told what to show. Every render takes a
//! new token and each region only accepts the completion carrying the latest
//! token, so a slow response from a superseded render never overwrites a
//! newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use maud::Markup;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    Error,
    api::FinanceApi,
    document::ButtonTarget,
    envelope::Envelope,
    events::{AppEvent, EventBus},
    models::{AccountSummary, EntityId, PageQuery, TransactionItem},
    view::{
        ACCOUNT_TITLE_PLACEHOLDER, REMOVE_ACCOUNT_CLASS, REMOVE_TRANSACTION_CLASS,
        transactions_view,
    },
};

/// Asked before an account is removed.
pub const REMOVE_ACCOUNT_PROMPT: &str = "Вы уверены? Отменить это действие невозможно";

/// Asked before a transaction is removed.
pub const REMOVE_TRANSACTION_PROMPT: &str = "Вы действительно хотите удалить эту транзакцию?";

/// The regions of the page container the controller writes to.
pub trait PageView: Send + Sync {
    /// Set the text of `.content-title`.
    fn set_title(&self, title: &str);

    /// Replace the inner HTML of `.content`.
    fn set_content(&self, content: Markup);
}

/// Asks the user for consent before a destructive action.
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Show `message` and wait for the answer, `true` meaning go ahead.
    async fn confirm(&self, message: &str) -> bool;
}

/// What happened to one region of the page during a render.
#[derive(Debug, PartialEq)]
pub enum RegionOutcome {
    /// The region now shows the response.
    Updated,
    /// A later render or a clear took over, the response was discarded.
    Superseded,
    /// The request failed or was rejected.
    ///
    /// A failed title keeps its text, a failed list is emptied so rows of the
    /// previous account never show under the new query.
    Failed(Error),
}

/// The result of [TransactionsPage::render].
#[derive(Debug, PartialEq)]
pub enum RenderOutcome {
    /// There was no query, nothing was requested.
    Skipped,
    /// Both regions were requested.
    Rendered {
        /// The account title.
        title: RegionOutcome,
        /// The transaction list.
        transactions: RegionOutcome,
    },
}

/// The result of a destructive action.
#[derive(Debug, PartialEq)]
pub enum ActionOutcome {
    /// No account is shown, so there is nothing to remove.
    NothingSelected,
    /// The user said no, nothing was sent.
    Declined,
    /// The server removed the entity and a refresh was published.
    Completed,
    /// The request failed or was rejected.
    Failed(Error),
}

#[derive(Debug, Default)]
struct PageState {
    last_query: Option<PageQuery>,
    render_token: u64,
}

/// The controller of the account transactions page.
pub struct TransactionsPage<A, V, C> {
    element: V,
    api: Arc<A>,
    confirm: C,
    events: EventBus,
    state: Mutex<PageState>,
}

impl<A, V, C> TransactionsPage<A, V, C>
where
    A: FinanceApi,
    V: PageView,
    C: Confirm,
{
    /// Take control of the page container `element`.
    ///
    /// # Errors
    /// Returns [Error::InvalidElement] if `element` is `None`.
    pub fn new(
        element: Option<V>,
        api: Arc<A>,
        confirm: C,
        events: EventBus,
    ) -> Result<Self, Error> {
        let element = element.ok_or(Error::InvalidElement("transactions page container"))?;

        Ok(Self {
            element,
            api,
            confirm,
            events,
            state: Mutex::new(PageState::default()),
        })
    }

    /// The page container.
    pub fn element(&self) -> &V {
        &self.element
    }

    /// The query the page currently shows, `None` after a clear.
    pub fn last_query(&self) -> Option<PageQuery> {
        self.lock_state().last_query.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show the account and transactions selected by `query`.
    ///
    /// `None` leaves the page and its cached query untouched. Otherwise the
    /// query is cached and the account and its transactions are fetched
    /// concurrently, each region updating on its own when its response
    /// arrives. A failed title is left as it was, a failed list is emptied.
    pub async fn render(&self, query: Option<PageQuery>) -> RenderOutcome {
        let Some(query) = query else {
            return RenderOutcome::Skipped;
        };

        let token = {
            let mut state = self.lock_state();
            state.last_query = Some(query.clone());
            state.render_token += 1;
            state.render_token
        };
        tracing::debug!("Rendering account {} with token {token}", query.account_id);

        let (title, transactions) = tokio::join!(
            self.render_title(&query, token),
            self.render_transactions(&query, token)
        );

        RenderOutcome::Rendered {
            title,
            transactions,
        }
    }

    async fn render_title(&self, query: &PageQuery, token: u64) -> RegionOutcome {
        let account = self
            .api
            .get_account(&query.account_id)
            .await
            .and_then(Envelope::into_data::<AccountSummary>);

        match account {
            Ok(account) => {
                self.write_if_current(token, || self.element.set_title(&account.name))
            }
            Err(error) => {
                tracing::warn!("Could not load account {}: {error}", query.account_id);
                RegionOutcome::Failed(error)
            }
        }
    }

    async fn render_transactions(&self, query: &PageQuery, token: u64) -> RegionOutcome {
        let items = self
            .api
            .list_transactions(query)
            .await
            .and_then(Envelope::into_data::<Vec<TransactionItem>>);

        match items {
            Ok(items) => self.write_if_current(token, || {
                self.element.set_content(transactions_view(&items))
            }),
            Err(error) => {
                tracing::warn!(
                    "Could not load transactions of account {}: {error}",
                    query.account_id
                );
                self.write_if_current(token, || {
                    self.element.set_content(transactions_view(&[]))
                });
                RegionOutcome::Failed(error)
            }
        }
    }

    /// Run `write` only if no render or clear happened since `token` was taken.
    ///
    /// The state lock is held while writing so a newer render cannot slip in
    /// between the check and the write.
    fn write_if_current(&self, token: u64, write: impl FnOnce()) -> RegionOutcome {
        let state = self.lock_state();

        if state.render_token != token {
            tracing::debug!(
                "Discarding response for token {token}, latest is {}",
                state.render_token
            );
            return RegionOutcome::Superseded;
        }

        write();
        RegionOutcome::Updated
    }

    /// Render the cached query again.
    pub async fn update(&self) -> RenderOutcome {
        let query = self.last_query();
        self.render(query).await
    }

    /// Show an empty list and the placeholder title and forget the query.
    ///
    /// Responses of renders still in flight are discarded.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        Self::clear_locked(&self.element, &mut state);
    }

    fn clear_locked(element: &V, state: &mut PageState) {
        state.last_query = None;
        state.render_token += 1;
        element.set_content(transactions_view(&[]));
        element.set_title(ACCOUNT_TITLE_PLACEHOLDER);
    }

    /// Remove the shown account after the user confirms.
    ///
    /// On success the page is cleared, unless it has moved on to another
    /// account in the meantime, and a refresh is published.
    pub async fn remove_account(&self) -> ActionOutcome {
        let Some(query) = self.last_query() else {
            return ActionOutcome::NothingSelected;
        };

        if !self.confirm.confirm(REMOVE_ACCOUNT_PROMPT).await {
            tracing::debug!("Removal of account {} declined", query.account_id);
            return ActionOutcome::Declined;
        }

        let result = self
            .api
            .remove_account(&query.account_id)
            .await
            .and_then(Envelope::into_success);

        if let Err(error) = result {
            tracing::warn!("Could not remove account {}: {error}", query.account_id);
            return ActionOutcome::Failed(error);
        }

        {
            let mut state = self.lock_state();
            let still_shown = state
                .last_query
                .as_ref()
                .is_some_and(|shown| shown.account_id == query.account_id);
            if still_shown {
                Self::clear_locked(&self.element, &mut state);
            }
        }

        self.events.publish(AppEvent::Refresh);
        ActionOutcome::Completed
    }

    /// Remove a transaction after the user confirms.
    ///
    /// The page is not touched directly, the published refresh re-renders it.
    pub async fn remove_transaction(&self, transaction_id: &EntityId) -> ActionOutcome {
        if !self.confirm.confirm(REMOVE_TRANSACTION_PROMPT).await {
            tracing::debug!("Removal of transaction {transaction_id} declined");
            return ActionOutcome::Declined;
        }

        let result = self
            .api
            .remove_transaction(transaction_id)
            .await
            .and_then(Envelope::into_success);

        match result {
            Ok(()) => {
                self.events.publish(AppEvent::Refresh);
                ActionOutcome::Completed
            }
            Err(error) => {
                tracing::warn!("Could not remove transaction {transaction_id}: {error}");
                ActionOutcome::Failed(error)
            }
        }
    }

    /// The container's delegated click listener.
    ///
    /// `button` is the closest button around the clicked element. Clicks
    /// that are not on a remove button are ignored and return `None`.
    pub async fn handle_click(&self, button: Option<ButtonTarget>) -> Option<ActionOutcome> {
        let button = button?;

        if button.has_class(REMOVE_ACCOUNT_CLASS) {
            return Some(self.remove_account().await);
        }

        if button.has_class(REMOVE_TRANSACTION_CLASS) {
            let Some(id) = button.data_id() else {
                tracing::warn!("Transaction remove button has no data-id");
                return None;
            };
            return Some(self.remove_transaction(&EntityId::from(id)).await);
        }

        None
    }

    /// Re-render whenever a refresh is published, until the bus goes away.
    pub async fn follow_refreshes(&self, mut events: broadcast::Receiver<AppEvent>) {
        loop {
            match events.recv().await {
                Ok(AppEvent::Refresh) => {
                    self.update().await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Missed {skipped} events, refreshing once");
                    self.update().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
