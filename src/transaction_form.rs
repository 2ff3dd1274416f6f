//! The form for creating an income or expense.
//!
//! The form is an [AsyncForm] whose submissions go to [CreateTransaction].
//! Its account select is filled from the server when the form is created and
//! again after every refresh, so removed accounts disappear from it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    Error,
    api::FinanceApi,
    envelope::Envelope,
    events::{AppEvent, EventBus},
    form::{AsyncForm, FormData, FormElement, SubmitEvent, SubmitHandler, SubmitOutcome},
    models::{Account, User},
    view::account_options_view,
};

/// Sends a form's data to `Transaction.create`.
pub struct CreateTransaction<A> {
    api: Arc<A>,
    events: EventBus,
}

impl<A: FinanceApi> CreateTransaction<A> {
    /// A handler that creates transactions through `api` and announces them
    /// on `events`.
    pub fn new(api: Arc<A>, events: EventBus) -> Self {
        Self { api, events }
    }
}

#[async_trait]
impl<A, F> SubmitHandler<F> for CreateTransaction<A>
where
    A: FinanceApi,
    F: FormElement,
{
    /// On success the overlay is closed, the fields are reset and a refresh is
    /// published. A rejection leaves the form untouched so it can be fixed.
    ///
    /// # Errors
    /// Returns an error if the request produced no envelope.
    async fn on_submit(&self, form: &F, data: FormData) -> Result<SubmitOutcome, Error> {
        let envelope = self.api.create_transaction(data.into_request_data()).await?;

        match envelope.into_success() {
            Ok(()) => {
                form.close_overlay();
                form.reset();
                self.events.publish(AppEvent::Refresh);
                Ok(SubmitOutcome::Completed)
            }
            Err(Error::Rejected(message)) => {
                tracing::warn!("Transaction was not created: {message}");
                Ok(SubmitOutcome::Rejected(message))
            }
            Err(error) => Err(error),
        }
    }
}

/// The controller of a create transaction form.
pub struct CreateTransactionForm<F, A> {
    form: AsyncForm<F, CreateTransaction<A>>,
    api: Arc<A>,
    user: User,
}

impl<F, A> CreateTransactionForm<F, A>
where
    F: FormElement,
    A: FinanceApi,
{
    /// Take over `element` and fill its account select with the accounts of
    /// `user`.
    ///
    /// A failure to load the accounts is logged and leaves the select as it
    /// was, the form is still usable.
    ///
    /// # Errors
    /// Returns [Error::InvalidElement] if `element` is `None`.
    pub async fn new(
        element: Option<F>,
        api: Arc<A>,
        user: User,
        events: EventBus,
    ) -> Result<Self, Error> {
        let handler = CreateTransaction::new(api.clone(), events);
        let form = AsyncForm::bind(element, handler)?;
        let controller = Self { form, api, user };

        if let Err(error) = controller.render_accounts_list().await {
            tracing::warn!(
                "Could not load the accounts of {}: {error}",
                controller.user.name
            );
        }

        Ok(controller)
    }

    /// The bound form.
    pub fn element(&self) -> &F {
        self.form.element()
    }

    /// Replace the account options with the user's current accounts.
    ///
    /// Returns the number of options shown.
    ///
    /// # Errors
    /// Returns the request or envelope error, in which case the select is
    /// left unchanged.
    pub async fn render_accounts_list(&self) -> Result<usize, Error> {
        let accounts = self
            .api
            .list_accounts(&self.user)
            .await
            .and_then(Envelope::into_data::<Vec<Account>>)?;

        self.form
            .element()
            .replace_select_options(account_options_view(&accounts));
        tracing::debug!("Showing {} account(s) in the form", accounts.len());

        Ok(accounts.len())
    }

    /// Handle the form's submit event, see [CreateTransaction].
    ///
    /// # Errors
    /// Returns an error if the request produced no envelope.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> Result<SubmitOutcome, Error> {
        self.form.handle_submit(event).await
    }

    /// Reload the accounts whenever a refresh is published, until the bus goes
    /// away.
    pub async fn follow_refreshes(&self, mut events: broadcast::Receiver<AppEvent>) {
        loop {
            match events.recv().await {
                Ok(AppEvent::Refresh) | Err(RecvError::Lagged(_)) => {
                    if let Err(error) = self.render_accounts_list().await {
                        tracing::warn!("Could not reload accounts: {error}");
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    use crate::{
        Error,
        document::{HtmlForm, SelectOption},
        envelope::Envelope,
        events::{AppEvent, EventBus},
        form::{FormElement, SubmitEvent, SubmitOutcome},
        models::{EntityId, TransactionKind, User},
        request::RequestData,
        test_utils::{ApiCall, FakeApi},
        view::create_transaction_form_view,
    };

    use super::CreateTransactionForm;

    fn user() -> User {
        User {
            id: EntityId::from(1),
            name: "Vlad".to_owned(),
        }
    }

    fn income_form() -> HtmlForm {
        let html = create_transaction_form_view(TransactionKind::Income).into_string();
        HtmlForm::parse(&html).unwrap()
    }

    fn option(value: &str, label: &str) -> SelectOption {
        SelectOption {
            value: value.to_owned(),
            label: label.to_owned(),
        }
    }

    #[tokio::test]
    async fn missing_form_is_rejected() {
        let api = Arc::new(FakeApi::new());

        let result =
            CreateTransactionForm::<HtmlForm, _>::new(None, api.clone(), user(), EventBus::new())
                .await;

        assert_eq!(result.err(), Some(Error::InvalidElement("form element")));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn creation_fills_accounts_of_user() {
        let api = Arc::new(FakeApi::new().with_account(5, "Savings").with_account(7, "Cash"));

        let form =
            CreateTransactionForm::new(Some(income_form()), api.clone(), user(), EventBus::new())
                .await
                .unwrap();

        assert_eq!(api.calls(), vec![ApiCall::ListAccounts(EntityId::from(1))]);
        assert_eq!(
            form.element().options(),
            vec![option("5", "Savings"), option("7", "Cash")]
        );
        assert_eq!(form.element().select_value().as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn rejected_account_list_leaves_select_unchanged() {
        let api =
            Arc::new(FakeApi::new().with_account_list(Ok(Envelope::rejected("Unknown user"))));
        let element = HtmlForm::parse(
            r#"<form><select name="account_id"><option value="3">Old</option></select></form>"#,
        )
        .unwrap();

        let form = CreateTransactionForm::new(Some(element), api, user(), EventBus::new())
            .await
            .unwrap();

        assert_eq!(form.element().options(), vec![option("3", "Old")]);
        assert_eq!(
            form.render_accounts_list().await,
            Err(Error::Rejected("Unknown user".to_owned()))
        );
    }

    #[tokio::test]
    async fn failed_account_list_leaves_select_unchanged() {
        let api = Arc::new(
            FakeApi::new()
                .with_account_list(Err(Error::Transport("connection refused".to_owned()))),
        );

        let form = CreateTransactionForm::new(Some(income_form()), api, user(), EventBus::new())
            .await
            .unwrap();

        assert!(form.element().options().is_empty());
    }

    #[tokio::test]
    async fn successful_submit_closes_resets_and_refreshes() {
        let api = Arc::new(FakeApi::new().with_account(5, "Savings").with_account(7, "Cash"));
        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let form = CreateTransactionForm::new(Some(income_form()), api.clone(), user(), events)
            .await
            .unwrap();
        form.element().set_input("name", "Salary");
        form.element().set_input("sum", "1000");
        form.element().choose("7");

        let mut event = SubmitEvent::new();
        let outcome = form.handle_submit(&mut event).await;

        assert_eq!(outcome, Ok(SubmitOutcome::Completed));
        assert!(event.is_default_prevented());
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::CreateTransaction(
                RequestData::new()
                    .with("type", "income")
                    .with("name", "Salary")
                    .with("sum", "1000")
                    .with("account_id", "7")
            ))
        );
        assert!(!form.element().is_overlay_open());
        let data = form.form.collect_data();
        assert_eq!(data.get("name"), Some(""));
        assert_eq!(data.get("type"), Some("income"));
        assert_eq!(receiver.try_recv(), Ok(AppEvent::Refresh));
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn rejected_submit_keeps_form_as_is() {
        let api = Arc::new(
            FakeApi::new()
                .with_account(5, "Savings")
                .rejecting_creates("Sum must be positive"),
        );
        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let form = CreateTransactionForm::new(Some(income_form()), api, user(), events)
            .await
            .unwrap();
        form.element().set_input("name", "Salary");

        let outcome = form.handle_submit(&mut SubmitEvent::new()).await;

        assert_eq!(
            outcome,
            Ok(SubmitOutcome::Rejected("Sum must be positive".to_owned()))
        );
        assert!(form.element().is_overlay_open());
        assert_eq!(form.form.collect_data().get("name"), Some("Salary"));
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn refresh_reloads_accounts() {
        let api = Arc::new(FakeApi::new().with_account(5, "Savings"));
        let form =
            CreateTransactionForm::new(Some(income_form()), api.clone(), user(), EventBus::new())
                .await
                .unwrap();
        api.set_account_list(Ok(Envelope::success(json!([{"id": 7, "name": "Cash"}]))));
        let refreshes = EventBus::new();
        let receiver = refreshes.subscribe();

        refreshes.publish(AppEvent::Refresh);
        drop(refreshes);
        form.follow_refreshes(receiver).await;

        assert_eq!(form.element().options(), vec![option("7", "Cash")]);
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::ListAccounts(EntityId::from(1)),
                ApiCall::ListAccounts(EntityId::from(1)),
            ]
        );
    }
}
