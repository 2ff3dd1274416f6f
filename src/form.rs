//! Forms that submit through the API instead of navigating.
//!
//! [AsyncForm] takes over a form's submit event, collects the field values
//! and hands them to a [SubmitHandler]. Each kind of form gets its own
//! handler, see [crate::CreateTransaction].

use async_trait::async_trait;
use maud::Markup;

use crate::{Error, request::RequestData};

/// The parts of a `<form>` element the controllers read and write.
///
/// Methods take `&self` like DOM handles do, implementations use interior
/// mutability.
pub trait FormElement: Send + Sync {
    /// `(name, value)` of every `input` descendant, in document order.
    fn inputs(&self) -> Vec<(String, String)>;

    /// The value of the first `select` descendant, `None` if there is none.
    fn select_value(&self) -> Option<String>;

    /// Replace the options of the first `select` with `options`.
    fn replace_select_options(&self, options: Markup);

    /// Restore every field to its default value.
    fn reset(&self);

    /// Close the modal the form is shown in.
    fn close_overlay(&self);
}

/// The values of a form at the moment it was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    /// Input values keyed by input name, in document order.
    pub fields: RequestData,
    /// The selected account, `None` when the form has no select.
    pub account_id: Option<String>,
}

impl FormData {
    /// The value of the field `name`, `account_id` included.
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == "account_id" && self.account_id.is_some() {
            return self.account_id.as_deref();
        }

        self.fields.get(name)
    }

    /// The data to send to the server.
    ///
    /// A selected account overrides an input named `account_id`. Without a
    /// select the `account_id` is left out rather than sent empty.
    pub fn into_request_data(self) -> RequestData {
        let mut data = self.fields;
        if let Some(account_id) = self.account_id {
            data.insert("account_id", account_id);
        }
        data
    }
}

/// Read the current values of `form`.
pub fn collect_data<F: FormElement + ?Sized>(form: &F) -> FormData {
    FormData {
        fields: form.inputs().into_iter().collect(),
        account_id: form.select_value(),
    }
}

/// A native submit event.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    /// A fresh event that would navigate if nobody intervened.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the browser from sending the form itself.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether [SubmitEvent::prevent_default] was called.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// What a submit handler did with the form data.
#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The handler does not act on submissions.
    Ignored,
    /// The server accepted the data.
    Completed,
    /// The server answered with `success: false` and this message.
    Rejected(String),
}

/// The behaviour behind a form.
#[async_trait]
pub trait SubmitHandler<F: FormElement>: Send + Sync {
    /// Act on the collected `data` of `form`.
    async fn on_submit(&self, form: &F, data: FormData) -> Result<SubmitOutcome, Error>;
}

/// The handler of a form nobody has given behaviour to yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSubmit;

#[async_trait]
impl<F: FormElement> SubmitHandler<F> for NoopSubmit {
    async fn on_submit(&self, _form: &F, _data: FormData) -> Result<SubmitOutcome, Error> {
        Ok(SubmitOutcome::Ignored)
    }
}

/// A form bound to a submit handler.
#[derive(Debug)]
pub struct AsyncForm<F, H = NoopSubmit> {
    element: F,
    handler: H,
}

impl<F, H> AsyncForm<F, H>
where
    F: FormElement,
    H: SubmitHandler<F>,
{
    /// Take over the submission of `element`.
    ///
    /// # Errors
    /// Returns [Error::InvalidElement] if `element` is `None`.
    pub fn bind(element: Option<F>, handler: H) -> Result<Self, Error> {
        let element = element.ok_or(Error::InvalidElement("form element"))?;

        Ok(Self { element, handler })
    }

    /// The bound form.
    pub fn element(&self) -> &F {
        &self.element
    }

    /// The handler submissions go to.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The current values of the form.
    pub fn collect_data(&self) -> FormData {
        collect_data(&self.element)
    }

    /// Handle the form's submit event.
    ///
    /// The default navigation is always cancelled, then the collected data is
    /// passed to the handler.
    ///
    /// # Errors
    /// Returns whatever error the handler returns.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> Result<SubmitOutcome, Error> {
        event.prevent_default();
        let data = self.collect_data();
        tracing::debug!("Submitting form data {data:?}");

        self.handler.on_submit(&self.element, data).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::{Error, document::HtmlForm, request::RequestData};

    use super::{
        AsyncForm, FormData, FormElement, NoopSubmit, SubmitEvent, SubmitHandler, SubmitOutcome,
        collect_data,
    };

    #[derive(Default)]
    struct RecordingHandler {
        received: Mutex<Vec<FormData>>,
    }

    #[async_trait]
    impl<F: FormElement> SubmitHandler<F> for RecordingHandler {
        async fn on_submit(&self, _form: &F, data: FormData) -> Result<SubmitOutcome, Error> {
            self.received.lock().unwrap().push(data);
            Ok(SubmitOutcome::Completed)
        }
    }

    #[test]
    fn binding_without_element_fails() {
        let result = AsyncForm::<HtmlForm, NoopSubmit>::bind(None, NoopSubmit);

        assert_eq!(
            result.err(),
            Some(Error::InvalidElement("form element"))
        );
    }

    #[test]
    fn collects_inputs_without_select() {
        let form = HtmlForm::parse(r#"<form><input name="foo" value="bar"></form>"#).unwrap();

        let data = collect_data(&form);

        assert_eq!(
            data,
            FormData {
                fields: RequestData::new().with("foo", "bar"),
                account_id: None,
            }
        );
    }

    #[test]
    fn collects_selected_account() {
        let form = HtmlForm::parse(
            r#"<form>
                <input name="name" value="Salary">
                <input name="sum" value="100">
                <select name="account_id">
                    <option value="5">Savings</option>
                    <option value="7" selected>Cash</option>
                </select>
            </form>"#,
        )
        .unwrap();

        let data = collect_data(&form);

        assert_eq!(data.get("name"), Some("Salary"));
        assert_eq!(data.get("sum"), Some("100"));
        assert_eq!(data.account_id.as_deref(), Some("7"));
    }

    #[test]
    fn selected_account_overrides_input_of_same_name() {
        let data = FormData {
            fields: RequestData::new().with("account_id", "1").with("name", "x"),
            account_id: Some("2".to_owned()),
        };

        let request_data = data.into_request_data();

        assert_eq!(
            request_data.iter().collect::<Vec<_>>(),
            vec![("account_id", "2"), ("name", "x")]
        );
    }

    #[test]
    fn missing_account_is_not_sent() {
        let data = FormData {
            fields: RequestData::new().with("name", "x"),
            account_id: None,
        };

        assert_eq!(data.into_request_data().get("account_id"), None);
    }

    #[tokio::test]
    async fn submit_prevents_navigation_and_forwards_fresh_data() {
        let form = HtmlForm::parse(r#"<form><input name="name" value="first"></form>"#).unwrap();
        let form = AsyncForm::bind(Some(form), RecordingHandler::default()).unwrap();

        let mut event = SubmitEvent::new();
        let outcome = form.handle_submit(&mut event).await;
        form.element().set_input("name", "second");
        form.handle_submit(&mut SubmitEvent::new()).await.unwrap();

        assert_eq!(outcome, Ok(SubmitOutcome::Completed));
        assert!(event.is_default_prevented());
        let received = form.handler().received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].get("name"), Some("first"));
        assert_eq!(received[1].get("name"), Some("second"));
    }

    #[tokio::test]
    async fn base_handler_ignores_submissions() {
        let form = HtmlForm::parse(r#"<form><input name="name" value="x"></form>"#).unwrap();
        let form = AsyncForm::bind(Some(form), NoopSubmit).unwrap();
        let mut event = SubmitEvent::new();

        let outcome = form.handle_submit(&mut event).await;

        assert_eq!(outcome, Ok(SubmitOutcome::Ignored));
        assert!(event.is_default_prevented());
    }
}
