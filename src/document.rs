//! In-memory stand-ins for the page's DOM elements.
//!
//! [HtmlForm] and [HtmlPage] keep just enough element state for the
//! controllers to work outside a browser: the terminal front end renders
//! through them and the tests inspect them with `scraper`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use maud::Markup;
use scraper::{ElementRef, Html, Selector};

use crate::{
    Error,
    form::FormElement,
    page::PageView,
    view::{ACCOUNT_TITLE_PLACEHOLDER, page_view},
};

fn selector(selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.to_owned()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct InputState {
    name: String,
    value: String,
    default_value: String,
}

/// An option of a select control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// The submitted value.
    pub value: String,
    /// The visible label.
    pub label: String,
}

#[derive(Debug, Clone, Default)]
struct SelectState {
    options: Vec<SelectOption>,
    selected: Option<usize>,
    default_selected: Option<usize>,
}

impl SelectState {
    /// Read the options of a parsed `<select>` or of a fragment of `<option>`s.
    fn from_options<'a>(options: impl Iterator<Item = ElementRef<'a>>) -> Self {
        let mut state = SelectState::default();

        for (index, option) in options.enumerate() {
            let label: String = option.text().collect::<String>().trim().to_owned();
            let value = option
                .value()
                .attr("value")
                .map_or_else(|| label.clone(), str::to_owned);

            if option.value().attr("selected").is_some() {
                state.default_selected = Some(index);
            }
            state.options.push(SelectOption { value, label });
        }

        if state.default_selected.is_none() && !state.options.is_empty() {
            state.default_selected = Some(0);
        }
        state.selected = state.default_selected;
        state
    }
}

#[derive(Debug, Default)]
struct FormState {
    inputs: Vec<InputState>,
    select: Option<SelectState>,
    overlay_open: bool,
}

/// A `<form>` parsed from HTML whose fields can be edited and read back.
#[derive(Debug)]
pub struct HtmlForm {
    state: Mutex<FormState>,
}

impl HtmlForm {
    /// Parse the first `<form>` in `html`.
    ///
    /// Input defaults come from their `value` attribute, the select default
    /// is the option marked `selected` or else the first option.
    ///
    /// # Errors
    /// Returns [Error::InvalidElement] if `html` contains no form.
    pub fn parse(html: &str) -> Result<Self, Error> {
        let document = Html::parse_fragment(html);
        let form = document
            .select(&selector("form")?)
            .next()
            .ok_or(Error::InvalidElement("form element"))?;

        let inputs = form
            .select(&selector("input")?)
            .map(|input| {
                let name = input.value().attr("name").unwrap_or_default().to_owned();
                let value = input.value().attr("value").unwrap_or_default().to_owned();
                InputState {
                    name,
                    default_value: value.clone(),
                    value,
                }
            })
            .collect();

        let option_selector = selector("option")?;
        let select = form
            .select(&selector("select")?)
            .next()
            .map(|select| SelectState::from_options(select.select(&option_selector)));

        Ok(Self {
            state: Mutex::new(FormState {
                inputs,
                select,
                overlay_open: true,
            }),
        })
    }

    /// Type `value` into the input `name`, returning false if there is none.
    pub fn set_input(&self, name: &str, value: &str) -> bool {
        let mut state = lock(&self.state);

        match state.inputs.iter_mut().find(|input| input.name == name) {
            Some(input) => {
                input.value = value.to_owned();
                true
            }
            None => false,
        }
    }

    /// Pick the option with `value`, returning false if there is none.
    pub fn choose(&self, value: &str) -> bool {
        let mut state = lock(&self.state);
        let Some(select) = state.select.as_mut() else {
            return false;
        };

        match select.options.iter().position(|option| option.value == value) {
            Some(index) => {
                select.selected = Some(index);
                true
            }
            None => false,
        }
    }

    /// The options of the select, empty if there is no select.
    pub fn options(&self) -> Vec<SelectOption> {
        lock(&self.state)
            .select
            .as_ref()
            .map(|select| select.options.clone())
            .unwrap_or_default()
    }

    /// Whether the modal around the form is still open.
    pub fn is_overlay_open(&self) -> bool {
        lock(&self.state).overlay_open
    }
}

impl FormElement for HtmlForm {
    fn inputs(&self) -> Vec<(String, String)> {
        lock(&self.state)
            .inputs
            .iter()
            .map(|input| (input.name.clone(), input.value.clone()))
            .collect()
    }

    fn select_value(&self) -> Option<String> {
        let state = lock(&self.state);
        let select = state.select.as_ref()?;

        // A select without options has an empty value, like in a browser.
        Some(
            select
                .selected
                .and_then(|index| select.options.get(index))
                .map(|option| option.value.clone())
                .unwrap_or_default(),
        )
    }

    fn replace_select_options(&self, options: Markup) {
        let fragment = Html::parse_fragment(&options.into_string());
        let Ok(option_selector) = selector("option") else {
            return;
        };
        let replacement = SelectState::from_options(fragment.select(&option_selector));

        let mut state = lock(&self.state);
        match state.select.as_mut() {
            Some(select) => *select = replacement,
            None => tracing::warn!("Form has no select to put account options in"),
        }
    }

    fn reset(&self) {
        let mut state = lock(&self.state);

        for input in &mut state.inputs {
            input.value = input.default_value.clone();
        }
        if let Some(select) = state.select.as_mut() {
            select.selected = select.default_selected;
        }
    }

    fn close_overlay(&self) {
        lock(&self.state).overlay_open = false;
    }
}

/// The clicked button, as seen by the page's click delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTarget {
    classes: Vec<String>,
    data_id: Option<String>,
}

impl ButtonTarget {
    /// A button with the given classes and `data-id`.
    pub fn new<I, S>(classes: I, data_id: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            data_id: data_id.map(str::to_owned),
        }
    }

    fn from_element(button: ElementRef<'_>) -> Self {
        Self {
            classes: button.value().classes().map(str::to_owned).collect(),
            data_id: button.value().attr("data-id").map(str::to_owned),
        }
    }

    /// Whether the button has the class `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    /// The button's `data-id` attribute.
    pub fn data_id(&self) -> Option<&str> {
        self.data_id.as_deref()
    }
}

#[derive(Debug)]
struct PageState {
    title: String,
    content: String,
}

/// The transactions page container with its title and list regions.
#[derive(Debug)]
pub struct HtmlPage {
    state: Mutex<PageState>,
}

impl HtmlPage {
    /// An empty page showing the placeholder title.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PageState {
                title: ACCOUNT_TITLE_PLACEHOLDER.to_owned(),
                content: String::new(),
            }),
        }
    }

    /// The text of `.content-title`.
    pub fn title(&self) -> String {
        lock(&self.state).title.clone()
    }

    /// The inner HTML of `.content`.
    pub fn content(&self) -> String {
        lock(&self.state).content.clone()
    }

    /// The whole container as HTML.
    pub fn to_html(&self) -> String {
        let state = lock(&self.state);

        page_view(&state.title, &maud::PreEscaped(state.content.clone())).into_string()
    }

    /// Simulate a click on the first element matching `selector`.
    ///
    /// Returns the closest button around the clicked element, like the
    /// page's delegated click listener sees it, or `None` if nothing matches
    /// or the element is not inside a button.
    ///
    /// # Errors
    /// Returns [Error::InvalidSelector] if `selector` cannot be parsed.
    pub fn click(&self, selector_text: &str) -> Result<Option<ButtonTarget>, Error> {
        let selector = selector(selector_text)?;
        let document = Html::parse_fragment(&self.to_html());

        let Some(clicked) = document.select(&selector).next() else {
            return Ok(None);
        };

        let button = std::iter::once(clicked)
            .chain(clicked.ancestors().filter_map(ElementRef::wrap))
            .find(|element| element.value().name() == "button");

        Ok(button.map(ButtonTarget::from_element))
    }
}

impl Default for HtmlPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageView for HtmlPage {
    fn set_title(&self, title: &str) {
        lock(&self.state).title = title.to_owned();
    }

    fn set_content(&self, content: Markup) {
        lock(&self.state).content = content.into_string();
    }
}
