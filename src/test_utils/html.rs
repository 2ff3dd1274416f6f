use scraper::{Html, Selector};

pub(crate) fn parse_html_fragment(text: &str) -> Html {
    Html::parse_fragment(text)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The text content of every element matching `selector`.
#[track_caller]
pub(crate) fn texts(html: &Html, selector: &str) -> Vec<String> {
    let selector = Selector::parse(selector).unwrap();

    html.select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_owned())
        .collect()
}

/// The value of `attribute` on every element matching `selector`.
#[track_caller]
pub(crate) fn attribute_values(html: &Html, selector: &str, attribute: &str) -> Vec<String> {
    let selector = Selector::parse(selector).unwrap();

    html.select(&selector)
        .map(|element| {
            element
                .value()
                .attr(attribute)
                .unwrap_or_else(|| panic!("element is missing the {attribute} attribute"))
                .to_owned()
        })
        .collect()
}
