//! HTML fragments for the transactions page and the transaction form.
//!
//! The class names used here are the contract with the page's controllers
//! and stylesheets: `.content-title`, `.content`, `.remove-account` and
//! `.transaction__remove[data-id]`.

use maud::{Markup, html};

use crate::{
    Error,
    models::{Account, TransactionItem, TransactionKind},
};

/// The title shown while no account is selected.
pub const ACCOUNT_TITLE_PLACEHOLDER: &str = "Название счёта";

/// The class of the button that removes the selected account.
pub const REMOVE_ACCOUNT_CLASS: &str = "remove-account";

/// The class of the button that removes a single transaction.
pub const REMOVE_TRANSACTION_CLASS: &str = "transaction__remove";

const CURRENCY_SYMBOL: &str = "₽";

/// Month names in the genitive case, as used after a day number.
fn month_name(month: &str) -> Option<&'static str> {
    let name = match month {
        "01" => "января",
        "02" => "февраля",
        "03" => "марта",
        "04" => "апреля",
        "05" => "мая",
        "06" => "июня",
        "07" => "июля",
        "08" => "августа",
        "09" => "сентября",
        "10" => "октября",
        "11" => "ноября",
        "12" => "декабря",
        _ => return None,
    };

    Some(name)
}

/// Format a `YYYY-MM-DD HH:MM:SS` timestamp as `D <month> YYYY г. в HH:MM`.
///
/// Day and year are copied verbatim, seconds are dropped.
///
/// # Errors
/// Returns [Error::InvalidDate] if the date part is not three `-` separated
/// fields, the month is not `01`..`12`, or there is no time part.
pub fn format_date(date_time: &str) -> Result<String, Error> {
    let invalid = || Error::InvalidDate(date_time.to_owned());

    let (date, time) = date_time.split_once(' ').ok_or_else(invalid)?;
    let mut fields = date.split('-');
    let (Some(year), Some(month), Some(day), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };
    let month = month_name(month).ok_or_else(invalid)?;
    let hours_and_minutes = time.get(..5).unwrap_or(time);

    Ok(format!("{day} {month} {year} г. в {hours_and_minutes}"))
}

/// The amount with the sign implied by the transaction kind.
pub fn format_amount(kind: TransactionKind, sum: f64) -> String {
    let sign = match kind {
        TransactionKind::Income => '+',
        TransactionKind::Expense => '-',
    };

    format!("{sign}{}", sum.abs())
}

/// A single transaction row with its delete trigger.
pub fn transaction_view(item: &TransactionItem) -> Markup {
    let date = format_date(&item.created_at).unwrap_or_else(|error| {
        tracing::warn!("Showing raw timestamp for transaction {}: {error}", item.id);
        item.created_at.clone()
    });

    html! {
        div class=(format!("transaction transaction_{} row", item.kind.as_str()))
        {
            div class="col-md-7 transaction__details"
            {
                div class="transaction__icon"
                {
                    span class="fa fa-money fa-2x" {}
                }
                div class="transaction__info"
                {
                    h4 class="transaction__title" { (item.name) }
                    div class="transaction__date" { (date) }
                }
            }
            div class="col-md-3"
            {
                div class="transaction__summ"
                {
                    (format_amount(item.kind, item.sum))
                    " "
                    span class="currency" { (CURRENCY_SYMBOL) }
                }
            }
            div class="col-md-2 transaction__controls"
            {
                button
                    class=(format!("btn btn-danger {REMOVE_TRANSACTION_CLASS}"))
                    data-id=(item.id.as_str())
                {
                    i class="fa fa-trash" {}
                }
            }
        }
    }
}

/// Every transaction in order, replacing whatever the list showed before.
pub fn transactions_view(items: &[TransactionItem]) -> Markup {
    html! {
        @for item in items {
            (transaction_view(item))
        }
    }
}

/// One `<option>` per account for the account select.
pub fn account_options_view(accounts: &[Account]) -> Markup {
    html! {
        @for account in accounts {
            option value=(account.id.as_str()) { (account.name) }
        }
    }
}

/// The transactions page container: title, account removal and the list.
pub fn page_view(title: &str, content: &Markup) -> Markup {
    html! {
        section class="content-header"
        {
            h1
            {
                span class="content-title" { (title) }
                button class=(format!("btn btn-danger {REMOVE_ACCOUNT_CLASS}"))
                {
                    i class="fa fa-trash" {}
                    " Удалить счёт"
                }
            }
        }
        section class="content" { (content) }
    }
}

/// The form for creating an income or expense, inside its modal.
pub fn create_transaction_form_view(kind: TransactionKind) -> Markup {
    let (form_id, heading) = match kind {
        TransactionKind::Income => ("new-income-form", "Новый доход"),
        TransactionKind::Expense => ("new-expense-form", "Новый расход"),
    };

    html! {
        div class="modal"
        {
            form id=(form_id) class="form"
            {
                h4 { (heading) }
                input type="hidden" name="type" value=(kind.as_str());
                div class="form-group"
                {
                    label { "Название" }
                    input type="text" name="name" class="form-control" required;
                }
                div class="form-group"
                {
                    label { "Сумма" }
                    input type="number" name="sum" class="form-control" required;
                }
                div class="form-group"
                {
                    label { "Счёт" }
                    select name="account_id" class="form-control accounts-select" {}
                }
                button type="submit" class="btn btn-primary" { "Создать" }
            }
        }
    }
}
