use std::{process::ExitCode, sync::Arc};

use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use scraper::{Html, Selector};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::broadcast::Receiver,
};

use ledgerline::{
    ActionOutcome, AppEvent, Config, Confirm, CreateTransactionForm, Error, EventBus, HtmlForm,
    HtmlPage, HttpApi, PageQuery, RegionOutcome, RenderOutcome, RequestClient, SubmitEvent,
    SubmitOutcome, TransactionKind, TransactionsPage, create_transaction_form_view, setup_logging,
};

/// Manage the transactions of an account on a finance server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    config: Config,

    /// Answer yes to every confirmation instead of asking.
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show an account and its transactions.
    Show {
        /// The account ID.
        account: String,
    },
    /// Remove an account with all of its transactions.
    RemoveAccount {
        /// The account ID.
        account: String,
    },
    /// Remove a transaction shown on an account's page.
    RemoveTransaction {
        /// The account ID.
        account: String,
        /// The transaction ID.
        id: String,
    },
    /// Add an income or expense to an account.
    CreateTransaction {
        /// The account ID.
        account: String,
        /// Whether money comes in or goes out.
        #[arg(long = "type", value_enum)]
        kind: KindArg,
        /// What the transaction is for.
        #[arg(long)]
        name: String,
        /// The amount, without a sign.
        #[arg(long)]
        sum: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for TransactionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Income => TransactionKind::Income,
            KindArg::Expense => TransactionKind::Expense,
        }
    }
}

/// Asks on the terminal, or says yes to everything with `--yes`.
struct TerminalConfirm {
    assume_yes: bool,
}

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        let mut stderr = tokio::io::stderr();
        let prompt = format!("{message} [y/N] ");
        if let Err(error) = stderr.write_all(prompt.as_bytes()).await {
            tracing::warn!("Could not show the prompt: {error}");
            return false;
        }
        if let Err(error) = stderr.flush().await {
            tracing::warn!("Could not show the prompt: {error}");
            return false;
        }

        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await
        {
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes" | "да"),
            Err(error) => {
                tracing::warn!("Could not read the answer: {error}");
                false
            }
        }
    }
}

type Page = TransactionsPage<HttpApi, HtmlPage, TerminalConfirm>;

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let config = args.config.to_client_config()?;
    let api = Arc::new(HttpApi::new(RequestClient::new(), config.base_url()));
    let events = EventBus::new();
    let mut refreshes = events.subscribe();

    let page = TransactionsPage::new(
        Some(HtmlPage::new()),
        api.clone(),
        TerminalConfirm {
            assume_yes: args.yes,
        },
        events.clone(),
    )?;

    match args.command {
        Command::Show { account } => {
            report_render(page.render(Some(PageQuery::new(account))).await)?;
        }
        Command::RemoveAccount { account } => {
            report_render(page.render(Some(PageQuery::new(account))).await)?;
            let button = page.element().click(".remove-account")?;
            report_action(page.handle_click(button).await)?;
        }
        Command::RemoveTransaction { account, id } => {
            report_render(page.render(Some(PageQuery::new(account))).await)?;
            let button = page
                .element()
                .click(&format!(".transaction__remove[data-id=\"{id}\"]"))?;
            if button.is_none() {
                return Err(Error::Rejected(format!(
                    "transaction {id} is not on this page"
                )));
            }
            report_action(page.handle_click(button).await)?;
        }
        Command::CreateTransaction {
            account,
            kind,
            name,
            sum,
        } => {
            report_render(page.render(Some(PageQuery::new(account.as_str()))).await)?;
            let element =
                HtmlForm::parse(&create_transaction_form_view(kind.into()).into_string())?;
            let form =
                CreateTransactionForm::new(Some(element), api, config.user().clone(), events)
                    .await?;

            form.element().set_input("name", &name);
            form.element().set_input("sum", &sum);
            if !form.element().choose(&account) {
                return Err(Error::Rejected(format!(
                    "account {account} does not belong to {}",
                    config.user().name
                )));
            }

            match form.handle_submit(&mut SubmitEvent::new()).await? {
                SubmitOutcome::Completed => tracing::info!("Created \"{name}\""),
                SubmitOutcome::Rejected(message) => return Err(Error::Rejected(message)),
                SubmitOutcome::Ignored => {}
            }
        }
    }

    apply_refreshes(&page, &mut refreshes).await;
    print_page(page.element())
}

fn report_render(outcome: RenderOutcome) -> Result<(), Error> {
    let RenderOutcome::Rendered {
        title,
        transactions,
    } = outcome
    else {
        return Ok(());
    };

    if let RegionOutcome::Failed(error) = title {
        return Err(error);
    }
    if let RegionOutcome::Failed(error) = transactions {
        return Err(error);
    }

    Ok(())
}

fn report_action(outcome: Option<ActionOutcome>) -> Result<(), Error> {
    match outcome {
        Some(ActionOutcome::Completed) => Ok(()),
        Some(ActionOutcome::Declined) => {
            tracing::info!("Cancelled");
            Ok(())
        }
        Some(ActionOutcome::NothingSelected) | None => {
            tracing::info!("Nothing to remove");
            Ok(())
        }
        Some(ActionOutcome::Failed(error)) => Err(error),
    }
}

/// Re-render once for all refreshes published so far.
async fn apply_refreshes(page: &Page, refreshes: &mut Receiver<AppEvent>) {
    let mut pending = false;
    while let Ok(AppEvent::Refresh) = refreshes.try_recv() {
        pending = true;
    }

    if pending {
        page.update().await;
    }
}

fn print_page(page: &HtmlPage) -> Result<(), Error> {
    let document = Html::parse_fragment(&page.to_html());
    let row = parse_selector(".transaction")?;
    let cells = [
        parse_selector(".transaction__title")?,
        parse_selector(".transaction__date")?,
        parse_selector(".transaction__summ")?,
    ];
    let remove = parse_selector(".transaction__remove")?;

    println!("{}", page.title());
    for transaction in document.select(&row) {
        let id = transaction
            .select(&remove)
            .next()
            .and_then(|button| button.value().attr("data-id"))
            .unwrap_or_default();
        let columns: Vec<String> = cells
            .iter()
            .map(|cell| {
                transaction
                    .select(cell)
                    .next()
                    .map(|element| element.text().collect::<String>().trim().to_owned())
                    .unwrap_or_default()
            })
            .collect();

        println!("{id:>6}  {}", columns.join("  "));
    }

    Ok(())
}

fn parse_selector(selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.to_owned()))
}
