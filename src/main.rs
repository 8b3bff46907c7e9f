use std::process;
use std::sync::Arc;

use clap::Parser;
use saldo::application::error::LedgerError;
use saldo::application::ledger::{LedgerOptions, LedgerService};
use saldo::application::pagination::{PageInfo, PageQuery, QueryPage};
use saldo::config::{self, AddArgs, CliArgs, Command, ListArgs, UpdateArgs};
use saldo::domain::customers::{
    CustomerDraft, CustomerPatch, CustomerRecord, CustomerStatus, format_amount,
};
use saldo::infra::blob::JsonBlobStore;
use saldo::infra::error::InfraError;
use saldo::infra::telemetry;
use thiserror::Error;
use tracing::{dispatcher, error};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("invalid status `{0}`; expected Open, Paid, Due or Inactive")]
    Status(String),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        report_application_error(&err);
        process::exit(1);
    }
}

fn report_application_error(err: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %err, "application error");
    } else {
        eprintln!("saldo: {err}");
    }
}

async fn run() -> Result<(), AppError> {
    let cli = CliArgs::parse();
    let settings = config::load(&cli)?;
    telemetry::init(&settings.logging)?;

    let store = Arc::new(match settings.storage.simulated_latency {
        Some(latency) => JsonBlobStore::with_latency(&settings.storage.path, latency),
        None => JsonBlobStore::new(&settings.storage.path),
    });
    let service = LedgerService::new(
        store.clone(),
        LedgerOptions {
            debounce: settings.search.debounce,
            default_page_size: settings.query.default_page_size,
            page_size_options: settings.query.page_size_options.clone(),
        },
    );

    match cli.command {
        Command::List(args) => {
            list(&service, args, settings.query.default_page_size).await?;
        }
        Command::Add(args) => {
            let record = service.create_customer(draft_from(args)?).await?;
            println!("created {}", record.id);
            print_record(&record);
        }
        Command::Update(args) => {
            let record = service
                .update_customer(args.id, patch_from(&args)?)
                .await?;
            println!("updated {}", record.id);
            print_record(&record);
        }
        Command::Remove(args) => {
            let removed = service.delete_customers(&args.ids).await?;
            println!("removed {removed} of {} requested", args.ids.len());
        }
        Command::Seed => {
            let seeded = store.reset_to_seed().await.map_err(LedgerError::from)?;
            println!("seeded {} customers", seeded.len());
        }
    }

    Ok(())
}

async fn list(
    service: &LedgerService,
    args: ListArgs,
    default_page_size: usize,
) -> Result<(), AppError> {
    let page_size = args.page_size.unwrap_or(default_page_size);
    let query = PageQuery::new(args.search, args.page, page_size);
    let page = service.list_customers(&query).await?;
    print_page(&query, &page);
    Ok(())
}

fn draft_from(args: AddArgs) -> Result<CustomerDraft, AppError> {
    Ok(CustomerDraft {
        name: args.name,
        description: args.description,
        status: args.status.as_deref().map(parse_status).transpose()?,
        rate: args.rate,
        balance: args.balance,
        deposit: args.deposit,
    })
}

fn patch_from(args: &UpdateArgs) -> Result<CustomerPatch, AppError> {
    Ok(CustomerPatch {
        name: args.name.clone(),
        description: args.description.clone(),
        status: args.status.as_deref().map(parse_status).transpose()?,
        rate: args.rate,
        balance: args.balance,
        deposit: args.deposit,
    })
}

fn parse_status(value: &str) -> Result<CustomerStatus, AppError> {
    CustomerStatus::try_from(value).map_err(|()| AppError::Status(value.to_string()))
}

fn print_page(query: &PageQuery, page: &QueryPage<CustomerRecord>) {
    if page.data.is_empty() {
        println!("no data to display");
    }
    for record in &page.data {
        print_record(record);
    }
    let info = PageInfo::compute(query, page.total);
    println!(
        "{}-{} of {} (page {} of {})",
        info.start,
        info.end,
        info.total,
        query.page_index + 1,
        info.total_pages
    );
}

fn print_record(record: &CustomerRecord) {
    println!(
        "{}  {:<24} {:<8} rate {:>8}  balance {:>10}  deposit {:>10}  {}",
        record.id,
        record.name,
        record.status.as_str(),
        format_amount(record.rate),
        format_amount(record.balance),
        format_amount(record.deposit),
        record.description
    );
}
