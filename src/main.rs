use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;

use h2notifier::AppContext;
use h2notifier::common::format::{format_currency, format_date};
use h2notifier::common::{
    Channel, Installment, InstallmentInput, Message, MessageInput, NotificationRequest, PageRequest,
    Person, PersonInput, PersonPatch, PersonRole,
};
use h2notifier::config;
use h2notifier::ui::{InstallmentFilter, Pager};

#[derive(Parser)]
#[command(
    name = "h2notifier",
    version,
    about = "Command-line client for the H2Notifier backend"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the effective configuration to the config file
    InitConfig,
    #[command(subcommand)]
    People(PeopleCommand),
    #[command(subcommand)]
    Installments(InstallmentCommand),
    #[command(subcommand)]
    Messages(MessageCommand),
    #[command(subcommand)]
    Notify(NotifyCommand),
}

#[derive(Subcommand)]
enum PeopleCommand {
    List,
    Get { id: i64 },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// DEVEDOR or COBRADOR
        #[arg(long)]
        role: PersonRole,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Args)]
struct InstallmentFields {
    #[arg(long)]
    collector: i64,
    #[arg(long = "debtor", required = true)]
    debtors: Vec<i64>,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    description: String,
    /// YYYY-MM-DD
    #[arg(long)]
    due: NaiveDate,
    #[arg(long)]
    settled: bool,
    #[arg(long)]
    pix_key: Option<String>,
}

impl From<InstallmentFields> for InstallmentInput {
    fn from(fields: InstallmentFields) -> Self {
        InstallmentInput {
            collector_id: fields.collector,
            total_amount: fields.amount,
            description: fields.description,
            due_date: fields.due,
            settled: fields.settled,
            pix_key: fields.pix_key,
            debtor_ids: fields.debtors,
        }
    }
}

#[derive(Subcommand)]
enum InstallmentCommand {
    /// List installments; the first filter given wins
    List {
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        collector: Option<i64>,
        #[arg(long)]
        debtor: Option<i64>,
        #[arg(long)]
        overdue: bool,
    },
    Get { id: i64 },
    /// Total still receivable by a collector
    Total { collector: i64 },
    Create(InstallmentFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: InstallmentFields,
    },
    Settle { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum MessageCommand {
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = PageRequest::DEFAULT_SIZE)]
        size: u32,
    },
    Get { id: i64 },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        channel: Channel,
    },
    Update {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        channel: Channel,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum NotifyCommand {
    /// Send reminders for an installment over the given channels
    Send {
        installment: i64,
        #[arg(long = "channel")]
        channels: Vec<Channel>,
    },
    /// Render the message a single channel would receive
    Preview {
        installment: i64,
        #[arg(long = "channel")]
        channels: Vec<Channel>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config).with_env_overrides();

    if let Command::InitConfig = cli.command {
        config::save_config(&cli.config, &app_config)?;
        log::info!("Wrote config to {}", cli.config);
        return Ok(());
    }

    let app = AppContext::from_config(&app_config)?;
    if let Err(err) = run(&app, cli.command).await {
        log::error!("Command failed: {err}");
        return Err(err);
    }
    Ok(())
}

async fn run(app: &AppContext, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::InitConfig => Ok(()),
        Command::People(command) => run_people(app, command).await,
        Command::Installments(command) => run_installments(app, command).await,
        Command::Messages(command) => run_messages(app, command).await,
        Command::Notify(command) => run_notify(app, command).await,
    }
}

async fn run_people(app: &AppContext, command: PeopleCommand) -> Result<(), Box<dyn Error>> {
    match command {
        PeopleCommand::List => {
            let people = app.people.all().fetch().await.into_result()?;
            people.iter().for_each(print_person);
        }
        PeopleCommand::Get { id } => {
            let person = app.people.by_id(id).fetch().await.into_result()?;
            print_person(&person);
        }
        PeopleCommand::Create {
            name,
            email,
            phone,
            role,
        } => {
            let input = PersonInput {
                name,
                email,
                phone,
                role,
            };
            let person = app.people.create().mutate(input).await?;
            print_person(&person);
        }
        PeopleCommand::Update {
            id,
            name,
            email,
            phone,
        } => {
            let patch = PersonPatch { name, email, phone };
            let person = app.people.update().mutate((id, patch)).await?;
            print_person(&person);
        }
        PeopleCommand::Delete { id } => {
            app.people.delete().mutate(id).await?;
            println!("Deleted person #{id}");
        }
    }
    Ok(())
}

async fn run_installments(
    app: &AppContext,
    command: InstallmentCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        InstallmentCommand::List {
            due,
            collector,
            debtor,
            overdue,
        } => {
            let filter = InstallmentFilter::resolve(due, collector, debtor, overdue);
            let installments = app.installments.filtered(filter).fetch().await.into_result()?;
            println!("{} ({})", filter.label(), installments.len());
            installments.iter().for_each(print_installment);
        }
        InstallmentCommand::Get { id } => {
            let installment = app.installments.by_id(id).fetch().await.into_result()?;
            print_installment(&installment);
        }
        InstallmentCommand::Total { collector } => {
            let total = app
                .installments
                .total_receivable(collector)
                .fetch()
                .await
                .into_result()?;
            println!("Collector #{collector}: {}", format_currency(*total));
        }
        InstallmentCommand::Create(fields) => {
            let installment = app.installments.create().mutate(fields.into()).await?;
            print_installment(&installment);
        }
        InstallmentCommand::Update { id, fields } => {
            let installment = app
                .installments
                .update()
                .mutate((id, fields.into()))
                .await?;
            print_installment(&installment);
        }
        InstallmentCommand::Settle { id } => {
            let installment = app.installments.settle().mutate(id).await?;
            print_installment(&installment);
        }
        InstallmentCommand::Delete { id } => {
            app.installments.delete().mutate(id).await?;
            println!("Deleted installment #{id}");
        }
    }
    Ok(())
}

async fn run_messages(app: &AppContext, command: MessageCommand) -> Result<(), Box<dyn Error>> {
    match command {
        MessageCommand::List { page, size } => {
            let query = app.messages.page(PageRequest::new(page, size));
            let mut result = query.fetch().await.into_result()?;

            // Past the end: fall back to the last page the backend reported.
            let mut pager = Pager::new(size);
            pager.sync(&result);
            if result.content.is_empty() && page > 0 {
                pager.goto(page);
                result = query.rebind(pager.request()).await.into_result()?;
            }
            pager.goto(result.page);

            result.content.iter().for_each(print_message);
            println!(
                "Page {} of {} ({} templates)",
                result.page + 1,
                pager.total_pages(),
                result.total_elements
            );
            if pager.has_prev() {
                println!("  previous: --page {}", pager.page() - 1);
            }
            if pager.has_next() {
                println!("  next: --page {}", pager.page() + 1);
            }
        }
        MessageCommand::Get { id } => {
            let message = app.messages.by_id(id).fetch().await.into_result()?;
            print_message(&message);
        }
        MessageCommand::Create {
            title,
            body,
            channel,
        } => {
            let input = MessageInput {
                title,
                body,
                channel,
            };
            let message = app.messages.create().mutate(input).await?;
            print_message(&message);
        }
        MessageCommand::Update {
            id,
            title,
            body,
            channel,
        } => {
            let input = MessageInput {
                title,
                body,
                channel,
            };
            let message = app.messages.update().mutate((id, input)).await?;
            print_message(&message);
        }
        MessageCommand::Delete { id } => {
            app.messages.delete().mutate(id).await?;
            println!("Deleted message #{id}");
        }
    }
    Ok(())
}

async fn run_notify(app: &AppContext, command: NotifyCommand) -> Result<(), Box<dyn Error>> {
    match command {
        NotifyCommand::Send {
            installment,
            channels,
        } => {
            let request = NotificationRequest::new(installment, channels);
            app.notifications.dispatch().mutate(request).await?;
            println!("Notifications sent for installment #{installment}");
        }
        NotifyCommand::Preview {
            installment,
            channels,
        } => {
            let request = NotificationRequest::new(installment, channels);
            let preview = app.notifications.preview().mutate(request).await?;
            println!("{preview}");
        }
    }
    Ok(())
}

fn print_person(person: &Person) {
    println!(
        "#{:<4} {:<28} {:<9} {:<30} {}",
        person.id,
        person.name,
        person.role.as_str(),
        person.email,
        person.phone
    );
}

fn print_installment(installment: &Installment) {
    let debtors: Vec<&str> = installment
        .debtors
        .iter()
        .map(|debtor| debtor.name.as_str())
        .collect();
    println!(
        "#{:<4} {:<24} {} {:>14} ({} each) {} | {} -> {}",
        installment.id,
        installment.description,
        format_date(installment.due_date),
        format_currency(installment.total_amount),
        format_currency(installment.per_debtor_amount),
        if installment.settled { "quitada" } else { "em aberto" },
        installment.collector.name,
        debtors.join(", ")
    );
}

fn print_message(message: &Message) {
    println!(
        "#{:<4} [{}] {}: {}",
        message.id,
        message.channel.as_str(),
        message.title,
        message.body
    );
}
