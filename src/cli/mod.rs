use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::application::{AccountService, NewExpense};
use crate::domain::{
    Expense, SortKey, User, format_price, parse_date, parse_price, sort_expenses,
};

/// Money Spender - personal expense tracker
#[derive(Parser)]
#[command(name = "money-spender")]
#[command(about = "Track personal expenses per user, with filtering, sorting and totals")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "money-spender.db", global = true)]
    pub database: String,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Credentials of the user a command acts on.
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    /// Username
    #[arg(short, long)]
    pub user: String,

    /// Password
    #[arg(short, long)]
    pub password: String,
}

/// An expense identified by value (all four fields).
#[derive(Args, Debug, Clone)]
pub struct ExpenseArgs {
    /// Date (dd.MM.yyyy)
    #[arg(long)]
    pub date: String,

    /// Category (letters only)
    #[arg(short, long)]
    pub category: String,

    /// Price (e.g. "50" or "49.90")
    #[arg(long)]
    pub price: String,

    /// Description
    #[arg(long)]
    pub description: String,
}

impl ExpenseArgs {
    fn to_expense(&self) -> Result<Expense> {
        let price = parse_price(&self.price)?;
        Ok(Expense::parse(
            &self.date,
            self.category.as_str(),
            price,
            self.description.as_str(),
        )?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Record a new expense
    Add {
        #[command(flatten)]
        credentials: Credentials,

        /// Date (dd.MM.yyyy)
        #[arg(long)]
        date: String,

        /// Price (e.g. "50" or "49.90")
        #[arg(long)]
        price: String,

        /// Description
        #[arg(long)]
        description: String,

        /// New category (letters only)
        #[arg(short, long)]
        category: Option<String>,

        /// Existing category to reuse
        #[arg(long)]
        existing_category: Option<String>,
    },

    /// Remove an expense (matched by value)
    Remove {
        #[command(flatten)]
        credentials: Credentials,

        #[command(flatten)]
        expense: ExpenseArgs,
    },

    /// Replace fields of an existing expense (matched by value)
    Update {
        #[command(flatten)]
        credentials: Credentials,

        #[command(flatten)]
        expense: ExpenseArgs,

        /// New date (dd.MM.yyyy)
        #[arg(long)]
        set_date: Option<String>,

        /// New category
        #[arg(long)]
        set_category: Option<String>,

        /// New price
        #[arg(long)]
        set_price: Option<String>,

        /// New description
        #[arg(long)]
        set_description: Option<String>,
    },

    /// List expenses, most expensive first unless another order is given
    List {
        #[command(flatten)]
        credentials: Credentials,

        /// Only this category
        #[arg(long)]
        category: Option<String>,

        /// From date, inclusive (dd.MM.yyyy)
        #[arg(long)]
        from: Option<String>,

        /// To date, inclusive (dd.MM.yyyy)
        #[arg(long)]
        to: Option<String>,

        /// Sort by: price, date, category
        #[arg(long)]
        sort: Option<String>,

        /// Ascending order for --sort
        #[arg(long)]
        ascending: bool,
    },

    /// List the categories in use
    Categories {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show the total of all expenses
    Total {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show totals per category
    Summary {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Export expenses to CSV or JSON
    Export {
        #[command(flatten)]
        credentials: Credentials,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import expenses from CSV or JSON
    Import {
        #[command(flatten)]
        credentials: Credentials,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip records identical to an existing expense
        #[arg(long)]
        skip_duplicates: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        /// Username (letters only, at most 15)
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Check a user's credentials
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// List all users
    List,

    /// Delete a user and all of its expenses
    Delete {
        #[command(flatten)]
        credentials: Credentials,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Commands::Init = self.command {
            AccountService::init(&self.database).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = AccountService::connect(&self.database)
            .await
            .with_context(|| format!("Failed to open database '{}'", self.database))?;

        match self.command {
            Commands::Init => unreachable!("handled above"),

            Commands::User(user_cmd) => run_user_command(&service, user_cmd).await?,

            Commands::Add {
                credentials,
                date,
                price,
                description,
                category,
                existing_category,
            } => {
                let user = login(&service, &credentials).await?;
                let request = NewExpense {
                    date,
                    new_category: category,
                    existing_category,
                    price,
                    description,
                };
                let user = service.add_expense(user.username(), request).await?;
                let total = service.expense_service().total_for(&user);
                println!(
                    "Recorded expense ({} expenses, total {})",
                    user.ledger().expense_count(),
                    format_price(total)
                );
            }

            Commands::Remove {
                credentials,
                expense,
            } => {
                let user = login(&service, &credentials).await?;
                let expense = expense.to_expense()?;
                service.delete_expense(user.username(), &expense).await?;
                println!("Removed: {}", expense);
            }

            Commands::Update {
                credentials,
                expense,
                set_date,
                set_category,
                set_price,
                set_description,
            } => {
                let user = login(&service, &credentials).await?;
                let old = expense.to_expense()?;

                let mut new = old.clone();
                if let Some(date) = set_date {
                    new = new.with_date_str(&date)?;
                }
                if let Some(category) = set_category {
                    new = new.with_category(category)?;
                }
                if let Some(price) = set_price {
                    new = new.with_price(parse_price(&price)?)?;
                }
                if let Some(description) = set_description {
                    new = new.with_description(description)?;
                }

                service
                    .update_expense(user.username(), &old, new.clone())
                    .await?;
                println!("Updated: {}", new);
            }

            Commands::List {
                credentials,
                category,
                from,
                to,
                sort,
                ascending,
            } => {
                let user = login(&service, &credentials).await?;
                let sort_key = sort
                    .map(|s| {
                        SortKey::from_str(&s).ok_or_else(|| {
                            anyhow::anyhow!(
                                "Invalid sort key '{}'. Valid keys: price, date, category",
                                s
                            )
                        })
                    })
                    .transpose()?;
                run_list_command(&service, &user, category, from, to, sort_key, ascending)
                    .await?;
            }

            Commands::Categories { credentials } => {
                let user = login(&service, &credentials).await?;
                let mut categories: Vec<String> =
                    service.categories(user.username()).await?.into_iter().collect();
                categories.sort();

                if categories.is_empty() {
                    println!("No categories yet.");
                }
                for category in categories {
                    println!("{}", category);
                }
            }

            Commands::Total { credentials } => {
                let user = login(&service, &credentials).await?;
                let total = service.expense_service().total_for(&user);
                println!("Total: {}", format_price(total));
            }

            Commands::Summary { credentials } => {
                let user = login(&service, &credentials).await?;
                let totals = service.category_totals(user.username()).await?;

                if totals.is_empty() {
                    println!("No expenses found.");
                } else {
                    println!("{:<20} {:>8} {:>14}", "CATEGORY", "COUNT", "TOTAL");
                    println!("{}", "-".repeat(44));
                    for entry in &totals {
                        println!(
                            "{:<20} {:>8} {:>14}",
                            truncate(&entry.category, 20),
                            entry.count,
                            format_price(entry.total)
                        );
                    }
                    println!("{}", "-".repeat(44));
                    println!(
                        "{:<20} {:>8} {:>14}",
                        "TOTAL",
                        totals.iter().map(|t| t.count).sum::<usize>(),
                        format_price(service.expense_service().total_for(&user))
                    );
                }
            }

            Commands::Export {
                credentials,
                format,
                output,
            } => {
                let user = login(&service, &credentials).await?;
                run_export_command(&service, user.username(), &format, output.as_deref()).await?;
            }

            Commands::Import {
                credentials,
                format,
                input,
                dry_run,
                skip_duplicates,
            } => {
                let user = login(&service, &credentials).await?;
                run_import_command(
                    &service,
                    user.username(),
                    &format,
                    input.as_deref(),
                    dry_run,
                    skip_duplicates,
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn login(service: &AccountService, credentials: &Credentials) -> Result<User> {
    Ok(service
        .authenticate(&credentials.user, &credentials.password)
        .await?)
}

async fn run_user_command(service: &AccountService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Create { username, password } => {
            let user = service.create_user(&username, &password).await?;
            println!("Created user: {}", user.username());
        }

        UserCommands::Login { credentials } => {
            let user = login(service, &credentials).await?;
            println!(
                "Welcome, {}! {} expenses in {} categories.",
                user.username(),
                user.ledger().expense_count(),
                user.ledger().category_count()
            );
        }

        UserCommands::List => {
            let usernames = service.list_usernames().await?;
            if usernames.is_empty() {
                println!("No users found.");
            }
            for username in usernames {
                println!("{}", username);
            }
        }

        UserCommands::Delete { credentials } => {
            let user = login(service, &credentials).await?;
            service.delete_user(user.username()).await?;
            println!("Deleted user: {}", user.username());
        }
    }
    Ok(())
}

async fn run_list_command(
    service: &AccountService,
    user: &User,
    category: Option<String>,
    from: Option<String>,
    to: Option<String>,
    sort_key: Option<SortKey>,
    ascending: bool,
) -> Result<()> {
    let start = from
        .as_deref()
        .map(parse_cli_date)
        .transpose()
        .context("Invalid --from date")?;
    let end = to
        .as_deref()
        .map(parse_cli_date)
        .transpose()
        .context("Invalid --to date")?;

    let mut report = service
        .report(user.username(), category.as_deref(), start, end)
        .await?;

    if let Some(key) = sort_key {
        report.expenses = sort_expenses(&report.expenses, |a, b| {
            let order = key.compare(a, b);
            if ascending { order } else { order.reverse() }
        });
    }

    if report.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    for expense in &report.expenses {
        println!("{}", expense);
    }
    println!();
    println!("Total: {}", format_price(report.total));
    Ok(())
}

async fn run_export_command(
    service: &AccountService,
    username: &str,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        "csv" => {
            let count = exporter.export_expenses_csv(username, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_expenses_json(username, writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} expenses in {} categories",
                    snapshot.expenses.len(),
                    snapshot.categories.len()
                );
            }
        }
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    }

    Ok(())
}

async fn run_import_command(
    service: &AccountService,
    username: &str,
    format: &str,
    input: Option<&str>,
    dry_run: bool,
    skip_duplicates: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{Read, stdin};

    let importer = Importer::new(service);

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_duplicates,
    };

    let result = match format {
        "csv" => importer.import_expenses_csv(username, reader, options).await?,
        "json" => importer.import_expenses_json(username, reader, options).await?,
        _ => {
            anyhow::bail!("Invalid import format '{}'. Valid formats: csv, json", format);
        }
    };

    if dry_run {
        println!("Dry run complete (nothing saved)");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

fn parse_cli_date(date_str: &str) -> Result<NaiveDate> {
    parse_date(date_str).context("Date must be in dd.MM.yyyy format")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
