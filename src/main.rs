//! bank_ledger - command line front end
//!
//! ```text
//! bank_ledger [--env <name>] user create <username> <hashed_password> <full_name> <email>
//! bank_ledger [--env <name>] user get <username>
//! bank_ledger [--env <name>] account create <owner> <balance> <currency>
//! bank_ledger [--env <name>] account get <id>
//! bank_ledger [--env <name>] account list [<owner>]
//! bank_ledger [--env <name>] transfer <from> <to> <amount> <currency>
//! ```
//!
//! Results are printed to stdout as JSON.

use anyhow::{Context, Result, anyhow, bail};

use bank_ledger::config::AppConfig;
use bank_ledger::db::Database;
use bank_ledger::db::schema::init_schema;
use bank_ledger::store::{LedgerQueries, PgStore};
use bank_ledger::transfer::TransferService;
use bank_ledger::validation::{Currency, TransferRequest};
use bank_ledger::{AccountId, Amount, CreateUserParams};

const USAGE: &str = "usage:
  bank_ledger [--env <name>] user create <username> <hashed_password> <full_name> <email>
  bank_ledger [--env <name>] user get <username>
  bank_ledger [--env <name>] account create <owner> <balance> <currency>
  bank_ledger [--env <name>] account get <id>
  bank_ledger [--env <name>] account list [<owner>]
  bank_ledger [--env <name>] transfer <from> <to> <amount> <currency>";

/// Page size for `account list`
const LIST_LIMIT: i64 = 100;

#[derive(Debug, PartialEq)]
enum Command {
    CreateUser(CreateUserParams),
    GetUser {
        username: String,
    },
    CreateAccount {
        owner: String,
        balance: Amount,
        currency: Currency,
    },
    GetAccount {
        id: AccountId,
    },
    ListAccounts {
        owner: Option<String>,
    },
    Transfer(TransferRequest),
}

fn get_env(args: &[String]) -> String {
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Positional arguments with `--env <name>` removed
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
        } else if arg == "--env" || arg == "-e" {
            skip = true;
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_number(value: &str, what: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("invalid {}: {:?}", what, value))
}

fn parse_command(args: &[&str]) -> Result<Command> {
    match args {
        ["user", "create", username, hashed_password, full_name, email] => {
            Ok(Command::CreateUser(CreateUserParams {
                username: username.to_string(),
                hashed_password: hashed_password.to_string(),
                full_name: full_name.to_string(),
                email: email.to_string(),
            }))
        }
        ["user", "get", username] => Ok(Command::GetUser {
            username: username.to_string(),
        }),
        ["account", "create", owner, balance, currency] => Ok(Command::CreateAccount {
            owner: owner.to_string(),
            balance: parse_number(balance, "balance")?,
            currency: currency.parse()?,
        }),
        ["account", "get", id] => Ok(Command::GetAccount {
            id: parse_number(id, "account id")?,
        }),
        ["account", "list"] => Ok(Command::ListAccounts { owner: None }),
        ["account", "list", owner] => Ok(Command::ListAccounts {
            owner: Some(owner.to_string()),
        }),
        ["transfer", from, to, amount, currency] => Ok(Command::Transfer(TransferRequest {
            from_account_id: parse_number(from, "source account id")?,
            to_account_id: parse_number(to, "destination account id")?,
            amount: parse_number(amount, "amount")?,
            currency: currency.to_string(),
        })),
        _ => bail!("{}", USAGE),
    }
}

async fn run(config: &AppConfig, command: Command) -> Result<String> {
    let url = config
        .database_url()
        .ok_or_else(|| anyhow!("no database configured: set DATABASE_URL or postgres_url"))?;

    let db = Database::connect(&url, &config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    init_schema(db.pool()).await?;

    let store = PgStore::new(db.pool().clone());

    let output = match command {
        Command::CreateUser(params) => {
            let user = store.create_user(&params).await?;
            tracing::info!(username = %user.username, "User created");
            serde_json::to_string_pretty(&user)?
        }
        Command::GetUser { username } => {
            serde_json::to_string_pretty(&store.get_user(&username).await?)?
        }
        Command::CreateAccount {
            owner,
            balance,
            currency,
        } => {
            let account = store
                .create_account(&owner, balance, currency.as_str())
                .await?;
            tracing::info!(account_id = account.id, %owner, "Account created");
            serde_json::to_string_pretty(&account)?
        }
        Command::GetAccount { id } => serde_json::to_string_pretty(&store.get_account(id).await?)?,
        Command::ListAccounts { owner } => serde_json::to_string_pretty(
            &store
                .list_accounts(owner.as_deref(), LIST_LIMIT, 0)
                .await?,
        )?,
        Command::Transfer(req) => {
            let service = TransferService::new(store);
            serde_json::to_string_pretty(&service.execute(req).await?)?
        }
    };

    Ok(output)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&positional(&args))?;

    let env = get_env(&args);
    let app_config = AppConfig::load(&env)?;
    let _log_guard = bank_ledger::logging::init_logging(&app_config);

    tracing::info!("Starting bank_ledger in {} mode", env);

    let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let output = rt.block_on(run(&app_config, command))?;
    println!("{}", output);
    Ok(())
}
