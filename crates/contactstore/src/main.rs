//! `invitercmd` - import a webmail address book from the command line.
//!
//! Runs one import for the given credentials, or, with no arguments, a
//! batch of test credentials.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod batch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use contactstore_core::{Contact, Credentials, Importer, ImporterConfig, ProviderId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Words accepted as a request for usage text, besides `-h`/`--help`.
const HELP_WORDS: [&str; 3] = ["help", "?", "-?"];

const LONG_ABOUT: &str = "\
Import a webmail address book by running the external retrieval program.

  invitercmd user@hotmail.com password
  invitercmd hotmail user@live.com password

print the contacts pulled down for one account. Called with no arguments,
invitercmd runs through a list of test credentials taken from
contactstore_tests.json in the current directory:

  [{\"username\": \"someone@yahoo.com\", \"password\": \"somepassword\"}]

or, failing that, from the file named by INVITEDEFS, one
`email password` pair per line:

  INVITEDEFS=~/.mytestemails invitercmd";

#[derive(Debug, Parser)]
#[command(
    name = "invitercmd",
    version,
    about = "Import a webmail address book",
    long_about = LONG_ABOUT
)]
struct Cli {
    /// `[provider] email password`; omit to run the batch tests
    #[arg(value_name = "ARGS", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Importer configuration file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append the diagnostic fixture lines to the program output
    #[arg(long)]
    test_mode: bool,

    /// Print contacts as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    if std::env::args()
        .nth(1)
        .is_some_and(|arg| HELP_WORDS.contains(&arg.as_str()))
    {
        Cli::command().print_long_help()?;
        return Ok(());
    }

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ImporterConfig::load(path)?,
        None => ImporterConfig::load_default()?,
    };
    let importer = Importer::from_config(&config);

    match cli.args.as_slice() {
        [] => run_batch(&importer, &cli).await,
        [email, password] => run_one(&importer, None, email, password, &cli).await,
        [provider, email, password] => {
            let provider = provider
                .parse::<ProviderId>()
                .with_context(|| format!("unknown provider {provider:?}"))?;
            run_one(&importer, Some(provider), email, password, &cli).await
        }
        _ => {
            eprintln!("Wrong args - use: [provider] email password");
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invitercmd=info,contactstore_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_one(
    importer: &Importer,
    provider: Option<ProviderId>,
    email: &str,
    password: &str,
    cli: &Cli,
) -> Result<()> {
    let contacts = match provider {
        Some(provider) => {
            let credentials = Credentials::new(email, password);
            importer
                .import_with_provider(provider, &credentials, cli.test_mode)
                .await?
        }
        None => importer.get_contacts(email, password, cli.test_mode).await?,
    };

    let provider = provider.or_else(|| contactstore_core::resolve(email));
    match provider {
        Some(provider) => println!("{email} ({provider})"),
        None => println!("{email}"),
    }
    print_contacts(&contacts, cli.json)
}

async fn run_batch(importer: &Importer, cli: &Cli) -> Result<()> {
    let tests = batch::load_tests()?;
    if tests.is_empty() {
        eprintln!(
            "No test credentials: create {} or set {}",
            batch::TESTS_FILE,
            batch::DEFS_ENV
        );
        return Ok(());
    }

    info!("Running {} batch imports", tests.len());
    for case in &tests {
        match importer
            .get_contacts(&case.username, &case.password, cli.test_mode)
            .await
        {
            Ok(contacts) => {
                println!("{}", case.username);
                print_contacts(&contacts, cli.json)?;
            }
            Err(e) => println!("{}: {e}", case.username),
        }
        println!();
    }
    Ok(())
}

fn print_contacts(contacts: &[Contact], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(contacts)?);
    } else {
        for contact in contacts {
            println!("  {}", contact.display());
        }
    }
    Ok(())
}
