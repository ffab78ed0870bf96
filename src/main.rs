use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
mod input;
use neoncrypt::{
    DEFAULT_KEY_FILE, KeySource, KeyStore, LoadedKey, Outcome, Token, TokenCodec,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Args)]
struct TtlArgs {
    /// Reject tokens older than this many seconds
    #[arg(long, value_name = "SECONDS", env = "NEONCRYPT_TTL")]
    ttl: Option<u64>,
}

#[derive(Debug, Parser)]
#[command(name = "neoncrypt")]
#[command(
    version,
    about = "Encrypt and decrypt short text messages with a single local key."
)]
struct Cli {
    /// Path to the key file
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        env = "NEONCRYPT_KEY",
        default_value = DEFAULT_KEY_FILE
    )]
    key: PathBuf,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Copy successful output to the clipboard
    #[arg(long, global = true)]
    copy: bool,

    /// Log key handling details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts a message into a token
    Encrypt { message: Option<String> },

    /// Decrypts a token back into the message
    Decrypt {
        token: Option<String>,
        #[command(flatten)]
        ttl: TtlArgs,
    },

    /// Shows when a token was created
    Inspect { token: Option<String> },

    /// Writes a new key file
    Keygen {
        /// Replace an existing key file; tokens made with it become unreadable
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("neoncrypt={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

/// Load the key and tell the user when a first key was written.
///
/// A replaced key is reported by the store's own warning.
fn open_key(store: &KeyStore) -> Result<LoadedKey> {
    let loaded = store
        .load_or_create()
        .context("application cannot proceed without a key; check file permissions")?;

    if let KeySource::Generated = loaded.source() {
        eprintln!(
            "generated a new key and saved it as '{}'; keep this file secure",
            store.path().display()
        );
    }

    Ok(loaded)
}

fn run(key: PathBuf, command: Commands) -> Result<Outcome> {
    let store = KeyStore::new(key);

    let outcome = match command {
        Commands::Keygen { force } => {
            store.generate_new(force)?;
            Outcome::Success {
                output: format!("new key written to '{}'", store.path().display()),
            }
        }
        Commands::Encrypt { message } => {
            let message = input::read_input(message, "Message: ")?;
            let loaded = open_key(&store)?;
            Outcome::from(neoncrypt::encrypt(loaded.key(), &message))
        }
        Commands::Decrypt { token, ttl } => {
            let token = Token::from(input::read_input(token, "Token: ")?.trim());
            let loaded = open_key(&store)?;
            let codec = TokenCodec::new(loaded.key()).with_max_age(ttl.ttl);
            Outcome::from(codec.decrypt_str(&token))
        }
        Commands::Inspect { token } => {
            let token = Token::from(input::read_input(token, "Token: ")?.trim());
            let loaded = open_key(&store)?;
            let result = TokenCodec::new(loaded.key())
                .extract_timestamp(&token)
                .map(format_timestamp);
            Outcome::from(result)
        }
    };

    Ok(outcome)
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_owned())
        .context("failed to copy output")?;
    Ok(())
}

fn main() -> Result<ExitCode> {
    let Cli {
        key,
        json,
        copy,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    let outcome = run(key, command)?;

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else if outcome.is_success() {
        println!("{}", outcome.text());
    } else {
        eprintln!("Error: {}", outcome.text());
    }

    if !outcome.is_success() {
        return Ok(ExitCode::FAILURE);
    }

    if copy {
        match copy_to_clipboard(outcome.text()) {
            Ok(()) => eprintln!("output copied to clipboard"),
            Err(e) => eprintln!("warning: {e:#}"),
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_render_as_rfc3339() {
        assert_eq!(format_timestamp(499_162_800), "1985-10-26T08:20:00+00:00");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
