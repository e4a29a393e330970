//! extapi - command line front end for the external API token session.
//!
//! Loads settings from `.env`, the config file and the environment, applies
//! any runtime overrides given on the command line, then runs one command.

use std::io;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use extapi_core::{ApiContext, RuntimeConfigStore};

const USAGE: &str = "\
Usage:
  extapi config
  extapi token [--base-url URL] [--username USER [--password PASS]]
  extapi get PATH [--base-url URL] [--username USER [--password PASS]]";

/// Number of token characters shown before eliding the rest
const TOKEN_PREVIEW_CHARS: usize = 8;

fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=extapi_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Overrides {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Config,
    Token(Overrides),
    Get(String, Overrides),
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        bail!("missing command\n\n{USAGE}");
    };

    match command.as_str() {
        "config" => Ok(Command::Config),
        "token" => Ok(Command::Token(parse_overrides(rest)?)),
        "get" => {
            let Some((path, rest)) = rest.split_first() else {
                bail!("get requires a PATH\n\n{USAGE}");
            };
            Ok(Command::Get(path.clone(), parse_overrides(rest)?))
        }
        "-h" | "--help" | "help" => bail!("{USAGE}"),
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    }
}

fn parse_overrides(args: &[String]) -> Result<Overrides> {
    let mut overrides = Overrides::default();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let slot = match flag.as_str() {
            "--base-url" => &mut overrides.base_url,
            "--username" => &mut overrides.username,
            "--password" => &mut overrides.password,
            other => bail!("unknown option '{other}'\n\n{USAGE}"),
        };
        let value = iter
            .next()
            .with_context(|| format!("{flag} requires a value"))?;
        *slot = Some(value.clone());
    }
    if overrides.password.is_some() && overrides.username.is_none() {
        bail!("--password requires --username");
    }
    Ok(overrides)
}

fn apply_overrides(store: &RuntimeConfigStore, overrides: Overrides) -> Result<()> {
    if let Some(url) = overrides.base_url {
        store.update_base_url(&url).context("Invalid --base-url")?;
    }
    if let Some(username) = overrides.username {
        let password = match overrides.password {
            Some(p) => p,
            None => rpassword::prompt_password(format!("Password for {username}: "))
                .context("Failed to read password")?,
        };
        store
            .update_credentials(&username, &password)
            .context("Invalid credentials")?;
    }
    Ok(())
}

fn token_preview(token: &str) -> String {
    match token.char_indices().nth(TOKEN_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => token.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let ctx = ApiContext::load()?;
    info!("extapi starting");

    match command {
        Command::Config => {
            let snapshot = ctx.config.snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Token(overrides) => {
            apply_overrides(&ctx.config, overrides)?;
            let token = ctx
                .auth
                .get_access_token()
                .await
                .context("Failed to obtain access token")?;
            println!("token:  {}", token_preview(&token));
            println!("status: {}", ctx.auth.status().await.display_message());
        }
        Command::Get(path, overrides) => {
            apply_overrides(&ctx.config, overrides)?;
            let client = ctx
                .auth
                .get_authorized_client()
                .await
                .context("Failed to obtain access token")?;
            let response = client
                .get(&path)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {path}"))?;
            let status = response.status();
            let body = response.text().await.context("Failed to read response body")?;
            if !status.is_success() {
                bail!("GET {path} returned {status}: {body}");
            }
            println!("{body}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extapi_core::Settings;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_config_command() {
        assert_eq!(parse_args(&args(&["config"])).unwrap(), Command::Config);
    }

    #[test]
    fn test_parse_token_with_overrides() {
        let command = parse_args(&args(&[
            "token",
            "--base-url",
            "https://api.example.com",
            "--username",
            "bob",
            "--password",
            "pw",
        ]))
        .unwrap();
        assert_eq!(
            command,
            Command::Token(Overrides {
                base_url: Some("https://api.example.com".to_string()),
                username: Some("bob".to_string()),
                password: Some("pw".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_get_requires_path() {
        assert!(parse_args(&args(&["get"])).is_err());
        assert_eq!(
            parse_args(&args(&["get", "/items"])).unwrap(),
            Command::Get("/items".to_string(), Overrides::default())
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args(&["launch"])).is_err());
        assert!(parse_args(&args(&["token", "--username"])).is_err());
        assert!(parse_args(&args(&["token", "--verbose"])).is_err());
        assert!(parse_args(&args(&["token", "--password", "pw"])).is_err());
    }

    #[test]
    fn test_apply_overrides_validates_url() {
        let store = RuntimeConfigStore::new(&Settings::default());
        let bad = Overrides {
            base_url: Some("api.example.com".to_string()),
            ..Overrides::default()
        };
        assert!(apply_overrides(&store, bad).is_err());

        let good = Overrides {
            base_url: Some("https://api.example.com/".to_string()),
            username: Some("bob".to_string()),
            password: Some("pw".to_string()),
        };
        apply_overrides(&store, good).unwrap();
        assert_eq!(store.base_url(), "https://api.example.com");
        assert_eq!(store.username(), "bob");
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "short");
    }
}
