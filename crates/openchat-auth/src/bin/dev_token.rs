//! openchat-dev-token: mint a bearer token for a local development server.
//!
//! Tokens are signed with the deterministic development key, which a server
//! only trusts when `JWKS` is unset and strict mode is off.

use clap::Parser;
use openchat_auth::{dev_signing_key, sign_eddsa, Claims, DEV_ISSUER, DEV_KEY_ID};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "openchat-dev-token")]
#[command(author, version, about = "Mint a development JWT for OpenChat")]
struct Cli {
    /// User id placed in the `sub` claim
    #[arg(short, long)]
    sub: String,

    /// Issuer placed in the `iss` claim
    #[arg(short, long, default_value = DEV_ISSUER)]
    issuer: String,

    /// Token lifetime in seconds
    #[arg(short, long, default_value_t = 3600)]
    ttl_secs: i64,

    /// Audience (`aud`), when the server sets AUTH_APPLICATION_ID
    #[arg(short, long)]
    audience: Option<String>,

    /// Print a JSON object with the token and its claims instead of the bare token
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.sub.trim().is_empty() {
        return Err("--sub must not be empty".into());
    }
    if cli.ttl_secs <= 0 {
        return Err("--ttl-secs must be positive".into());
    }

    let mut claims = Claims::new(cli.sub.trim(), &cli.issuer, cli.ttl_secs);
    claims.aud = cli.audience.map(openchat_auth::Audience::One);
    let token = sign_eddsa(&claims, &dev_signing_key(), Some(DEV_KEY_ID))?;

    if cli.json {
        let output = serde_json::json!({
            "token": token,
            "claims": claims,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", token);
    }

    Ok(())
}
