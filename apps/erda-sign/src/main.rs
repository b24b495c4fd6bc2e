//! erda-sign - sign a request for an Erda ingestion endpoint.
//!
//! Prints the `Authorization` header (or, with query placement, the signed
//! URL) for the described request. Nothing is sent over the network.
//!
//! # Usage
//!
//! ```text
//! ERDA_ACCESS_KEY_ID=... ERDA_SECRET_KEY=... erda-sign GET 'https://collector.erda.cloud/users?page=1' x-erda-sdk:true
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ERDA_ACCESS_KEY_ID` | *(required)* | Access key id |
//! | `ERDA_SECRET_KEY` | *(required)* | Secret key |
//! | `ERDA_SIGN_TIMESTAMP` | `true` | Stamp the request with the current time |
//! | `ERDA_AUTH_IN_QUERY` | `false` | Put auth fields in the query string |
//! | `ERDA_SIGN_ALGORITHM` | `hmac-sha1` | `hmac-sha1` or `hmac-sha256` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use anyhow::{Context, Result, bail, ensure};
use erda_auth::{AuthConfig, Signer};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Build request parts from `METHOD URL [Name:Value ...]`.
fn build_request(args: &[String]) -> Result<http::request::Parts> {
    let [method, url, headers @ ..] = args else {
        bail!("usage: erda-sign <METHOD> <URL> [Name:Value ...]");
    };

    let mut builder = http::Request::builder()
        .method(method.to_ascii_uppercase().as_str())
        .uri(url.as_str());

    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header must be Name:Value, got {header}"))?;
        builder = builder.header(name.trim(), value.trim());
    }

    let (parts, ()) = builder
        .body(())
        .context("invalid request description")?
        .into_parts();
    Ok(parts)
}

fn main() -> Result<()> {
    let config = AuthConfig::from_env();
    init_tracing(&config.log_level)?;

    let pair = config.pair();
    ensure!(
        pair.is_complete(),
        "ERDA_ACCESS_KEY_ID and ERDA_SECRET_KEY must both be set"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut parts = build_request(&args)?;

    let signer = Signer::new(pair, config.signer_config());
    debug!(sign_string = %signer.sign_string(&parts), "Canonical request");

    signer
        .sign_request(&mut parts)
        .context("failed to sign request")?;

    info!(
        access_key_id = %config.access_key_id,
        algorithm = %signer.algorithm(),
        timestamp = signer.timestamp().unwrap_or("-"),
        in_query = config.auth_in_query,
        "Signed request"
    );

    if config.auth_in_query {
        println!("{}", parts.uri);
    } else if let Some(auth) = parts.headers.get(http::header::AUTHORIZATION) {
        println!(
            "Authorization: {}",
            auth.to_str().context("non-ASCII Authorization header")?
        );
    }

    Ok(())
}
