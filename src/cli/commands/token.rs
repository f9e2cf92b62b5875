use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, DevClaims};
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint an HS256 session token signed with AUTH_JWT_SECRET")]
    Mint {
        #[arg(help = "External user id (sub claim)")]
        subject: String,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Name claim")]
        name: Option<String>,
        #[arg(long, help = "Hours until expiry (defaults to DEV_TOKEN_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    match cmd {
        TokenCommands::Mint { subject, email, name, hours } => {
            let secret = config
                .security
                .jwt_secret
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("AUTH_JWT_SECRET must be set to mint tokens"))?;

            let mut claims = DevClaims::new(subject, hours.unwrap_or(config.security.dev_token_expiry_hours));
            claims.iss = config.security.auth_issuer.clone();
            claims.aud = config.security.auth_audience.clone();
            claims.email = email;
            claims.name = name;

            let token = generate_jwt(&claims, secret).map_err(|e| anyhow::anyhow!("{}", e))?;

            match output_format {
                OutputFormat::Json => output_value(
                    &output_format,
                    &json!({ "token": token, "sub": claims.sub, "exp": claims.exp }),
                ),
                OutputFormat::Text => output_value(&output_format, &json!(token)),
            }
        }
    }
}
