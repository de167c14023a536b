//! Operator tool for minting and inspecting session tokens with the
//! deployment's own configuration.
//!
//! ```text
//! token-tool sign <access|refresh> <sub> [role] [team]
//! token-tool verify <token>
//! token-tool rotate <refresh-token>
//! ```

use messenger_auth::observability::{init_tracing, TracingConfig};
use messenger_auth::{Config, IssueClaims, TokenKind, TokenService};
use std::process::ExitCode;
use tracing::info;

const USAGE: &str = "usage: token-tool sign <access|refresh> <sub> [role] [team]\n       \
                     token-tool verify <token>\n       \
                     token-tool rotate <refresh-token>";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(&TracingConfig::default().with_log_level("warn"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<String, String> {
    let config = Config::from_env().map_err(|e| e.to_string())?;
    let service = TokenService::from_config(config).map_err(|e| e.to_string())?;
    info!(algorithm = %service.config().algorithm, "Loaded token configuration");

    let fail = |e: messenger_auth::AuthError| {
        e.log();
        serde_json::to_string_pretty(&e.to_problem()).unwrap_or_else(|_| e.to_string())
    };

    match args {
        [cmd, kind, sub, rest @ ..] if cmd == "sign" && rest.len() <= 2 => {
            let kind = match kind.as_str() {
                "access" => TokenKind::Access,
                "refresh" => TokenKind::Refresh,
                other => return Err(format!("unknown token kind {other}\n{USAGE}")),
            };
            let mut claims = IssueClaims::new(sub.as_str());
            if let Some(role) = rest.first() {
                claims = claims.role(role.as_str());
            }
            if let Some(team) = rest.get(1) {
                claims = claims.team(team.as_str());
            }
            service.sign(kind, claims).await.map_err(fail)
        }
        [cmd, token] if cmd == "verify" => {
            let claims = service.verify(token).await.map_err(fail)?;
            serde_json::to_string_pretty(&claims).map_err(|e| e.to_string())
        }
        [cmd, token] if cmd == "rotate" => {
            let rotated = service.rotate_refresh(token).await.map_err(fail)?;
            Ok(format!("access:  {}\nrefresh: {}", rotated.access, rotated.refresh))
        }
        _ => Err(USAGE.to_string()),
    }
}
