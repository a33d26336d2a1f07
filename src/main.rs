use anyhow::Result;
use clap::{Parser, Subcommand};
use rtcpair_lib::config::{SessionConfig, DEFAULT_STUN_URL};
use rtcpair_lib::peer::ServerConfig;
use rtcpair_lib::{logger, run_file_session, Role, SignalError};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rtcpair", about = "WebRTC data channel via file-based signaling")]
struct Args {
    #[command(subcommand)]
    role: RoleArg,

    /// Path where the signaling files will be stored
    #[arg(long, default_value = "./", env = "RTCPAIR_ROOT_PATH", global = true)]
    root_path: PathBuf,

    /// STUN/TURN server, repeatable
    #[arg(long = "ice-server", default_value = DEFAULT_STUN_URL, global = true)]
    ice_servers: Vec<String>,

    /// Username for turn:/turns: servers
    #[arg(long, env = "RTCPAIR_ICE_USERNAME", global = true)]
    ice_username: Option<String>,

    /// Credential for turn:/turns: servers
    #[arg(long, env = "RTCPAIR_ICE_CREDENTIAL", global = true, hide_env_values = true)]
    ice_credential: Option<String>,

    /// Signaling file polling interval
    #[arg(
        long,
        default_value_t = 100,
        global = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval_ms: u64,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            root_path: self.root_path.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ice_servers: self
                .ice_servers
                .iter()
                .enumerate()
                .map(|(i, url)| {
                    ServerConfig::from_url(
                        format!("cli-{i}"),
                        url.clone(),
                        self.ice_username.clone(),
                        self.ice_credential.clone(),
                    )
                })
                .collect(),
            ..SessionConfig::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum RoleArg {
    /// Create the offer and the data channel
    Offer,
    /// Wait for the offer and answer it
    Answer,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Offer => Role::Offerer,
            RoleArg::Answer => Role::Answerer,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();
    let role = Role::from(args.role);
    let config = args.session_config();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted");
                cancel.cancel();
            }
        }
    });

    match run_file_session(role, &config, cancel).await {
        Ok(()) | Err(SignalError::Cancelled) => Ok(()),
        Err(SignalError::ConnectionFailed) => {
            error!("peer connection has gone to failed, exiting");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Args::try_parse_from(["rtcpair", "offer", "--poll-interval-ms", "0"]).is_err());
        let args = Args::try_parse_from(["rtcpair", "answer", "--poll-interval-ms", "5"]).unwrap();
        assert_eq!(args.session_config().poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn turn_servers_get_cli_credentials() {
        let args = Args::try_parse_from([
            "rtcpair",
            "offer",
            "--ice-server",
            "stun:stun.example.org:3478",
            "--ice-server",
            "turn:relay.example.org:3478",
            "--ice-username",
            "user",
            "--ice-credential",
            "secret",
        ])
        .unwrap();
        let servers = args.session_config().ice_servers;
        assert_eq!(servers[0].r#type, "stun");
        assert_eq!(servers[0].username, None);
        assert_eq!(servers[1].r#type, "turn");
        assert_eq!(servers[1].username.as_deref(), Some("user"));
        assert_eq!(servers[1].credential.as_deref(), Some("secret"));
    }
}
