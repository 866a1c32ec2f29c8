use clap::Parser;
use funcapp_settings::core::{
    DEFAULT_ENVIRONMENT, LOCAL_DEVELOPMENT, LayeredSourceBuilder, StartupOrchestrator,
};
use funcapp_settings::http::{self, AppState, DEFAULT_PORT};
use funcapp_settings::logging::{self, LogFormat};
use funcapp_settings::sources::LocalSecretsSource;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::net::TcpListener;

/// Serverless function app with layered, validated configuration.
#[derive(Debug, Parser)]
#[command(name = "funcapp-settings", version, about)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "FUNCTIONS_CUSTOMHANDLER_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory holding appsettings*.json
    #[arg(long, env = "APP_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Environment name
    #[arg(long, env = "AZURE_FUNCTIONS_ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    environment: String,

    /// Id of the developer-local secrets store
    #[arg(long, env = "USER_SECRETS_ID")]
    user_secrets_id: Option<String>,

    /// Explicit path to the local secrets file
    #[arg(long, env = "USER_SECRETS_PATH", conflicts_with = "user_secrets_id")]
    user_secrets_path: Option<PathBuf>,

    /// Abort startup after this many seconds
    #[arg(long, env = "STARTUP_DEADLINE_SECS")]
    startup_deadline_secs: Option<u64>,

    /// Log output format (defaults to pretty in Development, json elsewhere)
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn is_local_development(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case(LOCAL_DEVELOPMENT)
    }

    fn local_secrets_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.user_secrets_path {
            return Some(path.clone());
        }
        let id = self.user_secrets_id.as_deref()?;
        let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
        Some(LocalSecretsSource::default_path(&PathBuf::from(home), id))
    }

    fn sources(&self) -> LayeredSourceBuilder {
        let builder =
            LayeredSourceBuilder::new(self.environment.clone()).with_config_dir(&self.config_dir);
        match self.local_secrets_path() {
            Some(path) => builder.with_local_secrets(path),
            None => builder,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let format = args.log_format.unwrap_or(if args.is_local_development() {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    });
    let guard = match logging::init(format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = run(args).await;
    drop(guard);
    code
}

async fn run(args: Args) -> ExitCode {
    tracing::info!(
        environment = %args.environment,
        config_dir = %args.config_dir.display(),
        "Starting function app"
    );

    let mut startup = StartupOrchestrator::new(args.sources());
    if let Some(secs) = args.startup_deadline_secs {
        startup = startup.with_deadline(Duration::from_secs(secs));
    }

    let resolved = match startup.run().await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(error = %e, state = ?startup.state(), "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, args.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    match http::serve(listener, AppState::new(resolved)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
