use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use bizdesk::auth::{self, builtin_admins};
use bizdesk::config::Config;
use bizdesk::db::{self, DbPool};
use bizdesk::handlers;
use bizdesk::license::{self, RefreshSignal};
use bizdesk::models::{ActivateLicense, CreateUser, IdType, LicensePlan, UserRole};
use bizdesk::state::AppState;
use bizdesk::store::{SqliteGateway, StorageGateway};
use bizdesk::trial::TrialStatus;
use bizdesk::util::now_millis;

#[derive(Parser)]
#[command(name = "bizdesk", version, about = "Business dashboard back end with trial/license gating")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the trial/license status
    Status,
    /// Apply a license key
    Activate {
        #[arg(long)]
        key: String,
        #[arg(long, value_parser = parse_plan)]
        plan: LicensePlan,
    },
    /// Create a user account
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long, value_parser = parse_role, default_value = "USER")]
        role: UserRole,
        #[arg(long, value_parser = parse_id_type, default_value = "registration")]
        id_type: IdType,
        /// Required for admins
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user account
    DeleteUser {
        #[arg(long)]
        id: String,
    },
}

fn parse_plan(s: &str) -> Result<LicensePlan, String> {
    s.to_uppercase().parse().map_err(|_| format!("unknown plan '{}'", s))
}

fn parse_role(s: &str) -> Result<UserRole, String> {
    s.to_uppercase().parse().map_err(|_| format!("unknown role '{}'", s))
}

fn parse_id_type(s: &str) -> Result<IdType, String> {
    s.to_lowercase().parse().map_err(|_| format!("unknown id type '{}'", s))
}

fn open_pool(path: &str, init: fn(&rusqlite::Connection) -> rusqlite::Result<()>) -> anyhow::Result<DbPool> {
    let pool = db::create_pool(path).with_context(|| format!("failed to open {}", path))?;
    let conn = pool.get()?;
    init(&conn).with_context(|| format!("failed to initialize schema in {}", path))?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bizdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let remote = open_pool(&config.database_path, db::init_db)?;
    let local = open_pool(&config.settings_database_path, db::init_settings_db)?;
    let gateway: Arc<dyn StorageGateway> = Arc::new(SqliteGateway::new(remote, local));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, gateway).await,
        Command::Status => {
            let state = gateway.get_license_state().await?;
            let trial = TrialStatus::at(state.trial_start_date, config.trial_window_ms(), now_millis());
            println!("plan:       {}", state.plan_type.as_ref());
            println!("active:     {}", state.is_active);
            println!("time left:  {}", trial.time_left);
            println!("expired:    {}", trial.is_expired);
            Ok(())
        }
        Command::Activate { key, plan } => {
            let mut state = gateway.get_license_state().await?;
            let input = ActivateLicense {
                license_key: key,
                plan_type: plan,
            };
            license::apply_license_key(&mut state, &input, now_millis())?;
            gateway.save_license_state(&state).await?;
            println!("License activated ({})", plan.as_ref());
            Ok(())
        }
        Command::CreateUser {
            username,
            role,
            id_type,
            password,
        } => {
            let input = CreateUser {
                username,
                id_type,
                role,
                password,
                permissions: None,
            };
            let user = auth::create_user(gateway.as_ref(), &input).await?;
            println!("Created user {} ({})", user.username, user.id);
            Ok(())
        }
        Command::DeleteUser { id } => {
            auth::delete_user(gateway.as_ref(), &id).await?;
            println!("Deleted user {}", id);
            Ok(())
        }
    }
}

async fn serve(config: Config, gateway: Arc<dyn StorageGateway>) -> anyhow::Result<()> {
    tracing::info!("Starting bizdesk v{}", env!("CARGO_PKG_VERSION"));

    let admins = builtin_admins(
        config.bootstrap_admin_password.clone(),
        config.bootstrap_super_admin_password.clone(),
    );
    auth::bootstrap_admins(gateway.as_ref(), &admins).await;

    let cancel = CancellationToken::new();
    let state = AppState::start(gateway, &config, &cancel)
        .await
        .context("failed to load license state")?;

    #[cfg(unix)]
    spawn_reload_on_hangup(state.license.clone(), cancel.clone())?;

    let app = handlers::router(state);
    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;
    tracing::info!("HTTP server listening on {}", config.addr());

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// SIGHUP re-reads the license store, for edits made by other processes
/// (such as the `activate` subcommand) before the next poll.
#[cfg(unix)]
fn spawn_reload_on_hangup(watch: license::LicenseWatch, cancel: CancellationToken) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = hangups.recv() => {
                    if received.is_none() {
                        break;
                    }
                    watch.notify(RefreshSignal::StorageChanged);
                }
            }
        }
    });
    Ok(())
}
