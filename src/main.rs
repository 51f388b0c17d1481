//! skoolactl — account and session CLI for the Skoola admin system.
//!
//! Drives the multi-account session store the way the web client does:
//! sign in (add + activate), list stored accounts, switch the active one,
//! remove accounts, and log out. All wiring happens here in an explicit
//! [`AppContext`]; the library holds no global state.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use skoolactl::api::{ResponseCache, SkoolaApi};
use skoolactl::config::Config;
use skoolactl::rbac;
use skoolactl::session::{IdentityRecord, SessionStore, SqliteStateStore};

#[derive(Parser)]
#[command(name = "skoolactl", version, about = "Manage Skoola admin sessions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and make the new account the active one
    Login {
        /// Email to sign in with (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Show the active account
    Whoami {
        /// Verify against the server instead of only the local store
        #[arg(long)]
        remote: bool,
    },
    /// Manage stored accounts
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
    /// Sign out of the active account
    Logout {
        /// Sign out of every stored account
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum AccountsAction {
    /// List stored accounts
    List,
    /// Make another stored account the active one
    Switch { user_id: String },
    /// Forget a stored account
    Remove { user_id: String },
}

/// Everything the commands need, wired once at startup.
struct AppContext {
    store: Arc<SessionStore>,
    api: SkoolaApi,
    cache: ResponseCache,
}

impl AppContext {
    fn init(config: &Config) -> Result<Self> {
        let db_path = config.session_db_path()?;
        let backend = Arc::new(
            SqliteStateStore::open(&db_path)
                .with_context(|| format!("failed to open session db at {}", db_path.display()))?,
        );
        let store = Arc::new(SessionStore::open(backend));
        let api = SkoolaApi::new(&config.api, store.clone())?;
        Ok(Self {
            store,
            api,
            cache: ResponseCache::default(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::init(&config)?;

    match cli.command {
        Command::Login { email } => login(&ctx, email).await,
        Command::Whoami { remote } => whoami(&ctx, remote).await,
        Command::Accounts { action } => match action {
            AccountsAction::List => list_accounts(&ctx),
            AccountsAction::Switch { user_id } => switch_account(&ctx, &user_id),
            AccountsAction::Remove { user_id } => remove_account(&ctx, &user_id),
        },
        Command::Logout { all } => logout(&ctx, all).await,
    }
}

async fn login(ctx: &AppContext, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = dialoguer::Password::new()
        .with_prompt("Password")
        .interact()?;

    let record = ctx.api.sign_in(&email, &password).await?;
    let label = describe(&record);
    ctx.store.add_or_update(record, true);

    println!("Signed in as {label}");
    Ok(())
}

async fn whoami(ctx: &AppContext, remote: bool) -> Result<()> {
    let Some(identity) = ctx.store.active_identity() else {
        bail!("not signed in; run `skoolactl login`");
    };

    if remote {
        // Cached per credential; a switch invalidates the outgoing entry.
        let profile = match ctx.cache.get(&identity.user_id, "/users/me") {
            Some(cached) => serde_json::from_value(cached)?,
            None => {
                let profile = ctx.api.me().await?;
                ctx.cache
                    .put(&identity.user_id, "/users/me", serde_json::to_value(&profile)?);
                profile
            }
        };
        println!("{} <{}>", profile.name.as_deref().unwrap_or("-"), profile.email);
        if let Some(role) = profile.role.as_deref() {
            print_role(role);
        }
    } else {
        println!("{}", describe(&identity));
        if identity.is_expired(chrono::Utc::now().timestamp()) {
            println!("warning: stored credential has expired; sign in again");
        }
    }
    Ok(())
}

fn list_accounts(ctx: &AppContext) -> Result<()> {
    let identities = ctx.store.identities();
    if identities.is_empty() {
        println!("No stored accounts.");
        return Ok(());
    }

    let active = ctx.store.active_identity().map(|r| r.user_id);
    let now = chrono::Utc::now().timestamp();
    for identity in identities {
        let marker = if active.as_deref() == Some(&identity.user_id) {
            "*"
        } else {
            " "
        };
        let expiry = match identity.expires_at {
            Some(_) if identity.is_expired(now) => " (expired)".to_string(),
            Some(ts) => chrono::DateTime::from_timestamp(ts, 0)
                .map(|t| format!(" (until {})", t.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default(),
            None => String::new(),
        };
        println!("{marker} {} {}{expiry}", identity.user_id, describe(&identity));
    }
    Ok(())
}

fn switch_account(ctx: &AppContext, user_id: &str) -> Result<()> {
    let previous = ctx.store.active_identity();
    ctx.store.switch_active(user_id)?;

    // Explicit replacement for the old reload-the-page flush: drop every
    // cached response owned by the outgoing credential.
    if let Some(previous) = previous {
        ctx.cache.invalidate_user(&previous.user_id);
    }

    let identity = ctx
        .store
        .active_identity()
        .context("switched identity disappeared")?;
    println!("Now acting as {}", describe(&identity));
    Ok(())
}

fn remove_account(ctx: &AppContext, user_id: &str) -> Result<()> {
    ctx.store.remove(user_id)?;
    ctx.cache.invalidate_user(user_id);

    match ctx.store.active_identity() {
        Some(identity) => println!("Removed {user_id}; now acting as {}", describe(&identity)),
        None => println!("Removed {user_id}; no accounts remain"),
    }
    Ok(())
}

async fn logout(ctx: &AppContext, all: bool) -> Result<()> {
    if all {
        for identity in ctx.store.identities() {
            revoke_remote(ctx, &identity).await;
        }
        ctx.store.clear_all();
        ctx.cache.clear();
        println!("Signed out of all accounts.");
        return Ok(());
    }

    let Some(identity) = ctx.store.active_identity() else {
        bail!("not signed in");
    };
    revoke_remote(ctx, &identity).await;
    ctx.store.remove(&identity.user_id)?;
    ctx.cache.invalidate_user(&identity.user_id);

    match ctx.store.active_identity() {
        Some(next) => println!("Signed out; now acting as {}", describe(&next)),
        None => println!("Signed out."),
    }
    Ok(())
}

/// Server-side revocation is best-effort; the local record goes away
/// regardless.
async fn revoke_remote(ctx: &AppContext, identity: &IdentityRecord) {
    if let Err(e) = ctx.api.sign_out(&identity.token).await {
        tracing::warn!(user_id = %identity.user_id, error = %e, "remote sign-out failed");
    }
}

fn describe(identity: &IdentityRecord) -> String {
    let role = identity
        .user
        .role
        .as_deref()
        .filter(|r| rbac::is_role_name(r))
        .unwrap_or("unknown role");
    format!("{} [{role}]", identity.user.email)
}

fn print_role(role: &str) {
    match rbac::Role::from_name(role) {
        Some(role) => println!("role: {}", role.as_str()),
        None => println!("role: {role} (unrecognized)"),
    }
}
