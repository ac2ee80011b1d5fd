//! `mailgate` - headless driver for the mail client's login and session flow.
//!
//! Each command is one user action against the auth gate: check the stored
//! session, log in through a browser surface, log out, or ask where a route
//! would land.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod browser;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mailgate_core::{AuthGate, AuthState, Backend, BackendKind, Route, RouteGuard, SERVICE_NAME};
use mailgate_login::{CompletionDetector, DetectorAction, ExternalBrowserLogin, LoginForm};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::Settings;

#[derive(Parser)]
#[command(name = "mailgate")]
#[command(version)]
#[command(about = "Login and session driver for the mailgate mail client")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the session storage backend (keyring, file, memory)
    #[arg(long, value_name = "KIND")]
    backend: Option<BackendKind>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show the stored session and where the app would open
    Status,
    /// Log in through the identity provider
    Login {
        /// Email to log in as
        #[arg(short, long)]
        email: Option<String>,

        /// Password; when given, the form must be complete
        #[arg(short, long)]
        password: Option<String>,

        /// Browser surface to use
        #[arg(long, value_enum, default_value_t = Surface::Embedded)]
        browser: Surface,
    },
    /// Log out and clear the stored session
    Logout,
    /// Show which screen a route path would display
    Route {
        /// Router path, e.g. `/(tabs)/profile`
        path: String,
    },
    /// Print the effective settings
    Config {
        /// Also write them to the settings file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Surface {
    /// Navigation URLs are read from stdin, one per line
    Embedded,
    /// Open the system browser and confirm manually
    External,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailgate=info,mailgate_core=debug,mailgate_login=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(settings::default_path);
    let mut settings = settings::load_settings(&config_path).await?;
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }

    if let Command::Config { write } = cli.command {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        if write {
            settings::save_settings(&settings, &config_path).await?;
        }
        return Ok(());
    }

    let backend = Backend::from_kind(settings.backend, SERVICE_NAME, settings.session_file());
    info!("Using {:?} session storage", backend.kind());
    let gate = AuthGate::start(backend).await;

    match cli.command {
        Command::Status => status(&gate),
        Command::Login {
            email,
            password,
            browser,
        } => login(&gate, &settings, email, password, browser).await,
        Command::Logout => logout(&gate).await,
        Command::Route { path } => route(&gate, &path),
        Command::Config { .. } => Ok(()),
    }
}

fn status(gate: &AuthGate<Backend>) -> Result<()> {
    match gate.state() {
        AuthState::Authenticated(user) => println!("Logged in as {} ({})", user.name, user.email),
        AuthState::Unauthenticated => println!("Not logged in"),
        AuthState::Loading => println!("Session state unknown"),
    }
    let mut guard = RouteGuard::new(Route::DEFAULT_PROTECTED);
    guard.on_state_change(&gate.state());
    println!("Start screen: {}", guard.current());
    Ok(())
}

fn route(gate: &AuthGate<Backend>, path: &str) -> Result<()> {
    let Some(requested) = Route::parse(path) else {
        bail!("unknown route: {path}");
    };
    let mut guard = RouteGuard::new(requested.clone());
    match guard.on_state_change(&gate.state()) {
        Some(target) => println!("{requested} -> {target}"),
        None => println!("{requested}"),
    }
    Ok(())
}

async fn login(
    gate: &AuthGate<Backend>,
    settings: &Settings,
    email: Option<String>,
    password: Option<String>,
    surface: Surface,
) -> Result<()> {
    if let Some(user) = gate.user() {
        println!("Already logged in as {}", user.email);
        return Ok(());
    }

    let form = LoginForm::new(email.unwrap_or_default(), password.clone().unwrap_or_default());
    if password.is_some() {
        form.validate().map_err(mailgate_login::Error::from)?;
    }
    let email = form.handoff_email(settings.fallback_email.as_deref());

    let mut guard = RouteGuard::new(Route::Login);
    let mut state = gate.subscribe();
    guard.sync(&mut state);

    let logged_in = match surface {
        Surface::Embedded => embedded_login(gate, settings, &email).await,
        Surface::External => external_login(gate, settings, &email).await?,
    };

    if logged_in {
        if let Some(target) = guard.sync(&mut state) {
            println!("Opening {target}");
        }
    } else {
        println!("Login cancelled");
    }
    Ok(())
}

async fn embedded_login(gate: &AuthGate<Backend>, settings: &Settings, email: &str) -> bool {
    let mut detector = CompletionDetector::new(gate, settings.provider.clone(), email);
    let mut events = browser::spawn_reader(tokio::io::stdin());

    loop {
        println!("Browser opened on {}", detector.begin_attempt());
        println!("Enter navigated URLs, `error <text>` or `dismiss`:");

        let outcome = detector
            .run(&mut events, |action| match action {
                DetectorAction::LoggedIn { email } => println!("Logged in as {email}"),
                DetectorAction::HandoffFailed { error } => {
                    eprintln!("Login failed, please try again: {error}");
                }
                DetectorAction::LoadFailed { description } => {
                    eprintln!("Login page failed to load: {description}");
                }
                DetectorAction::Cancelled => println!("Browser closed"),
                DetectorAction::Busy | DetectorAction::Ignored | DetectorAction::Pending => {}
            })
            .await;

        match outcome {
            Some(DetectorAction::HandoffFailed { .. }) => {}
            outcome => return matches!(outcome, Some(DetectorAction::LoggedIn { .. })),
        }
    }
}

async fn external_login(
    gate: &AuthGate<Backend>,
    settings: &Settings,
    email: &str,
) -> Result<bool> {
    let mut flow = ExternalBrowserLogin::new(settings.provider.clone(), email);
    let url = flow.begin_attempt().clone();

    if let Err(e) = opener::open(url.as_str()) {
        warn!("Could not open browser: {e}");
        println!("Open {url} in your browser.");
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("Log in in the browser, then press Enter (or type `cancel`):");
        let answer = browser::read_answer(&mut input)
            .await
            .context("reading confirmation")?;
        match answer.as_deref() {
            None | Some("cancel") => {
                flow.cancel();
                return Ok(false);
            }
            Some(_) => match flow.confirm(gate).await {
                Ok(confirmed) => return Ok(confirmed || gate.is_authenticated()),
                Err(e) => eprintln!("Login failed, please try again: {e}"),
            },
        }
    }
}

async fn logout(gate: &AuthGate<Backend>) -> Result<()> {
    gate.logout().await?;
    let mut guard = RouteGuard::new(Route::Profile);
    if let Some(target) = guard.on_state_change(&gate.state()) {
        println!("Logged out, opening {target}");
    }
    Ok(())
}
