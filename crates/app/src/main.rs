//! Cogni API Client - command line entry point
//!
//! Loads configuration, wires the client to the reqwest transport and the
//! cookie file, and runs one subcommand.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cogni_application::ports::{Clock, CredentialStore};
use cogni_application::{ApiClient, ApiError};
use cogni_domain::{ApiRequest, ApiResponse, PasswordReset, RegistrationForm, SocialProvider};
use cogni_infrastructure::{
    FileCredentialStore, LoggingNavigator, MemoryCredentialStore, ReqwestTransport, SystemClock,
    init_tracing, load_config,
};
use url::Url;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(cookie_file) = cli.cookie_file {
        config.cookie_file = Some(cookie_file);
    }
    if config.cookie_file.is_none() && !cli.ephemeral {
        config.cookie_file = default_cookie_file();
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let store: Arc<dyn CredentialStore> = match (&config.cookie_file, cli.ephemeral) {
        (Some(path), false) => Arc::new(
            FileCredentialStore::open(path, Arc::clone(&clock))
                .with_context(|| format!("opening cookie file {}", path.display()))?,
        ),
        _ => Arc::new(MemoryCredentialStore::new(Arc::clone(&clock))),
    };
    let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);
    let navigator = Arc::new(LoggingNavigator::new());

    let client = ApiClient::new(config, transport, store, clock, navigator.clone())
        .context("building API client")?;

    let outcome = execute(&client, cli.command).await;

    if let Some(route) = navigator.last_route() {
        eprintln!("Session ended (redirect to {route}). Run `cogni login` to sign in again.");
    }

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(api) => report(api),
                None => eprintln!("error: {e:#}"),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn execute(client: &ApiClient, command: Command) -> Result<()> {
    let session = client.session();
    match command {
        Command::Status => {
            let status = session.status();
            println!("{}", status.display_message());
            println!("Refresh: {:?}", client.coordinator().state());
            if let Some(path) = &client.config().cookie_file {
                println!("Cookie file: {}", path.display());
            }
        }
        Command::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("Signed in as {}", user.display_name());
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out");
        }
        Command::Me => {
            let user = session.current_user().await?;
            print_json(&serde_json::to_value(&user).unwrap_or_default());
        }
        Command::Get { path, query } => {
            let request = query
                .into_iter()
                .fold(ApiRequest::get(path), |r, (k, v)| r.with_query(k, v));
            print_response(&client.execute(request).await?);
        }
        Command::Post { path, body } => {
            let body = parse_body(&body)?;
            print_response(&client.post(&path, body).await?);
        }
        Command::Put { path, body } => {
            let body = parse_body(&body)?;
            print_response(&client.put(&path, body).await?);
        }
        Command::Delete { path } => {
            print_response(&client.delete(&path).await?);
        }
        Command::Refresh => {
            client.coordinator().refresh().await?;
            println!("Access token refreshed");
        }
        Command::Register {
            first_name,
            last_name,
            username,
            email,
            password,
        } => {
            let form = RegistrationForm {
                first_name,
                last_name,
                username,
                email,
                confirm_password: password.clone(),
                password,
            };
            session.register(&form).await?;
            println!("Registered. Check your inbox to verify your email before signing in.");
        }
        Command::ForgotPassword { email } => {
            println!("{}", session.forgot_password(&email).await?);
        }
        Command::ResetPassword {
            token,
            password,
            confirm_password,
        } => {
            let reset = PasswordReset {
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            println!("{}", session.reset_password(&token, &reset).await?);
        }
        Command::VerifyEmail { token } => {
            println!("{}", session.verify_email(&token).await?);
        }
        Command::ResendVerification { email } => {
            println!("{}", session.resend_verification(&email).await?);
        }
        Command::SocialUrl { provider } => {
            let provider: SocialProvider = provider.parse()?;
            println!("{}", session.social_login_url(provider)?);
        }
        Command::OauthCallback { url } => {
            let url = Url::parse(&url).context("parsing callback URL")?;
            let user = session.complete_oauth_callback(&url).await?;
            println!("Signed in as {}", user.display_name());
        }
    }
    Ok(())
}

fn default_cookie_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("cogni").join("cookies.json"))
}

fn parse_body(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).context("request body is not valid JSON")
}

fn print_response(response: &ApiResponse) {
    match response.json::<serde_json::Value>() {
        Ok(value) => print_json(&value),
        Err(_) => println!("{}", response.text()),
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

fn report(error: &ApiError) {
    eprintln!("error: {error}");
    if let ApiError::Validation(errors) = error {
        for (field, message) in errors.iter() {
            eprintln!("  {field}: {message}");
        }
    }
    if let Some(response) = error.response() {
        let body = response.text();
        if !body.is_empty() {
            eprintln!("{body}");
        }
    }
}
