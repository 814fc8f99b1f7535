//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cogni CLI - terminal client for the Cogni API
#[derive(Parser, Debug)]
#[command(name = "cogni")]
#[command(version)]
#[command(about = "Authenticated client for the Cogni API", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./cogni.toml when present)
    #[arg(short, long, env = "COGNI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend URL (e.g., http://localhost:5000), overriding configuration
    #[arg(short = 'u', long = "url")]
    pub base_url: Option<String>,

    /// Cookie jar holding the session credentials
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,

    /// Keep credentials in memory for this invocation only
    #[arg(long, conflicts_with = "cookie_file")]
    pub ephemeral: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the stored session state
    Status,

    /// Sign in with email and password
    Login {
        /// Account email
        email: String,
        /// Account password
        #[arg(long, env = "COGNI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and clear stored credentials
    Logout,

    /// Print the signed-in user
    Me,

    /// Send an authenticated GET request
    Get {
        /// Path relative to the base URL, or an absolute URL
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },

    /// Send an authenticated POST request with a JSON body
    Post {
        /// Path relative to the base URL
        path: String,
        /// JSON body
        #[arg(default_value = "{}")]
        body: String,
    },

    /// Send an authenticated PUT request with a JSON body
    Put {
        /// Path relative to the base URL
        path: String,
        /// JSON body
        #[arg(default_value = "{}")]
        body: String,
    },

    /// Send an authenticated DELETE request
    Delete {
        /// Path relative to the base URL
        path: String,
    },

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Create an account
    Register {
        /// Given name
        #[arg(long)]
        first_name: String,
        /// Family name
        #[arg(long)]
        last_name: String,
        /// Public handle
        #[arg(long)]
        username: String,
        /// Contact email
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long, env = "COGNI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Request a password reset email
    ForgotPassword {
        /// Account email
        email: String,
    },

    /// Set a new password with the token from a reset email
    ResetPassword {
        /// Token from the reset link
        token: String,
        /// New password
        #[arg(long, env = "COGNI_PASSWORD", hide_env_values = true)]
        password: String,
        /// New password again (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Confirm an email address with the token from the verification email
    VerifyEmail {
        /// Token from the verification link
        token: String,
    },

    /// Send the verification email again
    ResendVerification {
        /// Account email
        email: String,
    },

    /// Print the social login URL for a provider
    SocialUrl {
        /// Identity provider
        #[arg(default_value = "google")]
        provider: String,
    },

    /// Finish a social login from the callback URL the browser landed on
    OauthCallback {
        /// Full callback URL including the query string
        url: String,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_query_pairs() {
        let cli = Cli::try_parse_from(["cogni", "get", "/api/projects", "-q", "page=2", "-q", "q=a=b"])
            .map_err(|e| e.to_string());
        let Ok(Cli {
            command: Command::Get { path, query },
            ..
        }) = cli
        else {
            panic!("expected a get command");
        };
        assert_eq!(path, "/api/projects");
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_query_pairs() {
        assert!(Cli::try_parse_from(["cogni", "get", "/x", "-q", "novalue"]).is_err());
    }

    #[test]
    fn reset_password_takes_an_optional_confirmation() {
        let cli = Cli::try_parse_from([
            "cogni",
            "reset-password",
            "rst-1",
            "--password",
            "Analytic5!",
        ]);
        let Ok(Cli {
            command:
                Command::ResetPassword {
                    token,
                    confirm_password,
                    ..
                },
            ..
        }) = cli
        else {
            panic!("expected a reset-password command");
        };
        assert_eq!(token, "rst-1");
        assert_eq!(confirm_password, None);
    }

    #[test]
    fn ephemeral_conflicts_with_cookie_file() {
        let result = Cli::try_parse_from(["cogni", "--ephemeral", "--cookie-file", "jar.json", "status"]);
        assert!(result.is_err());
    }
}
