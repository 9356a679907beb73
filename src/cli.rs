//! Command-line interface for the clerk-guard probe tool
//!
//! The binary is an operator tool for exercising the retrying client against a
//! live instance: fetch a single user or organization, or hammer `getUser` with
//! rounds of concurrent calls to watch rate limiting and retries happen.
//!
//! Connection settings come from the environment (`CLERK_SECRET_KEY`,
//! `CLERK_API_URL`, `CLERK_API_VERSION`, optionally via a `.env` file); retry
//! settings and the observer come from the flags below.

use clap::{Parser, Subcommand, ValueEnum};

use crate::retry::RetryPolicy;

/// Main command-line interface structure
///
/// Global options apply to all subcommands.
///
/// # Examples
///
/// ```
/// use clap::Parser;
/// use clerk_guard::cli::{Cli, Commands};
///
/// let cli = Cli::try_parse_from(["clerk-guard", "get-user", "--user-id", "user_1"]).unwrap();
/// assert!(matches!(cli.command, Commands::GetUser { .. }));
/// assert_eq!(cli.retry_policy().max_attempts, 32);
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "clerk-guard",
    about = "Retrying, observable client for Clerk user and organization management",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Where lifecycle events of each call are reported
    #[arg(short = 'o', long, value_enum, default_value = "console", global = true)]
    pub observer: ObserverKind,

    /// Total attempts per call, including the first
    #[arg(
        long,
        default_value = "32",
        global = true,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[arg(long, default_value = "1000", global = true)]
    pub min_delay_ms: u64,

    /// Upper bound for any retry delay in milliseconds
    #[arg(long, default_value = "5000", global = true)]
    pub max_delay_ms: u64,

    /// Per-request timeout in milliseconds for HTTP operations
    #[arg(short = 't', long, default_value = "10000", global = true)]
    pub timeout_ms: u64,
}

impl Cli {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_min_delay_ms(self.min_delay_ms)
            .with_max_delay_ms(self.max_delay_ms)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ObserverKind {
    /// Discard events
    None,
    /// One JSON line per event on stdout
    Console,
    /// Route events through the tracing log
    Tracing,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch one user by id
    GetUser {
        #[arg(short, long)]
        user_id: String,
    },
    /// Fetch one organization by id or slug
    GetOrganization {
        #[arg(short = 'g', long)]
        organization_id: String,
    },
    /// Run rounds of concurrent getUser calls against one user
    ///
    /// Each round starts `concurrency` calls at once and waits for all of
    /// them before starting the next. Results and errors are printed as
    /// they arrive.
    Probe {
        #[arg(short, long)]
        user_id: String,

        /// Number of sequential rounds
        #[arg(short, long, default_value = "10")]
        rounds: usize,

        /// Calls started at once in each round
        #[arg(short, long, default_value = "20")]
        concurrency: usize,
    },
}
