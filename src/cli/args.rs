//! Command-line argument parsing

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "registry-purger")]
#[command(about = "Purge old tags and dangling manifests from a container registry, with reversible archiving")]
#[command(version, author)]
pub struct Args {
    /// Registry name or login URL
    #[arg(
        long = "registry",
        short = 'r',
        global = true,
        default_value = "",
        help = "Registry name (myregistry) or login URL (myregistry.azurecr.io)"
    )]
    pub registry: String,

    /// Registry username
    #[arg(
        long = "username",
        short = 'u',
        global = true,
        help = "Username for registry authentication"
    )]
    pub username: Option<String>,

    /// Registry password
    #[arg(
        long = "password",
        short = 'p',
        global = true,
        help = "Password for registry authentication"
    )]
    pub password: Option<String>,

    /// Bearer token
    #[arg(
        long = "token",
        global = true,
        conflicts_with_all = ["username", "password"],
        help = "Pre-issued bearer token, used instead of username and password"
    )]
    pub token: Option<String>,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        global = true,
        default_value = "300",
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: u64,

    /// Verbose output
    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        help = "Enable verbose output"
    )]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        conflicts_with = "verbose",
        help = "Only print audit lines and errors"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete tags older than a given age, then sweep dangling manifests
    Purge(PurgeArgs),
    /// Restore an archived manifest into its repository
    Unarchive(UnarchiveArgs),
}

#[derive(ClapArgs, Debug)]
pub struct PurgeArgs {
    #[arg(long = "repository", help = "Repository to purge")]
    pub repository: String,

    #[arg(
        long = "ago",
        default_value = "1d",
        help = "Tags last updated before this age are deleted, e.g. 1d, 3d12h, 30m"
    )]
    pub ago: String,

    #[arg(long = "filter", help = "Only tags whose name matches this regular expression")]
    pub filter: Option<String>,

    #[arg(long = "dangling", help = "Only sweep manifests without tags")]
    pub dangling: bool,

    #[arg(
        long = "archive-repository",
        help = "Move manifests into this repository instead of deleting them"
    )]
    pub archive_repository: Option<String>,

    #[arg(
        long = "page-size",
        default_value = "100",
        help = "Number of entries requested per listing page"
    )]
    pub page_size: usize,

    #[arg(
        long = "continue-on-error",
        help = "Log failed deletions and keep going instead of stopping the run"
    )]
    pub continue_on_error: bool,
}

#[derive(ClapArgs, Debug)]
pub struct UnarchiveArgs {
    #[arg(long = "archive-repository", help = "Repository holding the archived manifest")]
    pub archive_repository: String,

    #[arg(long = "reference", help = "Digest of the archived manifest (sha256:...)")]
    pub reference: String,

    #[arg(long = "tag-name", help = "Restore under this tag instead of the recorded ones")]
    pub tag_name: Option<String>,

    #[arg(
        long = "repository",
        help = "Restore into this repository instead of the recorded one"
    )]
    pub repository: Option<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Fill unset options from `REGISTRY_PURGER_*` environment variables
    pub fn from_env(mut self) -> Self {
        let explicit_basic = self.username.is_some() || self.password.is_some();
        if self.token.is_none() && !explicit_basic {
            self.token = std::env::var("REGISTRY_PURGER_TOKEN").ok();
        }

        if self.token.is_none() {
            if self.username.is_none() {
                self.username = std::env::var("REGISTRY_PURGER_USERNAME").ok();
            }

            if self.password.is_none() {
                self.password = std::env::var("REGISTRY_PURGER_PASSWORD").ok();
            }
        }

        if let Ok(timeout) = std::env::var("REGISTRY_PURGER_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout = t;
            }
        }

        if std::env::var("REGISTRY_PURGER_VERBOSE").is_ok() && !self.quiet {
            self.verbose = true;
        }

        if std::env::var("REGISTRY_PURGER_SKIP_TLS").is_ok() {
            self.skip_tls = true;
        }

        self
    }
}
