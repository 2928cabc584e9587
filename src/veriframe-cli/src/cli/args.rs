//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use veriframe_common::CredentialsStoreMode;

use super::styles::{AFTER_HELP, get_styles};

/// Log level for tracing output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Color output mode for CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if output is a terminal
    #[default]
    Auto,
    /// Always output with colors
    Always,
    /// Never output with colors
    Never,
}

/// Credential backend selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    File,
    Keyring,
    Memory,
}

impl From<StoreArg> for CredentialsStoreMode {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::File => CredentialsStoreMode::File,
            StoreArg::Keyring => CredentialsStoreMode::Keyring,
            StoreArg::Memory => CredentialsStoreMode::Memory,
        }
    }
}

/// Veriframe - image provenance and deepfake detection client
#[derive(Debug, Parser)]
#[command(name = "veriframe")]
#[command(author, version)]
#[command(about = "Veriframe - image provenance and deepfake detection client", long_about = None)]
#[command(styles = get_styles(), after_help = AFTER_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Use debug log level (same as --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Log verbosity (default: warn, or VERIFRAME_LOG when set)
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// When to use colored output
    #[arg(long = "color", value_enum, global = true, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Tracing filter directive: `-v`, then `--log-level`, then the
    /// `VERIFRAME_LOG` value, then the default level.
    pub fn log_directive(&self, env_value: Option<&str>) -> String {
        if self.verbose {
            return LogLevel::Debug.as_filter_str().to_string();
        }
        if let Some(level) = self.log_level {
            return level.as_filter_str().to_string();
        }
        match env_value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => LogLevel::from_str_loose(value)
                .map(|level| level.as_filter_str().to_string())
                .unwrap_or_else(|| value.to_string()),
            None => LogLevel::default().as_filter_str().to_string(),
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// API base URL (overrides config.toml and VERIFRAME_API_URL)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Application home directory (default: ~/.veriframe)
    #[arg(long = "home", global = true, env = "VERIFRAME_HOME")]
    pub home: Option<PathBuf>,

    /// Where to keep credentials
    #[arg(long = "store", value_enum, global = true)]
    pub store: Option<StoreArg>,

    /// Print results as JSON
    #[arg(long = "json", global = true)]
    pub json: bool,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and store the session tokens
    Login(LoginArgs),

    /// Create an account (does not sign in)
    Register(RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Upload an image for duplicate and deepfake detection
    Upload(UploadArgs),

    /// List, download and delete images
    #[command(subcommand)]
    Images(ImagesCommand),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account name
    #[arg(short, long)]
    pub username: String,

    /// Password (prompted for when omitted)
    #[arg(short, long, env = "VERIFRAME_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long = "password-stdin", conflicts_with = "password")]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub email: Option<String>,

    /// Password (prompted for when omitted)
    #[arg(short, long, env = "VERIFRAME_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long = "password-stdin", conflicts_with = "password")]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Image file to upload
    pub file: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum ImagesCommand {
    /// Images you uploaded
    Mine,

    /// All images (admin)
    All(AdminFilterArgs),

    /// Verified images
    Verified,

    /// Download an image file
    Fetch(FetchArgs),

    /// Delete an image (admin)
    Delete(DeleteArgs),

    /// Print the file URL of an image
    Url {
        id: i64,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct AdminFilterArgs {
    /// Only images uploaded by this user
    #[arg(long = "uploaded-by")]
    pub uploaded_by: Option<String>,

    /// Only images with this label (Real or Fake)
    #[arg(long = "label")]
    pub deepfake_label: Option<String>,

    /// Filter on verification status
    #[arg(long = "verified")]
    pub is_verified: Option<bool>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    pub id: i64,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: i64,
}
