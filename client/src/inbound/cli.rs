//! Command-line surface.
//!
//! One process run is one page lifetime: the session is bootstrapped from
//! the persisted slots, the command runs, and the process exits.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use clap::{Parser, Subcommand};

use super::app::App;
use super::navigator::{NavigationError, NavigationOutcome};
use crate::domain::ports::ObjectKey;
use crate::domain::{
    AssetFile, Error, ItemId, Location, LocationError, LoginCredentials, LoginValidationError,
    PurchaseOutcome, SignUpForm,
};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Materials marketplace client.
#[derive(Debug, Parser)]
#[command(name = "client", version, about)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Client commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Navigate to an in-app path, e.g. `/profile` or `/admin`.
    Navigate {
        /// Target path with optional query and fragment.
        path: String,
    },
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        occupation: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },
    /// Sign out and return to the home page.
    Logout,
    /// Show the current identity and entitlements.
    Whoami,
    /// Buy a catalogue item.
    Buy {
        /// Item identifier.
        item: String,
        /// Card number; separators are allowed.
        #[arg(long)]
        card: String,
    },
    /// Upload an asset file.
    Upload {
        /// Local file to upload.
        file: PathBuf,
        /// Destination folder inside the bucket.
        #[arg(long)]
        folder: Option<String>,
        /// MIME type; guessed from the extension when omitted.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Print a signed download link for an object key.
    Sign {
        /// Object key, e.g. `zips/1700000000000-oak.zip`.
        key: String,
    },
}

/// Failures reported by a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A use-case service refused the request.
    #[error("{}: {}", .0.code(), .0.message())]
    Domain(#[from] Error),
    /// Navigation did not settle.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    /// The navigation target was malformed.
    #[error(transparent)]
    Location(#[from] LocationError),
    /// A credential or form field was invalid.
    #[error(transparent)]
    Validation(#[from] LoginValidationError),
    /// An argument was invalid.
    #[error("{0}")]
    Argument(String),
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Run `command` against `app`, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns a [`CliError`] when the command fails; partial output may already
/// have been written.
pub async fn run<W: Write>(app: &App, command: Command, out: &mut W) -> Result<(), CliError> {
    // A failed bootstrap is logged by `settle`; the run continues signed out.
    let _ = app.session.settle().await;

    match command {
        Command::Navigate { path } => {
            let outcome = app.navigator.navigate(Location::parse(&path)?).await?;
            write_navigation(out, &outcome)?;
        }
        Command::Login { email, password } => {
            let credentials = LoginCredentials::try_from_parts(&email, &password)?;
            let user = app.auth.sign_in(&credentials).await?;
            writeln!(
                out,
                "signed in as {} ({}, {})",
                user.name().unwrap_or(user.email()),
                user.email(),
                user.role()
            )?;
        }
        Command::Register {
            email,
            password,
            full_name,
            occupation,
            company,
        } => {
            let credentials = LoginCredentials::try_from_parts(&email, &password)?;
            let form = SignUpForm::try_new(
                credentials,
                &full_name,
                occupation.as_deref(),
                company.as_deref(),
            )?;
            let registration = app.auth.register(&form).await?;
            if registration.signed_in {
                writeln!(out, "registered and signed in as {}", registration.user.email())?;
            } else {
                writeln!(
                    out,
                    "registered {}; confirm your email, then log in",
                    registration.user.email()
                )?;
            }
        }
        Command::Logout => {
            let signed_out = app.auth.sign_out().await?;
            if let Some(err) = &signed_out.store_error {
                writeln!(out, "warning: saved session was not removed ({err})")?;
            }
            let location = app.navigator.complete_sign_out(signed_out);
            writeln!(out, "signed out; now at {location}")?;
        }
        Command::Whoami => write_identity(app, out)?,
        Command::Buy { item, card } => {
            let item = ItemId::new(&item).map_err(|err| CliError::Argument(err.to_string()))?;
            match app.checkout.purchase(item.clone(), &card).await? {
                PurchaseOutcome::AlreadyOwned => writeln!(out, "{item} is already owned")?,
                PurchaseOutcome::Purchased(receipt) => writeln!(
                    out,
                    "purchased {item} (transaction {}, {})",
                    receipt.transaction_id,
                    receipt.paid_at.to_rfc3339()
                )?,
            }
        }
        Command::Upload {
            file,
            folder,
            content_type,
        } => {
            let asset = read_asset(&file, content_type)?;
            let key = app.assets.upload(asset, folder.as_deref()).await?;
            writeln!(out, "uploaded {key}")?;
        }
        Command::Sign { key } => {
            let key = ObjectKey::new(key).map_err(|err| CliError::Argument(err.to_string()))?;
            let signed = app.assets.download_link(&key).await?;
            writeln!(out, "{}", signed.url)?;
            writeln!(out, "expires {}", signed.expires_at.to_rfc3339())?;
        }
    }
    Ok(())
}

fn write_navigation<W: Write>(out: &mut W, outcome: &NavigationOutcome) -> io::Result<()> {
    for notice in &outcome.notices {
        writeln!(out, "notice: {}", notice.message)?;
    }
    for redirect in &outcome.redirects {
        writeln!(
            out,
            "redirected from {} to {} ({})",
            redirect.from, redirect.to, redirect.reason
        )?;
    }
    writeln!(out, "at {}", outcome.location)
}

fn write_identity<W: Write>(app: &App, out: &mut W) -> io::Result<()> {
    let Some(user) = app.session.user() else {
        return writeln!(out, "{} (not signed in)", app.session.display_name());
    };
    writeln!(
        out,
        "{} <{}> role={}",
        app.session.display_name(),
        user.email(),
        user.role()
    )?;
    let owned = app.session.entitlements().sorted();
    if owned.is_empty() {
        writeln!(out, "no purchases this session")
    } else {
        let owned: Vec<String> = owned.iter().map(ToString::to_string).collect();
        writeln!(out, "owned: {}", owned.join(", "))
    }
}

fn read_asset(path: &Path, content_type: Option<String>) -> Result<AssetFile, CliError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::Argument(format!("{} is not a file path", path.display())))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let bytes = dir.read(name)?;
    Ok(AssetFile {
        name: name.to_owned(),
        content_type: content_type.unwrap_or_else(|| guess_content_type(name).to_owned()),
        bytes,
    })
}

fn guess_content_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("exr") => "image/x-exr",
        Some("json") => "application/json",
        _ => FALLBACK_CONTENT_TYPE,
    }
}
