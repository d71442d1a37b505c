//! Client entry-point: loads settings, wires adapters and runs one command.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use client::ClientSettings;
use client::domain::ports::NoticeSink;
use client::domain::Notice;
use client::inbound::cli::{self, Cli};
use client::inbound::{App, AppPorts};
use client::outbound::identity::RestIdentityClient;
use client::outbound::object_storage::{Presigner, S3Credentials, S3ObjectStorage};
use client::outbound::payment::{SimulatedPaymentGateway, TokioSleeper};
use client::outbound::storage::DirectorySlotStorage;

/// Notices go to the log; command output reports them as well.
struct LoggingNoticeSink;

impl NoticeSink for LoggingNoticeSink {
    fn show(&self, notice: &Notice) {
        warn!(reason = %notice.reason, message = %notice.message, "navigation notice");
    }
}

fn compose(settings: &ClientSettings) -> Result<App> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let session_dir = settings.session_dir();
    let slots = DirectorySlotStorage::open(&session_dir)
        .wrap_err_with(|| format!("opening session directory {}", session_dir.display()))?;
    let mut ports = AppPorts::with_fixtures(Arc::new(slots), clock.clone());
    let timeout = settings.http_timeout();

    if let Some((base, api_key)) = settings.identity()? {
        let identity = Arc::new(
            RestIdentityClient::new(base, api_key, timeout)
                .wrap_err("building identity client")?,
        );
        ports.identity = identity.clone();
        ports.profiles = identity;
    } else {
        info!("identity service not configured; using fixtures");
    }

    if let Some(storage) = settings.storage()? {
        let presigner = Presigner::new(
            storage.endpoint,
            storage.bucket,
            storage.region,
            S3Credentials::new(storage.access_key, storage.secret_key),
        );
        ports.objects = Arc::new(
            S3ObjectStorage::new(presigner, clock.clone(), timeout)
                .wrap_err("building object storage client")?,
        );
    } else {
        info!("object storage not configured; using in-memory store");
    }

    ports.payments = Arc::new(
        SimulatedPaymentGateway::new(Arc::new(TokioSleeper), clock)
            .with_delay(settings.payment_delay()),
    );
    ports.notices = Arc::new(LoggingNoticeSink);

    Ok(App::new(ports).with_signed_url_ttl(settings.signed_url_ttl()))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = Cli::parse();
    let settings = ClientSettings::load_from_iter([OsString::from("client")])
        .wrap_err("loading client settings")?;
    let app = compose(&settings)?;

    let mut stdout = io::stdout().lock();
    cli::run(&app, args.command, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}
