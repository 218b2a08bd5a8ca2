//! Process lifecycle: tracing init, wiring, and the trace session.

use tracing::info;

use crate::config::Config;
use crate::display::Terminal;
use crate::net::GeoClient;
use crate::session::Session;

/// Run the tool after config has been parsed.
pub async fn run(config: Config) -> anyhow::Result<()> {
    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        geo_url = %config.geo_url,
        public_ip_url = %config.public_ip_url,
        timeout_secs = config.timeout,
        "ip-tracer starting"
    );

    let client = GeoClient::new(&config)?;
    let terminal = Terminal::stdio(!config.no_clear);

    Session::new(client, terminal).run().await?;
    Ok(())
}

/// Diagnostics go to stderr so they never interleave with the prompts and
/// tables on stdout.
fn init_tracing(config: &Config) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
