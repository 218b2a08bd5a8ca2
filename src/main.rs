mod app;
mod config;
mod display;
mod error;
mod ip;
mod net;
mod report;
mod session;

use clap::Parser;

use config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    app::run(config).await
}
