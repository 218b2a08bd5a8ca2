use clap::Parser;

/// Trace where an IPv4 address lives.
///
/// Prompts for an address (blank means your own public IP), looks it up with
/// a geolocation service and prints what it finds. Every option has a
/// default, so running with no arguments is the normal way to use it.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// Geolocation endpoint; the target IP is appended as a path segment
    #[arg(long, env = "IP_TRACER_GEO_URL", default_value = "http://ip-api.com/json")]
    pub geo_url: String,

    /// Endpoint answering with the caller's public IP as `{"ip": "..."}`
    #[arg(
        long,
        env = "IP_TRACER_PUBLIC_IP_URL",
        default_value = "https://api.ipify.org?format=json"
    )]
    pub public_ip_url: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "IP_TRACER_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error)
    #[arg(long, env = "IP_TRACER_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "IP_TRACER_LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    /// Keep the scrollback instead of clearing the screen before each trace
    #[arg(long, env = "IP_TRACER_NO_CLEAR", default_value_t = false)]
    pub no_clear: bool,
}
