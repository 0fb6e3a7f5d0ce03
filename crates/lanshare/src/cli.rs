use clap::Parser;
use fileserver::ServerConfig;

/// Share files with devices on the local network over HTTP
#[derive(Debug, Parser)]
#[command(name = "lanshare", version, about)]
pub struct Cli {
    /// Address to listen on (overrides LANSHARE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides LANSHARE_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Files to share right away
    pub files: Vec<String>,
}

impl Cli {
    /// Apply command-line overrides on top of `base`
    pub fn server_config(&self, base: ServerConfig) -> ServerConfig {
        ServerConfig {
            host: self.host.clone().unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
        }
    }
}
