use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args {
    /// The address rosterd should listen on. By default
    /// rosterd will listen just on the IPv4 loopback.
    #[arg(short, long)]
    address: Option<String>,

    /// The port rosterd listens on.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// The credential file: a JSON object keyed by username,
    /// holding a password and role for each account.
    #[arg(short, long, default_value = "users.json")]
    users: PathBuf,

    /// Directory served under /static, holding the web client.
    #[arg(short, long, default_value = "static")]
    static_dir: PathBuf,
}

impl Args {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse()
            .map(|addr: IpAddr| (addr, self.port).into())
    }

    pub fn users_file(&self) -> &Path {
        &self.users
    }

    pub fn static_dir(&self) -> PathBuf {
        self.static_dir.clone()
    }
}
