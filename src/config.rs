use crate::error::Error;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Upstream recursive resolvers, each `host:port`.
    pub servers: Vec<String>,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "read_timeout_ms")]
    pub read_timeout: Duration,
    pub max_tries: usize,
    #[serde(default)]
    pub allow_restricted_addresses: bool,
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.servers_are_valid()?;
        Ok(conf)
    }

    pub fn try_from_str(s: &str) -> Result<Self, Error> {
        let conf: Config = serde_json::from_str(s)?;
        conf.servers_are_valid()?;
        Ok(conf)
    }

    /// Upper bound for a single lookup: every try waiting out the full read timeout.
    #[must_use]
    pub fn lookup_budget(&self) -> Duration {
        let tries = u32::try_from(self.max_tries.max(1)).unwrap_or(u32::MAX);
        self.read_timeout.saturating_mul(tries)
    }

    fn servers_are_valid(&self) -> Result<(), Error> {
        for server in &self.servers {
            match server.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
                _ => return Err(Error::InvalidServerAddr(server.clone())),
            }
        }
        Ok(())
    }
}
