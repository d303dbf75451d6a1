//! Connection settings shared by every subcommand.
//!
//! A named profile from `~/.prettysync/connections.yaml` supplies defaults;
//! explicit flags (or their `PRETTYSYNC_*` variables) override it.

use anyhow::{bail, Context, Result};
use clap::Args;

use prettysync_adt::AdtConfig;
use prettysync_core::config::{self, ConnectionProfile};
use prettysync_core::{Discovery, ObjectDescriptor, TransportError};

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Profile name in ~/.prettysync/connections.yaml.
    #[arg(long, env = "PRETTYSYNC_CONNECTION")]
    pub connection: Option<String>,

    /// Server root, e.g. https://dev.example.com:44300.
    #[arg(long, env = "PRETTYSYNC_URL")]
    pub url: Option<String>,

    #[arg(long, env = "PRETTYSYNC_USER")]
    pub user: Option<String>,

    #[arg(long, env = "PRETTYSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Logon client (sap-client).
    #[arg(long, env = "PRETTYSYNC_CLIENT")]
    pub client: Option<String>,

    /// Logon language (sap-language).
    #[arg(long, env = "PRETTYSYNC_LANGUAGE")]
    pub language: Option<String>,
}

impl ConnectionArgs {
    /// Merge the selected profile with explicit settings.
    pub fn resolve(&self) -> Result<AdtConfig> {
        let profile = match &self.connection {
            Some(name) => config::load()
                .context("failed to load connection profiles")?
                .profile(name)?
                .clone(),
            None => ConnectionProfile::default(),
        };
        merge(profile, self)
    }
}

fn merge(profile: ConnectionProfile, args: &ConnectionArgs) -> Result<AdtConfig> {
    let url = args.url.clone().unwrap_or(profile.url);
    let user = args.user.clone().unwrap_or(profile.user);
    if url.is_empty() {
        bail!("no server url: pass --url, set PRETTYSYNC_URL or pick a --connection");
    }
    if user.is_empty() {
        bail!("no user: pass --user, set PRETTYSYNC_USER or pick a --connection");
    }
    let password = args
        .password
        .clone()
        .or(profile.password)
        .context("no password: pass --password or set PRETTYSYNC_PASSWORD")?;

    let mut config = AdtConfig::new(url, user, password);
    config.client = args.client.clone().or(profile.client);
    config.language = args.language.clone().or(profile.language);
    Ok(config)
}

/// Stands in for live discovery when no connection could be resolved.
///
/// Manifest listings never reach it; queries fail with the resolution error.
pub struct Unconnected {
    reason: String,
}

impl Unconnected {
    pub fn new(err: &anyhow::Error) -> Self {
        Self {
            reason: format!("{err:#}"),
        }
    }
}

impl Discovery for Unconnected {
    fn list(
        &self,
        _object_type: &str,
        _name: &str,
        _recursive: bool,
        _progress: &mut dyn FnMut(&str),
    ) -> Result<Vec<ObjectDescriptor>, TransportError> {
        Err(TransportError::Connection(self.reason.clone()))
    }
}
