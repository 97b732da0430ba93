// # noipd - No-IP update client
//
// This binary is a THIN integration layer: every decision about when to call
// the update API and what its answer means lives in noip-core. noipd only:
// 1. Reads configuration from environment variables and secret files
// 2. Initializes logging and the runtime
// 3. Wires the HTTP IP source, the No-IP provider and the file records
// 4. Runs one pass and maps its outcome to an exit code
//
// Scheduling is external (cron, systemd timer). Passes sharing the same
// records must not overlap.
//
// ## Configuration
//
// ### Credentials
// - `NOIP_USERNAME`: Account username, else the contents of
//   `NOIP_USERNAME_FILE` (default `/run/secrets/noip-username`)
// - `NOIP_PASSWORD`: Account password, else the contents of
//   `NOIP_PASSWORD_FILE` (default `/run/secrets/noip-password`)
//
// ### Update
// - `NOIP_HOSTS`: Comma-separated list of hostnames to update
// - `NOIP_IP_RESOLVER_URL`: "What is my IP" service
// - `NOIP_UPDATE_URL`: Update endpoint
// - `NOIP_USER_AGENT`: User agent sent to the update endpoint
//
// ### Records
// - `NOIP_IP_CACHE_PATH`: Last reported IP (default `/tmp/ip.noipy`)
// - `NOIP_QUARANTINE_PATH`: Quarantine record (default `/tmp/quarantine.noipy`)
// - `NOIP_SERVER_ERROR_QUARANTINE_MINS`: Quarantine after a server error (default 45)
//
// ### Other
// - `NOIP_CONFIG_FILE`: JSON file with the same settings; environment wins
// - `NOIP_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export NOIP_USERNAME=me@example.com
// export NOIP_PASSWORD_FILE=/run/secrets/noip-password
// export NOIP_HOSTS=home.example.net,nas.example.net
//
// noipd
// ```

use anyhow::{Context, Result};
use clap::Parser;
use noip_core::config::StorageConfig;
use noip_core::{
    Clock, EngineStatus, FileSlot, IpCache, NoipConfig, Outcome, QuarantineStatus,
    QuarantineStore, RunOutcome, SystemClock, UpdateEngine,
};
use noip_ip_http::HttpIpSource;
use noip_provider::NoIpProvider;
use std::env;
use std::path::Path;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_USERNAME_FILE: &str = "/run/secrets/noip-username";
const DEFAULT_PASSWORD_FILE: &str = "/run/secrets/noip-password";

/// Exit codes for the outcomes of a pass
///
/// Schedulers and wrapper scripts can tell a quiet pass from one that needs
/// attention without parsing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoipExitCode {
    /// Update accepted, or no update needed
    Success = 0,
    /// Quarantined at start, or quarantined by this pass
    Quarantined = 1,
    /// Public IP could not be determined
    ResolverFailed = 2,
    /// The update call did not complete
    TransportFailed = 3,
    /// Invalid configuration, or the provider rejected it
    ConfigError = 4,
    /// Storage or runtime failure
    RuntimeError = 5,
}

impl From<NoipExitCode> for ExitCode {
    fn from(code: NoipExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Command line flags
#[derive(Debug, Parser)]
#[command(
    name = "noipd",
    about = "No-IP dynamic DNS update client (one pass per invocation)",
    version
)]
struct Args {
    /// Remove the quarantine record and exit
    #[arg(long, conflicts_with_all = ["status", "dry_run"])]
    lift_quarantine: bool,

    /// Print the cached IP and quarantine state without network calls
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,

    /// Resolve and compare, but skip the update call
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// Whether the requested action talks to the update API
    fn needs_account(&self) -> bool {
        !self.lift_quarantine && !self.status
    }
}

/// Application configuration
struct Config {
    noip: NoipConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    ///
    /// Precedence per setting: environment variable, then secret file (for
    /// credentials), then `NOIP_CONFIG_FILE`, then the built-in default.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut noip = match var("NOIP_CONFIG_FILE") {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read NOIP_CONFIG_FILE {}", path))?;
                NoipConfig::from_json(&json)
                    .with_context(|| format!("NOIP_CONFIG_FILE {} is not valid", path))?
            }
            None => NoipConfig::default(),
        };

        if let Some(username) = secret(
            var("NOIP_USERNAME"),
            var("NOIP_USERNAME_FILE"),
            DEFAULT_USERNAME_FILE,
        )? {
            noip.credentials.username = username;
        }
        if let Some(password) = secret(
            var("NOIP_PASSWORD"),
            var("NOIP_PASSWORD_FILE"),
            DEFAULT_PASSWORD_FILE,
        )? {
            noip.credentials.password = password;
        }

        if let Some(hosts) = var("NOIP_HOSTS") {
            noip.hostnames = hosts
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(url) = var("NOIP_IP_RESOLVER_URL") {
            noip.ip_source.url = url;
        }
        if let Some(url) = var("NOIP_UPDATE_URL") {
            noip.provider.update_url = url;
        }
        if let Some(agent) = var("NOIP_USER_AGENT") {
            noip.provider.user_agent = agent;
        }
        if let Some(path) = var("NOIP_IP_CACHE_PATH") {
            noip.storage.ip_cache_path = path;
        }
        if let Some(path) = var("NOIP_QUARANTINE_PATH") {
            noip.storage.quarantine_path = path;
        }
        if let Some(mins) = var("NOIP_SERVER_ERROR_QUARANTINE_MINS") {
            noip.quarantine.server_error_minutes = mins.trim().parse().with_context(|| {
                format!(
                    "NOIP_SERVER_ERROR_QUARANTINE_MINS must be a whole number of minutes. Got: {}",
                    mins
                )
            })?;
        }

        Ok(Self {
            noip,
            log_level: var("NOIP_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Actions that only touch the local records need no account settings.
    fn validate(&self, needs_account: bool) -> Result<()> {
        if needs_account {
            self.noip.validate().context(
                "Set NOIP_USERNAME, NOIP_PASSWORD and NOIP_HOSTS (or the matching \
                secret files / NOIP_CONFIG_FILE)",
            )?;
        } else {
            self.noip.storage.validate()?;
        }

        if self.log_level().is_none() {
            anyhow::bail!(
                "NOIP_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn log_level(&self) -> Option<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

/// Resolve a credential from its variable or secret file
///
/// An explicitly named file must exist; the default location is optional.
fn secret(value: Option<String>, file: Option<String>, default_file: &str) -> Result<Option<String>> {
    if value.is_some() {
        return Ok(value);
    }

    let (path, explicit) = match file {
        Some(path) => (path, true),
        None => (default_file.to_string(), false),
    };

    if !explicit && !Path::new(&path).exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read secret file {}", path))?;
    Ok(Some(contents.trim_end_matches(['\r', '\n']).to_string()))
}

/// Exit code for a finished pass
fn exit_code_for(outcome: &RunOutcome) -> NoipExitCode {
    if outcome.is_quarantined() {
        return NoipExitCode::Quarantined;
    }

    match outcome {
        RunOutcome::Quarantined { .. } => NoipExitCode::Quarantined,
        RunOutcome::ResolverFailed { .. } => NoipExitCode::ResolverFailed,
        RunOutcome::TransportFailed { .. } => NoipExitCode::TransportFailed,
        RunOutcome::Unchanged { .. } | RunOutcome::WouldUpdate { .. } => NoipExitCode::Success,
        RunOutcome::Classified { outcome, .. } => match outcome {
            Outcome::Success => NoipExitCode::Success,
            Outcome::Failure(category) if category.is_configuration_problem() => {
                NoipExitCode::ConfigError
            }
            Outcome::Failure(_) => NoipExitCode::Quarantined,
        },
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return NoipExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate(args.needs_account()) {
        eprintln!("Configuration validation error: {:#}", e);
        return NoipExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NoipExitCode::RuntimeError.into();
    }

    // One pass, one task: no worker threads needed
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NoipExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(args, config.noip)).into()
}

/// Run the requested action
async fn run(args: Args, config: NoipConfig) -> NoipExitCode {
    if args.lift_quarantine {
        let (_, quarantine) = open_records(&config.storage);
        return match quarantine.lift().await {
            Ok(true) => {
                info!("Quarantine lifted");
                println!("Quarantine lifted");
                NoipExitCode::Success
            }
            Ok(false) => {
                println!("Not quarantined");
                NoipExitCode::Success
            }
            Err(e) => {
                error!("Failed to lift quarantine: {}", e);
                NoipExitCode::RuntimeError
            }
        };
    }

    if args.status {
        let (cache, quarantine) = open_records(&config.storage);
        return match EngineStatus::read(&cache, &quarantine, SystemClock.now()).await {
            Ok(status) => {
                println!(
                    "cached ip:  {}",
                    status.cached_ip.as_deref().unwrap_or("none")
                );
                println!("quarantine: {}", status.quarantine);
                NoipExitCode::Success
            }
            Err(e) => {
                error!("Failed to read state: {}", e);
                NoipExitCode::RuntimeError
            }
        };
    }

    let engine = match build_engine(&config, args.dry_run) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return NoipExitCode::ConfigError;
        }
    };

    info!(
        "Starting update pass for {} host(s)",
        config.hostnames.len()
    );

    match engine.run_once().await {
        Ok(outcome) => {
            if let RunOutcome::Quarantined {
                status: QuarantineStatus::Indefinite,
            } = &outcome
            {
                info!("Run with --lift-quarantine once the account issue is resolved");
            }
            exit_code_for(&outcome)
        }
        Err(e) => {
            error!("Update pass failed: {}", e);
            NoipExitCode::RuntimeError
        }
    }
}

/// Open the two file-backed records
fn open_records(storage: &StorageConfig) -> (IpCache, QuarantineStore) {
    (
        IpCache::new(Box::new(FileSlot::new(&storage.ip_cache_path))),
        QuarantineStore::new(Box::new(FileSlot::new(&storage.quarantine_path))),
    )
}

/// Wire the collaborators into an engine
fn build_engine(config: &NoipConfig, dry_run: bool) -> Result<UpdateEngine> {
    let ip_source = HttpIpSource::from_config(&config.ip_source)?;
    let provider = NoIpProvider::new(&config.provider, config.credentials.clone())?;
    let (cache, quarantine) = open_records(&config.storage);

    let engine = UpdateEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        cache,
        quarantine,
        config,
    )?
    .with_dry_run(dry_run);

    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use noip_core::FailureCategory;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn secret_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_config() {
        let config = load(&[
            ("NOIP_USERNAME", "me@example.com"),
            ("NOIP_PASSWORD", "hunter2"),
            ("NOIP_HOSTS", "home.example.net, nas.example.net,"),
            ("NOIP_SERVER_ERROR_QUARANTINE_MINS", "10"),
            ("NOIP_IP_CACHE_PATH", "/var/lib/noipd/ip"),
            ("NOIP_QUARANTINE_PATH", "/var/lib/noipd/quarantine"),
        ])
        .unwrap();

        assert_eq!(config.noip.credentials.username, "me@example.com");
        assert_eq!(
            config.noip.hostnames,
            vec!["home.example.net".to_string(), "nas.example.net".to_string()]
        );
        assert_eq!(config.noip.quarantine.server_error_minutes, 10);
        assert_eq!(config.noip.storage.ip_cache_path, "/var/lib/noipd/ip");
        assert_eq!(config.log_level, "info");
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_secret_files_trim_trailing_newline() {
        let username = secret_file("me@example.com\n");
        let password = secret_file("pass word\r\n");

        let config = load(&[
            ("NOIP_USERNAME_FILE", username.path().to_str().unwrap()),
            ("NOIP_PASSWORD_FILE", password.path().to_str().unwrap()),
            ("NOIP_HOSTS", "home.example.net"),
        ])
        .unwrap();

        assert_eq!(config.noip.credentials.username, "me@example.com");
        assert_eq!(config.noip.credentials.password, "pass word");
    }

    #[test]
    fn test_variable_beats_secret_file() {
        let password = secret_file("from-file");

        let config = load(&[
            ("NOIP_PASSWORD", "from-env"),
            ("NOIP_PASSWORD_FILE", password.path().to_str().unwrap()),
        ])
        .unwrap();

        assert_eq!(config.noip.credentials.password, "from-env");
    }

    #[test]
    fn test_missing_explicit_secret_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");

        let result = load(&[("NOIP_USERNAME_FILE", missing.to_str().unwrap())]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_with_env_override() {
        let file = secret_file(
            r#"{
                "credentials": { "username": "file-user", "password": "file-pass" },
                "hostnames": ["file.example.net"],
                "quarantine": { "server_error_minutes": 5 }
            }"#,
        );

        let config = load(&[
            ("NOIP_CONFIG_FILE", file.path().to_str().unwrap()),
            ("NOIP_HOSTS", "env.example.net"),
        ])
        .unwrap();

        assert_eq!(config.noip.credentials.username, "file-user");
        assert_eq!(config.noip.hostnames, vec!["env.example.net".to_string()]);
        assert_eq!(config.noip.quarantine.server_error_minutes, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("NOIP_SERVER_ERROR_QUARANTINE_MINS", "soon")]).is_err());

        let config = load(&[
            ("NOIP_USERNAME", "me"),
            ("NOIP_PASSWORD", "pw"),
            ("NOIP_HOSTS", "home.example.net"),
            ("NOIP_LOG_LEVEL", "loud"),
        ])
        .unwrap();
        assert!(config.validate(true).is_err());

        let config = load(&[("NOIP_USERNAME", "me"), ("NOIP_PASSWORD", "pw")]).unwrap();
        assert!(config.validate(true).is_err(), "no hostnames");
    }

    #[test]
    fn test_exit_codes() {
        let ip = "203.0.113.5".to_string();

        assert_eq!(
            exit_code_for(&RunOutcome::Quarantined {
                status: QuarantineStatus::Indefinite
            }),
            NoipExitCode::Quarantined
        );
        assert_eq!(
            exit_code_for(&RunOutcome::ResolverFailed {
                reason: "timeout".to_string()
            }),
            NoipExitCode::ResolverFailed
        );
        assert_eq!(
            exit_code_for(&RunOutcome::Unchanged { ip: ip.clone() }),
            NoipExitCode::Success
        );
        assert_eq!(
            exit_code_for(&RunOutcome::TransportFailed {
                ip: ip.clone(),
                reason: "connection refused".to_string()
            }),
            NoipExitCode::TransportFailed
        );
        assert_eq!(
            exit_code_for(&RunOutcome::Classified {
                ip: ip.clone(),
                outcome: Outcome::Success,
                quarantine: None
            }),
            NoipExitCode::Success
        );
        assert_eq!(
            exit_code_for(&RunOutcome::Classified {
                ip: ip.clone(),
                outcome: Outcome::Failure(FailureCategory::BadAuth),
                quarantine: None
            }),
            NoipExitCode::ConfigError
        );
        assert_eq!(
            exit_code_for(&RunOutcome::Classified {
                ip,
                outcome: Outcome::Failure(FailureCategory::Abuse),
                quarantine: Some(QuarantineStatus::Indefinite)
            }),
            NoipExitCode::Quarantined
        );
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from(["noipd", "--dry-run"]).unwrap();
        assert!(args.dry_run && !args.status && !args.lift_quarantine);

        assert!(Args::try_parse_from(["noipd", "--status", "--lift-quarantine"]).is_err());
    }

    fn local_only(dir: &TempDir) -> Config {
        load(&[
            ("NOIP_IP_CACHE_PATH", dir.path().join("ip").to_str().unwrap()),
            (
                "NOIP_QUARANTINE_PATH",
                dir.path().join("quarantine").to_str().unwrap(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_local_actions_need_no_account() {
        let dir = TempDir::new().unwrap();
        let config = local_only(&dir);

        assert!(config.validate(false).is_ok());
        assert!(config.validate(true).is_err());

        let lift = Args::try_parse_from(["noipd", "--lift-quarantine"]).unwrap();
        let status = Args::try_parse_from(["noipd", "--status"]).unwrap();
        let update = Args::try_parse_from(["noipd"]).unwrap();
        assert!(!lift.needs_account() && !status.needs_account());
        assert!(update.needs_account());
    }

    #[tokio::test]
    async fn test_lift_quarantine_without_credentials() {
        let dir = TempDir::new().unwrap();
        let quarantine = dir.path().join("quarantine");
        std::fs::write(&quarantine, "").unwrap();
        let config = local_only(&dir);

        let args = Args::try_parse_from(["noipd", "--lift-quarantine"]).unwrap();
        assert_eq!(run(args, config.noip).await, NoipExitCode::Success);
        assert!(!quarantine.exists());
    }

    #[tokio::test]
    async fn test_status_without_credentials() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ip"), "203.0.113.5").unwrap();
        let config = local_only(&dir);

        let args = Args::try_parse_from(["noipd", "--status"]).unwrap();
        assert_eq!(run(args, config.noip).await, NoipExitCode::Success);
        assert!(!dir.path().join("quarantine").exists());
    }

    #[test]
    fn test_build_engine_from_valid_config() {
        let dir = TempDir::new().unwrap();
        let config = load(&[
            ("NOIP_USERNAME", "me"),
            ("NOIP_PASSWORD", "pw"),
            ("NOIP_HOSTS", "home.example.net"),
            ("NOIP_IP_CACHE_PATH", dir.path().join("ip").to_str().unwrap()),
            (
                "NOIP_QUARANTINE_PATH",
                dir.path().join("quarantine").to_str().unwrap(),
            ),
        ])
        .unwrap();

        assert!(build_engine(&config.noip, false).is_ok());
    }
}
