use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, warn};

use hostbus::{BusAddress, HostBus, HostBusConfig, ProxyError, StartMode, Version};

#[derive(Parser, Debug)]
#[command(name = "hostbus", version, about = "Inspect and drive host services over D-Bus")]
struct Cli {
    /// Use the session bus instead of the system bus.
    #[arg(long, conflicts_with = "address")]
    session: bool,

    /// Connect to the bus at this address, e.g. `unix:path=/run/dbus/system_bus_socket`.
    #[arg(long)]
    address: Option<String>,

    /// Oldest NetworkManager version accepted.
    #[arg(long, value_name = "VERSION")]
    nm_min_version: Option<Version>,

    /// More log output; repeat for trace level. `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which host services are reachable and their versions.
    Status,
    /// Show or change the host clock.
    Time {
        #[command(subcommand)]
        action: Option<TimeAction>,
    },
    /// List or control systemd units.
    Units {
        #[command(subcommand)]
        action: Option<UnitAction>,
    },
    /// Reboot the host.
    Reboot {
        /// Go through systemd instead of logind.
        #[arg(long)]
        systemd: bool,
    },
    /// Power off the host.
    PowerOff {
        #[arg(long)]
        systemd: bool,
    },
    /// Manage AppArmor profiles through the OS agent.
    Apparmor {
        #[command(subcommand)]
        action: AppArmorAction,
    },
    /// NetworkManager queries.
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },
}

#[derive(Subcommand, Debug)]
enum TimeAction {
    /// Set the clock, as an RFC 3339 timestamp.
    Set { when: DateTime<Utc> },
    /// Turn NTP synchronisation on or off.
    Ntp {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Debug)]
enum UnitAction {
    Start(UnitArgs),
    Stop(UnitArgs),
    Reload(UnitArgs),
    Restart(UnitArgs),
}

#[derive(clap::Args, Debug)]
struct UnitArgs {
    unit: String,
    #[arg(long, value_enum, default_value_t = Mode::Replace)]
    mode: Mode,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Replace,
    Fail,
    Isolate,
    IgnoreDependencies,
    IgnoreRequirements,
}

impl From<Mode> for StartMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Replace => StartMode::Replace,
            Mode::Fail => StartMode::Fail,
            Mode::Isolate => StartMode::Isolate,
            Mode::IgnoreDependencies => StartMode::IgnoreDependencies,
            Mode::IgnoreRequirements => StartMode::IgnoreRequirements,
        }
    }
}

#[derive(Subcommand, Debug)]
enum AppArmorAction {
    Load { profile: String, cache: String },
    Unload { profile: String, cache: String },
}

#[derive(Subcommand, Debug)]
enum NetworkAction {
    /// Ask NetworkManager for its connectivity state.
    Connectivity {
        /// Re-run the connectivity probe first.
        #[arg(long)]
        force: bool,
    },
    /// List devices and active connections.
    Devices,
    /// Show a saved connection profile.
    Profile { path: String },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn config(cli: &Cli) -> HostBusConfig {
    let bus = match (&cli.address, cli.session) {
        (Some(address), _) => BusAddress::Address(address.clone()),
        (None, true) => BusAddress::Session,
        (None, false) => BusAddress::System,
    };
    let mut config = HostBusConfig::default().with_bus(bus);
    if let Some(minimum) = &cli.nm_min_version {
        config = config.with_network_manager_min_version(minimum.clone());
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("parsed cli command with {cli:?}");

    let mut host = HostBus::from_config(config(&cli))
        .await
        .context("failed to open the bus")?;

    let report = match host.connect().await {
        Ok(report) => Some(report),
        // Everything but NetworkManager is still usable.
        Err(e @ ProxyError::VersionUnsupported { .. }) => {
            warn!("{e}");
            None
        }
        Err(e) => return Err(e).context("failed to attach host services"),
    };

    match cli.command {
        Commands::Status => {
            if let Some(report) = &report {
                for service in &report.attached {
                    println!("{service}: attached");
                }
                for (service, reason) in &report.degraded {
                    println!("{service}: unavailable ({reason})");
                }
            }
            if let Ok(version) = host.network().version() {
                println!("NetworkManager {version}");
            }
            if let Ok(version) = host.agent().version() {
                println!("OS agent {version}");
            }
            if let Ok(version) = host.agent().apparmor().version() {
                println!("AppArmor parser {version}");
            }
            if let Ok(seconds) = host.systemd().startup_time() {
                println!("startup took {seconds:.2}s");
            }
        }
        Commands::Time { action: None } => {
            let timedate = host.timedate();
            println!("time:      {}", timedate.dt_utc()?.to_rfc3339());
            println!("time zone: {}", timedate.timezone()?);
            println!(
                "ntp:       {} (synchronized: {})",
                timedate.ntp()?,
                timedate.ntp_synchronized()?
            );
        }
        Commands::Time {
            action: Some(TimeAction::Set { when }),
        } => host.timedate().set_time(when).await?,
        Commands::Time {
            action: Some(TimeAction::Ntp { enabled }),
        } => host.timedate().set_ntp(enabled).await?,
        Commands::Units { action: None } => {
            for unit in host.systemd().list_units().await? {
                println!(
                    "{:<48} {:<8} {:<10} {}",
                    unit.name, unit.active_state, unit.sub_state, unit.description
                );
            }
        }
        Commands::Units {
            action: Some(action),
        } => {
            let systemd = host.systemd();
            let job = match action {
                UnitAction::Start(args) => systemd.start_unit(&args.unit, args.mode.into()).await?,
                UnitAction::Stop(args) => systemd.stop_unit(&args.unit, args.mode.into()).await?,
                UnitAction::Reload(args) => {
                    systemd.reload_unit(&args.unit, args.mode.into()).await?
                }
                UnitAction::Restart(args) => {
                    systemd.restart_unit(&args.unit, args.mode.into()).await?
                }
            };
            println!("{job}");
        }
        Commands::Reboot { systemd: true } => host.systemd().reboot().await?,
        Commands::Reboot { systemd: false } => host.logind().reboot().await?,
        Commands::PowerOff { systemd: true } => host.systemd().power_off().await?,
        Commands::PowerOff { systemd: false } => host.logind().power_off().await?,
        Commands::Apparmor {
            action: AppArmorAction::Load { profile, cache },
        } => host.agent().apparmor().load_profile(&profile, &cache).await?,
        Commands::Apparmor {
            action: AppArmorAction::Unload { profile, cache },
        } => {
            host.agent()
                .apparmor()
                .unload_profile(&profile, &cache)
                .await?
        }
        Commands::Network { action } => network(&host, action).await?,
    }
    Ok(())
}

async fn network(host: &HostBus, action: NetworkAction) -> Result<()> {
    match action {
        NetworkAction::Connectivity { force } => {
            let state = host.network().check_connectivity(force).await?;
            println!("{state:?}");
        }
        NetworkAction::Devices => {
            for device in host.network().devices()? {
                println!("device     {device}");
            }
            for path in host.network().active_connections()? {
                let connection = host.active_connection(&path).await?;
                println!(
                    "connection {} {} ({:?})",
                    path,
                    connection.id().unwrap_or_default(),
                    connection.state()?
                );
            }
        }
        NetworkAction::Profile { path } => {
            let setting = host
                .network_setting(&path)
                .await
                .with_context(|| format!("failed to load {path}"))?;
            if let Some(profile) = setting.profile() {
                println!("{profile:#?}");
            }
        }
    }
    Ok(())
}
