use std::{env, path::PathBuf, process, sync::Arc};

use clap::{command, Parser, Subcommand, ValueHint};
use log::{debug, error, info, LevelFilter};

use jbl4305p::{
    client::{Client, DeviceApi},
    config::Config,
    coordinator::Update,
    error::{Error, Result},
    events,
    integration::{self, Instance, Registry},
    options::{LogLevel, Options, OptionsStore},
    signal::Handler,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Speaker address
    ///
    /// Host name or IP address, optionally with a port.
    #[arg(value_hint = ValueHint::Hostname)]
    host: String,

    /// Options file
    ///
    /// Holds the discovered inputs, scan interval and log level. Created
    /// on first use.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value = "jbl4305p.toml")]
    options_file: PathBuf,

    /// Speaker's name
    ///
    /// Renames the speaker during setup when it differs.
    #[arg(short, long)]
    name: Option<String>,

    /// Seconds between polls, 10 through 300
    ///
    /// Overrides and updates the stored scan interval.
    #[arg(short = 'i', long, value_name = "SECS")]
    scan_interval: Option<u64>,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Subcommand)]
enum Command {
    /// Poll the speaker and log changes until interrupted (default)
    ///
    /// SIGHUP re-reads the options file.
    Run,

    /// Print the current state and diagnostics
    Status,

    /// Print the input options and the active one
    Inputs,

    /// Switch to an input by its name
    Select {
        /// Input name as printed by `inputs`
        name: String,
    },

    /// Discover the inputs again and store them
    Rediscover,

    /// Store a Bluetooth peer as an input
    ///
    /// Without a device path, uses the last peer seen playing.
    AddBluetooth {
        /// BlueZ object path of the peer
        #[arg(long)]
        device_path: Option<String>,

        /// Friendly name of the peer
        #[arg(long)]
        name: Option<String>,
    },

    /// Rename the speaker
    Rename {
        name: String,
    },
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// Without either of those, the stored log level option sets the maximum
/// level once an instance is set up.
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(args: &Args) {
    let from_env = env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let from_args = args.quiet || args.verbose > 0;
    if from_args {
        let level = match args.verbose {
            // Quiet and verbose are mutually exclusive.
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module("jbl4305p", level);
    } else if !from_env {
        // Let the stored log level be the only gate for our own messages.
        logger.filter_module("jbl4305p", LevelFilter::Debug);
    }

    logger.init();

    if from_args || from_env {
        LogLevel::fix_max_level();
    } else {
        LogLevel::default().apply();
    }
}

fn config(args: &Args) -> Result<Config> {
    let mut config = Config::with_host(&args.host)?;
    config.name.clone_from(&args.name);
    config.options_file = Some(args.options_file.clone());
    config.scan_interval = args.scan_interval;
    Ok(config)
}

/// Validates the speaker and opens its options.
///
/// On first use the discovered inputs are stored. Command line overrides
/// are stored as well.
async fn prepare(config: &Config, client: &Client) -> Result<(String, String, OptionsStore)> {
    let info = integration::validate_input(client, config).await?;

    let mut store = match &config.options_file {
        Some(path) => OptionsStore::open(path)?,
        None => OptionsStore::memory(Options::default()),
    };

    let mut options = store.options().clone();
    if options.available_inputs.is_empty() {
        info!("storing {} discovered inputs", info.available_inputs.len());
        options.available_inputs = info.available_inputs;
    }
    config.apply_overrides(&mut options)?;
    if &options != store.options() {
        store.update(options)?;
    }

    Ok((info.unique_id, info.title, store))
}

async fn setup(config: &Config) -> Result<Instance<Client>> {
    let client = Arc::new(Client::new(config)?);
    let (entry_id, title, store) = prepare(config, &client).await?;
    Instance::setup(entry_id, title, client, store).await
}

fn print_status(instance: &Instance<Client>) -> Result<()> {
    let Some(snapshot) = instance.coordinator().data() else {
        return Err(Error::unavailable("no data received"));
    };

    println!("{}", instance.device_info());
    println!("state: {}", snapshot.state.as_deref().unwrap_or("none"));
    println!(
        "input: {}",
        instance
            .select()
            .current_option()
            .or_else(|| snapshot.current_input.clone())
            .unwrap_or_else(|| "none".to_owned())
    );
    if let Some(path) = &snapshot.last_bt_device_path {
        println!("last bluetooth device: {path}");
    }

    for sensor in instance.sensors() {
        if let Some(value) = sensor.native_value() {
            println!("{}: {value}", sensor.name());
        }
    }

    debug!("snapshot: {}", serde_json::to_string_pretty(&*snapshot)?);
    Ok(())
}

fn print_inputs(instance: &Instance<Client>) {
    let current = instance.select().current_option();
    for option in instance.select().options() {
        let marker = if current.as_ref() == Some(&option) { "*" } else { " " };
        println!("{marker} {option}");
    }
}

/// Polls until a shutdown signal, logging every change.
async fn run_forever(config: &Config) -> Result<()> {
    let client = Arc::new(Client::new(config)?);
    let (entry_id, title, store) = prepare(config, &client).await?;

    let mut signals = Handler::new()?;
    let mut registry = Registry::new();
    let mut updates = registry
        .setup(entry_id.as_str(), title, client, store)
        .await?
        .coordinator()
        .subscribe();
    let mut previous = Update::default();

    loop {
        tokio::select! {
            // Prioritize signals.
            biased;

            signal = signals.recv() => {
                if signal.is_shutdown() {
                    info!("shutting down gracefully");
                    registry.unload_all().await;
                    break Ok(());
                }

                info!("{signal}: reloading options");
                updates = registry.reload(&entry_id).await?.coordinator().subscribe();
            }

            changed = updates.changed() => {
                if changed.is_err() {
                    break Err(Error::internal("coordinator went away"));
                }

                let current = updates.borrow_and_update().clone();
                for event in events::between(&previous, &current) {
                    info!("{event}");
                }
                previous = current;
            }
        }
    }
}

/// Main application logic.
///
/// # Errors
///
/// This function returns an error when the speaker cannot be set up or the
/// command fails.
async fn run(args: Args) -> Result<()> {
    let config = config(&args)?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_forever(&config).await,

        Command::Status => print_status(&setup(&config).await?),

        Command::Inputs => {
            print_inputs(&setup(&config).await?);
            Ok(())
        }

        Command::Select { name } => {
            let instance = setup(&config).await?;
            instance.select().select_option(&name).await?;
            print_inputs(&instance);
            Ok(())
        }

        Command::Rediscover => {
            let mut instance = setup(&config).await?;
            instance.rediscover_inputs().await?;
            print_inputs(&instance);
            Ok(())
        }

        Command::AddBluetooth { device_path, name } => {
            let mut instance = setup(&config).await?;
            match instance
                .add_bluetooth_device(device_path.as_deref(), name.as_deref())
                .await?
            {
                Some(input_id) => info!("added input {input_id}"),
                None => info!("no bluetooth device to add"),
            }
            Ok(())
        }

        Command::Rename { name } => {
            let client = Client::new(&config)?;
            if !client.set_device_name(&name).await {
                return Err(Error::unavailable(format!("speaker rejected name {name}")));
            }
            info!("renamed speaker to {name}");
            Ok(())
        }
    }
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and runs the command.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
