use anyhow::{Context, Result};
use azdeploy::azure::{auth::AzureCredentials, format_azure_error, AzureClient, AzureError};
use azdeploy::compute::image;
use azdeploy::config::Config;
use azdeploy::resources::create_resource_group_config;
use azdeploy::strategy::{deploy, EntityConfig, SubscriptionContext};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Declarative Azure resource deployment
#[derive(Parser, Debug)]
#[command(name = "azdeploy", version, about, long_about = None)]
struct Cli {
    /// Azure subscription id
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a virtual machine with its network
    NewVm(NewVmArgs),
}

#[derive(Args, Debug)]
struct NewVmArgs {
    /// Virtual machine name; also names the network resources
    #[arg(short, long)]
    name: String,

    /// Resource group (defaults to the config value, then the VM name)
    #[arg(short, long)]
    resource_group: Option<String>,

    /// Azure location
    #[arg(short, long)]
    location: Option<String>,

    /// Image alias (e.g. UbuntuLTS, Win2016Datacenter) or publisher:offer:sku:version
    #[arg(short, long, default_value = "Win2016Datacenter")]
    image: String,

    /// VM size
    #[arg(long, default_value = "Standard_DS1_v2")]
    size: String,

    #[arg(long)]
    admin_username: String,

    #[arg(long)]
    admin_password: String,

    /// Virtual network address prefix
    #[arg(long, default_value = "192.168.0.0/16")]
    address_prefix: String,

    /// Subnet address prefix
    #[arg(long, default_value = "192.168.1.0/24")]
    subnet_address_prefix: String,

    /// DNS label for the public IP
    #[arg(long)]
    domain_name_label: Option<String>,

    /// Print the resources that would be created and exit
    #[arg(long)]
    dry_run: bool,

    /// Output format for --dry-run and results
    #[arg(long, value_enum, default_value = "json")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azdeploy started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("azdeploy").join("azdeploy.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".azdeploy").join("azdeploy.log");
    }
    PathBuf::from("azdeploy.log")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    if let Err(err) = run(cli).await {
        tracing::error!("{:?}", err);
        if err.downcast_ref::<AzureError>().is_some() {
            eprintln!("Error: {}", format_azure_error(&err));
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load();

    match cli.command {
        Command::NewVm(args) => new_vm(&mut config, cli.subscription, args).await,
    }
}

async fn new_vm(config: &mut Config, subscription: Option<String>, args: NewVmArgs) -> Result<()> {
    let subscription_id = subscription
        .or_else(|| config.effective_subscription())
        .context("No Azure subscription configured. Set AZURE_SUBSCRIPTION_ID, run 'az login', or use --subscription")?;
    let location = args
        .location
        .clone()
        .unwrap_or_else(|| config.effective_location());
    let resource_group = args
        .resource_group
        .clone()
        .or_else(|| config.resource_group.clone())
        .unwrap_or_else(|| args.name.clone());

    let resolved = image::resolve(&args.image)?;
    tracing::info!(
        "new-vm: name={}, resource_group={}, location={}, image={}, windows={}",
        args.name,
        resource_group,
        location,
        resolved.image,
        resolved.is_windows
    );

    let rg = create_resource_group_config(&resource_group);
    let vnet = rg.create_virtual_network_config(
        &args.name,
        &args.address_prefix,
        &args.name,
        &args.subnet_address_prefix,
    );
    let pip = rg.create_public_ip_address_config(&args.name, args.domain_name_label.as_deref());
    let nic = rg.create_network_interface_config(&args.name, &vnet, &args.name, &pip);
    let vm = rg.create_virtual_machine_config(
        &args.name,
        &nic,
        resolved.is_windows,
        &args.admin_username,
        &args.admin_password,
        &resolved.image,
        &args.size,
    );
    let root: Arc<dyn EntityConfig> = vm;
    let ctx = SubscriptionContext::new(&subscription_id, &location);

    if args.dry_run {
        let rendered = deploy::render(&root, &ctx)?;
        print_output(&rendered, args.output)?;
        return Ok(());
    }

    let client = AzureClient::new(&subscription_id, &config.effective_endpoint(), AzureCredentials::new())?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let report = deploy::apply(&client, &ctx, &root, &cancel, &|progress| {
        eprintln!(
            "[{:>3.0}%] created {}",
            progress.fraction() * 100.0,
            progress.resource
        );
    })
    .await
    .with_context(|| format!("Failed to create virtual machine {}", args.name))?;

    for id in &report.existing {
        eprintln!("exists  {}", id);
    }

    if let Err(e) = config.remember(&subscription_id, &location) {
        tracing::warn!("Failed to save config: {}", e);
    }

    match report.root {
        Some(vm) => print_output(&vm, args.output),
        None => {
            eprintln!("Virtual machine {} already exists", args.name);
            Ok(())
        }
    }
}

fn print_output<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", text);
    Ok(())
}
