use bus::{Bus, CoreCommand, CoreEvent};
use clap::{Parser, Subcommand};
use core_types::SessionId;
use editor::{FormContainer, FormEvent, SessionHost, SessionView, SyncError, WidgetProps};
use net::{ConfigError, SyncConfig, TransportError};
use runtime_net::start_render_runtime;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};
use thiserror::Error;
use widgets::endpoint::handle_render_json;
use widgets::{EndpointError, WidgetInstance, WidgetRegistry};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "widgetsync")]
#[command(about = "Edit legacy widget instances through the widget render endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML transport config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Render endpoint base URL; overrides the config. Without one, widgets render in-process
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the widget types registered in-process
    List,

    /// Answer one render request body the way the endpoint does
    Render {
        identifier: String,

        /// JSON body: `{ instance, instance_changes, id_to_use }`
        #[arg(long, default_value = "{}")]
        body: String,
    },

    /// Open an editing session, apply form edits and submit them
    Edit {
        identifier: String,

        /// Starting instance as JSON
        #[arg(long, default_value = "{}")]
        instance: String,

        /// Type into a field: `field=value` (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Choose options of a select field: `field=value[,value...]` (repeatable)
        #[arg(long = "select", value_parser = parse_assignment)]
        select: Vec<(String, String)>,

        /// Check a checkbox field (repeatable)
        #[arg(long)]
        check: Vec<String>,

        /// Uncheck a checkbox field (repeatable)
        #[arg(long)]
        uncheck: Vec<String>,

        /// Print the mounted form container after the update
        #[arg(long)]
        show_form: bool,

        /// Fetch and print the front-end output after the update
        #[arg(long)]
        preview: bool,

        /// How long to wait for each response (seconds)
        #[arg(long, default_value = "10")]
        wait: u64,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out waiting for the renderer")]
    Timeout,
    #[error("no form for `{identifier}`: {reason}")]
    NoForm { identifier: String, reason: String },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim().to_string(), value.to_string()))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| format!("expected `field=value`, got `{raw}`"))
}

fn load_config(cli: &Cli) -> Result<SyncConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    config.validate()?;
    Ok(config)
}

type Host = SessionHost<Sender<CoreCommand>>;

/// Route events until `done` holds or `timeout` passes.
fn wait_until(
    host: &mut Host,
    events: &Receiver<CoreEvent>,
    timeout: Duration,
    mut done: impl FnMut(&Host) -> bool,
) -> Result<(), CliError> {
    let deadline = Instant::now() + timeout;
    while !done(host) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(CliError::Timeout);
        }
        host.pump_one(events, remaining.min(Duration::from_millis(100)));
    }
    Ok(())
}

fn settled(id: SessionId) -> impl FnMut(&Host) -> bool {
    move |host: &Host| host.get(id).is_none_or(|s| !s.is_rendering())
}

struct EditArgs {
    identifier: String,
    instance: String,
    set: Vec<(String, String)>,
    select: Vec<(String, String)>,
    check: Vec<String>,
    uncheck: Vec<String>,
    show_form: bool,
    preview: bool,
    wait: Duration,
}

fn edit(config: &SyncConfig, args: EditArgs) -> Result<(), CliError> {
    let registry = Arc::new(WidgetRegistry::with_builtins());
    let transport = config.build_transport(registry)?;
    let (bus, cmd_rx) = Bus::new();
    let _runtime = start_render_runtime(cmd_rx, bus.evt_tx.clone(), transport, config.retry);
    let mut host = SessionHost::new(bus.cmd_tx.clone());

    let instance: WidgetInstance = serde_json::from_str(&args.instance)?;
    let id = host.open_with(WidgetProps::new(args.identifier.clone(), instance), |session| {
        session.add_form_listener(|event: FormEvent, container: &FormContainer| {
            log::info!(target: "widgetsync", "{} on `{}`", event.legacy_name(), container.id_base());
        });
        session.set_owner(|instance: &WidgetInstance| {
            log::info!(target: "widgetsync", "instance changed: {}", serde_json::to_string(instance).unwrap_or_default());
        });
    })?;
    wait_until(&mut host, &bus.evt_rx, args.wait, settled(id))?;

    let session = host.get_mut(id).ok_or(SyncError::UnknownSession(id))?;
    if let SessionView::InvalidWidget(message) = session.view() {
        println!("{message}");
        return Ok(());
    }
    let reason = session
        .last_error()
        .map(ToString::to_string)
        .unwrap_or_else(|| "no response".to_string());
    let form = session.form_mut().ok_or_else(|| CliError::NoForm {
        identifier: args.identifier.clone(),
        reason,
    })?;

    let mut edited = false;
    for (field, value) in &args.set {
        edited |= form.set_field_value(field, value)?;
    }
    for (field, values) in &args.select {
        let values: Vec<&str> = values.split(',').map(str::trim).collect();
        edited |= form.select_option(field, &values)?;
    }
    for field in &args.check {
        edited |= form.set_field_checked(field, true)?;
    }
    for field in &args.uncheck {
        edited |= form.set_field_checked(field, false)?;
    }

    if edited {
        host.submit_update(id)?;
        wait_until(&mut host, &bus.evt_rx, args.wait, settled(id))?;
    }

    let session = host.get(id).ok_or(SyncError::UnknownSession(id))?;
    if let Some(err) = session.last_error() {
        log::warn!(target: "widgetsync", "last request failed: {err}");
    }
    println!("{}", serde_json::to_string_pretty(session.instance())?);
    if args.show_form
        && let Some(form) = session.form()
    {
        println!("{}", form.container_html());
    }

    if args.preview {
        host.request_preview(id)?;
        wait_until(&mut host, &bus.evt_rx, args.wait, |host| {
            host.get(id).is_none_or(|s| !s.is_previewing())
        })?;
        if let Some(session) = host.get(id)
            && let SessionView::Preview(markup) = session.view()
        {
            println!("{markup}");
        }
    }

    host.close(id)?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    match cli.command {
        Commands::List => {
            let registry = WidgetRegistry::with_builtins();
            println!("{}", serde_json::to_string_pretty(&registry.available())?);
        }
        Commands::Render { identifier, body } => {
            let registry = WidgetRegistry::with_builtins();
            let response = handle_render_json(&registry, Some(&identifier), &body)?;
            if response.is_empty() {
                eprintln!("(empty response)");
            } else {
                println!("{response}");
            }
        }
        Commands::Edit {
            identifier,
            instance,
            set,
            select,
            check,
            uncheck,
            show_form,
            preview,
            wait,
        } => edit(
            &config,
            EditArgs {
                identifier,
                instance,
                set,
                select,
                check,
                uncheck,
                show_form,
                preview,
                wait: Duration::from_secs(wait),
            },
        )?,
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
