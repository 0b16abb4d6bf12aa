#![forbid(unsafe_code)]

//! `agenda-citas-ctl`: local administration CLI for `agenda-citas`.
//!
//! Operates directly on the configured record store. Intended for an
//! operator on the host machine; it does not send confirmation emails.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use agenda_citas::config::GlobalConfig;
use agenda_citas::notify::dispatcher::Notifier;
use agenda_citas::persistence::open_store;
use agenda_citas::workflow::ConfirmationWorkflow;
use agenda_citas::AppError;

#[derive(Debug, Parser)]
#[command(
    name = "agenda-citas-ctl",
    about = "Local CLI for the agenda-citas record store",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the server's TOML configuration file.
    ///
    /// When omitted, `agenda-citas.toml` in the working directory is used
    /// if present, otherwise the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all appointments.
    List {
        /// Only show appointments that are still pending.
        #[arg(long)]
        pending: bool,
    },

    /// Show one appointment.
    Show {
        /// Appointment ID.
        id: String,
    },

    /// Mark an appointment as confirmed on the requester's behalf.
    Confirm {
        /// Appointment ID.
        id: String,
    },

    /// Delete an appointment.
    Delete {
        /// Appointment ID.
        id: String,
    },
}

fn main() {
    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(args)) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> agenda_citas::Result<()> {
    let config = match args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None if std::path::Path::new("agenda-citas.toml").exists() => {
            GlobalConfig::load_from_path("agenda-citas.toml")?
        }
        None => GlobalConfig::default(),
    };

    let store = open_store(&config.storage).await?;
    let workflow = ConfirmationWorkflow::new(store, Notifier::disabled(), &config);

    match args.command {
        Command::List { pending } => {
            let mut appointments = workflow.list_appointments().await?;
            if pending {
                appointments.retain(|appointment| !appointment.confirmed);
            }
            print_json(&appointments)
        }
        Command::Show { id } => print_json(&workflow.get_appointment(&id).await?),
        Command::Confirm { id } => print_json(&workflow.confirm_by_link(&id).await?),
        Command::Delete { id } => {
            if workflow.delete_appointment(&id).await? {
                println!("OK");
                Ok(())
            } else {
                Err(AppError::NotFound(format!("appointment {id} not found")))
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> agenda_citas::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
