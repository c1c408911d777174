use clap::{Parser, Subcommand};
use serde_json::json;
use tgsm_device::DeviceHandle;
use tgsm_session::{ops, ExternalClient, ExternalConverter, SessionStore};
use tracing::warn;

#[derive(Parser)]
#[command(name = "tgsm", version, about = "Telegram session extraction over an emulated android device")]
struct Cli {
    /// Skip the container/adb/app startup chain
    #[arg(long, global = true)]
    no_setup: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Device connectivity, install state, authorization, stored sessions
    Status,
    /// Clear the on-device app and launch it for manual code entry
    AuthStart { phone: String },
    /// Extract the device session and persist a credential record
    Extract { phone: String },
    /// Rebuild a session from a stored record and run a live check
    Reauthorize {
        phone: String,
        #[arg(long)]
        api_id: i32,
        #[arg(long)]
        api_hash: String,
    },
    /// Stored session records
    Sessions {
        #[command(subcommand)]
        cmd: SessionsCmd,
    },
}

#[derive(Subcommand)]
enum SessionsCmd {
    /// List persisted credential records
    List,
    /// Delete all persisted records, session files, and transients
    Purge,
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("failed to render output: {err}"),
    }
}

async fn run_setup(handle: &DeviceHandle) {
    if let Err(err) = ops::startup(handle).await {
        warn!("startup chain incomplete, continuing degraded: {err}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tgsm_util::init_tracing()?;
    let cli = Cli::parse();

    let handle = DeviceHandle::default();
    let store = SessionStore::open_default();

    match cli.cmd {
        Cmd::Status => {
            if !cli.no_setup {
                run_setup(&handle).await;
            }
            match ops::status(&handle, &store).await {
                Ok(report) => print_json(&report),
                Err(err) => {
                    print_json(&json!({ "error": err.to_string() }));
                    std::process::exit(1);
                }
            }
        }
        Cmd::AuthStart { phone } => {
            if !cli.no_setup {
                run_setup(&handle).await;
            }
            let report = ops::auth_start(&handle, &phone).await;
            print_json(&report);
        }
        Cmd::Extract { phone } => {
            if !cli.no_setup {
                run_setup(&handle).await;
            }
            let converter = ExternalConverter::from_env();
            match ops::extract_and_save(&handle, &store, &converter, &phone).await {
                Ok(record) => print_json(&record),
                Err(err) => {
                    print_json(&json!({ "error": err.to_string() }));
                    std::process::exit(1);
                }
            }
        }
        Cmd::Reauthorize {
            phone,
            api_id,
            api_hash,
        } => {
            let client = ExternalClient::from_env();
            match ops::reauthorize(&store, &client, &phone, api_id, &api_hash).await {
                Ok(identity) => print_json(&json!({
                    "success": true,
                    "user_id": identity.user_id,
                    "username": identity.username,
                    "phone": identity.phone,
                })),
                Err(err) => {
                    print_json(&json!({ "success": false, "error": err.to_string() }));
                    std::process::exit(1);
                }
            }
        }
        Cmd::Sessions { cmd } => match cmd {
            SessionsCmd::List => {
                let sessions = ops::sessions_list(&store);
                print_json(&json!({ "sessions": sessions }));
            }
            SessionsCmd::Purge => {
                let report = ops::sessions_purge(&store);
                print_json(&report);
            }
        },
    }

    Ok(())
}
