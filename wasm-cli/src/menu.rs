//! Menu navigation around the commands.
//!
//! One [`Console`] is created by the caller and threaded through every
//! nested menu; item selection goes through a [`Chooser`].

use std::io::Write;

use anyhow::{Context, Result};
use dialoguer::Select;
use tracing::{debug, warn};

use crate::codes::LogLevel;
use crate::commands::{self, describe_instance, Outcome};
use crate::config::Config;
use crate::console::{Console, ReadLine};
use crate::host::WasmHost;
use crate::instance_key::InstanceKey;

pub const QUIT_ENTRY: &str = "q/Q - Quit Menu";

const MAIN_MENU: [&str; 4] = ["Create VM", "List VM's", "Vm Settings", "Send Traffic"];
const SETTINGS_MENU: [&str; 2] = ["Show Log Level", "Set Log Level"];

/// Picks one entry out of a menu.
pub trait Chooser {
    /// `Ok(None)` when the operator leaves the menu.
    fn choose(&mut self, items: &[String]) -> Result<Option<usize>>;
}

/// Arrow-key menus on the terminal, with [`QUIT_ENTRY`] appended.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerChooser;

impl Chooser for DialoguerChooser {
    fn choose(&mut self, items: &[String]) -> Result<Option<usize>> {
        let mut entries = items.to_vec();
        entries.push(QUIT_ENTRY.to_string());

        let selection = Select::new()
            .items(&entries)
            .default(0)
            .interact_opt()
            .context("menu selection")?;
        Ok(item_choice(selection, items.len()))
    }
}

/// Map a raw selection over `len` items plus the trailing quit entry to an
/// item index.
fn item_choice(selection: Option<usize>, len: usize) -> Option<usize> {
    selection.filter(|&idx| idx < len)
}

fn show_menu<C: Chooser, T: ToString>(chooser: &mut C, items: &[T]) -> Result<Option<usize>> {
    let entries: Vec<String> = items.iter().map(ToString::to_string).collect();
    Ok(chooser.choose(&entries)?.filter(|&idx| idx < entries.len()))
}

fn log_outcome(command: &str, outcome: &Outcome) {
    debug!(command, ?outcome, "command finished");
}

/// Main menu loop; returns when the operator quits.
pub async fn run<H, R, W, C>(
    host: &H,
    console: &mut Console<R, W>,
    chooser: &mut C,
    config: &Config,
) -> Result<()>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
    C: Chooser,
{
    while let Some(idx) = show_menu(chooser, &MAIN_MENU)? {
        match idx {
            0 => log_outcome("create", &commands::create_instance(host, console, config).await?),
            1 => log_outcome("list", &commands::list_instances(host, console).await?),
            2 => vm_settings(host, console, chooser).await?,
            _ => log_outcome("send-traffic", &commands::send_traffic(host, console, config).await?),
        }
    }
    Ok(())
}

async fn vm_settings<H, R, W, C>(host: &H, console: &mut Console<R, W>, chooser: &mut C) -> Result<()>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
    C: Chooser,
{
    let instances = match host.list_instances("").await {
        Ok(instances) => instances,
        Err(e) => {
            warn!(error = %e, "could not list instances");
            console.say(format!("Error: {e}"))?;
            return Ok(());
        }
    };
    let options: Vec<String> = instances
        .iter()
        .enumerate()
        .map(|(idx, rec)| describe_instance(idx, rec))
        .collect();

    while let Some(idx) = show_menu(chooser, &options)? {
        let Some(rec) = instances.get(idx) else { continue };
        match InstanceKey::parse(&rec.key) {
            Ok(key) => instance_settings(host, console, chooser, &key).await?,
            Err(e) => {
                warn!(error = %e, "host returned malformed instance key");
                console.say(format!("Error: {e}"))?;
            }
        }
    }
    Ok(())
}

async fn instance_settings<H, R, W, C>(
    host: &H,
    console: &mut Console<R, W>,
    chooser: &mut C,
    key: &InstanceKey,
) -> Result<()>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
    C: Chooser,
{
    console.say(format!("Settings for vm \"{key}\""))?;

    while let Some(idx) = show_menu(chooser, &SETTINGS_MENU)? {
        if idx == 0 {
            // The host API has no settings query; echo the target only.
            console.say(format!("Show log level for {key}"))?;
            continue;
        }
        if let Some(level) = show_menu(chooser, &LogLevel::ALL)? {
            let outcome = commands::set_log_level(host, console, key, LogLevel::ALL[level]).await?;
            log_outcome("set-log-level", &outcome);
        }
    }
    Ok(())
}
