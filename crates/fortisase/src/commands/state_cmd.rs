//! State subcommand handlers.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, StateArgs, StateCommand};
use crate::error::CliError;
use crate::output;
use crate::state::Address;

use super::Session;

#[derive(Serialize)]
struct Tracked {
    address: String,
    type_name: String,
    id: Option<String>,
}

#[derive(Tabled)]
struct TrackedRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "ID")]
    id: String,
}

pub fn handle(args: StateArgs, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StateCommand::List => {
            let state = session.load_state()?;
            let tracked: Vec<Tracked> = state
                .resources
                .iter()
                .map(|(address, res)| Tracked {
                    address: address.clone(),
                    type_name: res.type_name.clone(),
                    id: res.state["id"].as_str().map(str::to_owned),
                })
                .collect();
            let out = output::render_list(
                global.output,
                &tracked,
                |t| TrackedRow {
                    address: t.address.clone(),
                    id: t.id.clone().unwrap_or_else(|| "-".into()),
                },
                |t| t.address.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StateCommand::Show(args) => {
            let address: Address = args.address.parse()?;
            let state = session.load_state()?;
            let mut value = state
                .get(&address)
                .cloned()
                .ok_or_else(|| not_tracked(session, &address))?;
            if let Some(resource) = session.registry.get(&address.type_name) {
                resource.schema().redact(&mut value);
            }
            let out = output::render_single(global.output, &value, output::detail_lines, |v| {
                v["id"].as_str().unwrap_or_default().to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StateCommand::Remove(args) => {
            let address: Address = args.address.parse()?;
            let mut state = session.load_state()?;
            state
                .remove(&address)
                .ok_or_else(|| not_tracked(session, &address))?;
            session.save_state(&state)?;
            if !global.quiet {
                eprintln!("✓ {address} removed from state (the object itself was not touched)");
            }
            Ok(())
        }
    }
}

pub(crate) fn not_tracked(session: &Session, address: &Address) -> CliError {
    CliError::NotTracked {
        address: address.to_string(),
        state_file: session.state_path.display().to_string(),
    }
}
