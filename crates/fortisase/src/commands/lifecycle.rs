//! Lifecycle commands: validate, plan, apply, refresh, destroy, import.
//!
//! Each handler drives one `DynResource` call and keeps the local state
//! file in step with what the API reported.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use fortisase_core::{Diagnostics, DynResource, Plan, PlanAction, Response};

use crate::cli::{AddressArgs, ConfigFileArgs, GlobalOpts, ImportArgs, RefreshArgs};
use crate::error::CliError;
use crate::output;
use crate::state::Address;

use super::state_cmd::not_tracked;
use super::{Session, util};

// ── Helpers ─────────────────────────────────────────────────────────

/// Print warnings; turn errors into a CLI error.
fn check(
    diags: &Diagnostics,
    action: &'static str,
    address: &Address,
    session: &Session,
) -> Result<(), CliError> {
    output::print_diagnostics(diags, session.color);
    if diags.has_errors() {
        return Err(CliError::from_diagnostics(action, &address.to_string(), diags));
    }
    Ok(())
}

fn checked_state(
    resp: Response,
    action: &'static str,
    address: &Address,
    session: &Session,
) -> Result<Option<Value>, CliError> {
    check(&resp.diagnostics, action, address, session)?;
    Ok(resp.state)
}

fn print_state(
    resource: &dyn DynResource,
    mut state: Value,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    resource.schema().redact(&mut state);
    let out = output::render_single(global.output, &state, output::detail_lines, |v| {
        v["id"].as_str().unwrap_or_default().to_owned()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn done(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("✓ {message}");
    }
}

// ── Plan rendering ──────────────────────────────────────────────────

#[derive(Serialize)]
struct PlanView<'a> {
    address: String,
    action: PlanAction,
    changed: &'a [String],
    replace_paths: &'a [String],
}

fn plan_text(address: &Address, plan: &Plan) -> String {
    let headline = match plan.action {
        PlanAction::NoOp => return format!("{address}: no changes"),
        PlanAction::Create => format!("{address} will be created"),
        PlanAction::Update => format!("{address} will be updated in place"),
        PlanAction::Replace => format!("{address} must be replaced"),
    };
    let mut out = headline;
    for attr in &plan.changed {
        if plan.replace_paths.contains(attr) {
            out.push_str(&format!("\n  ~ {attr} (forces replacement)"));
        } else {
            out.push_str(&format!("\n  ~ {attr}"));
        }
    }
    out
}

fn render_plan(address: &Address, plan: &Plan, global: &GlobalOpts) -> Result<(), CliError> {
    let view = PlanView {
        address: address.to_string(),
        action: plan.action,
        changed: &plan.changed,
        replace_paths: &plan.replace_paths,
    };
    let out = output::render_single(
        global.output,
        &view,
        |_| plan_text(address, plan),
        |v| v.action.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Validate ────────────────────────────────────────────────────────

pub fn validate(
    args: &ConfigFileArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let address: Address = args.address.parse()?;
    let resource = session.resource(&address.type_name)?;
    let config = util::read_json_file(&args.file)?;

    check(&resource.validate(&config), "validate", &address, session)?;
    done(global, &format!("{address} is valid"));
    Ok(())
}

// ── Plan ────────────────────────────────────────────────────────────

pub fn plan(args: &ConfigFileArgs, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let address: Address = args.address.parse()?;
    let resource = session.resource(&address.type_name)?;
    let config = util::read_json_file(&args.file)?;
    let state = session.load_state()?;

    let plan = resource.plan(state.get(&address), &config);
    check(&plan.diagnostics, "plan", &address, session)?;
    render_plan(&address, &plan, global)
}

// ── Apply ───────────────────────────────────────────────────────────

pub async fn apply(
    args: &ConfigFileArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let address: Address = args.address.parse()?;
    let resource = session.resource(&address.type_name)?;
    let config = util::read_json_file(&args.file)?;
    let mut state = session.load_state()?;
    let prior = state.get(&address).cloned();

    let plan = resource.plan(prior.as_ref(), &config);
    check(&plan.diagnostics, "plan", &address, session)?;
    if plan.action == PlanAction::NoOp {
        done(global, &format!("{address}: no changes"));
        return Ok(());
    }
    if !global.quiet {
        eprintln!("{}", plan_text(&address, &plan));
    }

    let ctx = session.context(global)?;
    info!(%address, action = %plan.action, "applying");

    let resp = match (plan.action, prior) {
        (PlanAction::Update, Some(prior)) => {
            let bar = util::spinner(format!("Updating {address}"), global.quiet);
            let resp = resource.update(&ctx, &prior, &config).await;
            bar.finish_and_clear();
            resp
        }
        (PlanAction::Replace, Some(prior)) => {
            let message = format!(
                "{address} must be destroyed and re-created ({}). Continue?",
                plan.replace_paths.join(", ")
            );
            if !util::confirm(&message, "replace", global.yes)? {
                return Err(CliError::Aborted);
            }
            let bar = util::spinner(format!("Destroying {address}"), global.quiet);
            let diags = resource.delete(&ctx, &prior).await;
            bar.finish_and_clear();
            check(&diags, "destroy", &address, session)?;
            state.remove(&address);
            session.save_state(&state)?;

            let bar = util::spinner(format!("Creating {address}"), global.quiet);
            let resp = resource.create(&ctx, &config).await;
            bar.finish_and_clear();
            resp
        }
        _ => {
            let bar = util::spinner(format!("Creating {address}"), global.quiet);
            let resp = resource.create(&ctx, &config).await;
            bar.finish_and_clear();
            resp
        }
    };

    let new_state = checked_state(resp, "apply", &address, session)?.ok_or_else(|| {
        CliError::Api {
            message: format!("{address}: the API returned no state"),
        }
    })?;
    state.put(&address, new_state.clone());
    session.save_state(&state)?;
    done(global, &format!("{address} applied"));
    print_state(resource.as_ref(), new_state, global)
}

// ── Refresh ─────────────────────────────────────────────────────────

pub async fn refresh(
    args: &RefreshArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut state = session.load_state()?;
    let addresses = match &args.address {
        Some(raw) => {
            let address: Address = raw.parse()?;
            if state.get(&address).is_none() {
                return Err(not_tracked(session, &address));
            }
            vec![address]
        }
        None => state.addresses()?,
    };
    if addresses.is_empty() {
        done(global, "nothing tracked; nothing to refresh");
        return Ok(());
    }

    let ctx = session.context(global)?;
    let mut first_error = None;

    for address in addresses {
        let Some(prior) = state.get(&address).cloned() else {
            continue;
        };
        let resource = session.resource(&address.type_name)?;
        let bar = util::spinner(format!("Refreshing {address}"), global.quiet);
        let resp = resource.read(&ctx, &prior).await;
        bar.finish_and_clear();

        match checked_state(resp, "refresh", &address, session) {
            Ok(Some(fresh)) => {
                debug!(%address, "refreshed");
                state.put(&address, fresh);
            }
            Ok(None) => {
                state.remove(&address);
                if !global.quiet {
                    eprintln!("{address} no longer exists; removed from state");
                }
            }
            // Keep going so one broken object doesn't block the rest.
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    session.save_state(&state)?;
    match first_error {
        Some(e) => Err(e),
        None => {
            done(global, "state refreshed");
            Ok(())
        }
    }
}

// ── Destroy ─────────────────────────────────────────────────────────

pub async fn destroy(
    args: &AddressArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let address: Address = args.address.parse()?;
    let resource = session.resource(&address.type_name)?;
    let mut state = session.load_state()?;
    let prior = state
        .get(&address)
        .cloned()
        .ok_or_else(|| not_tracked(session, &address))?;

    if !util::confirm(&format!("Destroy {address}?"), "destroy", global.yes)? {
        return Err(CliError::Aborted);
    }

    let ctx = session.context(global)?;
    let bar = util::spinner(format!("Destroying {address}"), global.quiet);
    let diags = resource.delete(&ctx, &prior).await;
    bar.finish_and_clear();
    check(&diags, "destroy", &address, session)?;

    state.remove(&address);
    session.save_state(&state)?;
    done(global, &format!("{address} destroyed"));
    Ok(())
}

// ── Import ──────────────────────────────────────────────────────────

pub async fn import(
    args: &ImportArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let address: Address = args.address.parse()?;
    let resource = session.resource(&address.type_name)?;
    let mut state = session.load_state()?;
    if state.get(&address).is_some() {
        return Err(CliError::AlreadyTracked {
            address: address.to_string(),
        });
    }

    let seed = checked_state(resource.import_state(&args.id), "import", &address, session)?
        .ok_or_else(|| CliError::Api {
            message: format!("{address}: import produced no state"),
        })?;

    let ctx = session.context(global)?;
    let bar = util::spinner(format!("Importing {address}"), global.quiet);
    let resp = resource.read(&ctx, &seed).await;
    bar.finish_and_clear();

    let imported = checked_state(resp, "import", &address, session)?.ok_or_else(|| {
        CliError::NotFound {
            entity_type: address.type_name.clone(),
            identifier: args.id.clone(),
        }
    })?;
    state.put(&address, imported.clone());
    session.save_state(&state)?;
    done(global, &format!("{address} imported"));
    print_state(resource.as_ref(), imported, global)
}
