//! Write-back and activation of a single locked include.
//!
//! ## `write_include` protocol
//!
//! 1. Refuse a lock without a usable handle.
//! 2. Validate the tracking id against the lock.
//! 3. Write the formatted source (skipped in dry-run).
//! 4. Unlock, always, whatever steps 2 and 3 did.
//! 5. Activate (skipped in dry-run); errors surface the first diagnostic.
//! 6. Count the include as written.

use prettysync_core::{ActivationResult, Include, Lock, SyncOptions, Transport};

use crate::error::SyncError;
use crate::guard::validate_transport;
use crate::status::{IncludeOutcome, SyncStats};

/// Write `formatted` into `include` under `lock`, then unlock and activate.
pub fn write_include(
    transport: &dyn Transport,
    include: &Include,
    formatted: &str,
    lock: &Lock,
    options: &SyncOptions,
    stats: &mut SyncStats,
) -> Result<IncludeOutcome, SyncError> {
    let unit = include.to_string();
    let Some(handle) = lock.usable_handle() else {
        return Err(SyncError::LockFailed { unit });
    };

    let written = validate_transport(lock, &unit, options.tracking_id.as_deref()).and_then(|()| {
        if options.dry_run {
            tracing::info!("[dry-run] would write: {unit}");
            return Ok(());
        }
        transport
            .set_object_source(
                &include.source_url,
                formatted,
                handle,
                options.tracking_id.as_deref(),
            )
            .map_err(SyncError::from)
    });

    let unlocked = transport.unlock(&include.meta_url, handle);
    match (written, unlocked) {
        (Err(err), Err(unlock_err)) => {
            tracing::warn!("unlock of {unit} failed after write error: {unlock_err}");
            return Err(err);
        }
        (Err(err), Ok(())) => return Err(err),
        (Ok(()), Err(unlock_err)) => return Err(unlock_err.into()),
        (Ok(()), Ok(())) => {}
    }

    let outcome = if options.dry_run {
        IncludeOutcome::WouldWrite
    } else {
        let result = activate(transport, include)?;
        if !result.success {
            return Err(SyncError::ActivationFailed {
                unit,
                message: result
                    .first_message()
                    .unwrap_or("failed to activate")
                    .to_string(),
            });
        }
        tracing::info!("wrote: {unit}");
        IncludeOutcome::Written
    };

    stats.written_includes += 1;
    Ok(outcome)
}

/// Activate `include`.
///
/// Program includes are activated in the context of their first main program.
/// Anything else is activated directly; if that leaves objects inactive, they
/// get exactly one follow-up activation whose result is returned.
pub fn activate(
    transport: &dyn Transport,
    include: &Include,
) -> Result<ActivationResult, SyncError> {
    if include.needs_main_program() {
        let mains = transport.main_programs(&include.meta_url)?;
        let main = mains.first().map(|m| m.uri.as_str());
        tracing::debug!("activating {include} with main program {main:?}");
        return Ok(transport.activate(&include.name, &include.meta_url, main)?);
    }

    let first = transport.activate(&include.name, &include.meta_url, None)?;
    if first.inactive.is_empty() {
        return Ok(first);
    }
    tracing::debug!(
        "activation of {include} left {} object(s) inactive, activating them",
        first.inactive.len()
    );
    Ok(transport.activate_inactive(&first.inactive)?)
}
