//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde::de::DeserializeOwned;

use fleetboard_core::{Backend, CollectionManager, EntityId, OrderedEntity};

use crate::error::{CliError, list_command};

/// Resolve a row id, or a unique prefix of one, against the loaded rows.
pub fn resolve_id<T: OrderedEntity, B: Backend>(
    manager: &CollectionManager<T, B>,
    identifier: &str,
) -> Result<EntityId, CliError> {
    let snap = manager.snapshot();
    if let Some(row) = snap.iter().find(|r| r.id().to_string() == identifier) {
        return Ok(row.id().clone());
    }

    let matches: Vec<&EntityId> = snap
        .iter()
        .map(|r| r.id())
        .filter(|id| id.starts_with(identifier))
        .collect();
    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        [] => Err(CliError::NotFound {
            resource_type: T::COLLECTION.noun().into(),
            identifier: identifier.into(),
            list_command: list_command(T::COLLECTION).into(),
        }),
        many => Err(CliError::Ambiguous {
            resource_type: T::COLLECTION.noun().into(),
            identifier: identifier.into(),
            candidates: many
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// First eight characters of an id, enough to type back.
pub fn short_id(id: &EntityId) -> String {
    id.to_string().chars().take(8).collect()
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<D: DeserializeOwned>(path: &Path) -> Result<D, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Cut a long text down to a table cell.
pub fn ellipsize(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}
