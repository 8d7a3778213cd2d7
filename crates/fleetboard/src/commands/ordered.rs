//! Verbs shared by every ordered collection.
//!
//! Each collection module supplies a table row and a detail view via
//! [`Presented`]; listing, moving, toggling, deleting and watching work
//! the same for all four.

use std::sync::Arc;

use tabled::Tabled;

use fleetboard_core::{
    Backend, CollectionManager, EntityFilter, Locale, ManagerOptions, MoveOutcome,
    OrderedEntity, ViewStatus, Visibility,
};

use crate::cli::{GlobalOpts, ListArgs, MoveArgs, StatusFilter};
use crate::error::CliError;
use crate::output;

use super::util;

/// Rendering context shared by the handlers of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Ctx {
    pub locale: Locale,
    pub color: bool,
}

/// How a collection's rows are shown.
pub trait Presented: OrderedEntity {
    type Row: Tabled;

    fn row(&self, ctx: &Ctx) -> Self::Row;

    fn detail(&self, ctx: &Ctx) -> String;
}

impl StatusFilter {
    fn to_filter<T: OrderedEntity>(self) -> EntityFilter<T> {
        match self {
            Self::All => EntityFilter::All,
            Self::Active => EntityFilter::Active,
            Self::Inactive => EntityFilter::Inactive,
        }
    }
}

/// The manager to read through: the shared admin one, or a fresh public view.
fn view<T: OrderedEntity, B: Backend>(
    backend: &Arc<B>,
    manager: &CollectionManager<T, B>,
    public: bool,
) -> CollectionManager<T, B> {
    if public {
        let options = ManagerOptions {
            visibility: Visibility::Public,
            ..manager.options().clone()
        };
        CollectionManager::new(Arc::clone(backend), options)
    } else {
        manager.clone()
    }
}

fn render_rows<T: Presented>(
    rows: &[Arc<T>],
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    output::render_list(&global.output, rows, |r| r.row(ctx), |r| r.id().to_string())
}

fn render_one<T: Presented>(row: &T, ctx: &Ctx, global: &GlobalOpts) -> Result<String, CliError> {
    output::render_single(&global.output, row, |r| r.detail(ctx), |r| r.id().to_string())
}

// ── Read ─────────────────────────────────────────────────────────────

pub async fn list<T: Presented, B: Backend>(
    backend: &Arc<B>,
    manager: &CollectionManager<T, B>,
    args: &ListArgs,
    extra: Option<EntityFilter<T>>,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let manager = view(backend, manager, args.public);
    manager.mount().await?;

    let filter = args.status.to_filter::<T>();
    let rows: Vec<Arc<T>> = manager
        .snapshot()
        .iter()
        .filter(|r| filter.matches(r) && extra.as_ref().is_none_or(|f| f.matches(r)))
        .cloned()
        .collect();

    let out = render_rows(&rows, ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn get<T: Presented, B: Backend>(
    manager: &CollectionManager<T, B>,
    identifier: &str,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    manager.mount().await?;
    let id = util::resolve_id(manager, identifier)?;
    let row = manager.get(&id).ok_or_else(|| CliError::NotFound {
        resource_type: T::COLLECTION.noun().into(),
        identifier: identifier.into(),
        list_command: crate::error::list_command(T::COLLECTION).into(),
    })?;
    let out = render_one(row.as_ref(), ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Write ────────────────────────────────────────────────────────────

pub async fn add<T: Presented, B: Backend>(
    manager: &CollectionManager<T, B>,
    draft: T::Draft,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    manager.mount().await?;
    let created = manager.insert(draft).await?;
    output::notice(
        &format!(
            "Added {} '{}' at position {}",
            T::COLLECTION.noun(),
            created.label(),
            created.position().unwrap_or_default()
        ),
        global.quiet,
    );
    let out = render_one(&created, ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn edit<T: Presented, B: Backend>(
    manager: &CollectionManager<T, B>,
    identifier: &str,
    patch: T::Patch,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    manager.mount().await?;
    let id = util::resolve_id(manager, identifier)?;
    let updated = manager.update_fields(&id, patch).await?;
    output::notice(
        &format!("Updated {} '{}'", T::COLLECTION.noun(), updated.label()),
        global.quiet,
    );
    let out = render_one(&updated, ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Move one row step by step; stops early at the edge of its group.
pub async fn move_item<T: Presented, B: Backend>(
    manager: &CollectionManager<T, B>,
    args: &MoveArgs,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.steps == 0 {
        return Err(CliError::Validation {
            field: "steps".into(),
            reason: "must be at least 1".into(),
        });
    }
    manager.mount().await?;
    let id = util::resolve_id(manager, &args.id)?;
    let direction = args.direction.into();

    let mut moved = 0;
    for _ in 0..args.steps {
        match manager.move_item(&id, direction).await? {
            MoveOutcome::Moved => moved += 1,
            MoveOutcome::Unchanged => break,
        }
    }

    let row = manager.get(&id);
    let label = row.as_ref().map_or_else(|| id.to_string(), |r| r.label().to_owned());
    if moved == 0 {
        output::notice(
            &format!("'{label}' is already at the {}", edge(direction)),
            global.quiet,
        );
    } else {
        output::notice(
            &format!("Moved '{label}' {direction} {moved} step(s)"),
            global.quiet,
        );
    }

    // Show the group the row lives in, as the backend now has it.
    let group = row.as_ref().and_then(|r| r.group().map(str::to_owned));
    let rows: Vec<Arc<T>> = manager
        .snapshot()
        .iter()
        .filter(|r| r.group().map(str::to_owned) == group)
        .cloned()
        .collect();
    let out = render_rows(&rows, ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn edge(direction: fleetboard_core::MoveDirection) -> &'static str {
    match direction {
        fleetboard_core::MoveDirection::Up => "top",
        fleetboard_core::MoveDirection::Down => "bottom",
    }
}

pub async fn toggle<T: Presented, B: Backend>(
    manager: &CollectionManager<T, B>,
    identifier: &str,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    manager.mount().await?;
    let id = util::resolve_id(manager, identifier)?;
    let updated = manager.toggle_active(&id).await?;
    let state = if updated.is_active() { "shown" } else { "hidden" };
    output::notice(
        &format!("{} '{}' is now {state}", T::COLLECTION.noun(), updated.label()),
        global.quiet,
    );
    let out = render_one(&updated, ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn delete<T: Presented, B: Backend>(
    manager: &CollectionManager<T, B>,
    identifier: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    manager.mount().await?;
    let id = util::resolve_id(manager, identifier)?;
    let label = manager
        .get(&id)
        .map_or_else(|| id.to_string(), |r| r.label().to_owned());

    if !util::confirm(
        &format!("Delete {} '{label}'? This cannot be undone.", T::COLLECTION.noun()),
        global.yes,
    )? {
        return Ok(());
    }
    manager.delete(&id).await?;
    output::notice(
        &format!("Deleted {} '{label}'", T::COLLECTION.noun()),
        global.quiet,
    );
    Ok(())
}

// ── Watch ────────────────────────────────────────────────────────────

/// Print the list, then reprint it whenever it changes, until Ctrl-C.
pub async fn watch<T: Presented, B: Backend>(
    backend: &Arc<B>,
    manager: &CollectionManager<T, B>,
    args: &ListArgs,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let manager = view(backend, manager, args.public);
    let filter = args.status.to_filter::<T>();

    let mut rows = manager.subscribe();
    let mut status = manager.subscribe();
    if let Err(e) = manager.mount().await {
        // Keep watching: the feed task retries and the next refresh may succeed.
        tracing::warn!(error = %e, "initial load failed");
    }
    print_frame::<T>(&rows.latest(), &filter, &manager.status(), ctx, global)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            snap = rows.changed() => {
                let Some(snap) = snap else { break };
                print_frame::<T>(&snap, &filter, &manager.status(), ctx, global)?;
            }
            st = status.status_changed() => {
                let Some(st) = st else { break };
                if let Some(ref err) = st.last_error {
                    tracing::debug!(error = %err, "view reports an error");
                }
            }
        }
    }

    manager.unmount().await;
    Ok(())
}

fn print_frame<T: Presented>(
    snap: &[Arc<T>],
    filter: &EntityFilter<T>,
    status: &ViewStatus,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let healthy = status.last_error.is_none();
    let refreshed = status.last_refresh.map_or_else(
        || "never".to_owned(),
        |at| at.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
    );
    let mut header = format!(
        "── {} · {} · feed {} · {refreshed}",
        T::COLLECTION,
        output::status_word(&status.phase.to_string(), healthy, ctx.color),
        status.feed,
    );
    if let Some(ref err) = status.last_error {
        header.push_str(" · ");
        header.push_str(&output::status_word(err, false, ctx.color));
    }
    output::notice(&header, global.quiet);

    let rows = filter.apply(snap);
    let out = render_rows(&rows, ctx, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
