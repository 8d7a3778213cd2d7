//! Member command handlers.

use tabled::Tabled;

use fleetboard_core::{Backend, Dashboard, Member, MemberPatch, NewMember, parse_achievements};

use crate::cli::{GlobalOpts, MemberAddArgs, MemberEditArgs, MembersArgs, MembersCommand};
use crate::error::CliError;
use crate::output;

use super::ordered::{self, Ctx, Presented};
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct MemberRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Joined")]
    joined: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl Presented for Member {
    type Row = MemberRow;

    fn row(&self, ctx: &Ctx) -> MemberRow {
        MemberRow {
            id: util::short_id(&self.id),
            position: self.position.map(|p| p.to_string()).unwrap_or_default(),
            name: self.name.clone(),
            role: self.role.clone(),
            joined: self.join_date.clone().unwrap_or_default(),
            active: output::active_cell(self.is_active, ctx.color),
        }
    }

    fn detail(&self, ctx: &Ctx) -> String {
        let mut lines = vec![
            format!("ID:        {}", self.id),
            format!("Name:      {}", self.name),
            format!("Role:      {}", self.role),
            format!("Joined:    {}", self.join_date.as_deref().unwrap_or("-")),
            format!(
                "Position:  {}",
                self.position.map_or_else(|| "-".into(), |p| p.to_string())
            ),
            format!("Active:    {}", output::active_cell(self.is_active, ctx.color)),
            format!("Portrait:  {}", self.portrait_url()),
        ];
        if let Some(ref smogon) = self.smogon {
            lines.push(format!("Smogon:    {smogon}"));
        }
        if !self.achievements.is_empty() {
            lines.push("Achievements:".into());
            lines.extend(self.achievements.iter().map(|a| format!("  - {a}")));
        }
        lines.join("\n")
    }
}

// ── Flag → payload ──────────────────────────────────────────────────

fn draft(args: MemberAddArgs) -> Result<NewMember, CliError> {
    if let Some(path) = args.from_file {
        return util::read_json_file(&path);
    }
    Ok(NewMember {
        name: args.name.unwrap_or_default(),
        image: args.image.unwrap_or_default(),
        role: args.role.unwrap_or_default(),
        join_date: args.join_date.unwrap_or_default(),
        achievements: args.achievements,
        smogon: args.smogon,
        is_active: !args.inactive,
    })
}

fn patch(args: MemberEditArgs) -> MemberPatch {
    MemberPatch {
        name: args.name,
        image: args.image,
        role: args.role,
        join_date: args.join_date,
        achievements: args.achievements.as_deref().map(parse_achievements),
        smogon: args.smogon,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<B: Backend>(
    dashboard: &Dashboard<B>,
    args: MembersArgs,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let members = dashboard.members();
    match args.command {
        MembersCommand::List(list) => {
            ordered::list(dashboard.backend(), members, &list, None, ctx, global).await
        }
        MembersCommand::Get(target) => ordered::get(members, &target.id, ctx, global).await,
        MembersCommand::Add(add) => ordered::add(members, draft(add)?, ctx, global).await,
        MembersCommand::Edit { id, fields } => {
            ordered::edit(members, &id, patch(fields), ctx, global).await
        }
        MembersCommand::Move(mv) => ordered::move_item(members, &mv, ctx, global).await,
        MembersCommand::Toggle(target) => ordered::toggle(members, &target.id, ctx, global).await,
        MembersCommand::Delete(target) => ordered::delete(members, &target.id, global).await,
        MembersCommand::Watch(list) => {
            ordered::watch(dashboard.backend(), members, &list, ctx, global).await
        }
    }
}
