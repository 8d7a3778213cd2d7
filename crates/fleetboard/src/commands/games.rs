//! Showcased game command handlers.

use tabled::Tabled;

use fleetboard_core::{Backend, Dashboard, Game, GamePatch, NewGame};

use crate::cli::{GameAddArgs, GameEditArgs, GamesArgs, GamesCommand, GlobalOpts};
use crate::error::CliError;

use super::ordered::{self, Ctx, Presented};
use super::util;

#[derive(Tabled)]
pub struct GameRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Tournament")]
    tournament: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Players")]
    players: String,
}

impl Presented for Game {
    type Row = GameRow;

    fn row(&self, _ctx: &Ctx) -> GameRow {
        GameRow {
            id: util::short_id(&self.id),
            position: self.position.map(|p| p.to_string()).unwrap_or_default(),
            tournament: self.tournament.clone(),
            phase: self.phase.clone(),
            format: self.format.clone(),
            players: self.players.clone(),
        }
    }

    fn detail(&self, ctx: &Ctx) -> String {
        [
            format!("ID:          {}", self.id),
            format!("Tournament:  {} ({})", self.tournament, self.phase),
            format!("Format:      {}", self.format),
            format!("Players:     {}", self.players),
            format!(
                "Position:    {}",
                self.position.map_or_else(|| "-".into(), |p| p.to_string())
            ),
            format!("Thumbnail:   {}", self.thumbnail_url()),
            format!("Replay:      {}", self.replay_url),
            String::new(),
            self.description(ctx.locale).to_owned(),
        ]
        .join("\n")
    }
}

fn draft(args: GameAddArgs) -> Result<NewGame, CliError> {
    if let Some(path) = args.from_file {
        return util::read_json_file(&path);
    }
    Ok(NewGame {
        tournament: args.tournament.unwrap_or_default(),
        phase: args.phase.unwrap_or_default(),
        format: args.format.unwrap_or_default(),
        players: args.players.unwrap_or_default(),
        description_it: args.description_it.unwrap_or_default(),
        description_en: args.description_en.unwrap_or_default(),
        image_url: args.image_url.unwrap_or_default(),
        replay_url: args.replay_url.unwrap_or_default(),
    })
}

fn patch(args: GameEditArgs) -> GamePatch {
    GamePatch {
        tournament: args.tournament,
        phase: args.phase,
        format: args.format,
        players: args.players,
        description_it: args.description_it,
        description_en: args.description_en,
        image_url: args.image_url,
        replay_url: args.replay_url,
    }
}

pub async fn handle<B: Backend>(
    dashboard: &Dashboard<B>,
    args: GamesArgs,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let games = dashboard.games();
    match args.command {
        GamesCommand::List(list) => {
            ordered::list(dashboard.backend(), games, &list, None, ctx, global).await
        }
        GamesCommand::Get(target) => ordered::get(games, &target.id, ctx, global).await,
        GamesCommand::Add(add) => ordered::add(games, draft(add)?, ctx, global).await,
        GamesCommand::Edit { id, fields } => {
            ordered::edit(games, &id, patch(fields), ctx, global).await
        }
        GamesCommand::Move(mv) => ordered::move_item(games, &mv, ctx, global).await,
        GamesCommand::Delete(target) => ordered::delete(games, &target.id, global).await,
        GamesCommand::Watch(list) => {
            ordered::watch(dashboard.backend(), games, &list, ctx, global).await
        }
    }
}
