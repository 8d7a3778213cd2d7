//! FAQ command handlers.

use tabled::Tabled;

use fleetboard_core::{Backend, Dashboard, Faq, FaqPatch, NewFaq};

use crate::cli::{FaqAddArgs, FaqEditArgs, FaqsArgs, FaqsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::ordered::{self, Ctx, Presented};
use super::util;

#[derive(Tabled)]
pub struct FaqRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Question")]
    question: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl Presented for Faq {
    type Row = FaqRow;

    fn row(&self, ctx: &Ctx) -> FaqRow {
        FaqRow {
            id: util::short_id(&self.id),
            position: self.position.map(|p| p.to_string()).unwrap_or_default(),
            question: util::ellipsize(self.question(ctx.locale), 60),
            active: output::active_cell(self.is_active, ctx.color),
        }
    }

    fn detail(&self, ctx: &Ctx) -> String {
        [
            format!("ID:        {}", self.id),
            format!(
                "Position:  {}",
                self.position.map_or_else(|| "-".into(), |p| p.to_string())
            ),
            format!("Active:    {}", output::active_cell(self.is_active, ctx.color)),
            String::new(),
            format!("Q: {}", self.question(ctx.locale)),
            format!("A: {}", self.answer(ctx.locale)),
        ]
        .join("\n")
    }
}

fn draft(args: FaqAddArgs) -> Result<NewFaq, CliError> {
    if let Some(path) = args.from_file {
        return util::read_json_file(&path);
    }
    Ok(NewFaq {
        question_it: args.question_it.unwrap_or_default(),
        question_en: args.question_en.unwrap_or_default(),
        answer_it: args.answer_it.unwrap_or_default(),
        answer_en: args.answer_en.unwrap_or_default(),
        is_active: !args.inactive,
    })
}

fn patch(args: FaqEditArgs) -> FaqPatch {
    FaqPatch {
        question_it: args.question_it,
        question_en: args.question_en,
        answer_it: args.answer_it,
        answer_en: args.answer_en,
    }
}

pub async fn handle<B: Backend>(
    dashboard: &Dashboard<B>,
    args: FaqsArgs,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let faqs = dashboard.faqs();
    match args.command {
        FaqsCommand::List(list) => {
            ordered::list(dashboard.backend(), faqs, &list, None, ctx, global).await
        }
        FaqsCommand::Get(target) => ordered::get(faqs, &target.id, ctx, global).await,
        FaqsCommand::Add(add) => ordered::add(faqs, draft(add)?, ctx, global).await,
        FaqsCommand::Edit { id, fields } => {
            ordered::edit(faqs, &id, patch(fields), ctx, global).await
        }
        FaqsCommand::Move(mv) => ordered::move_item(faqs, &mv, ctx, global).await,
        FaqsCommand::Toggle(target) => ordered::toggle(faqs, &target.id, ctx, global).await,
        FaqsCommand::Delete(target) => ordered::delete(faqs, &target.id, global).await,
        FaqsCommand::Watch(list) => {
            ordered::watch(dashboard.backend(), faqs, &list, ctx, global).await
        }
    }
}
