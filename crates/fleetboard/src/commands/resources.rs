//! Footer resource command handlers.
//!
//! Positions are per category, so moves never cross a category boundary.

use tabled::Tabled;

use fleetboard_core::{
    Backend, Dashboard, EntityFilter, FooterResource, FooterResourcePatch, NewFooterResource,
    ResourceCategory,
};

use crate::cli::{GlobalOpts, ResourceAddArgs, ResourceEditArgs, ResourcesArgs, ResourcesCommand};
use crate::error::CliError;
use crate::output;

use super::ordered::{self, Ctx, Presented};
use super::util;

#[derive(Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl Presented for FooterResource {
    type Row = ResourceRow;

    fn row(&self, ctx: &Ctx) -> ResourceRow {
        ResourceRow {
            id: util::short_id(&self.id),
            category: self.category.clone(),
            position: self.position.map(|p| p.to_string()).unwrap_or_default(),
            title: self.title(ctx.locale).to_owned(),
            url: util::ellipsize(&self.url, 48),
            active: output::active_cell(self.is_active, ctx.color),
        }
    }

    fn detail(&self, ctx: &Ctx) -> String {
        [
            format!("ID:        {}", self.id),
            format!("Title:     {}", self.title(ctx.locale)),
            format!("URL:       {}", self.url),
            format!("Icon:      {}", self.icon.as_deref().unwrap_or("-")),
            format!("Category:  {}", self.category),
            format!(
                "Position:  {}",
                self.position.map_or_else(|| "-".into(), |p| p.to_string())
            ),
            format!("Active:    {}", output::active_cell(self.is_active, ctx.color)),
        ]
        .join("\n")
    }
}

fn draft(args: ResourceAddArgs) -> Result<NewFooterResource, CliError> {
    if let Some(path) = args.from_file {
        return util::read_json_file(&path);
    }
    let category = args.category.map(ResourceCategory::from).ok_or_else(|| {
        CliError::Validation {
            field: "category".into(),
            reason: "a category is required".into(),
        }
    })?;
    Ok(NewFooterResource {
        title_it: args.title_it.unwrap_or_default(),
        title_en: args.title_en.unwrap_or_default(),
        url: args.url.unwrap_or_default(),
        icon: args.icon,
        category,
        is_active: !args.inactive,
    })
}

fn patch(args: ResourceEditArgs) -> FooterResourcePatch {
    FooterResourcePatch {
        title_it: args.title_it,
        title_en: args.title_en,
        url: args.url,
        icon: args.icon,
        category: args.category.map(ResourceCategory::from),
    }
}

pub async fn handle<B: Backend>(
    dashboard: &Dashboard<B>,
    args: ResourcesArgs,
    ctx: &Ctx,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resources = dashboard.resources();
    match args.command {
        ResourcesCommand::List { list, category } => {
            let group = category
                .map(|c| EntityFilter::Group(ResourceCategory::from(c).as_ref().to_owned()));
            ordered::list(dashboard.backend(), resources, &list, group, ctx, global).await
        }
        ResourcesCommand::Get(target) => ordered::get(resources, &target.id, ctx, global).await,
        ResourcesCommand::Add(add) => ordered::add(resources, draft(add)?, ctx, global).await,
        ResourcesCommand::Edit { id, fields } => {
            ordered::edit(resources, &id, patch(fields), ctx, global).await
        }
        ResourcesCommand::Move(mv) => ordered::move_item(resources, &mv, ctx, global).await,
        ResourcesCommand::Toggle(target) => {
            ordered::toggle(resources, &target.id, ctx, global).await
        }
        ResourcesCommand::Delete(target) => ordered::delete(resources, &target.id, global).await,
        ResourcesCommand::Watch(list) => {
            ordered::watch(dashboard.backend(), resources, &list, ctx, global).await
        }
    }
}
