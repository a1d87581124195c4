//! Group management through mentions.

use super::{thread_options, PluginContext, ADMINS_GROUP};
use anyhow::Context;
use async_trait::async_trait;
use gadget_core::{Handler, MentionEvent, MentionRoute, Request, Route, WILDCARD};
use user_store::{Group, StoreError};

const PLUGIN: &str = "groups";

pub fn mention_routes(ctx: &PluginContext) -> Vec<MentionRoute> {
    vec![
        MentionRoute::new(
            Route::new("groups.getMyGroups")
                .with_pattern(r"(?i)^((list )?my groups|which groups am I (in|a member of))[.?]?$")
                .with_description("Lists the groups you belong to")
                .with_help("my groups")
                .with_permissions([WILDCARD]),
            MyGroups { ctx: ctx.clone() },
        ),
        MentionRoute::new(
            Route::new("groups.getAllGroups")
                .with_pattern(r"(?i)^(list|list all|all) groups\.?$")
                .with_description("Lists every group")
                .with_help("list groups")
                .with_permissions([ADMINS_GROUP]),
            AllGroups { ctx: ctx.clone() },
        ),
        MentionRoute::new(
            Route::new("groups.addUserToGroup")
                .with_pattern(r"(?i)^add <@([a-z0-9]+)> to( group)? ([a-z0-9]+)\.?$")
                .with_description("Adds a user to a group, creating the group if needed")
                .with_help("add @user to group <name>")
                .with_permissions([ADMINS_GROUP]),
            AddMember { ctx: ctx.clone() },
        ),
        MentionRoute::new(
            Route::new("groups.removeUserFromGroup")
                .with_pattern(r"(?i)^remove <@([a-z0-9]+)> from( group)? ([a-z0-9]+)\.?$")
                .with_description("Removes a user from a group")
                .with_help("remove @user from group <name>")
                .with_permissions([ADMINS_GROUP]),
            RemoveMember { ctx: ctx.clone() },
        ),
    ]
}

fn bullet_list(groups: &[Group]) -> String {
    groups
        .iter()
        .map(|group| format!("*-* {}\n", group.name))
        .collect()
}

/// User and group captured by the add/remove patterns.
fn member_and_group(request: &Request<MentionEvent>) -> anyhow::Result<(String, String)> {
    let user = request.capture(1).context("pattern captured no user")?;
    let group = request.capture(3).context("pattern captured no group")?;
    Ok((user.to_string(), group.to_string()))
}

struct MyGroups {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for MyGroups {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        let options = thread_options(ev.thread_ts.as_deref());

        let header = format!("Here are your groups, <@{}>:", ev.user);
        self.ctx.reply(PLUGIN, &ev.channel, &header, &options).await;

        let user = self.ctx.store.find_or_create_user(&ev.user).await?;
        let groups = self.ctx.store.groups_of(&user).await?;

        let response = if groups.is_empty() {
            "You don't seem to be a member of _any_ groups. Bummer.".to_string()
        } else {
            bullet_list(&groups)
        };

        self.ctx.reply(PLUGIN, &ev.channel, &response, &options).await;
        Ok(())
    }
}

struct AllGroups {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for AllGroups {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        let options = thread_options(ev.thread_ts.as_deref());

        self.ctx
            .reply(
                PLUGIN,
                &ev.channel,
                "Here are *all* the groups I know about:",
                &options,
            )
            .await;

        let groups = self.ctx.store.list_groups().await?;
        let response = if groups.is_empty() {
            "I don't know about any groups yet.".to_string()
        } else {
            bullet_list(&groups)
        };

        self.ctx.reply(PLUGIN, &ev.channel, &response, &options).await;
        Ok(())
    }
}

struct AddMember {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for AddMember {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        let (user, group) = member_and_group(&request)?;

        self.ctx.react(PLUGIN, &ev.channel, &ev.ts, "tada").await;
        self.ctx.store.add_member(&group, &user).await?;

        let text = format!("I successfully added <@{}> to {}!", user, group);
        self.ctx
            .reply(PLUGIN, &ev.channel, &text, &thread_options(ev.thread_ts.as_deref()))
            .await;
        Ok(())
    }
}

struct RemoveMember {
    ctx: PluginContext,
}

#[async_trait]
impl Handler<MentionEvent> for RemoveMember {
    async fn handle(&self, request: Request<MentionEvent>) -> anyhow::Result<()> {
        let ev = &request.event;
        let (user, group) = member_and_group(&request)?;

        self.ctx
            .react(PLUGIN, &ev.channel, &ev.ts, "slightly_frowning_face")
            .await;
        self.ctx.store.find_or_create_user(&user).await?;

        let text = match self.ctx.store.remove_member(&group, &user).await {
            Ok(true) => format!("<@{}> is no longer a member of {}!", user, group),
            Ok(false) => format!("It doesn't look like <@{}> is a member of {}.", user, group),
            Err(StoreError::GroupNotFound(_)) => {
                format!("I couldn't find a group named '{}'.", group)
            }
            Err(e) => return Err(e.into()),
        };

        self.ctx
            .reply(PLUGIN, &ev.channel, &text, &thread_options(ev.thread_ts.as_deref()))
            .await;
        Ok(())
    }
}
