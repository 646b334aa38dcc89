use super::creator::CreatorContext;
use super::messages::Message;
use crate::workspace::insert_personal_access_token;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use ws_core::secrets::generate_token;
use ws_core::FallibleStep;

pub const TOKEN_PREFIX: &str = "wspat-";
pub const TOKEN_RANDOM_LENGTH: usize = 20;
pub const TOKEN_SCOPES: [&str; 1] = ["write_repository"];

fn failed(details: impl std::fmt::Display) -> Message {
    Message::WorkspaceCreateFailed(format!("Personal access token: {}", details))
}

/// Tokens expire at the start of the day after the workspace's termination.
pub(crate) fn token_expiry(now: DateTime<Utc>, max_hours: i64) -> Option<NaiveDate> {
    let terminates_at = now.checked_add_signed(TimeDelta::try_hours(max_hours)?)?;
    terminates_at.date_naive().checked_add_days(Days::new(1))
}

/// Issues the token the workspace uses to talk to the project repository.
pub struct PersonalAccessTokenCreator;

#[async_trait]
impl FallibleStep<CreatorContext, Message> for PersonalAccessTokenCreator {
    fn name(&self) -> &'static str {
        "personal_access_token_creator"
    }

    async fn run(&self, mut creator: CreatorContext) -> Result<CreatorContext, Message> {
        let context = &mut creator.context;

        let name = context
            .workspace_name
            .clone()
            .ok_or_else(|| failed("workspace name has not been generated"))?;
        let expires_at = token_expiry(Utc::now(), context.params.max_hours_before_termination)
            .ok_or_else(|| failed("Expiry date is out of range"))?;
        let token = format!("{}{}", TOKEN_PREFIX, generate_token(TOKEN_RANDOM_LENGTH));

        let issued = insert_personal_access_token(
            &mut creator.tx,
            context.current_user.id,
            &name,
            &token,
            &TOKEN_SCOPES,
            expires_at,
        )
        .await
        .map_err(failed)?;

        context.personal_access_token = Some(issued);
        Ok(creator)
    }
}
