use super::context::Context;
use super::messages::Message;
use async_trait::async_trait;
use ws_core::FallibleStep;
use ws_devfile::validate::PostFlattenValidator;

pub struct PostFlattenDevfileValidator;

#[async_trait]
impl FallibleStep<Context, Message> for PostFlattenDevfileValidator {
    fn name(&self) -> &'static str {
        "post_flatten_devfile_validator"
    }

    async fn run(&self, context: Context) -> Result<Context, Message> {
        let Some(devfile) = &context.processed_devfile else {
            return Err(Message::WorkspaceCreatePostFlattenDevfileValidationFailed(
                "No processed devfile".to_string(),
            ));
        };

        PostFlattenValidator::new(devfile)
            .validate()
            .map_err(|e| Message::WorkspaceCreatePostFlattenDevfileValidationFailed(e.to_string()))?;

        Ok(context)
    }
}
