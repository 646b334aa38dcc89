use super::context::Context;
use super::messages::Message;
use async_trait::async_trait;
use ws_core::FallibleStep;
use ws_devfile::validate::PreFlattenValidator;

pub struct PreFlattenDevfileValidator;

#[async_trait]
impl FallibleStep<Context, Message> for PreFlattenDevfileValidator {
    fn name(&self) -> &'static str {
        "pre_flatten_devfile_validator"
    }

    async fn run(&self, context: Context) -> Result<Context, Message> {
        let Some(devfile) = &context.devfile else {
            return Err(Message::WorkspaceCreatePreFlattenDevfileValidationFailed(
                "No devfile loaded".to_string(),
            ));
        };

        PreFlattenValidator::new(devfile)
            .validate()
            .map_err(|e| Message::WorkspaceCreatePreFlattenDevfileValidationFailed(e.to_string()))?;

        Ok(context)
    }
}
