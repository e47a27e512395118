use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use fee_reminder_api_structs::get_history_entry::*;
use fee_reminder_domain::{ReminderHistoryEntry, ID};
use fee_reminder_infra::ReminderContext;

fn handle_error(e: UseCaseErrors) -> ApiError {
    match e {
        UseCaseErrors::NotFound(entry_id) => ApiError::NotFound(format!(
            "The reminder history entry with id: {}, was not found.",
            entry_id
        )),
        UseCaseErrors::StorageError => ApiError::InternalError,
    }
}

pub async fn get_history_entry_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ApiError> {
    let usecase = GetHistoryEntryUseCase {
        entry_id: path_params.entry_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|entry| HttpResponse::Ok().json(APIResponse::new(entry)))
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct GetHistoryEntryUseCase {
    pub entry_id: ID,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for GetHistoryEntryUseCase {
    type Response = ReminderHistoryEntry;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        match ctx.repos.reminder_history.find(&self.entry_id).await {
            Ok(Some(entry)) => Ok(entry),
            Ok(None) => Err(UseCaseErrors::NotFound(self.entry_id)),
            Err(_) => Err(UseCaseErrors::StorageError),
        }
    }
}
