use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};
use actix_web::{web, HttpResponse};
use fee_reminder_api_structs::query_history::*;
use fee_reminder_domain::{HistoryQuery, Page, ReminderHistoryEntry};
use fee_reminder_infra::ReminderContext;
use std::str::FromStr;

const DEFAULT_PER_PAGE: i64 = 10;

fn handle_error(e: UseCaseErrors) -> ApiError {
    match e {
        UseCaseErrors::InvalidQuery(msg) => ApiError::BadClientData(msg),
        UseCaseErrors::StorageError => ApiError::InternalError,
    }
}

fn parse_filter<T: FromStr<Err = String>>(
    name: &str,
    value: &Option<String>,
) -> Result<Option<T>, ApiError> {
    value
        .as_ref()
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| ApiError::BadClientData(format!("Invalid {}: {}", name, e)))
        })
        .transpose()
}

pub async fn query_history_controller(
    query_params: web::Query<QueryParams>,
    ctx: web::Data<ReminderContext>,
) -> Result<HttpResponse, ApiError> {
    let query_params = query_params.0;
    let query = HistoryQuery {
        client_id: query_params.client_id,
        status: parse_filter("status", &query_params.status)?,
        kind: parse_filter("type", &query_params.kind)?,
        channel: parse_filter("channel", &query_params.channel)?,
        start_ts: query_params.start_ts,
        end_ts: query_params.end_ts,
        search: query_params.search.filter(|s| !s.trim().is_empty()),
        page: query_params.page.unwrap_or(1),
        per_page: query_params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    };

    let usecase = QueryHistoryUseCase { query };

    execute(usecase, &ctx)
        .await
        .map(|page| HttpResponse::Ok().json(APIResponse::new(page)))
        .map_err(handle_error)
}

/// Reads a page of the reminder history, newest entries first
#[derive(Debug)]
pub struct QueryHistoryUseCase {
    pub query: HistoryQuery,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    InvalidQuery(String),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for QueryHistoryUseCase {
    type Response = Page<ReminderHistoryEntry>;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        if self.query.page < 1 {
            return Err(UseCaseErrors::InvalidQuery(
                "The page must be a positive number".into(),
            ));
        }
        if self.query.per_page < 1 {
            return Err(UseCaseErrors::InvalidQuery(
                "The page size must be a positive number".into(),
            ));
        }
        if let (Some(start), Some(end)) = (self.query.start_ts, self.query.end_ts) {
            if start > end {
                return Err(UseCaseErrors::InvalidQuery(
                    "The start of the date range cannot be after its end".into(),
                ));
            }
        }
        self.query.per_page = self.query.per_page.min(ctx.config.history_page_size_limit);
        if self.query.checked_skip().is_none() {
            return Err(UseCaseErrors::InvalidQuery("The page is out of range".into()));
        }

        ctx.repos
            .reminder_history
            .find_by_query(&self.query)
            .await
            .map_err(|_| UseCaseErrors::StorageError)
    }
}
