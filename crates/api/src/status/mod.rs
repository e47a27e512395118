use crate::scheduler::Scheduler;
use actix_web::{web, HttpResponse};
use fee_reminder_api_structs::get_service_health::*;

async fn status(scheduler: web::Data<Scheduler>) -> HttpResponse {
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
        reminder_run_active: scheduler.is_running(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status));
}
