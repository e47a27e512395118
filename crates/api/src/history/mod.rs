mod get_history_entry;
mod query_history;
pub mod record_history;

use actix_web::web;
use get_history_entry::get_history_entry_controller;
use query_history::query_history_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/history", web::get().to(query_history_controller));
    cfg.route(
        "/history/{entry_id}",
        web::get().to(get_history_entry_controller),
    );
}
