use actix_web::web;

use crate::{constants::{API_PREFIX, UPLOADS_PATH}, handlers::{home::home, system::health_check, uploads}};

mod json_error;
mod projects;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope(API_PREFIX)
            .service(health_check)
            .configure(projects::config_routes)
    );

    cfg.service(
        web::resource(format!("{}/{{file_name}}", UPLOADS_PATH))
            .route(web::get().to(uploads::serve_upload))
    );

    cfg.configure(json_error::config_routes);
}
