use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Portfolio projects API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "gallery": "/api/v1/gallery",
        "projects": "/api/v1/projects"
    }))
}
