use actix_web::{web, HttpResponse};
use log::{error, info};

use crate::models::AppState;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Runs the pipeline and returns the links, one per line.
pub async fn links_handler(app_state: web::Data<AppState>) -> HttpResponse {
    let state = app_state.get_ref().clone();
    // The HTTP client is blocking, keep it off the async workers
    match web::block(move || state.collect_links()).await {
        Ok(Ok(links)) => {
            info!("Serving {} links", links.len());
            HttpResponse::Ok()
                .content_type(TEXT_PLAIN)
                .body(links.join("\n"))
        }
        Ok(Err(e)) => {
            error!("Link harvest failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type(TEXT_PLAIN)
                .body(format!("Error: {}", e))
        }
        Err(e) => {
            error!("Link harvest worker failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type(TEXT_PLAIN)
                .body(format!("Error: {}", e))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(links_handler))
        .route("/health", web::get().to(|| async { "nodelinks is running!" }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::HarvestError;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_links_as_plain_text() {
        let state = AppState::with_runner(|| {
            Ok(vec!["vmess://a".to_string(), "vless://b".to_string()])
        });
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
        let body = test::read_body(resp).await;
        assert_eq!(body, "vmess://a\nvless://b");
    }

    #[actix_web::test]
    async fn test_fatal_error_is_500() {
        let state = AppState::with_runner(|| Err(HarvestError::NoNodes));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 500);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("no nodes"));
    }

    #[actix_web::test]
    async fn test_health() {
        let state = AppState::with_runner(|| Ok(Vec::new()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(config),
        )
        .await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "nodelinks is running!");
    }
}
