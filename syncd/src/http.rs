//! The HTTP status server: a small `actix-web` app exposing replication
//! progress to operators, plus (in `--dev`) a couple of reverse-proxy routes
//! for a companion frontend dev server.

use actix_web::{web, App, HttpResponse, HttpServer};
use futures::stream;
use libsync::status::StatusStore;
use std::sync::Arc;

const DEV_UPSTREAM: &str = "http://127.0.0.1:8080";

async fn get_status(
    status: web::Data<Arc<StatusStore>>,
    name: web::Path<String>,
) -> HttpResponse {
    match status.snapshot(&name) {
        Some(replication) => HttpResponse::Ok().json(replication.projects),
        None => HttpResponse::NotFound().json(serde_json::json!({})),
    }
}

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Server-sent events feed: one JSON snapshot of every replication per
/// change, preceded by the current snapshot so a new client isn't left
/// waiting for the next state transition.
async fn sync_feed(status: web::Data<Arc<StatusStore>>) -> HttpResponse {
    let initial = snapshot_event(&status);
    let rx = status.subscribe();
    let status = status.get_ref().clone();

    let tail = stream::unfold((rx, status), |(mut rx, status)| async move {
        if rx.changed().await.is_err() {
            return None;
        }
        let event = snapshot_event(&status);
        Some((Ok::<_, actix_web::Error>(web::Bytes::from(event)), (rx, status)))
    });

    let body = stream::once(async move { Ok::<_, actix_web::Error>(web::Bytes::from(initial)) })
        .chain(tail);

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(body)
}

fn snapshot_event(status: &StatusStore) -> String {
    let snapshot = status.snapshot_all();
    let by_name: std::collections::HashMap<_, _> = snapshot
        .into_iter()
        .map(|r| (r.name.clone(), r.projects))
        .collect();
    let body = serde_json::to_string(&by_name).unwrap_or_else(|_| "{}".to_string());
    format!("data: {body}\n\n")
}

async fn dev_proxy(
    client: web::Data<reqwest::Client>,
    dev: web::Data<bool>,
    path: web::Path<String>,
) -> HttpResponse {
    if !*dev {
        return HttpResponse::NotFound().finish();
    }
    proxy_path(&client, &format!("/{}", path.into_inner())).await
}

async fn dev_proxy_root(client: web::Data<reqwest::Client>, dev: web::Data<bool>) -> HttpResponse {
    if !*dev {
        return HttpResponse::NotFound().finish();
    }
    proxy_path(&client, "/").await
}

async fn proxy_path(client: &reqwest::Client, path: &str) -> HttpResponse {
    let url = format!("{DEV_UPSTREAM}{path}");
    match client.get(&url).send().await {
        Ok(response) => {
            let status = response.status();
            match response.bytes().await {
                Ok(body) => HttpResponse::build(status).body(body),
                Err(_) => HttpResponse::BadGateway().finish(),
            }
        }
        Err(_) => HttpResponse::BadGateway().finish(),
    }
}

/// Runs the status server on `0.0.0.0:8081` until the process is asked to
/// shut down. `dev` enables the `/` and `/app.js` reverse-proxy routes.
pub async fn serve(status: Arc<StatusStore>, dev: bool) -> std::io::Result<()> {
    log::info!("status server listening on 0.0.0.0:8081 (dev mode: {dev})");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(status.clone()))
            .app_data(web::Data::new(reqwest::Client::new()))
            .app_data(web::Data::new(dev))
            .route("/status/{name}", web::get().to(get_status))
            .route("/sync", web::get().to(sync_feed))
            .route("/healthz", web::get().to(healthz))
            .route("/", web::get().to(dev_proxy_root))
            .route("/{path:.*}", web::get().to(dev_proxy))
    })
    .bind(("0.0.0.0", 8081))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use libsync::status::Status;

    fn test_app_data(status: Arc<StatusStore>, dev: bool) -> (web::Data<Arc<StatusStore>>, web::Data<bool>) {
        (web::Data::new(status), web::Data::new(dev))
    }

    #[actix_web::test]
    async fn healthz_returns_ok() {
        let app = test::init_service(App::new().route("/healthz", web::get().to(healthz))).await;
        let req = test::TestRequest::get().uri("/healthz").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn status_unknown_replication_is_404() {
        let status = Arc::new(StatusStore::new());
        let (status_data, _) = test_app_data(status, false);
        let app = test::init_service(
            App::new()
                .app_data(status_data)
                .route("/status/{name}", web::get().to(get_status)),
        )
        .await;
        let req = test::TestRequest::get().uri("/status/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn status_known_replication_returns_projects() {
        let status = Arc::new(StatusStore::new());
        status.set_project_status("repl-a", "alpine", Status::Done, None);
        let (status_data, _) = test_app_data(status, false);
        let app = test::init_service(
            App::new()
                .app_data(status_data)
                .route("/status/{name}", web::get().to(get_status)),
        )
        .await;
        let req = test::TestRequest::get().uri("/status/repl-a").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Vec<serde_json::Value> = test::read_body_json(resp).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["name"], "alpine");
    }

    #[actix_web::test]
    async fn dev_proxy_is_404_when_dev_mode_is_off() {
        let (_, dev_data) = test_app_data(Arc::new(StatusStore::new()), false);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(reqwest::Client::new()))
                .app_data(dev_data)
                .route("/", web::get().to(dev_proxy_root)),
        )
        .await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
