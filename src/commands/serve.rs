use std::net::SocketAddr;

use axum::extract::{DefaultBodyLimit, FromRequest, Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::Session;
use crate::controllers::pastes;
use crate::types::api::{
    CreatePaste, CreatedData, CreatedPaste, DeletedData, DeletedPaste, ListData, ListPastes,
    UpdatePaste, UpdatedData, UpdatedPaste,
};
use crate::{ApiError, App};

/// Request-body extractor whose rejection goes through the standard error
/// envelope instead of axum's plain-text default.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct JsonBody<T>(T);

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], app.config.port));

    info!("listening on {addr}");

    axum::Server::bind(&addr)
        .serve(router(app).into_make_service())
        .await?;

    Ok(())
}

pub fn router(app: App) -> Router {
    Router::new()
        .route("/api/pastes", get(list_pastes).post(create_paste))
        .route("/api/pastes/:id", put(update_paste).delete(delete_paste))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(app.config.limits.max_request_size))
        .layer(TraceLayer::new_for_http())
        .route_layer(NormalizePathLayer::trim_trailing_slash())
        .with_state(app)
}

async fn list_pastes(
    State(app): State<App>,
    Session(principal): Session,
) -> crate::ApiResult<Json<ListPastes>> {
    let pastes = pastes::list(&app, &principal).await?;

    Ok(Json(ListPastes {
        success: true,
        data: ListData { pastes },
    }))
}

async fn create_paste(
    State(app): State<App>,
    Session(principal): Session,
    JsonBody(body): JsonBody<CreatePaste>,
) -> crate::ApiResult<Json<CreatedPaste>> {
    let (paste, all_pastes) = pastes::create(&app, &principal, &body.content).await?;

    Ok(Json(CreatedPaste {
        success: true,
        data: CreatedData { paste, all_pastes },
    }))
}

async fn update_paste(
    State(app): State<App>,
    Session(principal): Session,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdatePaste>,
) -> crate::ApiResult<Json<UpdatedPaste>> {
    let result = pastes::update(&app, &principal, &id, &body.content).await?;

    Ok(Json(UpdatedPaste {
        success: true,
        message: "Paste updated successfully".into(),
        data: UpdatedData {
            updated_paste: result.paste,
            remaining_pastes: result.remaining,
            timestamp: Utc::now(),
        },
    }))
}

async fn delete_paste(
    State(app): State<App>,
    Session(principal): Session,
    Path(id): Path<String>,
) -> crate::ApiResult<Json<DeletedPaste>> {
    let result = pastes::delete(&app, &principal, &id).await?;

    Ok(Json(DeletedPaste {
        success: true,
        message: "Paste deleted successfully".into(),
        data: DeletedData {
            deleted_paste: result.paste,
            remaining_pastes: result.remaining,
            timestamp: Utc::now(),
        },
    }))
}
