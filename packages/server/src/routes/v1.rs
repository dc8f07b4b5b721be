use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/owners/{owner_id}/files", owner_file_routes())
        .nest("/files", file_routes())
}

fn owner_file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::file::upload_file,
            handlers::file::list_files
        ))
        .layer(handlers::file::upload_body_limit())
}

fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::file::get_file, handlers::file::delete_file))
        .routes(routes!(handlers::file::download_file))
}
