//! Inbound HTTP: the landing page and the OAuth redirect target.
//!
//! * `GET /` shows the relay's state and a link that starts authorization.
//! * `GET /callback?code=...` hands the one-time code to the supervisor.

use std::future::Future;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use url::Url;

use crate::{
    error::{Error, Result},
    protocol::telegram::escape,
    supervisor::Handle,
};

#[derive(Clone)]
struct AppState {
    handle: Handle,
    authorize_url: Url,
}

/// Query of the redirect back from the provider.
///
/// Carries either `code` or, when the user declined, `error`.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

/// Routes of the inbound surface.
pub fn router(handle: Handle, authorize_url: Url) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/callback", get(callback))
        .with_state(AppState {
            handle,
            authorize_url,
        })
}

/// Serves `router` until `shutdown` completes.
///
/// # Errors
///
/// Returns `Network` if accepting connections fails.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("server is running on http://{addr}");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::network)
}

async fn landing(State(state): State<AppState>) -> Html<String> {
    let status = match state.handle.status().await {
        Ok(status) if status.polling => match status.published {
            Some(track) => format!("Showing <b>{}</b>.", escape(&track.to_string())),
            None => "Waiting for music.".to_owned(),
        },
        Ok(status) if status.authorized => "Not polling; please reauthorize.".to_owned(),
        Ok(_) => "Not authorized yet.".to_owned(),
        Err(_) => "Shutting down.".to_owned(),
    };

    Html(format!(
        "<!DOCTYPE html>\n\
         <html><head><title>Now playing</title></head><body>\n\
         <p>{status}</p>\n\
         <p><a href=\"{}\">Authorize with Spotify</a></p>\n\
         </body></html>\n",
        escape(state.authorize_url.as_str())
    ))
}

async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, String) {
    if let Some(error) = params.error {
        warn!("authorization declined: {error}");
        return (
            StatusCode::BAD_REQUEST,
            format!("Authorization declined: {error}"),
        );
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing authorization code".to_owned(),
        );
    };

    match state.handle.authorize(code).await {
        Ok(()) => (
            StatusCode::OK,
            "Callback handled successfully!".to_owned(),
        ),
        Err(e) => {
            error!("callback handling failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error handling callback".to_owned(),
            )
        }
    }
}
