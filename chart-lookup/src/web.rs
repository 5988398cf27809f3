use std::net::SocketAddr;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chart_client::{
    registry::{RegistryClient, RegistryListing},
    ChartClient, ChartRecord, LookupError,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone)]
struct WebAppState {
    chart_client: ChartClient,
}

pub async fn run_web_app(chart_client: ChartClient, listen: SocketAddr) -> anyhow::Result<()> {
    let state = WebAppState { chart_client };
    // One catch-all endpoint, any method and path.
    let app = Router::new().fallback(lookup).with_state(state);

    let listener = TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    repo: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug)]
struct LookupFailure {
    status: StatusCode,
    message: String,
}

impl LookupFailure {
    fn bad_request(message: &str) -> Self {
        LookupFailure {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl From<LookupError> for LookupFailure {
    fn from(err: LookupError) -> Self {
        // The response only carries the message; the cause chain stays in
        // the logs.
        warn!(error = ?err, "Lookup failed");
        LookupFailure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for LookupFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Backend {
    Index(Url),
    Registry(Url),
    Unknown,
}

impl Backend {
    /// Pick the fetch target for a repository URL. HTTP(S) repositories are
    /// always read at `/index.yaml`, whatever path the caller supplied.
    fn from_repo(mut url: Url) -> Self {
        match url.scheme() {
            "http" | "https" => {
                url.set_path("/index.yaml");
                url.set_query(None);
                Backend::Index(url)
            }
            "oci" => Backend::Registry(url),
            _ => Backend::Unknown,
        }
    }
}

/// Wire contract: an unimplemented registry listing reads as an empty chart
/// list.
fn registry_charts(listing: RegistryListing) -> Vec<ChartRecord> {
    match listing {
        RegistryListing::Charts(charts) => charts,
        RegistryListing::NotImplemented(_) => Vec::new(),
    }
}

async fn lookup(
    State(state): State<WebAppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<Option<Vec<ChartRecord>>>, LookupFailure> {
    let repo = match params.repo {
        Some(repo) if !repo.is_empty() => repo,
        _ => return Err(LookupFailure::bad_request("Repo URL required")),
    };
    let repo_url = Url::parse(&repo).map_err(|_| LookupFailure::bad_request("Invalid repo URL"))?;

    let charts = match Backend::from_repo(repo_url) {
        Backend::Index(index_url) => {
            debug!(%index_url, "Fetching repository index");
            Some(state.chart_client.http_index(&index_url).await?)
        }
        Backend::Registry(repo_url) => {
            let registry = RegistryClient::new(state.chart_client.http_client(), &repo_url)?;
            Some(registry_charts(registry.charts().await?))
        }
        Backend::Unknown => None,
    };

    Ok(Json(charts))
}
