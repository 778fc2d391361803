//! Serves generated controller artifacts verbatim.
//!
//! `/hmi/<area>/plc-config.json`, `/hmi/<area>/perspective-view.json` and
//! `/hmi/<area>` for the index page, where `<area>` may span several
//! segments.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use hmi_05_plc_deployment::{Artifact, DeploymentError};

use crate::domain::error::{ApiError, ApiResult};
use crate::router::AppState;

const PLC_CONFIG_SUFFIX: &str = "/plc-config.json";
const VIEW_SUFFIX: &str = "/perspective-view.json";

/// Split a request tail into the area path and the requested artifact.
pub fn resolve(rest: &str) -> (&str, Artifact) {
    let rest = rest.trim_end_matches('/');
    if let Some(area) = rest.strip_suffix(PLC_CONFIG_SUFFIX) {
        (area, Artifact::PlcConfig)
    } else if let Some(area) = rest.strip_suffix(VIEW_SUFFIX) {
        (area, Artifact::PerspectiveView)
    } else {
        (rest, Artifact::HmiIndex)
    }
}

pub async fn serve_artifact(
    State(state): State<AppState>,
    Path(rest): Path<String>,
) -> ApiResult<Response> {
    let (area, artifact) = resolve(&rest);
    let what = match artifact {
        Artifact::PlcConfig => "PLC configuration",
        Artifact::PerspectiveView => "Perspective view",
        Artifact::HmiIndex => "HMI interface",
    };

    let bytes = state
        .deployer
        .read_artifact(area, artifact)
        .await
        .map_err(|e| match e {
            DeploymentError::NotFound(_) => ApiError::not_found(what),
            other => ApiError::deployment(format!("Error loading {what}"), other),
        })?;

    Ok(([(header::CONTENT_TYPE, artifact.content_type())], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_suffixes() {
        assert_eq!(
            resolve("client/src/plc-config.json"),
            ("client/src", Artifact::PlcConfig)
        );
        assert_eq!(
            resolve("server/perspective-view.json"),
            ("server", Artifact::PerspectiveView)
        );
        assert_eq!(resolve("client/src/"), ("client/src", Artifact::HmiIndex));
    }
}
