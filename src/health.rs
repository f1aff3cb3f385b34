use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tokio::time::timeout;
use tracing::instrument;

use crate::error::Envelope;
use crate::state::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Timeout is reported as `unreachable`, distinct from a collaborator
/// that answered with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Failing,
    Unreachable,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub database: ProbeStatus,
    pub auth: ProbeStatus,
}

impl HealthReport {
    fn all_ok(&self) -> bool {
        self.database == ProbeStatus::Ok && self.auth == ProbeStatus::Ok
    }
}

#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match timeout(PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(&state.db)).await
    {
        Err(_) => ProbeStatus::Unreachable,
        Ok(Ok(_)) => ProbeStatus::Ok,
        Ok(Err(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)) => ProbeStatus::Unreachable,
        Ok(Err(_)) => ProbeStatus::Failing,
    };

    let auth = match timeout(PROBE_TIMEOUT, state.auth.health_check()).await {
        Err(_) => ProbeStatus::Unreachable,
        Ok(Ok(())) => ProbeStatus::Ok,
        Ok(Err(crate::providers::auth::AuthProviderError::Unreachable(_))) => {
            ProbeStatus::Unreachable
        }
        Ok(Err(_)) => ProbeStatus::Failing,
    };

    respond(HealthReport { database, auth })
}

/// The body's `success` tracks the status code: a degraded report is a
/// failure envelope, with the probe detail still in `data`.
fn respond(report: HealthReport) -> (StatusCode, Json<Envelope<HealthReport>>) {
    let status = if report.all_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let degraded: Vec<&str> = [("database", report.database), ("auth", report.auth)]
        .into_iter()
        .filter(|(_, probe)| *probe != ProbeStatus::Ok)
        .map(|(name, _)| name)
        .collect();
    let body = Envelope {
        success: report.all_ok(),
        error: if degraded.is_empty() {
            None
        } else {
            Some(format!("degraded: {}", degraded.join(", ")))
        },
        data: Some(report),
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProbeStatus::Unreachable).unwrap(),
            r#""unreachable""#
        );
        assert_eq!(serde_json::to_string(&ProbeStatus::Ok).unwrap(), r#""ok""#);
    }

    #[test]
    fn report_is_healthy_only_when_every_probe_is_ok() {
        let healthy = HealthReport {
            database: ProbeStatus::Ok,
            auth: ProbeStatus::Ok,
        };
        assert!(healthy.all_ok());

        let degraded = HealthReport {
            database: ProbeStatus::Ok,
            auth: ProbeStatus::Unreachable,
        };
        assert!(!degraded.all_ok());
    }

    #[test]
    fn degraded_report_returns_a_failure_envelope() {
        let (status, body) = respond(HealthReport {
            database: ProbeStatus::Failing,
            auth: ProbeStatus::Ok,
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json = serde_json::to_value(&body.0).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "degraded: database");
        assert_eq!(json["data"]["database"], "failing");

        let (status, body) = respond(HealthReport {
            database: ProbeStatus::Ok,
            auth: ProbeStatus::Ok,
        });
        assert_eq!(status, StatusCode::OK);
        let json = serde_json::to_value(&body.0).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }
}
