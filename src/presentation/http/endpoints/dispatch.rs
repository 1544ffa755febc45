use std::sync::Arc;

use chrono::Utc;
use poem::http::HeaderMap;
use poem_openapi::{OpenApi, param::Query, payload::Json};

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    mappers::map_cycle_report,
    responses::{DispatchSummaryDto, RunDispatchResponse},
    security::{presented_token, token_matches},
};

#[derive(Clone)]
pub struct DispatchEndpoints {
    state: Arc<ApiState>,
}

impl DispatchEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl DispatchEndpoints {
    /// Cron trigger: runs one dispatch cycle over due and birthday messages.
    #[oai(path = "/dispatch/run", method = "post", tag = EndpointsTags::Dispatch)]
    pub async fn run_dispatch(
        &self,
        headers: &HeaderMap,
        token: Query<Option<String>>,
    ) -> RunDispatchResponse {
        let authorized = presented_token(headers, token.0.as_deref())
            .is_some_and(|presented| token_matches(presented, &self.state.cron_secret));
        if !authorized {
            tracing::warn!("dispatch trigger rejected: missing or invalid token");
            return RunDispatchResponse::Unauthorized(Json(DispatchSummaryDto::failure(
                "unauthorized",
            )));
        }

        match self
            .state
            .run_dispatch_cycle_usecase
            .execute(Utc::now())
            .await
        {
            Ok(report) => RunDispatchResponse::Ok(Json(map_cycle_report(&report))),
            Err(err) => {
                tracing::error!(error = %err, "dispatch cycle could not start");
                RunDispatchResponse::Failed(Json(DispatchSummaryDto::failure(err.to_string())))
            }
        }
    }
}
