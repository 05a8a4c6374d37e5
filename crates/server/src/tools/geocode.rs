//! geocode_city tool implementation.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waypost_core::models::GeocodingResult;

use crate::context::GatewayContext;

/// Input parameters for the geocode_city tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeocodeCityParams {
    /// City name to resolve, free text (e.g. "London" or "Paris, France").
    pub city: String,
}

/// Output structure for the geocode_city tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeocodeCityOutput {
    /// Whether the upstream had a match for the query.
    pub found: bool,
    /// The best match, when one exists.
    pub result: Option<GeocodingResult>,
}

/// Implementation of the geocode_city tool.
pub async fn geocode_impl(
    context: &GatewayContext,
    params: GeocodeCityParams,
) -> Result<CallToolResult, McpError> {
    let result = context.geocoding.resolve(&params.city).await?;

    let output = GeocodeCityOutput { found: result.is_some(), result };

    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&output).unwrap_or_default(),
    )]))
}
