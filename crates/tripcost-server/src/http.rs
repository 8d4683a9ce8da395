//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::Html,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use tripcost_core::{
    format_currency, Categorical, City, CostCategory, FlightType, HotelClass, PredictionOutcome,
    PredictionTarget, RawTripFields, Season, TransportMode, TripCostError, FEATURE_COLUMNS,
    FEATURE_COUNT,
};

use crate::page::{FormInput, PageResult};
use crate::AppState;

/// Errors surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A form field could not be read as a number
    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: String, value: String },

    /// A form field that must be a whole number had a fraction
    #[error("{field} must be a whole number, got {value:?}")]
    NotWhole { field: String, value: String },

    /// The prediction target selector had an unknown value
    #[error("{0}")]
    InvalidTarget(String),

    /// Encoding or inference failed
    #[error(transparent)]
    Prediction(#[from] TripCostError),
}

impl ApiError {
    /// Bad input is the client's problem; anything from the models is ours.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidNumber { .. }
            | ApiError::NotWhole { .. }
            | ApiError::InvalidTarget(_)
            | ApiError::Prediction(TripCostError::Encode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn run_prediction(
    state: &AppState,
    raw: &RawTripFields,
    target: PredictionTarget,
) -> Result<PredictionOutcome, ApiError> {
    let outcome = state.predictor.predict(raw, target).map_err(|e| {
        match &e {
            TripCostError::Encode(_) => tracing::debug!("Rejected trip input: {}", e),
            _ => tracing::warn!("Prediction failed: {}", e),
        }
        ApiError::from(e)
    })?;
    if let Some(category) = outcome.category.filter(|c| !c.is_known()) {
        tracing::warn!("Classifier returned unmapped code {}", category.code());
    }
    tracing::debug!(
        prediction_target = %outcome.target,
        cost = ?outcome.cost,
        category = ?outcome.category.map(|c| c.code()),
        "Prediction served"
    );
    Ok(outcome)
}

// ============================================================================
// Form page
// ============================================================================

fn render_page(
    state: &AppState,
    status: StatusCode,
    form: &FormInput,
    result: Option<&PageResult>,
) -> (StatusCode, Html<String>) {
    match state.page.render(&state.config.display, form, result) {
        Ok(html) => (status, Html(html)),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Internal server error</h1>".to_string()),
            )
        }
    }
}

/// Render the empty trip form
pub async fn index(State(state): State<Arc<AppState>>) -> (StatusCode, Html<String>) {
    render_page(&state, StatusCode::OK, &FormInput::default(), None)
}

/// Handle a form submit and re-render the page with the results
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<FormInput>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let result = PageResult::Error(rejection.body_text());
            return render_page(&state, StatusCode::BAD_REQUEST, &FormInput::default(), Some(&result));
        }
    };

    let result = form
        .to_request()
        .and_then(|(raw, target)| run_prediction(&state, &raw, target));

    let (status, page_result) = match result {
        Ok(outcome) => (StatusCode::OK, PageResult::Outcome(outcome)),
        Err(e) => (e.status(), PageResult::Error(e.to_string())),
    };

    render_page(&state, status, &form, Some(&page_result))
}

// ============================================================================
// JSON API
// ============================================================================

/// Request body for `/api/predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(flatten)]
    pub trip: RawTripFields,
    #[serde(default)]
    pub target: PredictionTarget,
}

/// Response body for `/api/predict`
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub target: PredictionTarget,
    pub features: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_code: Option<i64>,
}

type JsonFailure = (StatusCode, Json<serde_json::Value>);

fn json_failure(status: StatusCode, message: String) -> JsonFailure {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": message
        })),
    )
}

/// Predict from a JSON body
pub async fn predict(
    State(state): State<Arc<AppState>>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, JsonFailure> {
    let Json(request) = request.map_err(|rejection| {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        json_failure(rejection.status(), rejection.body_text())
    })?;

    let outcome = run_prediction(&state, &request.trip, request.target)
        .map_err(|e| json_failure(e.status(), e.to_string()))?;

    let symbol = &state.config.display.currency_symbol;
    Ok(Json(PredictResponse {
        success: true,
        target: outcome.target,
        features: outcome.features.as_slice().to_vec(),
        cost: outcome.cost,
        cost_display: outcome.cost.map(|c| format_currency(c, symbol)),
        category: outcome.category.map(|c| c.to_string()),
        category_code: outcome.category.map(|c| c.code()),
    }))
}

/// One categorical attribute and its options
#[derive(Debug, Serialize)]
pub struct OptionList {
    pub attribute: &'static str,
    pub field: &'static str,
    pub options: Vec<&'static str>,
}

impl OptionList {
    fn of<T: Categorical>(field: &'static str) -> Self {
        Self {
            attribute: T::ATTRIBUTE,
            field,
            options: T::labels(),
        }
    }
}

/// Response for `/api/options`
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub attributes: Vec<OptionList>,
    pub categories: Vec<&'static str>,
    pub targets: Vec<&'static str>,
    pub feature_columns: Vec<&'static str>,
}

/// List every selectable option, in display order
pub async fn get_options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        attributes: vec![
            OptionList::of::<City>("city"),
            OptionList::of::<Season>("season"),
            OptionList::of::<FlightType>("flight_type"),
            OptionList::of::<HotelClass>("hotel_class"),
            OptionList::of::<TransportMode>("transport_mode"),
        ],
        categories: CostCategory::labels(),
        targets: PredictionTarget::ALL
            .iter()
            .map(|t| t.display_name())
            .collect(),
        feature_columns: FEATURE_COLUMNS.to_vec(),
    })
}

/// Get system status
pub async fn get_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "tripcost",
        "version": tripcost_core::version(),
        "feature_count": FEATURE_COUNT,
        "ready": true
    }))
}
