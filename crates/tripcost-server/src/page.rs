//! Trip form page
//!
//! Server-rendered HTML: the trip details form, the target selector, and the
//! results of the last submit. Submitted values are echoed back into the form.
//!
//! The markup lives in `templates/page.html` and is rendered with minijinja,
//! which escapes every interpolated value because the template name ends in
//! `.html`.

use std::fmt;

use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};

use tripcost_core::{
    format_currency, whole_number, Categorical, City, DisplayConfig, FlightType, HotelClass,
    PredictionOutcome, PredictionTarget, RawTripFields, Season, TransportMode,
};

use crate::http::ApiError;

/// Form fields exactly as the browser posts them
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormInput {
    pub city: String,
    pub season: String,
    pub flight_type: String,
    pub hotel_class: String,
    pub transport_mode: String,
    pub trip_days: String,
    pub distance_km: String,
    pub daily_hotel_cost: String,
    pub daily_food_cost: String,
    pub daily_transport_cost: String,
    pub activities_count: String,
    pub shopping_cost: String,
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_target() -> String {
    PredictionTarget::default().key().to_string()
}

impl Default for FormInput {
    fn default() -> Self {
        Self::from_raw(&RawTripFields::default(), PredictionTarget::default())
    }
}

impl FormInput {
    pub fn from_raw(raw: &RawTripFields, target: PredictionTarget) -> Self {
        Self {
            city: raw.city.clone(),
            season: raw.season.clone(),
            flight_type: raw.flight_type.clone(),
            hotel_class: raw.hotel_class.clone(),
            transport_mode: raw.transport_mode.clone(),
            trip_days: raw.trip_days.to_string(),
            distance_km: raw.distance_km.to_string(),
            daily_hotel_cost: raw.daily_hotel_cost.to_string(),
            daily_food_cost: raw.daily_food_cost.to_string(),
            daily_transport_cost: raw.daily_transport_cost.to_string(),
            activities_count: raw.activities_count.to_string(),
            shopping_cost: raw.shopping_cost.to_string(),
            target: target.key().to_string(),
        }
    }

    /// Parse the numeric fields and the target selector.
    ///
    /// Labels are left as-is; the encoder rejects unknown ones.
    pub fn to_request(&self) -> Result<(RawTripFields, PredictionTarget), ApiError> {
        let raw = RawTripFields {
            city: self.city.clone(),
            season: self.season.clone(),
            flight_type: self.flight_type.clone(),
            hotel_class: self.hotel_class.clone(),
            transport_mode: self.transport_mode.clone(),
            trip_days: parse_whole("Trip Days", &self.trip_days)?,
            distance_km: parse_number("Distance (km)", &self.distance_km)?,
            daily_hotel_cost: parse_number("Daily Hotel Cost", &self.daily_hotel_cost)?,
            daily_food_cost: parse_number("Daily Food Cost", &self.daily_food_cost)?,
            daily_transport_cost: parse_number("Daily Transport Cost", &self.daily_transport_cost)?,
            activities_count: parse_whole("Activities Count", &self.activities_count)?,
            shopping_cost: parse_number("Shopping Cost", &self.shopping_cost)?,
        };
        let target = self.target.parse().map_err(ApiError::InvalidTarget)?;
        Ok((raw, target))
    }
}

fn parse_number(field: &str, value: &str) -> Result<f64, ApiError> {
    value.trim().parse().map_err(|_| ApiError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Accepts `"5"` and `"5.0"`, rejects `"5.5"`.
fn parse_whole(field: &str, value: &str) -> Result<i64, ApiError> {
    if let Ok(n) = value.trim().parse::<i64>() {
        return Ok(n);
    }
    whole_number(parse_number(field, value)?).ok_or_else(|| ApiError::NotWhole {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// What to show under the form
#[derive(Debug)]
pub enum PageResult {
    Outcome(PredictionOutcome),
    Error(String),
}

const PAGE_NAME: &str = "page.html";
const PAGE_TEMPLATE: &str = include_str!("../templates/page.html");

#[derive(Serialize)]
struct OptionView {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct SelectView {
    name: &'static str,
    label: &'static str,
    options: Vec<OptionView>,
}

impl SelectView {
    fn of<T: Categorical + PartialEq>(name: &'static str, selected: &str) -> Self {
        let current = T::from_label(selected).ok();
        Self {
            name,
            label: T::ATTRIBUTE,
            options: T::ALL
                .iter()
                .map(|option| OptionView {
                    value: option.label(),
                    label: option.label(),
                    selected: current == Some(*option),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct NumberView<'a> {
    name: &'static str,
    label: String,
    value: &'a str,
    min: &'static str,
    step: &'static str,
}

#[derive(Serialize)]
struct ResultView {
    cost: Option<String>,
    category: Option<String>,
    error: Option<String>,
}

impl ResultView {
    fn new(display: &DisplayConfig, result: &PageResult) -> Self {
        match result {
            PageResult::Outcome(outcome) => Self {
                cost: outcome
                    .cost
                    .map(|cost| format_currency(cost, &display.currency_symbol)),
                category: outcome.category.map(|category| category.to_string()),
                error: None,
            },
            PageResult::Error(message) => Self {
                cost: None,
                category: None,
                error: Some(message.clone()),
            },
        }
    }
}

impl<'a> NumberView<'a> {
    fn new(name: &'static str, label: String, value: &'a str, min: &'static str, step: &'static str) -> Self {
        Self {
            name,
            label,
            value,
            min,
            step,
        }
    }
}

fn number_fields<'a>(form: &'a FormInput, symbol: &str) -> Vec<NumberView<'a>> {
    let money = |label: &str| format!("{} ({})", label, symbol);
    vec![
        NumberView::new("trip_days", "Trip Days".to_string(), &form.trip_days, "1", "1"),
        NumberView::new("distance_km", "Distance (km)".to_string(), &form.distance_km, "0", "any"),
        NumberView::new("daily_hotel_cost", money("Daily Hotel Cost"), &form.daily_hotel_cost, "0", "any"),
        NumberView::new("daily_food_cost", money("Daily Food Cost"), &form.daily_food_cost, "0", "any"),
        NumberView::new(
            "daily_transport_cost",
            money("Daily Transport Cost"),
            &form.daily_transport_cost,
            "0",
            "any",
        ),
        NumberView::new(
            "activities_count",
            "Activities Count".to_string(),
            &form.activities_count,
            "0",
            "1",
        ),
        NumberView::new("shopping_cost", money("Shopping Cost"), &form.shopping_cost, "0", "any"),
    ]
}

fn target_options(selected: &str) -> Vec<OptionView> {
    let current = selected.parse::<PredictionTarget>().ok();
    PredictionTarget::ALL
        .iter()
        .map(|target| OptionView {
            value: target.key(),
            label: target.display_name(),
            selected: current == Some(*target),
        })
        .collect()
}

/// The compiled trip form page
pub struct Page {
    env: Environment<'static>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("template", &PAGE_NAME)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Compile the page template.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(PAGE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the full page.
    pub fn render(
        &self,
        display: &DisplayConfig,
        form: &FormInput,
        result: Option<&PageResult>,
    ) -> Result<String, minijinja::Error> {
        let selects = vec![
            SelectView::of::<City>("city", &form.city),
            SelectView::of::<Season>("season", &form.season),
            SelectView::of::<FlightType>("flight_type", &form.flight_type),
            SelectView::of::<HotelClass>("hotel_class", &form.hotel_class),
            SelectView::of::<TransportMode>("transport_mode", &form.transport_mode),
        ];

        self.env.get_template(PAGE_NAME)?.render(context! {
            title => &display.title,
            selects => selects,
            numbers => number_fields(form, &display.currency_symbol),
            targets => target_options(&form.target),
            result => result.map(|result| ResultView::new(display, result)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(form: &FormInput, result: Option<&PageResult>) -> String {
        Page::new()
            .unwrap()
            .render(&DisplayConfig::default(), form, result)
            .unwrap()
    }

    #[test]
    fn test_default_form_matches_initial_state() {
        let form = FormInput::default();
        assert_eq!(form.city, "London");
        assert_eq!(form.trip_days, "1");
        assert_eq!(form.activities_count, "3");
        assert_eq!(form.distance_km, "0");
        assert_eq!(form.target, "total_trip_cost");

        let (raw, target) = form.to_request().unwrap();
        assert_eq!(raw, RawTripFields::default());
        assert_eq!(target, PredictionTarget::TotalTripCost);
    }

    #[test]
    fn test_whole_number_parsing() {
        assert_eq!(parse_whole("Trip Days", " 5 ").unwrap(), 5);
        assert_eq!(parse_whole("Trip Days", "5.0").unwrap(), 5);
        assert_eq!(parse_whole("Trip Days", "-2").unwrap(), -2);
        assert!(matches!(
            parse_whole("Trip Days", "5.5"),
            Err(ApiError::NotWhole { .. })
        ));
        assert!(matches!(
            parse_whole("Trip Days", ""),
            Err(ApiError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_unknown_target() {
        let form = FormInput {
            target: "everything".to_string(),
            ..FormInput::default()
        };
        assert!(matches!(form.to_request(), Err(ApiError::InvalidTarget(_))));
    }

    #[test]
    fn test_render_keeps_selection_and_escapes() {
        let form = FormInput {
            season: "Monsoon".to_string(),
            shopping_cost: "\"><script>".to_string(),
            target: "both".to_string(),
            ..FormInput::default()
        };
        let html = render(&form, None);
        assert!(html.contains("<option value=\"Monsoon\" selected>Monsoon</option>"));
        assert!(html.contains("<option value=\"both\" selected>Both</option>"));
        assert!(html.contains("<option value=\"Off-Season\">Off-Season</option>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Shopping Cost (₹)"));
        assert!(!html.contains("class=\"results\""));
    }

    #[test]
    fn test_render_error() {
        let html = render(
            &FormInput::default(),
            Some(&PageResult::Error("Unknown City option: \"Paris\"".to_string())),
        );
        assert!(html.contains("<p class=\"error\">Unknown City option: &quot;Paris&quot;</p>"));
    }

    #[test]
    fn test_render_escapes_configured_title() {
        let display = DisplayConfig {
            title: "<b>Trips</b>".to_string(),
            ..DisplayConfig::default()
        };
        let html = Page::new()
            .unwrap()
            .render(&display, &FormInput::default(), None)
            .unwrap();
        assert!(html.contains("&lt;b&gt;Trips"));
        assert!(!html.contains("<b>Trips"));
    }

    #[test]
    fn test_render_outcome_sections() {
        let outcome = PredictionOutcome {
            target: PredictionTarget::Both,
            features: tripcost_core::encode(&RawTripFields::default()).unwrap(),
            cost: Some(1234.5),
            category: Some(tripcost_core::CategoryLabel::from_code(1)),
        };
        let html = render(&FormInput::default(), Some(&PageResult::Outcome(outcome)));
        assert!(html.contains("🔢 Your Total Cost"));
        assert!(html.contains("₹ 1,234.50"));
        assert!(html.contains("<strong>Predicted Cost Category:</strong> Luxury"));
        assert!(!html.contains("class=\"error\""));
    }
}
