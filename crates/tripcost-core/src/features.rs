//! Feature encoding
//!
//! Turns the values a user submits into the 12-column vector the scaler and
//! models were fit on. Column order is fixed by [`FEATURE_COLUMNS`]; nothing
//! downstream can detect a reordering, so it is only ever built here.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::codes::{Categorical, City, FlightType, HotelClass, Season, TransportMode};
use crate::error::EncodeError;

/// Number of model input columns
pub const FEATURE_COUNT: usize = 12;

/// Model input columns, in fit order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "City",
    "Season",
    "Trip_Days",
    "Flight_Type",
    "Distance_km",
    "Hotel_Class",
    "Daily_Hotel_Cost",
    "Daily_Food_Cost",
    "Transport_Mode",
    "Daily_Transport_Cost",
    "Activities_Count",
    "Shopping_Cost",
];

/// Field values as submitted by the form or the JSON API.
///
/// Categorical selections arrive as labels; integers are signed so that a
/// negative entry is reported as out of range rather than as a parse failure.
/// The two counts also accept whole-valued floats such as `5.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTripFields {
    pub city: String,
    pub season: String,
    pub flight_type: String,
    pub hotel_class: String,
    pub transport_mode: String,
    #[serde(deserialize_with = "deserialize_count")]
    pub trip_days: i64,
    pub distance_km: f64,
    pub daily_hotel_cost: f64,
    pub daily_food_cost: f64,
    pub daily_transport_cost: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub activities_count: i64,
    pub shopping_cost: f64,
}

/// The integer value of `value`, if it has no fractional part.
pub fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Whole(i64),
        Number(f64),
    }

    match Count::deserialize(deserializer) {
        Ok(Count::Whole(n)) => Ok(n),
        Ok(Count::Number(n)) => whole_number(n)
            .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {}", n))),
        Err(_) => Err(de::Error::custom("expected a whole number")),
    }
}

impl Default for RawTripFields {
    /// The form's initial state: first option of every list, one day, three activities.
    fn default() -> Self {
        Self {
            city: City::ALL[0].label().to_string(),
            season: Season::ALL[0].label().to_string(),
            flight_type: FlightType::ALL[0].label().to_string(),
            hotel_class: HotelClass::ALL[0].label().to_string(),
            transport_mode: TransportMode::ALL[0].label().to_string(),
            trip_days: 1,
            distance_km: 0.0,
            daily_hotel_cost: 0.0,
            daily_food_cost: 0.0,
            daily_transport_cost: 0.0,
            activities_count: 3,
            shopping_cost: 0.0,
        }
    }
}

/// Validated, typed trip attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripDetails {
    pub city: City,
    pub season: Season,
    pub flight_type: FlightType,
    pub hotel_class: HotelClass,
    pub transport_mode: TransportMode,
    pub trip_days: u32,
    pub distance_km: f64,
    pub daily_hotel_cost: f64,
    pub daily_food_cost: f64,
    pub daily_transport_cost: f64,
    pub activities_count: u32,
    pub shopping_cost: f64,
}

impl TripDetails {
    /// Resolve labels and check numeric constraints.
    pub fn from_raw(raw: &RawTripFields) -> Result<Self, EncodeError> {
        Ok(Self {
            city: City::from_label(&raw.city)?,
            season: Season::from_label(&raw.season)?,
            flight_type: FlightType::from_label(&raw.flight_type)?,
            hotel_class: HotelClass::from_label(&raw.hotel_class)?,
            transport_mode: TransportMode::from_label(&raw.transport_mode)?,
            trip_days: count_at_least("Trip_Days", raw.trip_days, 1)?,
            distance_km: non_negative("Distance_km", raw.distance_km)?,
            daily_hotel_cost: non_negative("Daily_Hotel_Cost", raw.daily_hotel_cost)?,
            daily_food_cost: non_negative("Daily_Food_Cost", raw.daily_food_cost)?,
            daily_transport_cost: non_negative("Daily_Transport_Cost", raw.daily_transport_cost)?,
            activities_count: count_at_least("Activities_Count", raw.activities_count, 0)?,
            shopping_cost: non_negative("Shopping_Cost", raw.shopping_cost)?,
        })
    }

    /// Assemble the model input row.
    pub fn to_features(&self) -> FeatureVector {
        FeatureVector([
            self.city.code() as f64,
            self.season.code() as f64,
            f64::from(self.trip_days),
            self.flight_type.code() as f64,
            self.distance_km,
            self.hotel_class.code() as f64,
            self.daily_hotel_cost,
            self.daily_food_cost,
            self.transport_mode.code() as f64,
            self.daily_transport_cost,
            f64::from(self.activities_count),
            self.shopping_cost,
        ])
    }
}

fn count_at_least(field: &str, value: i64, min: i64) -> Result<u32, EncodeError> {
    if value < min {
        return Err(EncodeError::OutOfRange {
            field: field.to_string(),
            min: min as f64,
            value: value as f64,
        });
    }
    u32::try_from(value).map_err(|_| EncodeError::TooLarge {
        field: field.to_string(),
        max: f64::from(u32::MAX),
    })
}

fn non_negative(field: &str, value: f64) -> Result<f64, EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::NonFinite {
            field: field.to_string(),
        });
    }
    if value < 0.0 {
        return Err(EncodeError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            value,
        });
    }
    Ok(value)
}

/// Encode raw fields into the model input row.
pub fn encode(raw: &RawTripFields) -> Result<FeatureVector, EncodeError> {
    TripDetails::from_raw(raw).map(|details| details.to_features())
}

/// One trip in model column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of a named column.
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|name| *name == column)
            .map(|index| self.0[index])
    }

    /// `(column, value)` pairs in model order.
    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.0.iter().copied())
    }
}

/// A feature vector after the scaler transform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledVector(Vec<f64>);

impl ScaledVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
