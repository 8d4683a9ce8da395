//! Categorical code tables.
//!
//! Each categorical trip attribute has a closed set of labels and a dense
//! integer code per label. The codes are what the models were fit on, so they
//! must never be renumbered without refitting the artifacts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// A closed categorical attribute with a fixed label ↔ code table.
pub trait Categorical: Copy + Sized + 'static {
    /// Attribute name as shown to the user.
    const ATTRIBUTE: &'static str;

    /// Every option, in the order it is offered to the user.
    const ALL: &'static [Self];

    /// Canonical label.
    fn label(&self) -> &'static str;

    /// Model code.
    fn code(&self) -> i64;

    /// Extra spellings accepted on input besides the canonical label.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Resolve a label, case-insensitively and ignoring surrounding whitespace.
    fn from_label(label: &str) -> Result<Self, EncodeError> {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|option| {
                option.label().eq_ignore_ascii_case(wanted)
                    || option
                        .aliases()
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| EncodeError::UnknownLabel {
                attribute: Self::ATTRIBUTE.to_string(),
                label: label.to_string(),
            })
    }

    /// Reverse lookup by model code.
    fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|option| option.code() == code)
    }

    /// Canonical labels in display order.
    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|option| option.label()).collect()
    }
}

/// Destination city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    London,
    Dubai,
    Goa,
    Bangkok,
    #[serde(rename = "Kaula Lumpur", alias = "Kuala Lumpur")]
    KualaLumpur,
    Istanbul,
}

impl Categorical for City {
    const ATTRIBUTE: &'static str = "City";
    const ALL: &'static [Self] = &[
        Self::London,
        Self::Dubai,
        Self::Goa,
        Self::Bangkok,
        Self::KualaLumpur,
        Self::Istanbul,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::London => "London",
            Self::Dubai => "Dubai",
            Self::Goa => "Goa",
            Self::Bangkok => "Bangkok",
            // Spelling is part of the option list the models were built against.
            Self::KualaLumpur => "Kaula Lumpur",
            Self::Istanbul => "Istanbul",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::London => 0,
            Self::Dubai => 1,
            Self::Goa => 2,
            Self::Bangkok => 3,
            Self::KualaLumpur => 4,
            Self::Istanbul => 5,
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::KualaLumpur => &["Kuala Lumpur"],
            _ => &[],
        }
    }
}

/// Travel season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Peak,
    Winter,
    Monsoon,
    Holiday,
    #[serde(rename = "Off-Season")]
    OffSeason,
}

impl Categorical for Season {
    const ATTRIBUTE: &'static str = "Season";
    const ALL: &'static [Self] = &[
        Self::Peak,
        Self::Winter,
        Self::Monsoon,
        Self::Holiday,
        Self::OffSeason,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Peak => "Peak",
            Self::Winter => "Winter",
            Self::Monsoon => "Monsoon",
            Self::Holiday => "Holiday",
            Self::OffSeason => "Off-Season",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::Peak => 0,
            Self::Winter => 1,
            Self::Monsoon => 2,
            Self::Holiday => 3,
            Self::OffSeason => 4,
        }
    }
}

/// Fare class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightType {
    Economy,
    #[serde(rename = "Premium Economy")]
    PremiumEconomy,
    Business,
    First,
}

impl Categorical for FlightType {
    const ATTRIBUTE: &'static str = "Flight Type";
    const ALL: &'static [Self] = &[
        Self::Economy,
        Self::PremiumEconomy,
        Self::Business,
        Self::First,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::PremiumEconomy => "Premium Economy",
            Self::Business => "Business",
            Self::First => "First",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::Economy => 0,
            Self::PremiumEconomy => 1,
            Self::Business => 2,
            Self::First => 3,
        }
    }
}

/// Hotel tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HotelClass {
    Budget,
    Standard,
    Luxury,
    Premium,
}

impl Categorical for HotelClass {
    const ATTRIBUTE: &'static str = "Hotel Class";
    const ALL: &'static [Self] = &[Self::Budget, Self::Standard, Self::Luxury, Self::Premium];

    fn label(&self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::Standard => "Standard",
            Self::Luxury => "Luxury",
            Self::Premium => "Premium",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::Budget => 0,
            Self::Standard => 1,
            Self::Luxury => 2,
            Self::Premium => 3,
        }
    }
}

/// Local transport mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportMode {
    #[serde(rename = "Private Car")]
    PrivateCar,
    Public,
    Rideshare,
    Taxi,
}

impl Categorical for TransportMode {
    const ATTRIBUTE: &'static str = "Transport Mode";
    const ALL: &'static [Self] = &[
        Self::PrivateCar,
        Self::Public,
        Self::Rideshare,
        Self::Taxi,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::PrivateCar => "Private Car",
            Self::Public => "Public",
            Self::Rideshare => "Rideshare",
            Self::Taxi => "Taxi",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::PrivateCar => 0,
            Self::Public => 1,
            Self::Rideshare => 2,
            Self::Taxi => 3,
        }
    }
}

/// Cost category predicted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    Budget,
    Luxury,
    #[serde(rename = "Mid-range")]
    MidRange,
}

impl Categorical for CostCategory {
    const ATTRIBUTE: &'static str = "Cost Category";
    const ALL: &'static [Self] = &[Self::Budget, Self::Luxury, Self::MidRange];

    fn label(&self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::Luxury => "Luxury",
            Self::MidRange => "Mid-range",
        }
    }

    fn code(&self) -> i64 {
        match self {
            Self::Budget => 0,
            Self::Luxury => 1,
            Self::MidRange => 2,
        }
    }
}

macro_rules! impl_display_label {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

impl_display_label!(City, Season, FlightType, HotelClass, TransportMode, CostCategory);

/// Classifier output as shown to the user.
///
/// Codes outside the category table are kept and rendered as the raw number
/// instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryLabel {
    Known(CostCategory),
    Unrecognized(i64),
}

impl CategoryLabel {
    pub fn from_code(code: i64) -> Self {
        match CostCategory::from_code(code) {
            Some(category) => Self::Known(category),
            None => Self::Unrecognized(code),
        }
    }

    /// The code the classifier returned.
    pub fn code(&self) -> i64 {
        match self {
            Self::Known(category) => category.code(),
            Self::Unrecognized(code) => *code,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(category) => f.write_str(category.label()),
            Self::Unrecognized(code) => write!(f, "{}", code),
        }
    }
}

impl Serialize for CategoryLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
