// 📉 Residual/Depreciation Estimator
//
// Expected resale value of a vehicle at the end of each horizon. A value
// supplied on the vehicle record always wins; otherwise the run's
// `ResidualModel` decides. The model lives on the PricingConfig, so every
// vehicle and every horizon of one run is valued the same way.

use crate::coerce::non_negative;
use crate::pricing::PricingConfig;
use crate::vehicle::{Vehicle, VehicleType};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// HORIZON
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    Three,
    Five,
    Eight,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Three, Horizon::Five, Horizon::Eight];

    pub fn years(&self) -> u32 {
        match self {
            Horizon::Three => 3,
            Horizon::Five => 5,
            Horizon::Eight => 8,
        }
    }

    pub fn months(&self) -> u32 {
        self.years() * 12
    }

    pub fn from_years(years: u32) -> Option<Horizon> {
        match years {
            3 => Some(Horizon::Three),
            5 => Some(Horizon::Five),
            8 => Some(Horizon::Eight),
            _ => None,
        }
    }

    /// Share of the purchase price lost by the end of the horizon
    pub fn depreciation_rate(&self) -> f64 {
        match self {
            Horizon::Three => 0.15,
            Horizon::Five => 0.25,
            Horizon::Eight => 0.40,
        }
    }

    /// Share of the purchase price kept at the end of the horizon
    pub fn retained_fraction(&self) -> f64 {
        match self {
            Horizon::Three => 0.55,
            Horizon::Five => 0.40,
            Horizon::Eight => 0.25,
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}y", self.years())
    }
}

// ============================================================================
// RESIDUAL MODEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualModel {
    /// `price * (1 - rate)` with rates 0.15 / 0.25 / 0.40
    #[default]
    Depreciation,

    /// `price * fraction` with fractions 0.55 / 0.40 / 0.25
    RetainedFraction,

    /// Age, mileage and powertrain aware retention grid
    RetentionCurve,
}

impl ResidualModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidualModel::Depreciation => "depreciation",
            ResidualModel::RetainedFraction => "retained_fraction",
            ResidualModel::RetentionCurve => "retention_curve",
        }
    }
}

impl FromStr for ResidualModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "depreciation" => Ok(ResidualModel::Depreciation),
            "retained_fraction" | "fraction" => Ok(ResidualModel::RetainedFraction),
            "retention_curve" | "curve" => Ok(ResidualModel::RetentionCurve),
            other => Err(format!("unknown residual model: {}", other)),
        }
    }
}

// ============================================================================
// RESIDUAL VALUE
// ============================================================================

/// Residual value supplied on the vehicle record, if any
pub fn supplied_residual(vehicle: &Vehicle, horizon: Horizon) -> Option<f64> {
    match horizon {
        Horizon::Three => vehicle.expected_value_after_3y,
        Horizon::Five => vehicle.expected_value_after_5y,
        Horizon::Eight => vehicle.expected_value_after_8y,
    }
}

/// Expected resale value at the end of `horizon` (unrounded SEK)
pub fn expected_residual_value(vehicle: &Vehicle, horizon: Horizon, pricing: &PricingConfig) -> f64 {
    if let Some(value) = supplied_residual(vehicle, horizon) {
        return value;
    }

    let price = non_negative(vehicle.estimated_purchase_price);

    let value = match pricing.residual_model {
        ResidualModel::Depreciation => price * (1.0 - horizon.depreciation_rate()),
        ResidualModel::RetainedFraction => price * horizon.retained_fraction(),
        ResidualModel::RetentionCurve => {
            let age_months = match (vehicle.year, pricing.valuation_date) {
                (Some(year), Some(date)) => months_since_model_year(year, date),
                _ => 0,
            };
            predict_future_value(
                price,
                age_months,
                horizon.years(),
                vehicle.vehicle_type,
                non_negative(pricing.yearly_km),
                &RetentionParams::default(),
            )
        }
    };

    value.max(0.0)
}

// ============================================================================
// RETENTION CURVE
// ============================================================================

/// Tunables of the retention curve
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionParams {
    /// Minimum retained share of the new price
    pub salvage_floor: f64,

    /// Yearly distance the grid assumes
    pub standard_km_per_year: f64,

    /// Retention lost per extra 10 000 km driven over the horizon
    pub mileage_slope_per_10k: f64,

    /// Extra drop for plug-ins whose battery warranty ends within the horizon
    pub warranty_kink: f64,

    pub warranty_months: u32,

    /// Retention lost per year after the last anchor
    pub tail_decay_per_year: f64,
}

impl Default for RetentionParams {
    fn default() -> Self {
        RetentionParams {
            salvage_floor: 0.15,
            standard_km_per_year: 20_000.0,
            mileage_slope_per_10k: 0.01,
            warranty_kink: 0.03,
            warranty_months: 96,
            tail_decay_per_year: 0.015,
        }
    }
}

/// Retained share of the NEW price at 36 / 60 / 96 months
fn retention_anchors(vehicle_type: VehicleType) -> [(u32, f64); 3] {
    match vehicle_type {
        VehicleType::Bensin => [(36, 0.53), (60, 0.40), (96, 0.28)],
        VehicleType::Diesel => [(36, 0.50), (60, 0.38), (96, 0.25)],
        VehicleType::Phev => [(36, 0.49), (60, 0.36), (96, 0.26)],
        VehicleType::Ev => [(36, 0.42), (60, 0.32), (96, 0.24)],
    }
}

/// Retained share of the new price at a given age in months
pub fn retention_at(vehicle_type: VehicleType, months: u32, params: &RetentionParams) -> f64 {
    let anchors = retention_anchors(vehicle_type);
    let mut prev = (0u32, 1.0f64);

    for (m, r) in anchors {
        if months <= m {
            let t = (months - prev.0) as f64 / (m - prev.0) as f64;
            return (prev.1 + t * (r - prev.1)).max(params.salvage_floor);
        }
        prev = (m, r);
    }

    // Past the last anchor
    let extra_years = (months - prev.0) as f64 / 12.0;
    (prev.1 - params.tail_decay_per_year * extra_years).max(params.salvage_floor)
}

/// Months from July 1 of the model year to `date` (never negative)
pub fn months_since_model_year(year: i32, date: NaiveDate) -> u32 {
    let months = (date.year() as i64 - year as i64) * 12 + (date.month() as i64 - 7);
    months.clamp(0, u32::MAX as i64) as u32
}

/// Value after `years_ahead` of a car worth `today_price` at `age_months`
pub fn predict_future_value(
    today_price: f64,
    age_months: u32,
    years_ahead: u32,
    vehicle_type: VehicleType,
    yearly_km: f64,
    params: &RetentionParams,
) -> f64 {
    let future_months = age_months.saturating_add(years_ahead.saturating_mul(12));
    let r_now = retention_at(vehicle_type, age_months, params);
    let mut r_future = retention_at(vehicle_type, future_months, params);

    if vehicle_type.is_plug_in()
        && age_months < params.warranty_months
        && params.warranty_months <= future_months
    {
        r_future = (r_future - params.warranty_kink).max(params.salvage_floor);
    }

    let mut expected = if r_now > 0.0 {
        today_price * r_future / r_now
    } else {
        0.0
    };

    let extra_km_per_year = (yearly_km - params.standard_km_per_year).max(0.0);
    let extra_10k = extra_km_per_year * years_ahead as f64 / 10_000.0;
    if extra_10k > 0.0 {
        expected *= (1.0 - params.mileage_slope_per_10k * extra_10k).max(0.0);
    }

    expected
}

/// Back out the new price from a used car's current price
pub fn estimate_new_price(today_price: f64, age_months: u32, vehicle_type: VehicleType) -> f64 {
    let r_now = retention_at(vehicle_type, age_months, &RetentionParams::default());
    if r_now <= 0.0 {
        today_price
    } else {
        today_price / r_now
    }
}
