// 🚗 Vehicle - one candidate car
//
// The record is read-mostly input: the calculator borrows it and returns a
// new, augmented copy. Numeric fields are coerced at deserialization time so
// the rest of the crate only ever sees finite f64 values.

use crate::coerce::{lenient_f64, lenient_opt_f64, lenient_opt_text, lenient_text, lenient_year};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// VEHICLE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum VehicleType {
    /// Battery electric
    #[default]
    #[serde(rename = "EV")]
    Ev,

    /// Plug-in hybrid (electric commute, petrol beyond range)
    #[serde(rename = "PHEV")]
    Phev,

    Diesel,

    /// Petrol
    Bensin,
}

impl VehicleType {
    pub const ALL: [VehicleType; 4] = [
        VehicleType::Ev,
        VehicleType::Phev,
        VehicleType::Diesel,
        VehicleType::Bensin,
    ];

    /// Normalize a free-text type tag.
    ///
    /// "bev"/"electric"/"ev" → EV, "phev" or anything with "plug" → PHEV,
    /// "d…" → Diesel, "b…"/"petrol"/"gasoline" → Bensin, anything else → EV.
    pub fn normalize(raw: &str) -> VehicleType {
        let s = raw.trim().to_lowercase();

        if s == "ev" || s == "bev" || s == "electric" {
            VehicleType::Ev
        } else if s == "phev" || s.contains("plug") {
            VehicleType::Phev
        } else if s.starts_with('d') {
            VehicleType::Diesel
        } else if s.starts_with('b') || s.contains("petrol") || s.contains("gasoline") {
            VehicleType::Bensin
        } else {
            VehicleType::Ev
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Ev => "EV",
            VehicleType::Phev => "PHEV",
            VehicleType::Diesel => "Diesel",
            VehicleType::Bensin => "Bensin",
        }
    }

    /// Runs (at least partly) on grid electricity
    pub fn is_plug_in(&self) -> bool {
        matches!(self, VehicleType::Ev | VehicleType::Phev)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(VehicleType::normalize(s))
    }
}

impl<'de> Deserialize<'de> for VehicleType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::String(s) => VehicleType::normalize(&s),
            _ => VehicleType::default(),
        })
    }
}

// ============================================================================
// VEHICLE
// ============================================================================

/// Candidate car as stored by the dashboard backend.
///
/// Field names follow the backend's JSON so records can be passed through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    /// Stable identifier. Numeric ids from the backend are kept as text;
    /// a missing id gets a fresh UUID.
    #[serde(default = "default_id", deserialize_with = "lenient_id")]
    pub id: String,

    /// Display name, e.g. "Kia EV6 GT-Line"
    #[serde(default, alias = "name", deserialize_with = "lenient_text")]
    pub model: String,

    #[serde(default, deserialize_with = "lenient_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(rename = "type_of_vehicle", default)]
    pub vehicle_type: VehicleType,

    // ========================================================================
    // PRICE & TIRES (SEK)
    // ========================================================================
    #[serde(default, deserialize_with = "lenient_f64")]
    pub estimated_purchase_price: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub summer_tires_price: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub winter_tires_price: f64,

    // ========================================================================
    // CONSUMPTION & BATTERY
    // ========================================================================
    #[serde(default, alias = "consumption_kwh_100km", deserialize_with = "lenient_f64")]
    pub consumption_kwh_per_100km: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub consumption_l_per_100km: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub battery_capacity_kwh: f64,

    // ========================================================================
    // CHARGING (informational, not used by the TCO calculation)
    // ========================================================================
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub dc_peak_kw: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub dc_time_min_10_80: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub ac_onboard_kw: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub ac_time_h_0_100: Option<f64>,

    // ========================================================================
    // YEARLY RUNNING COSTS (SEK / year)
    // ========================================================================
    #[serde(default, deserialize_with = "lenient_f64")]
    pub full_insurance_year: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub half_insurance_year: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub car_tax_year: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub repairs_year: f64,

    // ========================================================================
    // CLASSIFICATION (used for filtering and tire estimates only)
    // ========================================================================
    #[serde(default, deserialize_with = "lenient_opt_text", skip_serializing_if = "Option::is_none")]
    pub body_style: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt_text", skip_serializing_if = "Option::is_none")]
    pub eu_segment: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt_text", skip_serializing_if = "Option::is_none")]
    pub suv_tier: Option<String>,

    /// Seconds 0–100 km/h
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub acceleration_0_100: Option<f64>,

    // ========================================================================
    // EXTERNALLY SUPPLIED RESIDUAL VALUES (authoritative when present)
    // ========================================================================
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub expected_value_after_3y: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub expected_value_after_5y: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub expected_value_after_8y: Option<f64>,
}

fn default_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => default_id(),
    })
}

impl Default for Vehicle {
    fn default() -> Self {
        Vehicle {
            id: default_id(),
            model: String::new(),
            year: None,
            vehicle_type: VehicleType::default(),
            estimated_purchase_price: 0.0,
            summer_tires_price: 0.0,
            winter_tires_price: 0.0,
            consumption_kwh_per_100km: 0.0,
            consumption_l_per_100km: 0.0,
            battery_capacity_kwh: 0.0,
            dc_peak_kw: None,
            dc_time_min_10_80: None,
            ac_onboard_kw: None,
            ac_time_h_0_100: None,
            full_insurance_year: 0.0,
            half_insurance_year: 0.0,
            car_tax_year: 0.0,
            repairs_year: 0.0,
            body_style: None,
            eu_segment: None,
            suv_tier: None,
            acceleration_0_100: None,
            expected_value_after_3y: None,
            expected_value_after_5y: None,
            expected_value_after_8y: None,
        }
    }
}

impl Vehicle {
    /// Create a vehicle with the fields every calculation needs
    pub fn new(model: &str, vehicle_type: VehicleType, purchase_price: f64) -> Self {
        Vehicle {
            model: model.to_string(),
            vehicle_type,
            estimated_purchase_price: purchase_price,
            ..Vehicle::default()
        }
    }

    /// Summer + winter tire sets
    pub fn tire_sets_price(&self) -> f64 {
        self.summer_tires_price + self.winter_tires_price
    }

    /// Age in whole years relative to `current_year` (0 when the year is unknown)
    pub fn age_years(&self, current_year: i32) -> i32 {
        self.year.map(|y| current_year.saturating_sub(y).max(0)).unwrap_or(0)
    }

    /// Brand guess from the first word of the model name
    pub fn brand(&self) -> String {
        let first = self
            .model
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase();

        match first.as_str() {
            "vw" | "volkswagen" => "Volkswagen".to_string(),
            "mb" | "mercedes" | "mercedes-benz" => "Mercedes".to_string(),
            _ => {
                let mut chars = first.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        }
    }
}
