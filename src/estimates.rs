// 🧮 Fallback Estimates - sensible numbers for fields nobody filled in
//
// Heuristics for Swedish market running costs, tire sets and charging times.
// They never override a value present on the vehicle; they only fill zeros.

use crate::vehicle::{Vehicle, VehicleType};

/// Full coverage share paid for half coverage ("halvförsäkring")
pub const HALF_INSURANCE_SHARE: f64 = 0.55;

// ============================================================================
// RUNNING COSTS
// ============================================================================

/// Full-coverage insurance per year from price and powertrain
pub fn estimate_full_insurance_year(price: f64, vehicle_type: VehicleType) -> f64 {
    let ev = vehicle_type == VehicleType::Ev;

    if price <= 0.0 {
        return if ev { 11_000.0 } else { 12_000.0 };
    }

    let (base, rate) = if ev { (4_000.0, 0.020) } else { (5_000.0, 0.022) };
    (base + rate * price).clamp(7_000.0, 15_000.0)
}

pub fn estimate_half_from_full(full: f64) -> f64 {
    (full * HALF_INSURANCE_SHARE).round()
}

pub fn estimate_tax_year(vehicle_type: VehicleType) -> f64 {
    if vehicle_type == VehicleType::Ev {
        360.0
    } else {
        1_600.0
    }
}

/// Base repairs plus 300 SEK per year of age beyond five
pub fn estimate_repairs_year(vehicle_type: VehicleType, age_years: i32) -> f64 {
    let base = if vehicle_type == VehicleType::Ev { 3_000.0 } else { 5_000.0 };
    base + (age_years - 5).max(0) as f64 * 300.0
}

// ============================================================================
// TIRES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Summer,
    Winter,
}

const PREMIUM_BRANDS: &[&str] = &["BMW", "Mercedes", "Audi", "Polestar", "Tesla", "Volvo"];

fn is_premium(brand: &str) -> bool {
    PREMIUM_BRANDS.iter().any(|b| b.eq_ignore_ascii_case(brand))
}

fn is_performance(vehicle: &Vehicle) -> bool {
    matches!(vehicle.acceleration_0_100, Some(a) if a > 0.0 && a <= 5.0)
}

/// Price of one set of tires, rounded to 100 SEK
pub fn estimate_tire_set_price(vehicle: &Vehicle, season: Season) -> f64 {
    let mut price: f64 = match vehicle.suv_tier.as_deref().unwrap_or("Compact") {
        "Subcompact" => 7_000.0,
        "Midsize" => 11_000.0,
        "Large" => 13_000.0,
        _ => 9_000.0,
    };

    if season == Season::Winter {
        price *= 1.1;
    }
    // higher load index
    if vehicle.vehicle_type == VehicleType::Ev {
        price *= 1.05;
    }
    if is_performance(vehicle) {
        price *= 1.1;
    }
    if is_premium(&vehicle.brand()) {
        price *= 1.05;
    }

    (price / 100.0).round() * 100.0
}

/// Expected tire life in km, rounded to 500 km
pub fn suggest_tire_lifespan_km(vehicle: &Vehicle, season: Season) -> f64 {
    let mut life: f64 = match season {
        Season::Summer => 40_000.0,
        Season::Winter => 30_000.0,
    };

    if vehicle.vehicle_type == VehicleType::Ev {
        life *= 0.9;
    }
    if vehicle.suv_tier.is_some() {
        life *= 0.95;
    }
    if is_performance(vehicle) {
        life *= 0.95;
    }

    (life / 500.0).round() * 500.0
}

// ============================================================================
// CHARGING
// ============================================================================

/// DC 10→80 % in minutes (70 % of the pack at ~60 % of peak power)
pub fn estimate_dc_10_80_minutes(battery_kwh: f64, dc_peak_kw: f64) -> f64 {
    if battery_kwh > 0.0 && dc_peak_kw > 0.0 {
        round2((0.70 * battery_kwh) / (0.60 * dc_peak_kw) * 60.0)
    } else {
        0.0
    }
}

/// AC 0→100 % in hours; assumes an 11 kW charger when on-board power is unknown
pub fn estimate_ac_0_100_hours(battery_kwh: f64, ac_kw: Option<f64>) -> f64 {
    if battery_kwh <= 0.0 {
        return 0.0;
    }
    match ac_kw {
        Some(kw) if kw > 0.0 => round2(battery_kwh / kw),
        _ => round2(battery_kwh / 11.0),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ============================================================================
// FILLING A VEHICLE
// ============================================================================

impl Vehicle {
    /// Copy with zero running costs, tire prices and charging times replaced
    /// by estimates. `current_year` drives the age-based repairs estimate.
    pub fn with_estimates(&self, current_year: Option<i32>) -> Vehicle {
        let mut v = self.clone();
        let t = v.vehicle_type;

        if v.full_insurance_year <= 0.0 {
            v.full_insurance_year = if v.half_insurance_year > 0.0 {
                (v.half_insurance_year / HALF_INSURANCE_SHARE).round()
            } else {
                estimate_full_insurance_year(v.estimated_purchase_price, t)
            };
        }
        if v.half_insurance_year <= 0.0 {
            v.half_insurance_year = estimate_half_from_full(v.full_insurance_year);
        }
        if v.car_tax_year <= 0.0 {
            v.car_tax_year = estimate_tax_year(t);
        }
        if v.repairs_year <= 0.0 {
            let age = current_year.map(|y| v.age_years(y)).unwrap_or(0);
            v.repairs_year = estimate_repairs_year(t, age);
        }
        if v.summer_tires_price <= 0.0 {
            v.summer_tires_price = estimate_tire_set_price(&v, Season::Summer);
        }
        if v.winter_tires_price <= 0.0 {
            v.winter_tires_price = estimate_tire_set_price(&v, Season::Winter);
        }

        if t.is_plug_in() && v.battery_capacity_kwh > 0.0 {
            if v.dc_time_min_10_80.unwrap_or(0.0) <= 0.0 {
                if let Some(peak) = v.dc_peak_kw {
                    let est = estimate_dc_10_80_minutes(v.battery_capacity_kwh, peak);
                    if est > 0.0 {
                        v.dc_time_min_10_80 = Some(est);
                    }
                }
            }
            if v.ac_time_h_0_100.unwrap_or(0.0) <= 0.0 {
                v.ac_time_h_0_100 = Some(estimate_ac_0_100_hours(v.battery_capacity_kwh, v.ac_onboard_kw));
            }
        }

        v
    }
}
