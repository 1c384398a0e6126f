// ⚡ Energy/Fuel Estimator
//
// EV pays for electricity, Diesel/Bensin for litres. A PHEV drives its daily
// commute on the battery (up to its electric range, 22 commute days a month)
// and the rest of the month's distance on petrol. The per-month split is the
// authoritative figure; yearly is twelve months of it.

use crate::coerce::non_negative;
use crate::pricing::PricingConfig;
use crate::vehicle::{Vehicle, VehicleType};
use serde::Serialize;

pub const COMMUTE_DAYS_PER_MONTH: f64 = 22.0;

/// Electric range assumed when battery or consumption is unknown
pub const ASSUMED_PHEV_RANGE_KM: f64 = 40.0;

/// Electric range on one charge: `100 * battery / consumption`
pub fn ev_range_km(battery_kwh: f64, kwh_per_100km: f64) -> f64 {
    if battery_kwh > 0.0 && kwh_per_100km > 0.0 {
        100.0 * battery_kwh / kwh_per_100km
    } else {
        ASSUMED_PHEV_RANGE_KM
    }
}

/// One month of PHEV driving, split by propulsion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhevSplit {
    pub electric_km: f64,
    pub fuel_km: f64,
    pub electricity_cost: f64,
    pub fuel_cost: f64,
}

impl PhevSplit {
    pub fn total_cost(&self) -> f64 {
        self.electricity_cost + self.fuel_cost
    }
}

fn monthly_km(pricing: &PricingConfig) -> f64 {
    non_negative(pricing.yearly_km) / 12.0
}

fn daily_electric_km(vehicle: &Vehicle, pricing: &PricingConfig) -> f64 {
    let range = ev_range_km(
        vehicle.battery_capacity_kwh,
        vehicle.consumption_kwh_per_100km,
    );
    non_negative(pricing.daily_commute_km).min(range)
}

/// Monthly PHEV split: commute on electricity, remainder on petrol
pub fn phev_monthly_split(vehicle: &Vehicle, pricing: &PricingConfig) -> PhevSplit {
    let km = monthly_km(pricing);
    let kwh_per_100 = non_negative(vehicle.consumption_kwh_per_100km);
    let l_per_100 = non_negative(vehicle.consumption_l_per_100km);

    let electric_km = (daily_electric_km(vehicle, pricing) * COMMUTE_DAYS_PER_MONTH).min(km);
    let fuel_km = (km - electric_km).max(0.0);

    PhevSplit {
        electric_km,
        fuel_km,
        electricity_cost: electric_km * kwh_per_100 / 100.0 * pricing.el_price_sek_kwh(),
        fuel_cost: fuel_km / 100.0 * l_per_100 * non_negative(pricing.bensin_price_sek_litre),
    }
}

/// Fraction of yearly distance driven electrically, consistent with
/// [`phev_monthly_split`]. Zero when there is no yearly distance.
pub fn phev_electric_share(vehicle: &Vehicle, pricing: &PricingConfig) -> f64 {
    let yearly_km = non_negative(pricing.yearly_km);
    if yearly_km <= 0.0 {
        return 0.0;
    }
    let electric_km_year = daily_electric_km(vehicle, pricing) * COMMUTE_DAYS_PER_MONTH * 12.0;
    (electric_km_year / yearly_km).clamp(0.0, 1.0)
}

/// Energy/fuel cost for one month (SEK)
pub fn monthly_energy_fuel_cost(vehicle: &Vehicle, pricing: &PricingConfig) -> f64 {
    let km = monthly_km(pricing);
    if km <= 0.0 {
        return 0.0;
    }

    let kwh_per_100 = non_negative(vehicle.consumption_kwh_per_100km);
    let l_per_100 = non_negative(vehicle.consumption_l_per_100km);

    match vehicle.vehicle_type {
        VehicleType::Ev => km / 100.0 * kwh_per_100 * pricing.el_price_sek_kwh(),
        VehicleType::Diesel => km / 100.0 * l_per_100 * non_negative(pricing.diesel_price_sek_litre),
        VehicleType::Bensin => km / 100.0 * l_per_100 * non_negative(pricing.bensin_price_sek_litre),
        VehicleType::Phev => phev_monthly_split(vehicle, pricing).total_cost(),
    }
}

/// Energy/fuel cost for one year (SEK)
pub fn yearly_energy_fuel_cost(vehicle: &Vehicle, pricing: &PricingConfig) -> f64 {
    monthly_energy_fuel_cost(vehicle, pricing) * 12.0
}
