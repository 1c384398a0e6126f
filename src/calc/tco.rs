// 🧾 TCO Aggregator
//
// TCO_H = depreciation_H + H * recurring_yearly + downpayment + interest_H
//
// All arithmetic is unrounded; figures are rounded once when exposed. The
// residual value of a horizon is the exception: it is rounded when resolved so
// that depreciation is derived from the same number the output shows.

use super::energy::{monthly_energy_fuel_cost, yearly_energy_fuel_cost};
use super::loan::finance;
use super::residual::{expected_residual_value, Horizon};
use crate::coerce::{non_negative, round_currency};
use crate::estimates::{
    estimate_full_insurance_year, estimate_half_from_full, estimate_repairs_year, estimate_tax_year,
    HALF_INSURANCE_SHARE,
};
use crate::pricing::PricingConfig;
use crate::vehicle::Vehicle;
use serde::{Deserialize, Serialize};

// ============================================================================
// RECURRING COSTS
// ============================================================================

/// Yearly running costs as they enter the TCO (unrounded SEK)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RecurringCosts {
    pub energy_fuel: f64,
    pub tires: f64,
    pub full_insurance: f64,
    /// Informational; the TCO uses `full_insurance`
    pub half_insurance: f64,
    pub tax: f64,
    pub repairs: f64,
}

impl RecurringCosts {
    pub fn total(&self) -> f64 {
        self.energy_fuel + self.tires + self.full_insurance + self.tax + self.repairs
    }
}

/// Resolve the yearly running costs of `vehicle`.
///
/// Insurance is the full-coverage premium, derived from the half-coverage one
/// when only that is known. With `estimate_missing_costs`, zero insurance,
/// tax and repairs fall back to estimates.
pub fn recurring_costs(vehicle: &Vehicle, pricing: &PricingConfig) -> RecurringCosts {
    let estimate = pricing.estimate_missing_costs;
    let t = vehicle.vehicle_type;

    let full_given = non_negative(vehicle.full_insurance_year);
    let half_given = non_negative(vehicle.half_insurance_year);

    let full_insurance = if full_given > 0.0 {
        full_given
    } else if half_given > 0.0 {
        // whole SEK, like the value the dashboard stores back
        (half_given / HALF_INSURANCE_SHARE).round()
    } else if estimate {
        estimate_full_insurance_year(vehicle.estimated_purchase_price, t)
    } else {
        0.0
    };

    let half_insurance = if half_given > 0.0 {
        half_given
    } else {
        estimate_half_from_full(full_insurance)
    };

    let mut tax = non_negative(vehicle.car_tax_year);
    if tax <= 0.0 && estimate {
        tax = estimate_tax_year(t);
    }

    let mut repairs = non_negative(vehicle.repairs_year);
    if repairs <= 0.0 && estimate {
        let age = pricing
            .valuation_year()
            .map(|y| vehicle.age_years(y))
            .unwrap_or(0);
        repairs = estimate_repairs_year(t, age);
    }

    let lifespan = pricing.tire_lifespan_years.max(1.0);
    let tires = (non_negative(vehicle.summer_tires_price) + non_negative(vehicle.winter_tires_price)) / lifespan;

    RecurringCosts {
        energy_fuel: yearly_energy_fuel_cost(vehicle, pricing),
        tires,
        full_insurance,
        half_insurance,
        tax,
        repairs,
    }
}

// ============================================================================
// DERIVED FIGURES
// ============================================================================

/// Everything the calculator derives for one vehicle, rounded to whole SEK.
///
/// Keys match the dashboard's JSON so an evaluated record can be fed back in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedFigures {
    pub energy_fuel_year: f64,
    pub energy_cost_month: f64,

    pub recurring_year: f64,
    pub tires_year_effective: f64,
    pub full_insurance_year_effective: f64,
    pub half_insurance_year_effective: f64,
    pub car_tax_year_effective: f64,
    pub repairs_year_effective: f64,

    pub expected_value_after_3y: f64,
    pub expected_value_after_5y: f64,
    pub expected_value_after_8y: f64,

    pub depreciation_3y: f64,
    pub depreciation_5y: f64,
    pub depreciation_8y: f64,

    pub finance_principal_sek: f64,
    pub downpayment_effective: f64,
    pub finance_interest_3y: f64,
    pub finance_interest_5y: f64,
    pub finance_interest_8y: f64,

    pub tco_total_3y: f64,
    pub tco_total_5y: f64,
    pub tco_total_8y: f64,

    pub tco_per_month_3y: f64,
    pub tco_per_month_5y: f64,
    pub tco_per_month_8y: f64,
}

/// Unrounded figures of one horizon
#[derive(Debug, Clone, Copy)]
struct HorizonFigures {
    residual: f64,
    depreciation: f64,
    interest: f64,
    total: f64,
    per_month: f64,
}

impl DerivedFigures {
    pub fn expected_value(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Three => self.expected_value_after_3y,
            Horizon::Five => self.expected_value_after_5y,
            Horizon::Eight => self.expected_value_after_8y,
        }
    }

    pub fn depreciation(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Three => self.depreciation_3y,
            Horizon::Five => self.depreciation_5y,
            Horizon::Eight => self.depreciation_8y,
        }
    }

    pub fn finance_interest(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Three => self.finance_interest_3y,
            Horizon::Five => self.finance_interest_5y,
            Horizon::Eight => self.finance_interest_8y,
        }
    }

    pub fn tco_total(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Three => self.tco_total_3y,
            Horizon::Five => self.tco_total_5y,
            Horizon::Eight => self.tco_total_8y,
        }
    }

    pub fn tco_per_month(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Three => self.tco_per_month_3y,
            Horizon::Five => self.tco_per_month_5y,
            Horizon::Eight => self.tco_per_month_8y,
        }
    }

    fn set_horizon(&mut self, horizon: Horizon, f: HorizonFigures) {
        let (value, dep, interest, total, per_month) = match horizon {
            Horizon::Three => (
                &mut self.expected_value_after_3y,
                &mut self.depreciation_3y,
                &mut self.finance_interest_3y,
                &mut self.tco_total_3y,
                &mut self.tco_per_month_3y,
            ),
            Horizon::Five => (
                &mut self.expected_value_after_5y,
                &mut self.depreciation_5y,
                &mut self.finance_interest_5y,
                &mut self.tco_total_5y,
                &mut self.tco_per_month_5y,
            ),
            Horizon::Eight => (
                &mut self.expected_value_after_8y,
                &mut self.depreciation_8y,
                &mut self.finance_interest_8y,
                &mut self.tco_total_8y,
                &mut self.tco_per_month_8y,
            ),
        };

        *value = round_currency(f.residual);
        *dep = round_currency(f.depreciation);
        *interest = round_currency(f.interest);
        *total = round_currency(f.total);
        *per_month = round_currency(f.per_month);
    }
}

/// Derive every TCO figure for one vehicle. Pure; never fails.
pub fn compute_derived(vehicle: &Vehicle, pricing: &PricingConfig) -> DerivedFigures {
    let price = non_negative(vehicle.estimated_purchase_price);
    let downpayment = non_negative(pricing.downpayment_sek);
    let rate = pricing.effective_interest_rate_pct();

    let costs = recurring_costs(vehicle, pricing);
    let recurring = costs.total();

    let mut out = DerivedFigures {
        energy_fuel_year: round_currency(costs.energy_fuel),
        energy_cost_month: round_currency(monthly_energy_fuel_cost(vehicle, pricing)),
        recurring_year: round_currency(recurring),
        tires_year_effective: round_currency(costs.tires),
        full_insurance_year_effective: round_currency(costs.full_insurance),
        half_insurance_year_effective: round_currency(costs.half_insurance),
        car_tax_year_effective: round_currency(costs.tax),
        repairs_year_effective: round_currency(costs.repairs),
        finance_principal_sek: round_currency((price - downpayment).max(0.0)),
        downpayment_effective: round_currency(downpayment),
        ..DerivedFigures::default()
    };

    for horizon in Horizon::ALL {
        let years = horizon.years() as f64;

        let residual = round_currency(expected_residual_value(vehicle, horizon, pricing));
        let depreciation = (price - residual).max(0.0);
        let interest = finance(price, downpayment, rate, years).total_interest;
        let total = depreciation + years * recurring + downpayment + interest;

        out.set_horizon(
            horizon,
            HorizonFigures {
                residual,
                depreciation,
                interest,
                total,
                per_month: total / (years * 12.0),
            },
        );
    }

    tracing::trace!(
        vehicle = %vehicle.id,
        recurring_year = out.recurring_year,
        tco_per_month_8y = out.tco_per_month_8y,
        "derived figures computed"
    );

    out
}

// ============================================================================
// EVALUATED VEHICLE
// ============================================================================

/// A vehicle together with its derived figures, serialized as one flat object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedVehicle {
    #[serde(flatten)]
    pub vehicle: Vehicle,

    #[serde(flatten)]
    pub derived: DerivedFigures,
}

impl EvaluatedVehicle {
    /// Evaluate one vehicle. The resolved residual values replace the
    /// vehicle's own so each key appears once in the output.
    pub fn evaluate(vehicle: &Vehicle, pricing: &PricingConfig) -> Self {
        let derived = compute_derived(vehicle, pricing);
        let mut vehicle = vehicle.clone();
        vehicle.expected_value_after_3y = None;
        vehicle.expected_value_after_5y = None;
        vehicle.expected_value_after_8y = None;

        EvaluatedVehicle { vehicle, derived }
    }

    /// The vehicle with its resolved residual values supplied, ready to be
    /// evaluated again.
    pub fn to_vehicle(&self) -> Vehicle {
        Vehicle {
            expected_value_after_3y: Some(self.derived.expected_value_after_3y),
            expected_value_after_5y: Some(self.derived.expected_value_after_5y),
            expected_value_after_8y: Some(self.derived.expected_value_after_8y),
            ..self.vehicle.clone()
        }
    }
}

/// Evaluate every vehicle, preserving input order
pub fn recalc_all(vehicles: &[Vehicle], pricing: &PricingConfig) -> Vec<EvaluatedVehicle> {
    tracing::debug!(count = vehicles.len(), model = pricing.residual_model.as_str(), "recalculating vehicles");
    vehicles
        .iter()
        .map(|v| EvaluatedVehicle::evaluate(v, pricing))
        .collect()
}
