// TCO Calculator
//
// Four pure components, each a function of (Vehicle, PricingConfig):
// - energy:   yearly/monthly energy and fuel cost per powertrain
// - residual: expected resale value per horizon
// - loan:     fixed-rate annuity interest
// - tco:      aggregation into total and per-month cost per horizon

pub mod energy;
pub mod residual;
pub mod loan;
pub mod tco;

pub use energy::{
    ev_range_km, monthly_energy_fuel_cost, phev_electric_share, phev_monthly_split,
    yearly_energy_fuel_cost, PhevSplit, COMMUTE_DAYS_PER_MONTH,
};
pub use residual::{
    estimate_new_price, expected_residual_value, months_since_model_year, predict_future_value,
    retention_at, supplied_residual, Horizon, ResidualModel, RetentionParams,
};
pub use loan::{amortize, finance, schedule, Amortization, ScheduleRow};
pub use tco::{compute_derived, recalc_all, recurring_costs, DerivedFigures, EvaluatedVehicle, RecurringCosts};
