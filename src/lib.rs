// Car TCO - Core Library
// Total cost of ownership for candidate cars, shared by the CLI and tests

pub mod coerce;
pub mod vehicle;
pub mod pricing;
pub mod calc;        // energy, residual, loan, tco
pub mod estimates;   // fallbacks for missing running costs
pub mod evaluation;  // filter / sort / categories for the comparison view
pub mod sources;     // JSON / CSV / TOML / env adapters

// Re-export commonly used types
pub use vehicle::{Vehicle, VehicleType};
pub use pricing::PricingConfig;
pub use calc::{
    amortize, compute_derived, expected_residual_value, finance, monthly_energy_fuel_cost,
    recalc_all, recurring_costs, schedule, yearly_energy_fuel_cost,
    Amortization, DerivedFigures, EvaluatedVehicle, Horizon, RecurringCosts, ResidualModel,
    ScheduleRow,
};
pub use evaluation::{
    CategoryChoices, SortDirection, SortKey, SortState, VehicleFilter,
};
pub use sources::{load_pricing, load_vehicles, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
