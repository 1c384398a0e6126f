// 🔎 Evaluation - filtering, sorting and category choices over evaluated cars
//
// Mirrors the comparison table: a free-text query on the model name, year
// bounds, and set filters on type and classification. Sorting is stable so
// ties keep their input order.

use crate::calc::{EvaluatedVehicle, Horizon};
use crate::vehicle::{Vehicle, VehicleType};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// FILTER
// ============================================================================

/// Active filters. Empty sets and `None` bounds do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    /// Case-insensitive substring of the model name
    pub query: Option<String>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub types: HashSet<VehicleType>,
    pub body_styles: HashSet<String>,
    pub eu_segments: HashSet<String>,
    pub suv_tiers: HashSet<String>,
}

fn in_set(set: &HashSet<String>, value: &Option<String>) -> bool {
    set.is_empty() || value.as_ref().is_some_and(|v| set.contains(v))
}

impl VehicleFilter {
    pub fn is_empty(&self) -> bool {
        *self == VehicleFilter::default()
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(q) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            if !vehicle.model.to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }

        // a missing year passes an upper bound but fails a lower one
        if let Some(min) = self.year_min {
            if vehicle.year.unwrap_or(0) < min {
                return false;
            }
        }
        if let Some(max) = self.year_max {
            if vehicle.year.unwrap_or(9999) > max {
                return false;
            }
        }

        if !self.types.is_empty() && !self.types.contains(&vehicle.vehicle_type) {
            return false;
        }

        in_set(&self.body_styles, &vehicle.body_style)
            && in_set(&self.eu_segments, &vehicle.eu_segment)
            && in_set(&self.suv_tiers, &vehicle.suv_tier)
    }

    /// Borrowing filter over evaluated vehicles, order preserved
    pub fn apply<'a>(&self, vehicles: &'a [EvaluatedVehicle]) -> Vec<&'a EvaluatedVehicle> {
        vehicles.iter().filter(|e| self.matches(&e.vehicle)).collect()
    }
}

// ============================================================================
// SORT
// ============================================================================

/// Column to sort the comparison by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Model,
    Year,
    Type,
    PurchasePrice,
    ConsumptionKwh,
    ConsumptionLitres,
    BatteryCapacity,
    EnergyFuelYear,
    EnergyCostMonth,
    RecurringYear,
    ExpectedValue(Horizon),
    Depreciation(Horizon),
    FinanceInterest(Horizon),
    TcoTotal(Horizon),
    TcoPerMonth(Horizon),
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::TcoPerMonth(Horizon::Eight)
    }
}

impl SortKey {
    /// Field name as it appears in the evaluated JSON
    pub fn key(&self) -> String {
        match self {
            SortKey::Model => "model".to_string(),
            SortKey::Year => "year".to_string(),
            SortKey::Type => "type_of_vehicle".to_string(),
            SortKey::PurchasePrice => "estimated_purchase_price".to_string(),
            SortKey::ConsumptionKwh => "consumption_kwh_per_100km".to_string(),
            SortKey::ConsumptionLitres => "consumption_l_per_100km".to_string(),
            SortKey::BatteryCapacity => "battery_capacity_kwh".to_string(),
            SortKey::EnergyFuelYear => "energy_fuel_year".to_string(),
            SortKey::EnergyCostMonth => "energy_cost_month".to_string(),
            SortKey::RecurringYear => "recurring_year".to_string(),
            SortKey::ExpectedValue(h) => format!("expected_value_after_{}", h),
            SortKey::Depreciation(h) => format!("depreciation_{}", h),
            SortKey::FinanceInterest(h) => format!("finance_interest_{}", h),
            SortKey::TcoTotal(h) => format!("tco_total_{}", h),
            SortKey::TcoPerMonth(h) => format!("tco_per_month_{}", h),
        }
    }

    fn value(&self, e: &EvaluatedVehicle) -> SortValue {
        let v = &e.vehicle;
        let d = &e.derived;
        match self {
            SortKey::Model => SortValue::Text(v.model.to_lowercase()),
            SortKey::Type => SortValue::Text(v.vehicle_type.as_str().to_lowercase()),
            SortKey::Year => SortValue::Number(v.year.unwrap_or(0) as f64),
            SortKey::PurchasePrice => SortValue::Number(v.estimated_purchase_price),
            SortKey::ConsumptionKwh => SortValue::Number(v.consumption_kwh_per_100km),
            SortKey::ConsumptionLitres => SortValue::Number(v.consumption_l_per_100km),
            SortKey::BatteryCapacity => SortValue::Number(v.battery_capacity_kwh),
            SortKey::EnergyFuelYear => SortValue::Number(d.energy_fuel_year),
            SortKey::EnergyCostMonth => SortValue::Number(d.energy_cost_month),
            SortKey::RecurringYear => SortValue::Number(d.recurring_year),
            SortKey::ExpectedValue(h) => SortValue::Number(d.expected_value(*h)),
            SortKey::Depreciation(h) => SortValue::Number(d.depreciation(*h)),
            SortKey::FinanceInterest(h) => SortValue::Number(d.finance_interest(*h)),
            SortKey::TcoTotal(h) => SortValue::Number(d.tco_total(*h)),
            SortKey::TcoPerMonth(h) => SortValue::Number(d.tco_per_month(*h)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn horizon_suffix(s: &str, prefix: &str) -> Option<Horizon> {
    let years = s.strip_prefix(prefix)?.strip_suffix('y')?;
    Horizon::from_years(years.parse().ok()?)
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let simple = match key.as_str() {
            "model" | "name" => Some(SortKey::Model),
            "year" => Some(SortKey::Year),
            "type" | "type_of_vehicle" => Some(SortKey::Type),
            "price" | "estimated_purchase_price" => Some(SortKey::PurchasePrice),
            "consumption_kwh_per_100km" => Some(SortKey::ConsumptionKwh),
            "consumption_l_per_100km" => Some(SortKey::ConsumptionLitres),
            "battery_capacity_kwh" => Some(SortKey::BatteryCapacity),
            "energy_fuel_year" => Some(SortKey::EnergyFuelYear),
            "energy_cost_month" => Some(SortKey::EnergyCostMonth),
            "recurring_year" => Some(SortKey::RecurringYear),
            _ => None,
        };
        if let Some(k) = simple {
            return Ok(k);
        }

        let prefixed: [(&str, fn(Horizon) -> SortKey); 5] = [
            ("expected_value_after_", SortKey::ExpectedValue),
            ("depreciation_", SortKey::Depreciation),
            ("finance_interest_", SortKey::FinanceInterest),
            ("tco_total_", SortKey::TcoTotal),
            ("tco_per_month_", SortKey::TcoPerMonth),
        ];
        prefixed
            .iter()
            .find_map(|(prefix, make)| horizon_suffix(&key, prefix).map(make))
            .ok_or_else(|| format!("unknown sort key: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            // a key is either numeric or textual for every row
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Current sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        SortState { key, direction }
    }

    /// Clicking a column: a new key starts ascending, the same key flips
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Asc;
        }
    }

    /// Stable sort in place
    pub fn sort<E: AsRef<EvaluatedVehicle>>(&self, vehicles: &mut [E]) {
        vehicles.sort_by(|a, b| {
            let ord = self.key.value(a.as_ref()).compare(&self.key.value(b.as_ref()));
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}

impl AsRef<EvaluatedVehicle> for EvaluatedVehicle {
    fn as_ref(&self) -> &EvaluatedVehicle {
        self
    }
}

// ============================================================================
// CATEGORY CHOICES
// ============================================================================

/// Distinct values offered by the classification filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryChoices {
    pub body_styles: Vec<String>,
    pub eu_segments: Vec<String>,
    pub suv_tiers: Vec<String>,
}

impl CategoryChoices {
    /// Sorted, de-duplicated, non-empty values across `vehicles`
    pub fn collect<'a, I>(vehicles: I) -> Self
    where
        I: IntoIterator<Item = &'a Vehicle>,
    {
        let mut body = BTreeSet::new();
        let mut seg = BTreeSet::new();
        let mut suv = BTreeSet::new();

        for v in vehicles {
            let fields = [
                (&mut body, &v.body_style),
                (&mut seg, &v.eu_segment),
                (&mut suv, &v.suv_tier),
            ];
            for (set, value) in fields {
                if let Some(text) = value.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    set.insert(text.to_string());
                }
            }
        }

        CategoryChoices {
            body_styles: body.into_iter().collect(),
            eu_segments: seg.into_iter().collect(),
            suv_tiers: suv.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::recalc_all;
    use crate::pricing::PricingConfig;
    use pretty_assertions::assert_eq;

    fn fleet() -> Vec<EvaluatedVehicle> {
        let cars = vec![
            Vehicle {
                year: Some(2022),
                body_style: Some("SUV".to_string()),
                suv_tier: Some("Compact".to_string()),
                consumption_kwh_per_100km: 18.0,
                ..Vehicle::new("Kia EV6", VehicleType::Ev, 450_000.0)
            },
            Vehicle {
                year: Some(2019),
                body_style: Some("Wagon".to_string()),
                eu_segment: Some("D".to_string()),
                consumption_l_per_100km: 5.2,
                ..Vehicle::new("Volvo V60 D4", VehicleType::Diesel, 250_000.0)
            },
            Vehicle {
                body_style: Some("SUV".to_string()),
                suv_tier: Some("Midsize".to_string()),
                consumption_kwh_per_100km: 21.0,
                consumption_l_per_100km: 7.0,
                battery_capacity_kwh: 18.0,
                ..Vehicle::new("Volvo XC60 T6", VehicleType::Phev, 550_000.0)
            },
        ];
        recalc_all(&cars, &PricingConfig::default())
    }

    fn names(list: &[&EvaluatedVehicle]) -> Vec<String> {
        list.iter().map(|e| e.vehicle.model.clone()).collect()
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let all = fleet();
        let filter = VehicleFilter {
            query: Some("  volvo ".to_string()),
            ..VehicleFilter::default()
        };
        assert_eq!(names(&filter.apply(&all)), vec!["Volvo V60 D4", "Volvo XC60 T6"]);
    }

    #[test]
    fn test_year_bounds_with_missing_year() {
        let all = fleet();
        let min = VehicleFilter {
            year_min: Some(2020),
            ..VehicleFilter::default()
        };
        assert_eq!(names(&min.apply(&all)), vec!["Kia EV6"]);

        let max = VehicleFilter {
            year_max: Some(2020),
            ..VehicleFilter::default()
        };
        assert_eq!(names(&max.apply(&all)), vec!["Volvo V60 D4"]);
    }

    #[test]
    fn test_set_filters() {
        let all = fleet();
        let filter = VehicleFilter {
            types: [VehicleType::Ev, VehicleType::Phev].into_iter().collect(),
            body_styles: ["SUV".to_string()].into_iter().collect(),
            suv_tiers: ["Midsize".to_string()].into_iter().collect(),
            ..VehicleFilter::default()
        };
        assert_eq!(names(&filter.apply(&all)), vec!["Volvo XC60 T6"]);

        let segment = VehicleFilter {
            eu_segments: ["D".to_string()].into_iter().collect(),
            ..VehicleFilter::default()
        };
        assert_eq!(names(&segment.apply(&all)), vec!["Volvo V60 D4"]);
        assert!(VehicleFilter::default().is_empty());
        assert_eq!(VehicleFilter::default().apply(&all).len(), 3);
    }

    #[test]
    fn test_sort_by_price_and_name() {
        let mut all = fleet();
        SortState::new(SortKey::PurchasePrice, SortDirection::Desc).sort(&mut all);
        let order: Vec<&str> = all.iter().map(|e| e.vehicle.model.as_str()).collect();
        assert_eq!(order, vec!["Volvo XC60 T6", "Kia EV6", "Volvo V60 D4"]);

        SortState::new(SortKey::Model, SortDirection::Asc).sort(&mut all);
        let order: Vec<&str> = all.iter().map(|e| e.vehicle.model.as_str()).collect();
        assert_eq!(order, vec!["Kia EV6", "Volvo V60 D4", "Volvo XC60 T6"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let cars: Vec<Vehicle> = ["first", "second", "third"]
            .iter()
            .map(|m| Vehicle::new(m, VehicleType::Ev, 100_000.0))
            .collect();
        let mut all = recalc_all(&cars, &PricingConfig::default());

        SortState::default().sort(&mut all);
        let order: Vec<&str> = all.iter().map(|e| e.vehicle.model.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_sort_borrowed_rows() {
        let all = fleet();
        let mut rows = VehicleFilter::default().apply(&all);
        SortState::new(SortKey::Year, SortDirection::Asc).sort(&mut rows);
        assert_eq!(names(&rows), vec!["Volvo XC60 T6", "Volvo V60 D4", "Kia EV6"]);
    }

    #[test]
    fn test_toggle() {
        let mut state = SortState::default();
        assert_eq!(state.key, SortKey::TcoPerMonth(Horizon::Eight));

        state.toggle(SortKey::TcoPerMonth(Horizon::Eight));
        assert_eq!(state.direction, SortDirection::Desc);

        state.toggle(SortKey::Model);
        assert_eq!(state, SortState::new(SortKey::Model, SortDirection::Asc));
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("tco_per_month_3y".parse::<SortKey>(), Ok(SortKey::TcoPerMonth(Horizon::Three)));
        assert_eq!(
            "expected_value_after_5y".parse::<SortKey>(),
            Ok(SortKey::ExpectedValue(Horizon::Five))
        );
        assert_eq!("Model".parse::<SortKey>(), Ok(SortKey::Model));
        assert!("tco_total_4y".parse::<SortKey>().is_err());

        for key in [SortKey::FinanceInterest(Horizon::Eight), SortKey::RecurringYear] {
            assert_eq!(key.key().parse::<SortKey>(), Ok(key));
        }
    }

    #[test]
    fn test_category_choices() {
        let all = fleet();
        let choices = CategoryChoices::collect(all.iter().map(|e| &e.vehicle));
        assert_eq!(choices.body_styles, vec!["SUV", "Wagon"]);
        assert_eq!(choices.eu_segments, vec!["D"]);
        assert_eq!(choices.suv_tiers, vec!["Compact", "Midsize"]);
    }
}
