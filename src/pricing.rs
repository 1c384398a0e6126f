// ⚙️ Pricing Configuration - shared settings for every vehicle
//
// One value, passed explicitly into every calculation. Loaded from layers
// (defaults < file < environment); each key accepts the aliases the older
// dashboard clients used, and every value is coerced with the shared rule.

use crate::calc::residual::ResidualModel;
use crate::coerce::{non_negative, to_num};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// DEFAULTS
// ============================================================================

pub const DEFAULT_EL_PRICE_ORE_KWH: f64 = 250.0;
pub const DEFAULT_DIESEL_PRICE_SEK_LITRE: f64 = 20.0;
pub const DEFAULT_BENSIN_PRICE_SEK_LITRE: f64 = 18.0;
pub const DEFAULT_YEARLY_KM: f64 = 18_000.0;
pub const DEFAULT_DAILY_COMMUTE_KM: f64 = 30.0;
pub const DEFAULT_TIRE_LIFESPAN_YEARS: f64 = 3.0;
pub const DEFAULT_DOWNPAYMENT_SEK: f64 = 0.0;
pub const DEFAULT_INTEREST_RATE_PCT: f64 = 5.0;
pub const DEFAULT_CHARGING_LOSS_PCT: f64 = 0.0;

/// Prefix for environment overrides, e.g. `CAR_TCO_YEARLY_KM=20000`
pub const ENV_PREFIX: &str = "CAR_TCO";

/// Canonical key → accepted aliases
const KEY_ALIASES: &[(&str, &[&str])] = &[
    ("el_price_ore_kwh", &["electricity_price_ore_kwh", "elPriceOreKwh", "elOre"]),
    ("diesel_price_sek_litre", &["diesel"]),
    ("bensin_price_sek_litre", &["petrol", "bensin"]),
    ("yearly_km", &["yearlyKm", "yearly_driving_km"]),
    ("daily_commute_km", &["daily_commute", "dailyCommuteKm"]),
    ("tire_lifespan_years", &["tireLifespanYears"]),
    ("downpayment_sek", &["downPaymentSek", "downpayment", "downPayment"]),
    ("interest_rate_pct", &["interestRatePct", "interest"]),
    ("charging_loss_pct", &["chargingLossPct"]),
    ("residual_model", &["residualModel"]),
    ("estimate_missing_costs", &["estimateMissingCosts"]),
    ("valuation_date", &["valuationDate"]),
];

/// Map any accepted key spelling to its canonical name. Case-insensitive:
/// file and environment layers arrive with lower-cased keys.
pub fn canonical_key(key: &str) -> Option<&'static str> {
    KEY_ALIASES.iter().find_map(|(canonical, aliases)| {
        if canonical.eq_ignore_ascii_case(key) || aliases.iter().any(|a| a.eq_ignore_ascii_case(key)) {
            Some(*canonical)
        } else {
            None
        }
    })
}

// ============================================================================
// PRICING CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingConfig {
    /// Electricity, öre per kWh (100 öre = 1 SEK)
    pub el_price_ore_kwh: f64,

    /// SEK per litre
    pub diesel_price_sek_litre: f64,

    /// SEK per litre
    pub bensin_price_sek_litre: f64,

    pub yearly_km: f64,

    /// Drives the PHEV electric/petrol split
    pub daily_commute_km: f64,

    /// Years a summer + winter set lasts (at least 1)
    pub tire_lifespan_years: f64,

    /// Cash paid up front (SEK, non-negative)
    pub downpayment_sek: f64,

    /// Nominal annual loan rate in percent
    pub interest_rate_pct: f64,

    /// Extra grid energy lost while charging, as a fraction (0.1 = 10 %)
    pub charging_loss_pct: f64,

    /// How residual values are estimated for every vehicle in a run
    pub residual_model: ResidualModel,

    /// Replace missing insurance/tax/repairs with estimates
    pub estimate_missing_costs: bool,

    /// Date vehicle ages are measured against. Without it every car counts
    /// as new, which keeps results independent of the wall clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation_date: Option<NaiveDate>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            el_price_ore_kwh: DEFAULT_EL_PRICE_ORE_KWH,
            diesel_price_sek_litre: DEFAULT_DIESEL_PRICE_SEK_LITRE,
            bensin_price_sek_litre: DEFAULT_BENSIN_PRICE_SEK_LITRE,
            yearly_km: DEFAULT_YEARLY_KM,
            daily_commute_km: DEFAULT_DAILY_COMMUTE_KM,
            tire_lifespan_years: DEFAULT_TIRE_LIFESPAN_YEARS,
            downpayment_sek: DEFAULT_DOWNPAYMENT_SEK,
            interest_rate_pct: DEFAULT_INTEREST_RATE_PCT,
            charging_loss_pct: DEFAULT_CHARGING_LOSS_PCT,
            residual_model: ResidualModel::default(),
            estimate_missing_costs: false,
            valuation_date: None,
        }
    }
}

impl PricingConfig {
    /// Build from a flat key/value map. Unknown keys are ignored, aliases are
    /// resolved, and every missing or non-numeric value takes its default.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let normalized = normalize_keys(map);
        let get = |key: &str| normalized.get(key).unwrap_or(&Value::Null);

        PricingConfig {
            el_price_ore_kwh: to_num(get("el_price_ore_kwh"), DEFAULT_EL_PRICE_ORE_KWH),
            diesel_price_sek_litre: to_num(get("diesel_price_sek_litre"), DEFAULT_DIESEL_PRICE_SEK_LITRE),
            bensin_price_sek_litre: to_num(get("bensin_price_sek_litre"), DEFAULT_BENSIN_PRICE_SEK_LITRE),
            yearly_km: to_num(get("yearly_km"), DEFAULT_YEARLY_KM),
            daily_commute_km: to_num(get("daily_commute_km"), DEFAULT_DAILY_COMMUTE_KM),
            tire_lifespan_years: to_num(get("tire_lifespan_years"), DEFAULT_TIRE_LIFESPAN_YEARS).max(1.0),
            downpayment_sek: non_negative(to_num(get("downpayment_sek"), DEFAULT_DOWNPAYMENT_SEK)),
            interest_rate_pct: to_num(get("interest_rate_pct"), DEFAULT_INTEREST_RATE_PCT),
            charging_loss_pct: non_negative(to_num(get("charging_loss_pct"), DEFAULT_CHARGING_LOSS_PCT)),
            residual_model: get("residual_model")
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            estimate_missing_costs: to_bool(get("estimate_missing_costs")),
            valuation_date: to_date(get("valuation_date")),
        }
    }

    /// Electricity price in SEK per kWh drawn from the grid
    pub fn el_price_sek_kwh(&self) -> f64 {
        non_negative(self.el_price_ore_kwh) / 100.0 * (1.0 + self.charging_loss_pct)
    }

    /// Interest rate as used by the amortizer (negative rates count as 0)
    pub fn effective_interest_rate_pct(&self) -> f64 {
        non_negative(self.interest_rate_pct)
    }

    /// Calendar year used for age-based estimates (None when undated)
    pub fn valuation_year(&self) -> Option<i32> {
        self.valuation_date.map(|d| d.year())
    }
}

impl<'de> Deserialize<'de> for PricingConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(PricingConfig::from_map(&map))
    }
}

// ============================================================================
// KEY NORMALIZATION
// ============================================================================

/// Rewrite alias keys to canonical ones. Unknown keys are dropped; when both
/// an alias and the canonical key are present, the canonical key wins.
pub fn normalize_keys(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in map {
        if let Some(canonical) = canonical_key(key) {
            if key.as_str() == canonical || !map.contains_key(canonical) {
                out.insert(canonical.to_string(), value.clone());
            }
        }
    }

    out
}

/// Accepts "YYYY-MM-DD" strings and bare TOML dates
fn to_date(value: &Value) -> Option<NaiveDate> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.values().next().and_then(Value::as_str)?,
        _ => return None,
    };
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_map_gives_defaults() {
        assert_eq!(PricingConfig::from_map(&Map::new()), PricingConfig::default());
    }

    #[test]
    fn test_non_numeric_values_fall_back() {
        let cfg = PricingConfig::from_map(&map(json!({
            "el_price_ore_kwh": "cheap",
            "yearly_km": null,
            "daily_commute_km": "45",
            "bensin_price_sek_litre": "19,90",
        })));

        assert_eq!(cfg.el_price_ore_kwh, DEFAULT_EL_PRICE_ORE_KWH);
        assert_eq!(cfg.yearly_km, DEFAULT_YEARLY_KM);
        assert_eq!(cfg.daily_commute_km, 45.0);
        assert_eq!(cfg.bensin_price_sek_litre, 19.9);
    }

    #[test]
    fn test_aliases_resolve() {
        let cfg = PricingConfig::from_map(&map(json!({
            "elOre": 180,
            "petrol": 17.5,
            "yearly_driving_km": 12000,
            "downPayment": 50000,
            "interest": 4.2,
        })));

        assert_eq!(cfg.el_price_ore_kwh, 180.0);
        assert_eq!(cfg.bensin_price_sek_litre, 17.5);
        assert_eq!(cfg.yearly_km, 12000.0);
        assert_eq!(cfg.downpayment_sek, 50000.0);
        assert_eq!(cfg.interest_rate_pct, 4.2);
    }

    #[test]
    fn test_canonical_key_beats_alias() {
        let cfg = PricingConfig::from_map(&map(json!({
            "petrol": 10,
            "bensin_price_sek_litre": 16,
        })));
        assert_eq!(cfg.bensin_price_sek_litre, 16.0);
    }

    #[test]
    fn test_clamping() {
        let cfg = PricingConfig::from_map(&map(json!({
            "tire_lifespan_years": 0,
            "downpayment_sek": -1000,
            "interest_rate_pct": -2,
        })));

        assert_eq!(cfg.tire_lifespan_years, 1.0);
        assert_eq!(cfg.downpayment_sek, 0.0);
        assert_eq!(cfg.interest_rate_pct, -2.0);
        assert_eq!(cfg.effective_interest_rate_pct(), 0.0);
    }

    #[test]
    fn test_lowercased_aliases_resolve() {
        let cfg = PricingConfig::from_map(&map(json!({
            "yearlykm": "9000",
            "residualmodel": "retained_fraction",
            "DIESEL": 21,
        })));

        assert_eq!(canonical_key("downpayment"), Some("downpayment_sek"));
        assert_eq!(canonical_key("VALUATIONDATE"), Some("valuation_date"));
        assert_eq!(canonical_key("pricing_file"), None);
        assert_eq!(cfg.yearly_km, 9000.0);
        assert_eq!(cfg.residual_model, ResidualModel::RetainedFraction);
        assert_eq!(cfg.diesel_price_sek_litre, 21.0);
    }

    #[test]
    fn test_valuation_date_parsing() {
        let cfg = PricingConfig::from_map(&map(json!({ "valuationDate": "2026-10-19" })));
        assert_eq!(cfg.valuation_year(), Some(2026));

        let bad = PricingConfig::from_map(&map(json!({ "valuation_date": "yesterday" })));
        assert_eq!(bad.valuation_date, None);

        let bare: PricingConfig = toml::from_str("valuation_date = 2025-01-31").unwrap();
        assert_eq!(bare.valuation_date, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_electricity_price_conversion() {
        let mut cfg = PricingConfig::default();
        assert!((cfg.el_price_sek_kwh() - 2.5).abs() < 1e-12);

        cfg.charging_loss_pct = 0.1;
        assert!((cfg.el_price_sek_kwh() - 2.75).abs() < 1e-12);
    }

    #[test]
    fn test_toml_roundtrip() {
        let cfg = PricingConfig {
            yearly_km: 22000.0,
            estimate_missing_costs: true,
            valuation_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            ..PricingConfig::default()
        };
        let text = toml::to_string(&cfg).unwrap();
        let back: PricingConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
