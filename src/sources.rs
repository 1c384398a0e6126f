// 📂 Sources - loading vehicles and pricing from disk and environment
//
// Vehicles: JSON array of objects, or CSV with a header row.
// Pricing:  defaults < file (.toml / .json) < CAR_TCO_* environment.
//
// Every field goes through the same lenient coercion, whatever the format.

use crate::pricing::{PricingConfig, ENV_PREFIX};
use crate::vehicle::Vehicle;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pricing configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported file type: {0} (expected .json, .csv or .toml)")]
    UnsupportedExtension(String),

    #[error("expected {expected} at the top level")]
    Shape { expected: &'static str },
}

pub type Result<T> = std::result::Result<T, SourceError>;

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ============================================================================
// VEHICLES
// ============================================================================

/// Load vehicles from a `.json` or `.csv` file
pub fn load_vehicles(path: &Path) -> Result<Vec<Vehicle>> {
    let vehicles = match extension(path).as_str() {
        "json" => parse_vehicles_json(&read(path)?)?,
        "csv" => parse_vehicles_csv(&read(path)?)?,
        other => return Err(SourceError::UnsupportedExtension(other.to_string())),
    };

    tracing::info!(path = %path.display(), count = vehicles.len(), "loaded vehicles");
    Ok(vehicles)
}

/// JSON array of vehicle objects. Non-object entries are skipped.
pub fn parse_vehicles_json(text: &str) -> Result<Vec<Vehicle>> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(SourceError::Shape { expected: "an array of vehicles" }),
    };

    let mut vehicles = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::warn!(index = idx, "skipping non-object vehicle entry");
            continue;
        }
        vehicles.push(serde_json::from_value(item)?);
    }
    Ok(vehicles)
}

/// CSV with field names in the header row. Empty cells count as missing.
pub fn parse_vehicles_csv(text: &str) -> Result<Vec<Vehicle>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();

    let mut vehicles = Vec::new();
    for result in reader.records() {
        let record = result?;

        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name.to_string(), Value::String(cell.to_string())))
            .collect();

        if row.is_empty() {
            continue;
        }
        vehicles.push(serde_json::from_value(Value::Object(row))?);
    }

    Ok(vehicles)
}

// ============================================================================
// PRICING
// ============================================================================

/// Pricing from defaults, an optional file and the process environment
pub fn load_pricing(path: Option<&Path>) -> Result<PricingConfig> {
    load_pricing_with_env(path, std::env::vars())
}

/// [`load_pricing`] with an explicit set of environment variables
pub fn load_pricing_with_env<I>(path: Option<&Path>, vars: I) -> Result<PricingConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        let format = match extension(path).as_str() {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            other => return Err(SourceError::UnsupportedExtension(other.to_string())),
        };
        tracing::debug!(path = %path.display(), "pricing file layer");
        builder = builder.add_source(config::File::from(path).format(format).required(true));
    }

    let env: config::Map<String, String> = vars.into_iter().collect();
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).source(Some(env)));

    // Defaults are applied by from_map, after alias resolution
    let layers: Map<String, Value> = builder.build()?.try_deserialize()?;
    tracing::debug!(keys = layers.len(), "pricing layers merged");

    Ok(PricingConfig::from_map(&layers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::VehicleType;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_load_vehicles_json() {
        let file = temp_file(
            ".json",
            r#"[
                {"id": 7, "model": "Kia EV6", "type_of_vehicle": "bev",
                 "estimated_purchase_price": "449 900", "consumption_kwh_per_100km": "17,5"},
                {"name": "Volvo V60", "type_of_vehicle": "Diesel", "year": "2019"},
                "garbage",
                {"model": null, "type_of_vehicle": "Bensin", "estimated_purchase_price": 99000}
            ]"#,
        );

        let vehicles = load_vehicles(file.path()).unwrap();
        assert_eq!(vehicles.len(), 3);
        assert_eq!(vehicles[2].model, "");
        assert_eq!(vehicles[2].estimated_purchase_price, 99_000.0);
        assert_eq!(vehicles[0].id, "7");
        assert_eq!(vehicles[0].vehicle_type, VehicleType::Ev);
        assert_eq!(vehicles[0].estimated_purchase_price, 449_900.0);
        assert_eq!(vehicles[0].consumption_kwh_per_100km, 17.5);
        assert_eq!(vehicles[1].model, "Volvo V60");
        assert_eq!(vehicles[1].year, Some(2019));
        assert!(!vehicles[1].id.is_empty());
    }

    #[test]
    fn test_load_vehicles_csv() {
        let file = temp_file(
            ".csv",
            "model,type_of_vehicle,estimated_purchase_price,consumption_l_per_100km,expected_value_after_5y\n\
             Skoda Octavia,Bensin,289000,5.9,\n\
             Toyota RAV4 PHEV,plug-in,519000,1.2,300000\n\
             ,,,,\n",
        );

        let vehicles = load_vehicles(file.path()).unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].vehicle_type, VehicleType::Bensin);
        assert_eq!(vehicles[0].consumption_l_per_100km, 5.9);
        assert_eq!(vehicles[0].expected_value_after_5y, None);
        assert_eq!(vehicles[1].vehicle_type, VehicleType::Phev);
        assert_eq!(vehicles[1].expected_value_after_5y, Some(300_000.0));
    }

    #[test]
    fn test_unsupported_and_malformed() {
        let file = temp_file(".xlsx", "");
        assert!(matches!(
            load_vehicles(file.path()),
            Err(SourceError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));

        let object = temp_file(".json", r#"{"model": "not a list"}"#);
        assert!(matches!(load_vehicles(object.path()), Err(SourceError::Shape { .. })));

        let broken = temp_file(".json", "[{");
        assert!(matches!(load_vehicles(broken.path()), Err(SourceError::Json(_))));

        let missing = Path::new("/definitely/not/here.json");
        assert!(matches!(load_vehicles(missing), Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_pricing_defaults_without_sources() {
        let pricing = load_pricing_with_env(None, no_env()).unwrap();
        assert_eq!(pricing, PricingConfig::default());
    }

    #[test]
    fn test_pricing_toml_file() {
        let file = temp_file(
            ".toml",
            "el_price_ore_kwh = 180\n\
             petrol = \"19,5\"\n\
             yearlyKm = 12000\n\
             residual_model = \"retention_curve\"\n\
             valuation_date = 2026-01-15\n",
        );
        let pricing = load_pricing_with_env(Some(file.path()), no_env()).unwrap();

        assert_eq!(pricing.el_price_ore_kwh, 180.0);
        assert_eq!(pricing.bensin_price_sek_litre, 19.5);
        assert_eq!(pricing.yearly_km, 12_000.0);
        assert_eq!(pricing.residual_model, crate::calc::ResidualModel::RetentionCurve);
        assert_eq!(pricing.valuation_year(), Some(2026));
        assert_eq!(pricing.diesel_price_sek_litre, 20.0);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = temp_file(".json", r#"{"yearly_km": 12000, "interest": 3.5}"#);
        let env = vec![
            ("CAR_TCO_YEARLY_KM".to_string(), "25000".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let pricing = load_pricing_with_env(Some(file.path()), env).unwrap();

        assert_eq!(pricing.yearly_km, 25_000.0);
        assert_eq!(pricing.interest_rate_pct, 3.5);
    }

    #[test]
    fn test_env_without_file() {
        let env = vec![
            ("CAR_TCO_RESIDUAL_MODEL".to_string(), "retained_fraction".to_string()),
            ("CAR_TCO_ESTIMATE_MISSING_COSTS".to_string(), "true".to_string()),
            ("CAR_TCO_VALUATION_DATE".to_string(), "2026-03-01".to_string()),
            ("CAR_TCO_PRICING_FILE".to_string(), "/tmp/ignored.toml".to_string()),
        ];
        let pricing = load_pricing_with_env(None, env).unwrap();

        assert_eq!(pricing.residual_model, crate::calc::ResidualModel::RetainedFraction);
        assert!(pricing.estimate_missing_costs);
        assert_eq!(pricing.valuation_year(), Some(2026));
        assert_eq!(pricing.yearly_km, crate::pricing::DEFAULT_YEARLY_KM);
    }

    #[test]
    fn test_pricing_file_errors() {
        let bad = temp_file(".toml", "yearly_km = [");
        assert!(matches!(
            load_pricing_with_env(Some(bad.path()), no_env()),
            Err(SourceError::Config(_))
        ));

        let missing = Path::new("/definitely/not/pricing.toml");
        assert!(matches!(
            load_pricing_with_env(Some(missing), no_env()),
            Err(SourceError::Config(_))
        ));

        let yaml = temp_file(".yaml", "yearly_km: 1");
        assert!(matches!(
            load_pricing_with_env(Some(yaml.path()), no_env()),
            Err(SourceError::UnsupportedExtension(_))
        ));
    }
}
