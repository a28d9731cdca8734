//! CSV ingestion of the flat instrument table.
//!
//! Expected headers (any subset of the optional ones may be absent):
//!
//! ```text
//! Ticker, Company_Name, Sector, Overall_Rank, Current_Price, PE_Ratio, PB_Ratio,
//! Avg_Historical_CAGR, Forecast_6M, Forecast_12M, Forecast_18M, Forecast_24M,
//! Forecast_36M, Forecast_48M, Forecast_60M, Investment_Style, Risk_Level
//! ```
//!
//! Blank or unparseable numeric cells load as missing values. Missing style
//! and risk labels are derived from the valuation ratios.

use crate::error::{DataError, Result};
use crate::instrument::{ForecastHorizon, Instrument, derive_investment_style, derive_risk_level};
use crate::universe::InstrumentUniverse;
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Sector assigned to rows without one.
const UNKNOWN_SECTOR: &str = "Unknown";

/// One row of the instrument table, as it appears on disk.
#[derive(Debug, Deserialize)]
struct InstrumentRow {
    #[serde(rename = "Ticker")]
    ticker: String,

    #[serde(rename = "Company_Name", default)]
    company_name: Option<String>,

    #[serde(rename = "Sector", default)]
    sector: Option<String>,

    #[serde(rename = "Overall_Rank", default, deserialize_with = "csv::invalid_option")]
    overall_rank: Option<u32>,

    #[serde(rename = "Current_Price", default, deserialize_with = "csv::invalid_option")]
    current_price: Option<f64>,

    #[serde(rename = "PE_Ratio", default, deserialize_with = "csv::invalid_option")]
    pe_ratio: Option<f64>,

    #[serde(rename = "PB_Ratio", default, deserialize_with = "csv::invalid_option")]
    pb_ratio: Option<f64>,

    #[serde(rename = "Avg_Historical_CAGR", default, deserialize_with = "csv::invalid_option")]
    avg_historical_growth: Option<f64>,

    #[serde(rename = "Forecast_6M", default, deserialize_with = "csv::invalid_option")]
    forecast_6m: Option<f64>,

    #[serde(rename = "Forecast_12M", default, deserialize_with = "csv::invalid_option")]
    forecast_12m: Option<f64>,

    #[serde(rename = "Forecast_18M", default, deserialize_with = "csv::invalid_option")]
    forecast_18m: Option<f64>,

    #[serde(rename = "Forecast_24M", default, deserialize_with = "csv::invalid_option")]
    forecast_24m: Option<f64>,

    #[serde(rename = "Forecast_36M", default, deserialize_with = "csv::invalid_option")]
    forecast_36m: Option<f64>,

    #[serde(rename = "Forecast_48M", default, deserialize_with = "csv::invalid_option")]
    forecast_48m: Option<f64>,

    #[serde(rename = "Forecast_60M", default, deserialize_with = "csv::invalid_option")]
    forecast_60m: Option<f64>,

    #[serde(rename = "Investment_Style", default)]
    investment_style: Option<String>,

    #[serde(rename = "Risk_Level", default)]
    risk_level: Option<String>,
}

impl InstrumentRow {
    fn into_instrument(self, line: usize) -> Result<Instrument> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(DataError::MissingField {
                line,
                field: "Ticker",
            });
        }

        let current_price = self.current_price.ok_or(DataError::MissingField {
            line,
            field: "Current_Price",
        })?;

        let sector = non_blank(self.sector).unwrap_or_else(|| UNKNOWN_SECTOR.to_string());

        let forecasts = [
            (ForecastHorizon::SixMonths, self.forecast_6m),
            (ForecastHorizon::TwelveMonths, self.forecast_12m),
            (ForecastHorizon::EighteenMonths, self.forecast_18m),
            (ForecastHorizon::TwentyFourMonths, self.forecast_24m),
            (ForecastHorizon::ThirtySixMonths, self.forecast_36m),
            (ForecastHorizon::FortyEightMonths, self.forecast_48m),
            (ForecastHorizon::SixtyMonths, self.forecast_60m),
        ]
        .into_iter()
        .filter_map(|(h, v)| v.filter(|x| x.is_finite()).map(|x| (h, x)))
        .collect();

        let investment_style = non_blank(self.investment_style).or_else(|| {
            derive_investment_style(self.pe_ratio, self.pb_ratio, self.avg_historical_growth)
                .map(str::to_string)
        });
        let risk_level = non_blank(self.risk_level)
            .or_else(|| derive_risk_level(self.pe_ratio).map(str::to_string));

        Ok(Instrument {
            ticker,
            company_name: non_blank(self.company_name),
            sector,
            current_price,
            pe_ratio: self.pe_ratio,
            pb_ratio: self.pb_ratio,
            avg_historical_growth: self.avg_historical_growth,
            forecasts,
            overall_rank: self.overall_rank,
            investment_style,
            risk_level,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Forecast buckets whose column appears in `headers`.
fn forecast_columns(headers: &csv::StringRecord) -> Vec<ForecastHorizon> {
    ForecastHorizon::all()
        .into_iter()
        .filter(|h| headers.iter().any(|name| name == h.column_name()))
        .collect()
}

/// Read an instrument universe from any CSV source.
///
/// # Errors
/// Fails on malformed CSV, a missing ticker or price, a non-positive price
/// or a duplicate ticker.
pub fn read_universe<R: Read>(reader: R) -> Result<InstrumentUniverse> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let horizons = forecast_columns(rdr.headers()?);
    if horizons.is_empty() {
        warn!("No forecast columns found; every instrument will lack forecasts");
    } else {
        debug!(
            "Forecast columns: {}",
            horizons.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
    }

    let mut instruments = Vec::new();
    for (i, record) in rdr.deserialize::<InstrumentRow>().enumerate() {
        let instrument = record?.into_instrument(i + 1)?;
        debug!("Loaded {} ({})", instrument.ticker, instrument.sector);
        instruments.push(instrument);
    }

    let universe = InstrumentUniverse::new(instruments)?;
    info!(
        "Loaded universe: {} instruments across {} sectors",
        universe.len(),
        universe.sectors().len()
    );
    Ok(universe)
}

/// Read an instrument universe from a CSV file on disk.
///
/// # Errors
/// Fails if the file cannot be opened or its contents are invalid.
pub fn load_universe_csv(path: impl AsRef<Path>) -> Result<InstrumentUniverse> {
    let file = File::open(path.as_ref())?;
    read_universe(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
Ticker,Sector,Current_Price,PE_Ratio,PB_Ratio,Avg_Historical_CAGR,Forecast_12M,Forecast_24M,Overall_Rank
hdfclife,Financials,620.5,72.1,8.4,14.2,16.0,17.5,3
APOLLOHOSP,Health Care,5400,85.0,,22.0,19.0,,1
TCS,Information Technology,3900,28.0,12.0,n/a,12.0,13.0,
";

    #[test]
    fn test_read_sample() {
        let universe = read_universe(SAMPLE.as_bytes()).unwrap();
        assert_eq!(universe.len(), 3);

        let hdfc = universe.get("HDFCLIFE").unwrap();
        assert_eq!(hdfc.sector, "Financials");
        assert_relative_eq!(hdfc.current_price, 620.5);
        assert_eq!(hdfc.overall_rank, Some(3));
        assert_eq!(hdfc.forecast(ForecastHorizon::TwentyFourMonths), Some(17.5));
        assert_eq!(hdfc.forecast(ForecastHorizon::SixMonths), None);
        assert_eq!(hdfc.risk_level.as_deref(), Some("High"));

        let apollo = universe.get("APOLLOHOSP").unwrap();
        assert_eq!(apollo.pb_ratio, None);
        assert_eq!(apollo.forecast(ForecastHorizon::TwentyFourMonths), None);
        // no P/B, so no style can be derived
        assert_eq!(apollo.investment_style, None);

        let tcs = universe.get("TCS").unwrap();
        assert_eq!(tcs.avg_historical_growth, None);
        assert!(!tcs.is_usable());
        assert_eq!(tcs.overall_rank, None);
    }

    #[test]
    fn test_forecast_columns_from_headers() {
        let headers = csv::StringRecord::from(vec![
            "Ticker",
            "Forecast_60M",
            "Current_Price",
            "Forecast_12M",
            "Forecast_7M",
        ]);
        assert_eq!(
            forecast_columns(&headers),
            vec![ForecastHorizon::TwelveMonths, ForecastHorizon::SixtyMonths]
        );
        assert!(forecast_columns(&csv::StringRecord::from(vec!["Ticker"])).is_empty());

        // a table without forecasts still loads
        let data = "Ticker,Sector,Current_Price\nAAA,Energy,10\n";
        let universe = read_universe(data.as_bytes()).unwrap();
        let inst = universe.get("AAA").unwrap();
        assert_eq!(inst.forecast(ForecastHorizon::TwelveMonths), None);
    }

    #[test]
    fn test_missing_price_rejected() {
        let data = "Ticker,Sector,Current_Price\nAAA,Energy,\n";
        let err = read_universe(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingField {
                line: 1,
                field: "Current_Price"
            }
        ));
    }

    #[test]
    fn test_blank_sector_defaults_to_unknown() {
        let data = "Ticker,Sector,Current_Price\nAAA,,10\n";
        let universe = read_universe(data.as_bytes()).unwrap();
        assert_eq!(universe.get("AAA").unwrap().sector, UNKNOWN_SECTOR);
    }

    #[test]
    fn test_explicit_labels_are_kept() {
        let data = "Ticker,Sector,Current_Price,PE_Ratio,PB_Ratio,Investment_Style,Risk_Level\n\
                    AAA,Energy,10,12,1,Growth,High\n";
        let universe = read_universe(data.as_bytes()).unwrap();
        let inst = universe.get("AAA").unwrap();
        assert_eq!(inst.investment_style.as_deref(), Some("Growth"));
        assert_eq!(inst.risk_level.as_deref(), Some("High"));
    }
}
