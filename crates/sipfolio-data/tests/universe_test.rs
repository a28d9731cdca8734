//! Integration tests for loading and summarising an instrument universe.

use sipfolio_data::{DataError, ForecastHorizon, load_universe_csv, read_universe};
use std::io::Write;

const TABLE: &str = "\
Ticker,Company_Name,Sector,Overall_Rank,Current_Price,PE_Ratio,PB_Ratio,Avg_Historical_CAGR,Forecast_6M,Forecast_12M,Forecast_18M,Forecast_24M,Forecast_36M,Forecast_48M,Forecast_60M
HDFCLIFE,HDFC Life,Financials,4,620,72,8.4,14,12,13,14,15,16,17,18
ICICIBANK,ICICI Bank,Financials,2,1100,18,3.1,21,15,16,17,18,19,20,21
APOLLOHOSP,Apollo Hospitals,Health Care,1,5400,85,11,22,,19,,20,,,
HEROMOTOCO,Hero MotoCorp,Consumer Discretionary,9,4300,22,5,-3,8,9,10,11,12,13,14
";

#[test]
fn test_full_table_roundtrip_through_file() {
    let path = std::env::temp_dir().join("sipfolio_universe_test.csv");
    {
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();
    }

    let universe = load_universe_csv(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(universe.len(), 4);
    assert_eq!(
        universe.sectors(),
        vec!["Financials", "Health Care", "Consumer Discretionary"]
    );

    let icici = universe.get("ICICIBANK").unwrap();
    assert_eq!(icici.company_name.as_deref(), Some("ICICI Bank"));
    assert_eq!(icici.forecasts.len(), 7);
    assert_eq!(icici.forecast(ForecastHorizon::SixtyMonths), Some(21.0));

    let apollo = universe.get("APOLLOHOSP").unwrap();
    assert_eq!(apollo.forecasts.len(), 2);
    assert_eq!(
        apollo.forecast_nearest(ForecastHorizon::ThirtySixMonths),
        Some((ForecastHorizon::TwentyFourMonths, 20.0))
    );

    // negative historical growth fails the quality gate
    assert!(!universe.get("HEROMOTOCO").unwrap().is_usable());
    assert_eq!(universe.usable().count(), 3);

    let market = universe.market_summary();
    assert_eq!(market.usable_instruments, 3);
    assert_eq!(market.sector_summaries[0].sector, "Health Care");
}

#[test]
fn test_missing_file() {
    let err = load_universe_csv("/definitely/not/here.csv").unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
}

#[test]
fn test_duplicate_rows_rejected() {
    let data = "Ticker,Sector,Current_Price\nAAA,Energy,10\naaa,Energy,11\n";
    let err = read_universe(data.as_bytes()).unwrap_err();
    assert!(matches!(err, DataError::DuplicateTicker(t) if t == "AAA"));
}

#[test]
fn test_negative_price_rejected() {
    let data = "Ticker,Sector,Current_Price\nAAA,Energy,-10\n";
    let err = read_universe(data.as_bytes()).unwrap_err();
    assert!(matches!(err, DataError::InvalidPrice { .. }));
}
