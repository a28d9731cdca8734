//! Instrument records and forecast horizon buckets.
//!
//! An [`Instrument`] is a read-only snapshot of one tradable equity: its price,
//! valuation ratios, average historical growth and a set of forward growth
//! forecasts. Growth figures are percentages (`18.5` means 18.5% per year).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Forecast horizons for which growth forecasts are published.
///
/// Variants are declared in ascending order of months so the derived `Ord`
/// sorts buckets chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForecastHorizon {
    /// 6 months.
    #[serde(rename = "6m")]
    SixMonths,
    /// 12 months.
    #[serde(rename = "12m")]
    TwelveMonths,
    /// 18 months.
    #[serde(rename = "18m")]
    EighteenMonths,
    /// 24 months.
    #[serde(rename = "24m")]
    TwentyFourMonths,
    /// 36 months.
    #[serde(rename = "36m")]
    ThirtySixMonths,
    /// 48 months.
    #[serde(rename = "48m")]
    FortyEightMonths,
    /// 60 months.
    #[serde(rename = "60m")]
    SixtyMonths,
}

impl ForecastHorizon {
    /// Returns all supported buckets in ascending order.
    pub const fn all() -> [Self; 7] {
        [
            Self::SixMonths,
            Self::TwelveMonths,
            Self::EighteenMonths,
            Self::TwentyFourMonths,
            Self::ThirtySixMonths,
            Self::FortyEightMonths,
            Self::SixtyMonths,
        ]
    }

    /// Length of the bucket in months.
    pub const fn months(&self) -> u32 {
        match self {
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
            Self::EighteenMonths => 18,
            Self::TwentyFourMonths => 24,
            Self::ThirtySixMonths => 36,
            Self::FortyEightMonths => 48,
            Self::SixtyMonths => 60,
        }
    }

    /// Exact bucket for a month count, if one exists.
    pub const fn from_months(months: u32) -> Option<Self> {
        match months {
            6 => Some(Self::SixMonths),
            12 => Some(Self::TwelveMonths),
            18 => Some(Self::EighteenMonths),
            24 => Some(Self::TwentyFourMonths),
            36 => Some(Self::ThirtySixMonths),
            48 => Some(Self::FortyEightMonths),
            60 => Some(Self::SixtyMonths),
            _ => None,
        }
    }

    /// Resolve an arbitrary horizon to the closest bucket.
    ///
    /// Distance is absolute difference in months; on a tie the shorter bucket
    /// wins (30 months resolves to 24, 42 to 36, 54 to 48).
    pub fn nearest(months: u32) -> Self {
        Self::nearest_among(months, Self::all()).unwrap_or(Self::TwentyFourMonths)
    }

    /// Closest bucket to `months` among `candidates`, same tie rule as [`Self::nearest`].
    pub fn nearest_among<I>(months: u32, candidates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        candidates
            .into_iter()
            .min_by_key(|h| (h.months().abs_diff(months), h.months()))
    }

    /// Column name used for this bucket in instrument tables.
    pub const fn column_name(&self) -> &'static str {
        match self {
            Self::SixMonths => "Forecast_6M",
            Self::TwelveMonths => "Forecast_12M",
            Self::EighteenMonths => "Forecast_18M",
            Self::TwentyFourMonths => "Forecast_24M",
            Self::ThirtySixMonths => "Forecast_36M",
            Self::FortyEightMonths => "Forecast_48M",
            Self::SixtyMonths => "Forecast_60M",
        }
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}M", self.months())
    }
}

/// A tradable equity with valuation, growth and forecast data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker symbol (unique within a universe).
    pub ticker: String,

    /// Company name, when known.
    pub company_name: Option<String>,

    /// Sector label.
    pub sector: String,

    /// Current unit price.
    pub current_price: f64,

    /// Trailing price-to-earnings ratio.
    pub pe_ratio: Option<f64>,

    /// Price-to-book ratio.
    pub pb_ratio: Option<f64>,

    /// Average historical annualized growth rate, in percent.
    pub avg_historical_growth: Option<f64>,

    /// Forward growth forecasts in percent, keyed by horizon.
    #[serde(default)]
    pub forecasts: BTreeMap<ForecastHorizon, f64>,

    /// Overall rank (lower is better).
    pub overall_rank: Option<u32>,

    /// Investment style label (reporting only).
    pub investment_style: Option<String>,

    /// Risk level label (reporting only).
    pub risk_level: Option<String>,
}

impl Instrument {
    /// Create an instrument with only the mandatory fields set.
    pub fn new(ticker: impl Into<String>, sector: impl Into<String>, current_price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            company_name: None,
            sector: sector.into(),
            current_price,
            pe_ratio: None,
            pb_ratio: None,
            avg_historical_growth: None,
            forecasts: BTreeMap::new(),
            overall_rank: None,
            investment_style: None,
            risk_level: None,
        }
    }

    /// Set the company name.
    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// Set the trailing P/E ratio.
    pub const fn with_pe(mut self, pe: f64) -> Self {
        self.pe_ratio = Some(pe);
        self
    }

    /// Set the P/B ratio.
    pub const fn with_pb(mut self, pb: f64) -> Self {
        self.pb_ratio = Some(pb);
        self
    }

    /// Set the average historical growth rate (percent).
    pub const fn with_growth(mut self, growth_pct: f64) -> Self {
        self.avg_historical_growth = Some(growth_pct);
        self
    }

    /// Add a forecast (percent) for a horizon bucket.
    pub fn with_forecast(mut self, horizon: ForecastHorizon, growth_pct: f64) -> Self {
        self.forecasts.insert(horizon, growth_pct);
        self
    }

    /// Set the overall rank.
    pub const fn with_rank(mut self, rank: u32) -> Self {
        self.overall_rank = Some(rank);
        self
    }

    /// Set the investment style label.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.investment_style = Some(style.into());
        self
    }

    /// Set the risk level label.
    pub fn with_risk_level(mut self, level: impl Into<String>) -> Self {
        self.risk_level = Some(level.into());
        self
    }

    /// Quality gate: the instrument has a positive P/E and a positive
    /// historical growth rate, so its PEG ratio is defined.
    pub fn is_usable(&self) -> bool {
        self.peg_ratio().is_some()
    }

    /// PEG ratio (`PE / avg_historical_growth`), defined only when both are positive.
    pub fn peg_ratio(&self) -> Option<f64> {
        match (self.pe_ratio, self.avg_historical_growth) {
            (Some(pe), Some(growth)) if pe > 0.0 && growth > 0.0 => Some(pe / growth),
            _ => None,
        }
    }

    /// Forecast for an exact bucket.
    pub fn forecast(&self, horizon: ForecastHorizon) -> Option<f64> {
        self.forecasts.get(&horizon).copied()
    }

    /// Forecast for `horizon`, or for the closest bucket this instrument publishes.
    pub fn forecast_nearest(&self, horizon: ForecastHorizon) -> Option<(ForecastHorizon, f64)> {
        if let Some(value) = self.forecast(horizon) {
            return Some((horizon, value));
        }
        let bucket = ForecastHorizon::nearest_among(horizon.months(), self.forecasts.keys().copied())?;
        self.forecast(bucket).map(|value| (bucket, value))
    }
}

/// Investment style derived from valuation and growth when a source omits it.
pub fn derive_investment_style(
    pe: Option<f64>,
    pb: Option<f64>,
    growth_pct: Option<f64>,
) -> Option<&'static str> {
    let pe = pe?;
    let pb = pb?;
    let style = if pe < 15.0 && pb < 2.0 {
        "Deep Value"
    } else if pe < 20.0 && pb < 3.0 {
        "Value"
    } else if growth_pct.is_some_and(|g| g > 25.0) {
        "Growth"
    } else {
        "Balanced"
    };
    Some(style)
}

/// Risk level derived from the P/E ratio when a source omits it.
pub fn derive_risk_level(pe: Option<f64>) -> Option<&'static str> {
    let pe = pe?;
    let level = if pe < 15.0 {
        "Low"
    } else if pe < 30.0 {
        "Medium"
    } else {
        "High"
    };
    Some(level)
}
