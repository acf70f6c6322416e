//! The `dataObserved` section: market time series keyed by market object
//! code, loaded into a piecewise-constant observer.

use serde::Deserialize;

use actus_core::observers::market::TimeSeriesObserver;
use actus_core::types::time::ActusDateTime;

use crate::error::AdapterError;

/// One observed market series.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservedSeries {
    /// The market object code contracts observe under.
    #[serde(alias = "identifier", rename = "marketObjectCode")]
    pub market_object_code: String,
    /// The samples, in any order.
    #[serde(default)]
    pub data: Vec<ObservedPoint>,
}

/// One sample of an observed series.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservedPoint {
    /// Sample timestamp.
    pub timestamp: ActusDateTime,
    /// Sample value; the format stores numbers as strings or numbers.
    #[serde(deserialize_with = "number_or_string")]
    pub value: f64,
}

/// Builds a time-series observer from the `dataObserved` section.
pub fn observer_from_data(series: &[ObservedSeries]) -> Result<TimeSeriesObserver, AdapterError> {
    let mut observer = TimeSeriesObserver::new();
    for entry in series {
        if entry.data.is_empty() {
            continue;
        }
        observer.insert_series(
            entry.market_object_code.clone(),
            entry.data.iter().map(|p| (p.timestamp, p.value)).collect(),
        )?;
    }
    Ok(observer)
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actus_core::observers::market::MarketObserver;

    #[test]
    fn test_load_observed_series() {
        let series: Vec<ObservedSeries> = serde_json::from_str(
            r#"[{
                "marketObjectCode": "LIBOR-3M",
                "data": [
                    {"timestamp": "2024-01-01", "value": "0.03"},
                    {"timestamp": "2024-04-15", "value": 0.04}
                ]
            }]"#,
        )
        .unwrap();
        let observer = observer_from_data(&series).unwrap();
        let t = ActusDateTime::from_ymd(2024, 5, 1).unwrap();
        assert_eq!(observer.get("LIBOR-3M", t).unwrap(), 0.04);
        let early = ActusDateTime::from_ymd(2023, 1, 1).unwrap();
        assert_eq!(observer.get("LIBOR-3M", early).unwrap(), 0.03);
    }
}
