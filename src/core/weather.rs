use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::EngineError;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketWeather {
    #[default]
    Normal,
    Bull,
    Bear,
    Stagflation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketWeatherRegime {
    pub key: MarketWeather,
    pub label: &'static str,
    pub description: &'static str,
    /// Added to the base annual return.
    pub return_adjustment: f64,
    pub volatility_adjustment: f64,
}

pub static MARKET_WEATHER: [MarketWeatherRegime; 4] = [
    MarketWeatherRegime {
        key: MarketWeather::Normal,
        label: "Normaal",
        description: "Historisch gemiddeld rendement, geen bijsturing.",
        return_adjustment: 0.0,
        volatility_adjustment: 0.0,
    },
    MarketWeatherRegime {
        key: MarketWeather::Bull,
        label: "Hoogconjunctuur",
        description: "Langdurig sterke markten met bovengemiddeld rendement.",
        return_adjustment: 0.02,
        volatility_adjustment: -0.02,
    },
    MarketWeatherRegime {
        key: MarketWeather::Bear,
        label: "Berenmarkt",
        description: "Aanhoudend zwakke markten en lagere rendementen.",
        return_adjustment: -0.03,
        volatility_adjustment: 0.05,
    },
    MarketWeatherRegime {
        key: MarketWeather::Stagflation,
        label: "Stagflatie",
        description: "Hoge inflatie bij lage groei drukt het reële rendement.",
        return_adjustment: -0.04,
        volatility_adjustment: 0.03,
    },
];

impl MarketWeather {
    pub fn key(self) -> &'static str {
        match self {
            MarketWeather::Normal => "normal",
            MarketWeather::Bull => "bull",
            MarketWeather::Bear => "bear",
            MarketWeather::Stagflation => "stagflation",
        }
    }

    pub fn regime(self) -> &'static MarketWeatherRegime {
        match self {
            MarketWeather::Normal => &MARKET_WEATHER[0],
            MarketWeather::Bull => &MARKET_WEATHER[1],
            MarketWeather::Bear => &MARKET_WEATHER[2],
            MarketWeather::Stagflation => &MARKET_WEATHER[3],
        }
    }
}

impl FromStr for MarketWeather {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MARKET_WEATHER
            .iter()
            .find(|regime| regime.key.key() == wanted)
            .map(|regime| regime.key)
            .ok_or_else(|| EngineError::UnknownRegime(s.to_string()))
    }
}

/// Looks up a regime by its text key.
pub fn market_weather(key: &str) -> Result<&'static MarketWeatherRegime, EngineError> {
    key.parse::<MarketWeather>().map(MarketWeather::regime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_entries_match_their_enum_slot() {
        for regime in &MARKET_WEATHER {
            assert_eq!(regime.key.regime().key, regime.key);
        }
    }

    #[test]
    fn normal_regime_is_neutral_default() {
        let regime = MarketWeather::default().regime();
        assert_eq!(regime.key, MarketWeather::Normal);
        assert_eq!(regime.return_adjustment, 0.0);
        assert_eq!(regime.volatility_adjustment, 0.0);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let regime = market_weather("Stagflation").expect("known regime");
        assert_eq!(regime.key, MarketWeather::Stagflation);
        assert!(regime.return_adjustment < 0.0);
    }

    #[test]
    fn unknown_regime_fails_fast() {
        let err = market_weather("hurricane").expect_err("must reject");
        assert_eq!(err, EngineError::UnknownRegime("hurricane".to_string()));
    }
}
