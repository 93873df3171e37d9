//! Typed payloads for each source kind.
//!
//! Field names follow the analytics backend, including its space-separated
//! keys on the option-chain response.

use serde::{Deserialize, Serialize};

/// Decoded payload of any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    OptionChain(OptionChain),
    CurrentPrice(CurrentPrice),
    PreviousDay(PreviousDayOhlc),
    StochRsi(StochRsi),
    SupportResistance(SupportResistance),
}

impl Payload {
    pub fn as_option_chain(&self) -> Option<&OptionChain> {
        match self {
            Payload::OptionChain(chain) => Some(chain),
            _ => None,
        }
    }

    pub fn as_current_price(&self) -> Option<&CurrentPrice> {
        match self {
            Payload::CurrentPrice(price) => Some(price),
            _ => None,
        }
    }

    pub fn as_previous_day(&self) -> Option<&PreviousDayOhlc> {
        match self {
            Payload::PreviousDay(ohlc) => Some(ohlc),
            _ => None,
        }
    }

    pub fn as_stoch_rsi(&self) -> Option<&StochRsi> {
        match self {
            Payload::StochRsi(rsi) => Some(rsi),
            _ => None,
        }
    }

    pub fn as_support_resistance(&self) -> Option<&SupportResistance> {
        match self {
            Payload::SupportResistance(levels) => Some(levels),
            _ => None,
        }
    }
}

/// Option chain around the underlying price, with the put/call ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    #[serde(rename = "Nifty Price", default, skip_serializing_if = "Option::is_none")]
    pub underlying_price: Option<f64>,
    pub pcr: f64,
    #[serde(default)]
    pub calls: Vec<OptionLeg>,
    #[serde(default)]
    pub puts: Vec<OptionLeg>,
    /// Flat contract list returned by `/api/v1/option-data`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contracts: Vec<OptionContract>,
    #[serde(rename = "Call OI Change", default, skip_serializing_if = "Option::is_none")]
    pub call_oi_change: Option<f64>,
    #[serde(rename = "Put OI Change", default, skip_serializing_if = "Option::is_none")]
    pub put_oi_change: Option<f64>,
}

/// One strike of the call or put side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub strike_price: f64,
    #[serde(default, alias = "latest_oi")]
    pub oi: Option<f64>,
    #[serde(default)]
    pub oi_change: Option<f64>,
    #[serde(default)]
    pub ltp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub strike_price: f64,
    /// `CE` or `PE`
    pub option_type: String,
    #[serde(default)]
    pub ltp: Option<f64>,
    #[serde(default)]
    pub oi: Option<f64>,
    #[serde(default)]
    pub change_in_oi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub ltp: f64,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousDayOhlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub date: Option<String>,
}

/// Stochastic RSI on the 5-minute series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochRsi {
    pub stochrsi: f64,
    #[serde(default)]
    pub k: Option<f64>,
    #[serde(default)]
    pub d: Option<f64>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A pivot level: `[date, value]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level(pub String, pub f64);

impl Level {
    pub fn date(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub supports: Vec<Level>,
    pub resistances: Vec<Level>,
    #[serde(default)]
    pub trade_zone: Option<String>,
}
