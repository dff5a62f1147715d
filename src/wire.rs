//! Protobuf wire messages for the byte-in / byte-out boundary.
//!
//! Messages are declared inline with prost derives instead of generated from
//! a .proto file. Field tags are part of the contract with callers; never
//! renumber them.

use crate::errors::{EngineError, EngineResult};
use crate::state::{ExposurePoint, RiskResult};
use prost::Message;

/// Serialized trade request. Unset optional fields fall back to engine
/// defaults during validation.
#[derive(Clone, PartialEq, prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TradeRequestMsg {
    #[prost(string, tag = "1")]
    pub trade_id: String,
    #[prost(string, tag = "2")]
    pub counterparty_id: String,
    #[prost(string, tag = "3")]
    pub trade_type: String,
    #[prost(double, optional, tag = "4")]
    pub notional: Option<f64>,
    #[prost(double, tag = "5")]
    pub strike: f64,
    #[prost(double, tag = "6")]
    pub maturity: f64,
    #[prost(double, tag = "7")]
    pub spot_price: f64,
    #[prost(double, tag = "8")]
    pub volatility: f64,
    #[prost(double, tag = "9")]
    pub risk_free_rate: f64,
    #[prost(int64, optional, tag = "10")]
    pub path_count: Option<i64>,
    #[prost(double, optional, tag = "11")]
    pub confidence_level: Option<f64>,
    #[prost(uint64, optional, tag = "12")]
    pub rng_seed: Option<u64>,
    #[prost(uint32, optional, tag = "13")]
    pub time_steps: Option<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ExposurePointMsg {
    #[prost(double, tag = "1")]
    pub time: f64,
    #[prost(double, tag = "2")]
    pub expected_exposure: f64,
    #[prost(double, tag = "3")]
    pub pfe: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ValuationResultMsg {
    #[prost(string, tag = "1")]
    pub trade_id: String,
    #[prost(string, tag = "2")]
    pub counterparty_id: String,
    #[prost(double, tag = "3")]
    pub present_value: f64,
    #[prost(double, tag = "4")]
    pub pfe: f64,
    #[prost(double, tag = "5")]
    pub confidence_level: f64,
    #[prost(uint64, tag = "6")]
    pub path_count: u64,
    #[prost(double, tag = "7")]
    pub standard_error: f64,
    #[prost(double, tag = "8")]
    pub expected_exposure: f64,
    #[prost(double, tag = "9")]
    pub analytic_pv: f64,
    #[prost(uint64, tag = "10")]
    pub rng_seed: u64,
    #[prost(message, repeated, tag = "11")]
    pub exposure_profile: Vec<ExposurePointMsg>,
}

impl From<&ExposurePoint> for ExposurePointMsg {
    fn from(p: &ExposurePoint) -> Self {
        Self {
            time: p.time,
            expected_exposure: p.expected_exposure,
            pfe: p.pfe,
        }
    }
}

impl From<&RiskResult> for ValuationResultMsg {
    fn from(r: &RiskResult) -> Self {
        Self {
            trade_id: r.trade_id.clone(),
            counterparty_id: r.counterparty_id.clone(),
            present_value: r.pv,
            pfe: r.pfe,
            confidence_level: r.confidence_level,
            path_count: r.path_count as u64,
            standard_error: r.standard_error,
            expected_exposure: r.expected_exposure,
            analytic_pv: r.analytic_pv,
            rng_seed: r.rng_seed,
            exposure_profile: r.exposure_profile.iter().map(ExposurePointMsg::from).collect(),
        }
    }
}

/// Decode request bytes. An empty buffer is treated as incomplete input
/// rather than an all-defaults request.
pub fn decode_request(bytes: &[u8]) -> EngineResult<TradeRequestMsg> {
    if bytes.is_empty() {
        return Err(EngineError::Decode("empty request".into()));
    }
    Ok(TradeRequestMsg::decode(bytes)?)
}

pub fn encode_request(msg: &TradeRequestMsg) -> Vec<u8> {
    msg.encode_to_vec()
}

pub fn encode_result(result: &RiskResult) -> Vec<u8> {
    ValuationResultMsg::from(result).encode_to_vec()
}

pub fn decode_result(bytes: &[u8]) -> EngineResult<ValuationResultMsg> {
    Ok(ValuationResultMsg::decode(bytes)?)
}
