// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::MetricValue;

/// Fixed-schema makespan summary of one run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MakespanMetrics {
    #[cfg_attr(feature = "serde", serde(rename = "MTS", default))]
    pub mts: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "MTF", default))]
    pub mtf: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "MTP", default))]
    pub mtp: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "MTN", default))]
    pub mtn: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "EMS", default))]
    pub ems: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "P_TP", default))]
    pub p_tp: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "P_FN", default))]
    pub p_fn: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "P_TN", default))]
    pub p_tn: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "P_FP", default))]
    pub p_fp: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "P_NCS", default))]
    pub p_ncs: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "P_NCF", default))]
    pub p_ncf: MetricValue,
}

/// Truth-conditioned decision rates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConfusionRates {
    #[cfg_attr(feature = "serde", serde(rename = "TP", default))]
    pub tp: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "FN", default))]
    pub fn_: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "TN", default))]
    pub tn: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "FP", default))]
    pub fp: MetricValue,
    #[cfg_attr(feature = "serde", serde(rename = "NC", default))]
    pub nc: MetricValue,
}
