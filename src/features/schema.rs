//! Fixed feature schema emitted for every flow.
//!
//! Column names and order follow the CICFlowMeter CSV layout so that the
//! vectors can be fed to models trained on those datasets. The schema is
//! the same for every protocol; fields that do not apply are zero.

use serde::Serialize;
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::processor::FlowIdentity;

/// Value substituted for a feature that fails coercion.
pub const DEFAULT_FALLBACK: f64 = 0.0;

/// Accept only plain finite numbers.
pub fn coerce(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FlowError::Coercion { field, value })
    }
}

macro_rules! flow_metrics {
    ($($name:ident),* $(,)?) => {
        /// Numeric part of a flow's feature vector.
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        pub struct FlowMetrics {
            $(pub $name: f64,)*
        }

        impl FlowMetrics {
            pub const NAMES: &'static [&'static str] = &[$(stringify!($name)),*];

            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($name) => Some(self.$name),)*
                    _ => None,
                }
            }

            /// Values in `NAMES` order.
            pub fn values(&self) -> Vec<f64> {
                vec![$(self.$name),*]
            }

            /// Replace every value that is not a finite number by `fallback`.
            /// Returns how many fields were replaced.
            pub fn coerce_all(&mut self, fallback: f64) -> usize {
                let mut replaced = 0;
                $(
                    self.$name = match coerce(stringify!($name), self.$name) {
                        Ok(v) => v,
                        Err(e) => {
                            debug!(error = %e, "feature coerced to fallback");
                            replaced += 1;
                            fallback
                        }
                    };
                )*
                replaced
            }
        }
    };
}

flow_metrics! {
    timestamp,
    flow_duration,
    flow_byts_s,
    flow_pkts_s,
    fwd_pkts_s,
    bwd_pkts_s,
    tot_fwd_pkts,
    tot_bwd_pkts,
    totlen_fwd_pkts,
    totlen_bwd_pkts,
    fwd_pkt_len_max,
    fwd_pkt_len_min,
    fwd_pkt_len_mean,
    fwd_pkt_len_std,
    bwd_pkt_len_max,
    bwd_pkt_len_min,
    bwd_pkt_len_mean,
    bwd_pkt_len_std,
    pkt_len_max,
    pkt_len_min,
    pkt_len_mean,
    pkt_len_std,
    pkt_len_var,
    fwd_header_len,
    bwd_header_len,
    fwd_seg_size_min,
    fwd_act_data_pkts,
    flow_iat_mean,
    flow_iat_max,
    flow_iat_min,
    flow_iat_std,
    fwd_iat_tot,
    fwd_iat_max,
    fwd_iat_min,
    fwd_iat_mean,
    fwd_iat_std,
    bwd_iat_tot,
    bwd_iat_max,
    bwd_iat_min,
    bwd_iat_mean,
    bwd_iat_std,
    fwd_psh_flags,
    bwd_psh_flags,
    fwd_urg_flags,
    bwd_urg_flags,
    fin_flag_cnt,
    syn_flag_cnt,
    rst_flag_cnt,
    psh_flag_cnt,
    ack_flag_cnt,
    urg_flag_cnt,
    ece_flag_cnt,
    cwr_flag_cnt,
    down_up_ratio,
    pkt_size_avg,
    init_fwd_win_byts,
    init_bwd_win_byts,
    active_max,
    active_min,
    active_mean,
    active_std,
    idle_max,
    idle_min,
    idle_mean,
    idle_std,
    fwd_byts_b_avg,
    fwd_pkts_b_avg,
    bwd_byts_b_avg,
    bwd_pkts_b_avg,
    fwd_blk_rate_avg,
    bwd_blk_rate_avg,
    fwd_seg_size_avg,
    bwd_seg_size_avg,
    cwe_flag_count,
    subflow_fwd_pkts,
    subflow_bwd_pkts,
    subflow_fwd_byts,
    subflow_bwd_byts,
    forward_bulk_count,
    backward_bulk_count,
}

impl FlowMetrics {
    /// Zero every TCP flag and initial window field.
    pub fn clear_tcp_fields(&mut self) {
        self.fwd_psh_flags = 0.0;
        self.bwd_psh_flags = 0.0;
        self.fwd_urg_flags = 0.0;
        self.bwd_urg_flags = 0.0;
        self.fin_flag_cnt = 0.0;
        self.syn_flag_cnt = 0.0;
        self.rst_flag_cnt = 0.0;
        self.psh_flag_cnt = 0.0;
        self.ack_flag_cnt = 0.0;
        self.urg_flag_cnt = 0.0;
        self.ece_flag_cnt = 0.0;
        self.cwr_flag_cnt = 0.0;
        self.cwe_flag_count = 0.0;
        self.init_fwd_win_byts = 0.0;
        self.init_bwd_win_byts = 0.0;
    }
}

/// Complete feature vector of one flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowFeatures {
    #[serde(flatten)]
    pub identity: FlowIdentity,
    #[serde(flatten)]
    pub metrics: FlowMetrics,
}

impl FlowFeatures {
    /// Numeric feature by column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| FlowError::Parse(format!("serialize features: {e}")))
    }

    pub fn csv_header() -> String {
        FlowIdentity::COLUMNS
            .iter()
            .chain(FlowMetrics::NAMES.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn to_csv_row(&self) -> String {
        self.identity
            .csv_fields()
            .into_iter()
            .chain(self.metrics.values().into_iter().map(|v| v.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}
