use crate::hierarchy::Measures;
use serde::{Deserialize, Serialize};

pub fn variance(target: f64, actual: f64) -> f64 {
    target - actual
}

/// Accomplishment as a percentage of target. A zero target reads as a
/// zero rate, never NaN or infinity.
pub fn percentage(actual: f64, target: f64) -> f64 {
    if target > 0.0 {
        actual / target * 100.0
    } else {
        0.0
    }
}

pub fn obligation_rate(obligation: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        obligation / cost * 100.0
    } else {
        0.0
    }
}

pub fn disbursement_rate(disbursement: f64, obligation: f64) -> f64 {
    if obligation > 0.0 {
        disbursement / obligation * 100.0
    } else {
        0.0
    }
}

/// Derived rates for one hierarchy node, computed once from its
/// already-rolled-up annual sums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRates {
    pub variance: f64,
    pub completion: f64,
    pub obligation_rate: f64,
    pub disbursement_rate: f64,
}

impl Measures {
    pub fn rates(&self) -> NodeRates {
        NodeRates {
            variance: variance(self.output_totals.target, self.output_totals.actual),
            completion: percentage(self.output_totals.actual, self.output_totals.target),
            obligation_rate: obligation_rate(self.flow.obligation, self.flow.cost),
            disbursement_rate: disbursement_rate(self.flow.disbursement, self.flow.obligation),
        }
    }
}
