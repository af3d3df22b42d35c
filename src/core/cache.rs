/// ResultsCache (C1): the per-circuit store of the latest analysis output,
/// consulted by the plotting/measurement tools.
///
/// Single `Mutex`-guarded map, brief critical sections only -- the same
/// shared-resource discipline the teacher applies to its request counter,
/// generalized from an atomic counter to a small hash map since the stored
/// value isn't atomic.
use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    DcSweep,
    Transient,
    Ac,
    OperatingPoint,
    ParameterSweep,
    TemperatureSweep,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedAnalysisResult {
    pub analysis_type: AnalysisType,
    pub x_data: Vec<f64>,
    pub x_label: String,
    pub signals: HashMap<String, Vec<f64>>,
    pub imaginary_signals: HashMap<String, Vec<f64>>,
    pub operating_point_data: HashMap<String, f64>,
}

impl CachedAnalysisResult {
    /// Panics if any of the data-model invariants from the spec are
    /// violated. Called once, at construction time inside analysis
    /// handlers, so a malformed result never makes it into the cache.
    pub fn validate(&self) -> Result<(), String> {
        for (signal, values) in &self.signals {
            if values.len() != self.x_data.len() {
                return Err(format!(
                    "signal '{signal}' has {} samples, expected {} (len(xData))",
                    values.len(),
                    self.x_data.len()
                ));
            }
            if let Some(imag) = self.imaginary_signals.get(signal) {
                if imag.len() != values.len() {
                    return Err(format!(
                        "imaginary signal '{signal}' has {} samples, expected {}",
                        imag.len(),
                        values.len()
                    ));
                }
            }
        }
        if !self.imaginary_signals.is_empty() && self.analysis_type != AnalysisType::Ac {
            return Err("only 'ac' analyses may populate imaginarySignals".to_string());
        }
        if !self.operating_point_data.is_empty() && self.analysis_type != AnalysisType::OperatingPoint {
            return Err("only 'operating_point' analyses may populate operatingPointData".to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ResultsCache {
    entries: Mutex<HashMap<String, CachedAnalysisResult>>,
}

impl ResultsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any prior entry for `circuit_id`.
    pub fn store(&self, circuit_id: &str, result: CachedAnalysisResult) {
        let mut entries = self.entries.lock().expect("results cache poisoned");
        entries.insert(circuit_id.to_string(), result);
    }

    /// Returns the latest cached entry for `circuit_id`, if any.
    pub fn get(&self, circuit_id: &str) -> Option<CachedAnalysisResult> {
        let entries = self.entries.lock().expect("results cache poisoned");
        entries.get(circuit_id).cloned()
    }

    /// Removes the entry for `circuit_id`, if any. Called before a mutating
    /// tool returns success, and on circuit deletion.
    pub fn clear(&self, circuit_id: &str) {
        let mut entries = self.entries.lock().expect("results cache poisoned");
        entries.remove(circuit_id);
    }

    pub fn clear_all(&self) {
        let mut entries = self.entries.lock().expect("results cache poisoned");
        entries.clear();
    }
}
