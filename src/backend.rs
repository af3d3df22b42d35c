/// `SimulationBackend`: the external collaborator this crate calls into for
/// everything circuit-simulation related (device models, netlist parsing,
/// schematic rendering, plotting, the analysis math itself). Per spec this
/// is explicitly out of scope -- the dispatcher only needs an interface to
/// call. `StubBackend` is a deterministic in-memory implementation so the
/// crate is self-contained and its tests exercise real dispatch paths.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::cache::{AnalysisType, CachedAnalysisResult};

#[derive(thiserror::Error, Debug, Clone)]
pub enum BackendError {
    #[error("no such circuit: {0}")]
    CircuitNotFound(String),
    #[error("no such component: {0}")]
    ComponentNotFound(String),
    #[error("no such model: {0}")]
    ModelNotFound(String),
    #[error("no such signal: {0}")]
    SignalNotFound(String),
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("convergence failure: {0}")]
    ConvergenceFailure(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ComponentSpec {
    pub id: String,
    pub kind: String,
    pub nodes: Vec<String>,
    pub value: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

#[async_trait]
pub trait SimulationBackend: Send + Sync {
    async fn create_circuit(&self, circuit_id: &str) -> Result<(), BackendError>;
    async fn list_circuits(&self) -> Vec<String>;
    async fn delete_circuit(&self, circuit_id: &str) -> Result<(), BackendError>;

    async fn add_component(
        &self,
        circuit_id: &str,
        component: ComponentSpec,
    ) -> Result<(), BackendError>;
    async fn modify_component(
        &self,
        circuit_id: &str,
        component_id: &str,
        patch: Value,
    ) -> Result<(), BackendError>;
    async fn component_info(
        &self,
        circuit_id: &str,
        component_id: &str,
    ) -> Result<ComponentSpec, BackendError>;
    async fn define_model(
        &self,
        circuit_id: &str,
        name: &str,
        params: Value,
    ) -> Result<(), BackendError>;

    async fn import_netlist(&self, circuit_id: &str, netlist: &str) -> Result<(), BackendError>;
    async fn export_netlist(&self, circuit_id: &str) -> Result<String, BackendError>;
    async fn validate_circuit(&self, circuit_id: &str) -> Result<ValidationReport, BackendError>;

    async fn run_dc_sweep(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError>;
    async fn run_transient(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError>;
    async fn run_ac_analysis(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError>;
    async fn run_operating_point(
        &self,
        circuit_id: &str,
    ) -> Result<CachedAnalysisResult, BackendError>;
    async fn run_parameter_sweep(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError>;
    async fn run_temperature_sweep(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError>;

    async fn compute_impedance(
        &self,
        cached: &CachedAnalysisResult,
        params: Value,
    ) -> Result<Value, BackendError>;
    async fn measure(
        &self,
        cached: &CachedAnalysisResult,
        params: Value,
    ) -> Result<Value, BackendError>;
    async fn group_delay(
        &self,
        cached: &CachedAnalysisResult,
        params: Value,
    ) -> Result<Value, BackendError>;

    async fn render_schematic(&self, circuit_id: &str) -> Result<Vec<u8>, BackendError>;
    async fn render_plot(&self, cached: &CachedAnalysisResult) -> Result<Vec<u8>, BackendError>;

    async fn lookup_component(&self, query: &str) -> Result<Vec<Value>, BackendError>;
}

#[derive(Default)]
struct CircuitState {
    components: HashMap<String, ComponentSpec>,
    models: HashMap<String, Value>,
}

/// Deterministic in-memory stand-in for a real SPICE-style engine. Produces
/// plausible-shaped results (linear ramps, a 1x1 PNG placeholder) so that
/// dispatcher and cache-invalidation logic can be exercised without a real
/// simulation math library.
pub struct StubBackend {
    circuits: Mutex<HashMap<String, CircuitState>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
        }
    }

    const PLACEHOLDER_PNG_BASE64: &'static str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNk+A8AAQUBAScY42YAAAAASUVORK5CYII=";
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationBackend for StubBackend {
    async fn create_circuit(&self, circuit_id: &str) -> Result<(), BackendError> {
        let mut circuits = self.circuits.lock().expect("backend state poisoned");
        circuits.entry(circuit_id.to_string()).or_default();
        Ok(())
    }

    async fn list_circuits(&self) -> Vec<String> {
        let circuits = self.circuits.lock().expect("backend state poisoned");
        let mut ids: Vec<String> = circuits.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn delete_circuit(&self, circuit_id: &str) -> Result<(), BackendError> {
        let mut circuits = self.circuits.lock().expect("backend state poisoned");
        circuits
            .remove(circuit_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))
    }

    async fn add_component(
        &self,
        circuit_id: &str,
        component: ComponentSpec,
    ) -> Result<(), BackendError> {
        let mut circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .get_mut(circuit_id)
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))?;
        if component.nodes.len() < 2 {
            return Err(BackendError::InvalidTopology(format!(
                "component '{}' needs at least two nodes",
                component.id
            )));
        }
        circuit.components.insert(component.id.clone(), component);
        Ok(())
    }

    async fn modify_component(
        &self,
        circuit_id: &str,
        component_id: &str,
        patch: Value,
    ) -> Result<(), BackendError> {
        let mut circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .get_mut(circuit_id)
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))?;
        let component = circuit
            .components
            .get_mut(component_id)
            .ok_or_else(|| BackendError::ComponentNotFound(component_id.to_string()))?;
        if let Some(value) = patch.get("value").and_then(|v| v.as_f64()) {
            component.value = value;
        }
        Ok(())
    }

    async fn component_info(
        &self,
        circuit_id: &str,
        component_id: &str,
    ) -> Result<ComponentSpec, BackendError> {
        let circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .get(circuit_id)
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))?;
        circuit
            .components
            .get(component_id)
            .cloned()
            .ok_or_else(|| BackendError::ComponentNotFound(component_id.to_string()))
    }

    async fn define_model(
        &self,
        circuit_id: &str,
        name: &str,
        params: Value,
    ) -> Result<(), BackendError> {
        let mut circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .get_mut(circuit_id)
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))?;
        circuit.models.insert(name.to_string(), params);
        Ok(())
    }

    async fn import_netlist(&self, circuit_id: &str, netlist: &str) -> Result<(), BackendError> {
        let mut circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .entry(circuit_id.to_string())
            .or_default();
        circuit.components.clear();
        for (i, line) in netlist.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('*') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(BackendError::InvalidTopology(format!(
                    "line {}: expected 'name node+ node- value'",
                    i + 1
                )));
            }
            let value: f64 = parts[3]
                .parse()
                .map_err(|_| BackendError::InvalidTopology(format!("line {}: bad value", i + 1)))?;
            circuit.components.insert(
                parts[0].to_string(),
                ComponentSpec {
                    id: parts[0].to_string(),
                    kind: parts[0].chars().next().unwrap_or('?').to_string(),
                    nodes: vec![parts[1].to_string(), parts[2].to_string()],
                    value,
                },
            );
        }
        Ok(())
    }

    async fn export_netlist(&self, circuit_id: &str) -> Result<String, BackendError> {
        let circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .get(circuit_id)
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))?;
        let mut names: Vec<&String> = circuit.components.keys().collect();
        names.sort();
        let mut lines = Vec::new();
        for name in names {
            let c = &circuit.components[name];
            lines.push(format!(
                "{} {} {} {}",
                c.id,
                c.nodes.first().map(String::as_str).unwrap_or("0"),
                c.nodes.get(1).map(String::as_str).unwrap_or("0"),
                c.value
            ));
        }
        Ok(lines.join("\n"))
    }

    async fn validate_circuit(&self, circuit_id: &str) -> Result<ValidationReport, BackendError> {
        let circuits = self.circuits.lock().expect("backend state poisoned");
        let circuit = circuits
            .get(circuit_id)
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))?;
        let mut issues = Vec::new();
        if circuit.components.is_empty() {
            issues.push("circuit has no components".to_string());
        }
        Ok(ValidationReport {
            valid: issues.is_empty(),
            issues,
        })
    }

    async fn run_dc_sweep(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError> {
        self.require_circuit(circuit_id)?;
        let start = params.get("start").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let stop = params.get("stop").and_then(|v| v.as_f64()).unwrap_or(5.0);
        let step = params.get("step").and_then(|v| v.as_f64()).unwrap_or(1.0);
        let x_data = sweep(start, stop, step);
        let mut signals = HashMap::new();
        signals.insert("v(out)".to_string(), x_data.iter().map(|v| v * 0.5).collect());
        Ok(CachedAnalysisResult {
            analysis_type: AnalysisType::DcSweep,
            x_label: "V(sweep)".to_string(),
            signals,
            imaginary_signals: HashMap::new(),
            operating_point_data: HashMap::new(),
            x_data,
        })
    }

    async fn run_transient(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError> {
        self.require_circuit(circuit_id)?;
        let t_stop = params.get("t_stop").and_then(|v| v.as_f64()).unwrap_or(1e-3);
        let t_step = params.get("t_step").and_then(|v| v.as_f64()).unwrap_or(1e-5);
        let x_data = sweep(0.0, t_stop, t_step);
        let mut signals = HashMap::new();
        signals.insert(
            "v(out)".to_string(),
            x_data.iter().map(|t| (t * std::f64::consts::TAU).sin()).collect(),
        );
        Ok(CachedAnalysisResult {
            analysis_type: AnalysisType::Transient,
            x_label: "time".to_string(),
            signals,
            imaginary_signals: HashMap::new(),
            operating_point_data: HashMap::new(),
            x_data,
        })
    }

    async fn run_ac_analysis(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError> {
        self.require_circuit(circuit_id)?;
        let f_start = params.get("f_start").and_then(|v| v.as_f64()).unwrap_or(1.0);
        let f_stop = params.get("f_stop").and_then(|v| v.as_f64()).unwrap_or(1e6);
        let points = params.get("points").and_then(|v| v.as_u64()).unwrap_or(10).max(2);
        let x_data = log_sweep(f_start, f_stop, points as usize);
        let mut signals = HashMap::new();
        let mut imaginary_signals = HashMap::new();
        signals.insert("v(out)".to_string(), x_data.iter().map(|_| 1.0).collect());
        imaginary_signals.insert("v(out)".to_string(), x_data.iter().map(|_| 0.0).collect());
        Ok(CachedAnalysisResult {
            analysis_type: AnalysisType::Ac,
            x_label: "frequency".to_string(),
            signals,
            imaginary_signals,
            operating_point_data: HashMap::new(),
            x_data,
        })
    }

    async fn run_operating_point(
        &self,
        circuit_id: &str,
    ) -> Result<CachedAnalysisResult, BackendError> {
        let circuit_state = self.require_circuit(circuit_id)?;
        let mut operating_point_data = HashMap::new();
        for (name, c) in &circuit_state.components {
            operating_point_data.insert(format!("v({name})"), c.value);
        }
        Ok(CachedAnalysisResult {
            analysis_type: AnalysisType::OperatingPoint,
            x_label: String::new(),
            signals: HashMap::new(),
            imaginary_signals: HashMap::new(),
            operating_point_data,
            x_data: Vec::new(),
        })
    }

    async fn run_parameter_sweep(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError> {
        self.require_circuit(circuit_id)?;
        let start = params.get("start").and_then(|v| v.as_f64()).unwrap_or(0.0);
        let stop = params.get("stop").and_then(|v| v.as_f64()).unwrap_or(1.0);
        let step = params.get("step").and_then(|v| v.as_f64()).unwrap_or(0.1);
        let x_data = sweep(start, stop, step);
        let mut signals = HashMap::new();
        signals.insert("v(out)".to_string(), x_data.clone());
        Ok(CachedAnalysisResult {
            analysis_type: AnalysisType::ParameterSweep,
            x_label: params
                .get("parameter")
                .and_then(|v| v.as_str())
                .unwrap_or("parameter")
                .to_string(),
            signals,
            imaginary_signals: HashMap::new(),
            operating_point_data: HashMap::new(),
            x_data,
        })
    }

    async fn run_temperature_sweep(
        &self,
        circuit_id: &str,
        params: Value,
    ) -> Result<CachedAnalysisResult, BackendError> {
        self.require_circuit(circuit_id)?;
        let start = params.get("start_c").and_then(|v| v.as_f64()).unwrap_or(-40.0);
        let stop = params.get("stop_c").and_then(|v| v.as_f64()).unwrap_or(125.0);
        let step = params.get("step_c").and_then(|v| v.as_f64()).unwrap_or(5.0);
        let x_data = sweep(start, stop, step);
        let mut signals = HashMap::new();
        signals.insert("v(out)".to_string(), x_data.iter().map(|t| 1.0 + t * 0.001).collect());
        Ok(CachedAnalysisResult {
            analysis_type: AnalysisType::TemperatureSweep,
            x_label: "temperature_c".to_string(),
            signals,
            imaginary_signals: HashMap::new(),
            operating_point_data: HashMap::new(),
            x_data,
        })
    }

    async fn compute_impedance(
        &self,
        cached: &CachedAnalysisResult,
        _params: Value,
    ) -> Result<Value, BackendError> {
        if cached.analysis_type != AnalysisType::Ac {
            return Err(BackendError::Other(
                "impedance requires a cached 'ac' analysis".to_string(),
            ));
        }
        Ok(serde_json::json!({ "impedance_ohms": cached.x_data.iter().map(|_| 50.0).collect::<Vec<f64>>() }))
    }

    async fn measure(
        &self,
        cached: &CachedAnalysisResult,
        params: Value,
    ) -> Result<Value, BackendError> {
        let signal = params
            .get("signal")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BackendError::Other("missing 'signal' parameter".to_string()))?;
        let values = cached
            .signals
            .get(signal)
            .ok_or_else(|| BackendError::SignalNotFound(signal.to_string()))?;
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        Ok(serde_json::json!({ "min": min, "max": max, "peak_to_peak": max - min }))
    }

    async fn group_delay(
        &self,
        cached: &CachedAnalysisResult,
        _params: Value,
    ) -> Result<Value, BackendError> {
        if cached.analysis_type != AnalysisType::Ac {
            return Err(BackendError::Other(
                "group delay requires a cached 'ac' analysis".to_string(),
            ));
        }
        Ok(serde_json::json!({ "group_delay_s": cached.x_data.iter().map(|_| 0.0).collect::<Vec<f64>>() }))
    }

    async fn render_schematic(&self, circuit_id: &str) -> Result<Vec<u8>, BackendError> {
        self.require_circuit(circuit_id)?;
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(Self::PLACEHOLDER_PNG_BASE64)
            .map_err(|e| BackendError::Other(e.to_string()))
    }

    async fn render_plot(&self, _cached: &CachedAnalysisResult) -> Result<Vec<u8>, BackendError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(Self::PLACEHOLDER_PNG_BASE64)
            .map_err(|e| BackendError::Other(e.to_string()))
    }

    async fn lookup_component(&self, query: &str) -> Result<Vec<Value>, BackendError> {
        let catalog = [
            ("R", "generic resistor"),
            ("C", "generic capacitor"),
            ("L", "generic inductor"),
            ("D", "generic diode"),
        ];
        Ok(catalog
            .iter()
            .filter(|(kind, desc)| {
                query.is_empty()
                    || kind.eq_ignore_ascii_case(query)
                    || desc.contains(&query.to_lowercase())
            })
            .map(|(kind, desc)| serde_json::json!({ "kind": kind, "description": desc }))
            .collect())
    }
}

impl StubBackend {
    fn require_circuit(&self, circuit_id: &str) -> Result<CircuitStateSnapshot, BackendError> {
        let circuits = self.circuits.lock().expect("backend state poisoned");
        circuits
            .get(circuit_id)
            .map(|c| CircuitStateSnapshot {
                components: c.components.clone(),
            })
            .ok_or_else(|| BackendError::CircuitNotFound(circuit_id.to_string()))
    }
}

struct CircuitStateSnapshot {
    components: HashMap<String, ComponentSpec>,
}

fn sweep(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || start > stop {
        return vec![start];
    }
    let mut out = Vec::new();
    let mut x = start;
    while x <= stop + f64::EPSILON {
        out.push(x);
        x += step;
    }
    out
}

fn log_sweep(start: f64, stop: f64, points: usize) -> Vec<f64> {
    if start <= 0.0 || stop <= start || points < 2 {
        return vec![start.max(f64::MIN_POSITIVE)];
    }
    let log_start = start.log10();
    let log_stop = stop.log10();
    (0..points)
        .map(|i| {
            let t = i as f64 / (points - 1) as f64;
            10f64.powf(log_start + t * (log_stop - log_start))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str) -> ComponentSpec {
        ComponentSpec {
            id: id.to_string(),
            kind: "R".to_string(),
            nodes: vec!["n1".to_string(), "0".to_string()],
            value: 1000.0,
        }
    }

    #[tokio::test]
    async fn create_then_list_then_delete_round_trips() {
        let backend = StubBackend::new();
        backend.create_circuit("c1").await.unwrap();
        assert!(backend.list_circuits().await.contains(&"c1".to_string()));
        backend.delete_circuit("c1").await.unwrap();
        assert!(!backend.list_circuits().await.contains(&"c1".to_string()));
    }

    #[tokio::test]
    async fn add_component_rejects_single_node() {
        let backend = StubBackend::new();
        backend.create_circuit("c1").await.unwrap();
        let bad = ComponentSpec {
            id: "r1".to_string(),
            kind: "R".to_string(),
            nodes: vec!["n1".to_string()],
            value: 1.0,
        };
        let err = backend.add_component("c1", bad).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidTopology(_)));
    }

    #[tokio::test]
    async fn export_after_import_is_stable_up_to_ordering() {
        let backend = StubBackend::new();
        backend.create_circuit("c1").await.unwrap();
        backend
            .import_netlist("c1", "R1 n1 0 1000\nR2 n2 0 2000\n")
            .await
            .unwrap();
        let exported = backend.export_netlist("c1").await.unwrap();
        assert!(exported.contains("R1 n1 0 1000"));
        assert!(exported.contains("R2 n2 0 2000"));
    }

    #[tokio::test]
    async fn operating_point_populates_only_operating_point_data() {
        let backend = StubBackend::new();
        backend.create_circuit("c1").await.unwrap();
        backend.add_component("c1", component("r1")).await.unwrap();
        let result = backend.run_operating_point("c1").await.unwrap();
        assert!(result.x_data.is_empty());
        assert!(!result.operating_point_data.is_empty());
        result.validate().unwrap();
    }

    #[tokio::test]
    async fn ac_analysis_populates_matching_length_imaginary_signals() {
        let backend = StubBackend::new();
        backend.create_circuit("c1").await.unwrap();
        let result = backend
            .run_ac_analysis("c1", serde_json::json!({"points": 5}))
            .await
            .unwrap();
        result.validate().unwrap();
        assert_eq!(result.signals["v(out)"].len(), result.imaginary_signals["v(out)"].len());
    }

    #[tokio::test]
    async fn unknown_circuit_is_circuit_not_found() {
        let backend = StubBackend::new();
        let err = backend.run_transient("missing", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, BackendError::CircuitNotFound(_)));
    }
}
