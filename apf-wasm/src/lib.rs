use wasm_bindgen::prelude::*;
use apf_core::{SimConfig, Simulation};

#[wasm_bindgen]
pub struct Solver {
    inner: Simulation,
}

#[wasm_bindgen]
impl Solver {
    #[wasm_bindgen(constructor)]
    pub fn new(n: usize) -> Result<Solver, JsValue> {
        let inner = Simulation::new(SimConfig::square(n)).map_err(to_js)?;
        Ok(Solver { inner })
    }

    pub fn get_dt(&self) -> f64 { self.inner.params().dt }
    pub fn get_alpha(&self) -> f64 { self.inner.params().alpha }
    pub fn time(&self) -> f64 { self.inner.time() }
    pub fn niter(&self) -> f64 { self.inner.niter() as f64 }
    pub fn n(&self) -> usize { self.inner.shape().cols }

    pub fn reset(&mut self) -> Result<(), JsValue> { self.inner.reset().map_err(to_js) }
    pub fn excite(&mut self, row: usize, col: usize, value: f64) {
        self.inner.excite(row, col, value);
    }

    // Copy-based JS access, interior only, row-major
    pub fn get_field(&self) -> Result<Vec<f64>, JsValue> {
        let field = self.inner.excitation().map_err(to_js)?;
        Ok(field.interior_rows().flatten().copied().collect())
    }

    // Step + timing (WASM-only)
    pub fn advance(&mut self, steps: u32) -> StepInfo {
        let t0 = now_ms();
        for _ in 0..steps {
            self.inner.step();
        }
        let t1 = now_ms();
        StepInfo { steps, compute_ms: t1 - t0, t: self.inner.time() }
    }

    /// Step until simulated time reaches `t`. Non-finite targets are rejected.
    pub fn advance_to(&mut self, t: f64) -> Result<StepInfo, JsValue> {
        let t0 = now_ms();
        let taken = self.inner.advance_to(t).map_err(to_js)?;
        let t1 = now_ms();
        let steps = u32::try_from(taken).unwrap_or(u32::MAX);
        Ok(StepInfo { steps, compute_ms: t1 - t0, t: self.inner.time() })
    }

    pub fn stats(&self) -> Result<Stats, JsValue> {
        let d = self.inner.diagnostics().map_err(to_js)?;
        Ok(Stats { max: d.max, l2norm: d.l2norm })
    }
}

#[wasm_bindgen]
pub struct StepInfo {
    steps: u32,
    compute_ms: f64,
    t: f64,
}

#[wasm_bindgen]
impl StepInfo {
    pub fn steps(&self) -> u32 { self.steps }
    pub fn compute_ms(&self) -> f64 { self.compute_ms }
    pub fn t(&self) -> f64 { self.t }
}

#[wasm_bindgen]
pub struct Stats {
    max: f64,
    l2norm: f64,
}

#[wasm_bindgen]
impl Stats {
    pub fn max(&self) -> f64 { self.max }
    pub fn l2norm(&self) -> f64 { self.l2norm }
}

fn to_js(e: apf_core::ApfError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
