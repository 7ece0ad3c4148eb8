use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Latest reference quote for a symbol, as reported by a price provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change_24h_pct: f64,
    pub volume_24h: f64,
}

impl MarketSnapshot {
    /// Volatility proxy derived from the 24h change, capped at 1.0.
    pub fn volatility(&self) -> f64 {
        (self.change_24h_pct.abs() * 0.05).min(1.0)
    }
}

/// Tuning constants of the random walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorParams {
    /// Std-dev of the per-tick delta per unit of volatility.
    pub noise_scale: f64,
    /// Share of prior momentum added into the raw delta.
    pub momentum_carry: f64,
    /// Hard symmetric clamp on the per-tick relative move.
    pub max_step: f64,
    /// EMA weight of the new delta in the momentum update.
    pub momentum_weight: f64,
    pub volume_sensitivity: f64,
    pub volume_jitter_min: f64,
    pub volume_jitter_max: f64,
}

impl Default for SimulatorParams {
    fn default() -> Self {
        Self {
            noise_scale: 0.001,
            momentum_carry: 0.4,
            max_step: 0.003,
            momentum_weight: 0.7,
            volume_sensitivity: 50.0,
            volume_jitter_min: 0.000_01,
            volume_jitter_max: 0.000_1,
        }
    }
}

/// Per-symbol simulator state. `base_price`, `volatility` and `base_volume`
/// come from the provider; `momentum` is carried between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    pub base_price: f64,
    pub volatility: f64,
    pub base_volume: f64,
    pub momentum: f64,
}

impl SimState {
    pub fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        Self {
            base_price: snapshot.price,
            volatility: snapshot.volatility(),
            base_volume: snapshot.volume_24h,
            momentum: 0.0,
        }
    }

    /// Take the new reference quote while keeping momentum.
    pub fn refresh(&mut self, snapshot: &MarketSnapshot) {
        self.base_price = snapshot.price;
        self.volatility = snapshot.volatility();
        self.base_volume = snapshot.volume_24h;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimStep {
    pub price: f64,
    pub volume: f64,
    pub momentum: f64,
    /// Relative move actually applied, after clamping.
    pub delta: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TickSimulator {
    params: SimulatorParams,
}

impl TickSimulator {
    pub fn new(params: SimulatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SimulatorParams {
        &self.params
    }

    /// Produce the next synthetic price and volume. Returns `None` only when
    /// the base price is not a positive number.
    pub fn step<R: Rng + ?Sized>(&self, state: &SimState, rng: &mut R) -> Option<SimStep> {
        if !(state.base_price.is_finite() && state.base_price > 0.0) {
            return None;
        }
        let p = &self.params;

        let std_dev = state.volatility * p.noise_scale;
        let noise = match Normal::new(0.0, std_dev) {
            Ok(dist) if std_dev > 0.0 => dist.sample(rng),
            _ => 0.0,
        };

        let mut delta = noise + state.momentum * p.momentum_carry;
        delta = delta.clamp(-p.max_step, p.max_step);

        let price = state.base_price * (1.0 + delta);
        let momentum = delta * p.momentum_weight + state.momentum * (1.0 - p.momentum_weight);

        let jitter = if p.volume_jitter_max > p.volume_jitter_min {
            rng.gen_range(p.volume_jitter_min..p.volume_jitter_max)
        } else {
            p.volume_jitter_min
        };
        let base_volume = state.base_volume.max(0.0);
        let volume = base_volume * (1.0 + delta.abs() * p.volume_sensitivity) * jitter;

        Some(SimStep {
            price,
            volume,
            momentum,
            delta,
        })
    }
}
