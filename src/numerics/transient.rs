use num_dual::DualNum;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScheme {
    Bdf1,
    Bdf2,
}

/// Step sizes and scheme of the time step being solved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeStep {
    pub dt: f64,
    /// Size of the previous step; only read by BDF2.
    pub dt_last: f64,
    pub scheme: TimeScheme,
    /// Set on the first step after a restart, when no second history point exists.
    pub bdf2_lower_order: bool,
}

impl TimeStep {
    pub fn bdf1(dt: f64) -> Self {
        Self {
            dt,
            dt_last: dt,
            scheme: TimeScheme::Bdf1,
            bdf2_lower_order: false,
        }
    }

    pub fn bdf2(dt: f64, dt_last: f64) -> Self {
        Self {
            dt,
            dt_last,
            scheme: TimeScheme::Bdf2,
            bdf2_lower_order: false,
        }
    }

    pub fn with_lower_order(mut self, lower: bool) -> Self {
        self.bdf2_lower_order = lower;
        self
    }

    pub fn second_order(&self) -> bool {
        self.scheme == TimeScheme::Bdf2 && !self.bdf2_lower_order
    }

    pub fn weights(&self) -> BdfWeights {
        if self.second_order() {
            let r = self.dt_last / (self.dt_last + self.dt);
            BdfWeights {
                current: (2.0 - r) / (1.0 - r),
                previous: -1.0 / (r * (1.0 - r)),
                last: (1.0 - r) / r,
                span: self.dt_last + self.dt,
            }
        } else {
            BdfWeights {
                current: 1.0,
                previous: -1.0,
                last: 0.0,
                span: self.dt,
            }
        }
    }
}

/// Backward-difference stencil: `dx/dt ~ (current x + previous x_prev + last x_last) / span`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BdfWeights {
    pub current: f64,
    pub previous: f64,
    pub last: f64,
    pub span: f64,
}

impl BdfWeights {
    pub fn rate<T: DualNum<f64>>(&self, now: T, previous: f64, last: f64) -> T {
        (now * self.current + (previous * self.previous + last * self.last)) / self.span
    }

    /// Derivative of [`BdfWeights::rate`] with respect to the current value.
    pub fn slope(&self) -> f64 {
        self.current / self.span
    }
}

/// Time discretisation context handed to every assembly call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TimeContext {
    #[default]
    Steady,
    Transient(TimeStep),
}

impl TimeContext {
    pub fn step(&self) -> Option<&TimeStep> {
        match self {
            TimeContext::Steady => None,
            TimeContext::Transient(step) => Some(step),
        }
    }
}
