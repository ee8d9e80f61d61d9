use crate::error::PolyEstimatorError;
use crate::factorial::{factorial, falling_factorial, rising_factorial_inverse};

/// One measurement of an unknown polynomial `P`. Each variant knows how to
/// contribute exactly one row to the linear system that recovers `P`'s
/// coefficients (see [`Observation::row`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// `P(x) = y`.
    Direct { x: f64, y: f64 },
    /// `P^(order)(x) = y`.
    Derivative { x: f64, y: f64, order: usize },
    /// `I(x) = y`, where `I` is the `order`-th indefinite integral of `P`
    /// whose integration constants (lowest-order first) are `constants`.
    Integral {
        x: f64,
        y: f64,
        order: usize,
        constants: Option<Vec<f64>>,
    },
    /// `∫_{start_x}^{end_x} ... order-fold ... P = y`.
    IntegralInterval {
        start_x: f64,
        end_x: f64,
        y: f64,
        order: usize,
        constants: Option<Vec<f64>>,
    },
}

fn require_finite(label: &str, value: f64) -> Result<(), PolyEstimatorError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PolyEstimatorError::InvalidConfiguration(format!(
            "{label} must be finite, got {value}"
        )))
    }
}

fn require_order(order: usize) -> Result<(), PolyEstimatorError> {
    if order >= 1 {
        Ok(())
    } else {
        Err(PolyEstimatorError::InvalidConfiguration(
            "order must be >= 1".into(),
        ))
    }
}

fn require_constants_len(order: usize, constants: &Option<Vec<f64>>) -> Result<(), PolyEstimatorError> {
    if let Some(c) = constants {
        if c.len() != order {
            return Err(PolyEstimatorError::InvalidConfiguration(format!(
                "constants length ({}) must equal order ({})",
                c.len(),
                order
            )));
        }
    }
    Ok(())
}

/// `Σ_{i=0}^{order-1} (constants[i] / (order-1-i)!) * x^(order-1-i)`, the
/// known-constant correction subtracted into the observation's RHS. Zero when
/// `constants` is absent.
fn constants_contribution(x: f64, order: usize, constants: &Option<Vec<f64>>) -> f64 {
    match constants {
        None => 0.0,
        Some(c) => c
            .iter()
            .enumerate()
            .map(|(i, &ci)| {
                let power = order - 1 - i;
                (ci / factorial(power)) * x.powi(power as i32)
            })
            .sum(),
    }
}

impl Observation {
    pub fn direct(x: f64, y: f64) -> Result<Self, PolyEstimatorError> {
        require_finite("x", x)?;
        require_finite("y", y)?;
        Ok(Observation::Direct { x, y })
    }

    pub fn derivative(x: f64, y: f64, order: usize) -> Result<Self, PolyEstimatorError> {
        require_finite("x", x)?;
        require_finite("y", y)?;
        require_order(order)?;
        Ok(Observation::Derivative { x, y, order })
    }

    pub fn integral(
        x: f64,
        y: f64,
        order: usize,
        constants: Option<Vec<f64>>,
    ) -> Result<Self, PolyEstimatorError> {
        require_finite("x", x)?;
        require_finite("y", y)?;
        require_order(order)?;
        require_constants_len(order, &constants)?;
        Ok(Observation::Integral {
            x,
            y,
            order,
            constants,
        })
    }

    pub fn integral_interval(
        start_x: f64,
        end_x: f64,
        y: f64,
        order: usize,
        constants: Option<Vec<f64>>,
    ) -> Result<Self, PolyEstimatorError> {
        require_finite("start_x", start_x)?;
        require_finite("end_x", end_x)?;
        require_finite("y", y)?;
        require_order(order)?;
        require_constants_len(order, &constants)?;
        Ok(Observation::IntegralInterval {
            start_x,
            end_x,
            y,
            order,
            constants,
        })
    }

    pub fn order(&self) -> Option<usize> {
        match self {
            Observation::Direct { .. } => None,
            Observation::Derivative { order, .. }
            | Observation::Integral { order, .. }
            | Observation::IntegralInterval { order, .. } => Some(*order),
        }
    }

    /// Changes this observation's `order`. Fails (leaving the observation
    /// unchanged) when `order == 0` or this variant has no order field.
    pub fn set_order(&mut self, new_order: usize) -> Result<(), PolyEstimatorError> {
        require_order(new_order)?;
        match self {
            Observation::Direct { .. } => Err(PolyEstimatorError::InvalidConfiguration(
                "Direct observations have no order".into(),
            )),
            Observation::Derivative { order, .. } => {
                *order = new_order;
                Ok(())
            }
            Observation::Integral {
                order, constants, ..
            }
            | Observation::IntegralInterval {
                order, constants, ..
            } => {
                require_constants_len(new_order, constants)?;
                *order = new_order;
                Ok(())
            }
        }
    }

    /// Sets the full integration-constants array. Named in the plural
    /// (`set_constants`) since it replaces the whole array, not a single
    /// constant.
    pub fn set_constants(&mut self, new_constants: Option<Vec<f64>>) -> Result<(), PolyEstimatorError> {
        match self {
            Observation::Direct { .. } | Observation::Derivative { .. } => {
                Err(PolyEstimatorError::InvalidConfiguration(
                    "this variant has no integration constants".into(),
                ))
            }
            Observation::Integral {
                order, constants, ..
            }
            | Observation::IntegralInterval {
                order, constants, ..
            } => {
                require_constants_len(*order, &new_constants)?;
                *constants = new_constants;
                Ok(())
            }
        }
    }

    /// Emits this observation's contribution to the linear system for a
    /// polynomial of declared degree `d`: a row of `d + 1` coefficients and
    /// the corresponding right-hand-side scalar. Pure function of `self` and
    /// `d` — no mutation, no I/O.
    pub fn row(&self, d: usize) -> (Vec<f64>, f64) {
        match self {
            Observation::Direct { x, y } => {
                let row = (0..=d).map(|j| x.powi(j as i32)).collect();
                (row, *y)
            }
            Observation::Derivative { x, y, order } => {
                let row = (0..=d)
                    .map(|j| falling_factorial(j, *order) * x.powi((j.saturating_sub(*order)) as i32))
                    .collect();
                (row, *y)
            }
            Observation::Integral {
                x,
                y,
                order,
                constants,
            } => {
                let row = (0..=d)
                    .map(|j| rising_factorial_inverse(j, *order) * x.powi((j + order) as i32))
                    .collect();
                let rhs = y - constants_contribution(*x, *order, constants);
                (row, rhs)
            }
            Observation::IntegralInterval {
                start_x,
                end_x,
                y,
                order,
                constants,
            } => {
                let row = (0..=d)
                    .map(|j| {
                        rising_factorial_inverse(j, *order)
                            * (end_x.powi((j + order) as i32) - start_x.powi((j + order) as i32))
                    })
                    .collect();
                let correction = constants_contribution(*end_x, *order, constants)
                    - constants_contribution(*start_x, *order, constants);
                let rhs = y - correction;
                (row, rhs)
            }
        }
    }
}
