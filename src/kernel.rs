//! The distance-dependent transmission kernel.
//!
//! A normal individual transmits with probability `w0 · (1 − r/r0)²` inside `r0`. The two
//! superspreader hypotheses differ in how they exceed that:
//!
//! * **Strong Infectiousness**: same radius `r0`, flat probability `w0` over the whole disk.
//! * **Hub**: same peak `w0`, quadratic decay over the larger radius `rs`.
//!
//! Integrated over the plane the flat disk carries six times the transmission potential of the
//! quadratic one, and the Hub kernel carries `(rs/r0)²` times it.

use std::f64::consts::PI;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::parameters::Parameters;

/// Which superspreader hypothesis is active for a trial.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    StrongInfectiousness,
    Hub,
}

impl Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelVariant::StrongInfectiousness => write!(f, "strong_infectiousness"),
            ModelVariant::Hub => write!(f, "hub"),
        }
    }
}

impl FromStr for ModelVariant {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strong" | "strong_infectiousness" => Ok(ModelVariant::StrongInfectiousness),
            "hub" => Ok(ModelVariant::Hub),
            _ => Err(SimulationError::InvalidParameter(format!(
                "unknown model variant `{s}`, expected `strong` or `hub`"
            ))),
        }
    }
}

/// An individual's transmission role, fixed at creation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Normal,
    Superspreader,
}

impl Role {
    #[must_use]
    pub fn is_superspreader(self) -> bool {
        self == Role::Superspreader
    }
}

impl From<bool> for Role {
    fn from(is_superspreader: bool) -> Self {
        if is_superspreader {
            Role::Superspreader
        } else {
            Role::Normal
        }
    }
}

/// The transmission kernel for one model variant. Stateless apart from its constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernel {
    r0: f64,
    rs: f64,
    w0: f64,
    variant: ModelVariant,
}

/// Keeps `p` inside `[0, w0]`. Never panics, even for an out-of-range `w0`.
fn bounded(p: f64, w0: f64) -> f64 {
    p.min(w0).max(0.0)
}

/// `w0 · (1 − r/radius)²` on `[0, radius]`, zero beyond.
fn quadratic_decay(w0: f64, radius: f64, r: f64) -> f64 {
    if r > radius {
        return 0.0;
    }
    let x = 1.0 - r / radius;
    bounded(w0 * x * x, w0)
}

impl Kernel {
    #[must_use]
    pub fn new(parameters: &Parameters, variant: ModelVariant) -> Self {
        Kernel {
            r0: parameters.r0,
            rs: parameters.rs,
            w0: parameters.w0,
            variant,
        }
    }

    #[must_use]
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Probability that an infectious individual with `role` transmits to a susceptible at
    /// distance `r` during one step. Exactly zero beyond the role's contact radius, and for a
    /// negative or NaN distance.
    #[must_use]
    pub fn probability(&self, r: f64, role: Role) -> f64 {
        if r.is_nan() || r < 0.0 {
            return 0.0;
        }
        match (role, self.variant) {
            (Role::Normal, _) => quadratic_decay(self.w0, self.r0, r),
            (Role::Superspreader, ModelVariant::StrongInfectiousness) => {
                if r <= self.r0 {
                    bounded(self.w0, self.w0)
                } else {
                    0.0
                }
            }
            (Role::Superspreader, ModelVariant::Hub) => quadratic_decay(self.w0, self.rs, r),
        }
    }

    /// The distance beyond which `role` never transmits.
    #[must_use]
    pub fn contact_radius(&self, role: Role) -> f64 {
        match (role, self.variant) {
            (Role::Superspreader, ModelVariant::Hub) => self.rs,
            _ => self.r0,
        }
    }

    /// The largest contact radius any individual can have under this variant. Used as the
    /// spatial grid's cell size.
    #[must_use]
    pub fn max_contact_radius(&self) -> f64 {
        self.contact_radius(Role::Superspreader)
            .max(self.contact_radius(Role::Normal))
    }

    /// Closed form of `∫ w(|x|) dA` over the plane.
    #[must_use]
    pub fn spatial_integral(&self, role: Role) -> f64 {
        let radius = self.contact_radius(role);
        match (role, self.variant) {
            (Role::Superspreader, ModelVariant::StrongInfectiousness) => {
                PI * self.w0 * radius * radius
            }
            _ => PI * self.w0 * radius * radius / 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::parameters::{ParametersBuilder, DEFAULT_RS};

    fn kernel(variant: ModelVariant) -> Kernel {
        Kernel::new(&Parameters::default(), variant)
    }

    /// Midpoint rule for `∫ 2πr w(r) dr`.
    fn integrate_numerically(kernel: &Kernel, role: Role) -> f64 {
        let radius = kernel.contact_radius(role);
        let steps = 200_000;
        let dr = radius / f64::from(steps);
        (0..steps)
            .map(|i| {
                let r = (f64::from(i) + 0.5) * dr;
                2.0 * PI * r * kernel.probability(r, role) * dr
            })
            .sum()
    }

    #[test]
    fn normal_kernel_endpoints() {
        for variant in [ModelVariant::StrongInfectiousness, ModelVariant::Hub] {
            let kernel = kernel(variant);
            assert_relative_eq!(kernel.probability(0.0, Role::Normal), 1.0);
            assert_abs_diff_eq!(kernel.probability(1.0, Role::Normal), 0.0);
            assert_abs_diff_eq!(kernel.probability(1.0001, Role::Normal), 0.0);
            assert_abs_diff_eq!(kernel.probability(50.0, Role::Normal), 0.0);
            assert_relative_eq!(kernel.probability(0.5, Role::Normal), 0.25);
        }
    }

    #[test]
    fn strong_superspreader_is_flat() {
        let kernel = kernel(ModelVariant::StrongInfectiousness);
        for r in [0.0, 0.25, 0.5, 0.999, 1.0] {
            assert_relative_eq!(kernel.probability(r, Role::Superspreader), 1.0);
        }
        assert_abs_diff_eq!(kernel.probability(1.0 + 1e-9, Role::Superspreader), 0.0);
    }

    #[test]
    fn hub_superspreader_reaches_further() {
        let kernel = kernel(ModelVariant::Hub);
        let rs = kernel.contact_radius(Role::Superspreader);
        assert_abs_diff_eq!(kernel.probability(rs, Role::Superspreader), 0.0);
        for fraction in [0.0, 0.1, 0.5, 0.9, 0.999] {
            assert!(kernel.probability(fraction * rs, Role::Superspreader) > 0.0);
        }
        assert!(kernel.probability(1.5, Role::Superspreader) > 0.0);
        assert_abs_diff_eq!(kernel.probability(1.5, Role::Normal), 0.0);
    }

    #[test]
    fn kernel_is_bounded_and_non_increasing() {
        let parameters = ParametersBuilder::default().w0(0.7).build().unwrap();
        for variant in [ModelVariant::StrongInfectiousness, ModelVariant::Hub] {
            let kernel = Kernel::new(&parameters, variant);
            for role in [Role::Normal, Role::Superspreader] {
                let mut previous = f64::INFINITY;
                for i in 0..=300 {
                    let r = f64::from(i) * 0.01;
                    let w = kernel.probability(r, role);
                    assert!((0.0..=0.7).contains(&w));
                    assert!(w <= previous);
                    previous = w;
                }
            }
        }
    }

    #[test]
    fn degenerate_distances_never_transmit() {
        for variant in [ModelVariant::StrongInfectiousness, ModelVariant::Hub] {
            let kernel = kernel(variant);
            for role in [Role::Normal, Role::Superspreader] {
                for r in [f64::NAN, -0.5, f64::NEG_INFINITY, f64::INFINITY] {
                    assert_abs_diff_eq!(kernel.probability(r, role), 0.0);
                }
            }
        }
    }

    #[test]
    fn unvalidated_peak_probability_does_not_panic() {
        let parameters = Parameters {
            w0: -0.5,
            ..Parameters::default()
        };
        for variant in [ModelVariant::StrongInfectiousness, ModelVariant::Hub] {
            let kernel = Kernel::new(&parameters, variant);
            for role in [Role::Normal, Role::Superspreader] {
                for r in [0.0, 0.5, 2.0] {
                    assert_abs_diff_eq!(kernel.probability(r, role), 0.0);
                }
            }
        }
    }

    #[test]
    fn strong_integral_ratio_is_six() {
        let kernel = kernel(ModelVariant::StrongInfectiousness);
        let normal = integrate_numerically(&kernel, Role::Normal);
        let superspreader = integrate_numerically(&kernel, Role::Superspreader);
        assert_relative_eq!(superspreader / normal, 6.0, max_relative = 1e-4);
        assert_relative_eq!(normal, kernel.spatial_integral(Role::Normal), max_relative = 1e-4);
    }

    #[test]
    fn hub_integral_scales_with_radius_squared() {
        let parameters = ParametersBuilder::default().rs(2.0).build().unwrap();
        let kernel = Kernel::new(&parameters, ModelVariant::Hub);
        let normal = integrate_numerically(&kernel, Role::Normal);
        let superspreader = integrate_numerically(&kernel, Role::Superspreader);
        assert_relative_eq!(superspreader / normal, 4.0, max_relative = 1e-4);
        assert_relative_eq!(
            superspreader,
            kernel.spatial_integral(Role::Superspreader),
            max_relative = 1e-4
        );
    }

    #[test]
    fn contact_radii() {
        let strong = kernel(ModelVariant::StrongInfectiousness);
        assert_relative_eq!(strong.max_contact_radius(), 1.0);
        let hub = kernel(ModelVariant::Hub);
        assert_relative_eq!(hub.contact_radius(Role::Normal), 1.0);
        assert_relative_eq!(hub.max_contact_radius(), DEFAULT_RS);
    }

    #[test]
    fn parses_variants() {
        assert_eq!(
            "strong".parse::<ModelVariant>().unwrap(),
            ModelVariant::StrongInfectiousness
        );
        assert_eq!("hub".parse::<ModelVariant>().unwrap(), ModelVariant::Hub);
        assert!("mobile".parse::<ModelVariant>().is_err());
        assert_eq!(ModelVariant::Hub.to_string(), "hub");
    }
}
