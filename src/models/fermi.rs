//! Fermi-Dirac integral of order one half.
//!
//! Uses the closed-form approximation of Aymerich-Humet et al. (refined by
//! Bednarczyk), normalised so that `F(eta) -> exp(eta)` in the non-degenerate
//! limit. Maximum relative error is below 0.5 % over the whole real line.

use std::f64::consts::FRAC_PI_2;

use num_dual::DualNum;

pub fn fermi_half<T: DualNum<f64>>(eta: &T) -> T {
    let shifted = eta.clone() - 2.13;
    // |eta - 2.13|^2.4 through the square; the floor keeps the dual powf finite at the kink.
    let a = (shifted.clone() * shifted + 1e-30).powf(1.2) + 9.6;
    let b = eta.clone() + 2.13 + a.powf(5.0 / 12.0);
    let xi = b.powf(-1.5) * (3.0 * FRAC_PI_2.sqrt());
    if eta.re() < 0.0 {
        // exp(-eta) overflows far below the band edge.
        let e = eta.exp();
        e.clone() / (e * xi + 1.0)
    } else {
        ((-eta.clone()).exp() + xi).recip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::dual::SlotLayout;
    use approx::assert_relative_eq;

    #[test]
    fn non_degenerate_limit_is_boltzmann() {
        for eta in [-30.0, -20.0, -12.0] {
            assert_relative_eq!(fermi_half(&eta), f64::exp(eta), max_relative = 1e-4);
        }
    }

    #[test]
    fn matches_tabulated_value_at_zero() {
        // 2/sqrt(pi) * F_{1/2}(0)
        assert_relative_eq!(fermi_half(&0.0), 0.765_147_6, max_relative = 5e-3);
    }

    #[test]
    fn monotone_increasing() {
        let mut previous = fermi_half(&-40.0);
        let mut eta = -40.0;
        while eta < 40.0 {
            eta += 0.25;
            let value = fermi_half(&eta);
            assert!(value > previous, "not increasing at eta = {eta}");
            previous = value;
        }
    }

    #[test]
    fn deep_non_degenerate_derivative_stays_finite() {
        let layout = SlotLayout::with_width(1);
        for eta in [-700.0, -720.0, -800.0] {
            let value = fermi_half(&layout.seed(eta, 0));
            let slope = layout.gradient(&value)[0];
            assert!(value.re.is_finite() && value.re >= 0.0, "value at eta = {eta}");
            assert!(slope.is_finite() && slope >= 0.0, "derivative at eta = {eta}");
        }
    }

    #[test]
    fn branches_agree_at_zero() {
        assert_relative_eq!(fermi_half(&-1e-12), fermi_half(&1e-12), max_relative = 1e-10);
    }

    #[test]
    fn dual_derivative_matches_finite_difference() {
        let layout = SlotLayout::with_width(1);
        for eta in [-8.0, -1.0, 0.5, 2.0, 6.0, 25.0] {
            let dual = layout.gradient(&fermi_half(&layout.seed(eta, 0)))[0];
            let h = 1e-6 * f64::max(1.0, f64::abs(eta));
            let fd = (fermi_half(&(eta + h)) - fermi_half(&(eta - h))) / (2.0 * h);
            assert_relative_eq!(dual, fd, max_relative = 1e-6);
        }
    }
}
