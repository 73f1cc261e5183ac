//! Characteristic functions of `ln(S_T)` for the supported models.
//!
//! All are risk-neutral: `phi(0) = 1` and `phi(-i) = S exp((r - q) T)`.

mod diffusion;
mod jumps;
mod levy;

pub use diffusion::{BlackScholesCharFn, HestonCharFn};
pub use jumps::{BatesCharFn, KouCharFn, MertonCharFn};
pub use levy::{CgmyCharFn, NigCharFn, VarianceGammaCharFn};

use num_complex::Complex64;

use super::traits::CharacteristicFunction;

/// Characteristic function built by [`crate::model_params::Model`].
#[derive(Debug, Clone, Copy)]
pub enum ModelCharFn {
    Bsm(BlackScholesCharFn),
    Heston(HestonCharFn),
    Merton(MertonCharFn),
    Kou(KouCharFn),
    Bates(BatesCharFn),
    VarianceGamma(VarianceGammaCharFn),
    Nig(NigCharFn),
    Cgmy(CgmyCharFn),
}

impl CharacteristicFunction for ModelCharFn {
    fn cf(&self, u: Complex64) -> Complex64 {
        match self {
            ModelCharFn::Bsm(f) => f.cf(u),
            ModelCharFn::Heston(f) => f.cf(u),
            ModelCharFn::Merton(f) => f.cf(u),
            ModelCharFn::Kou(f) => f.cf(u),
            ModelCharFn::Bates(f) => f.cf(u),
            ModelCharFn::VarianceGamma(f) => f.cf(u),
            ModelCharFn::Nig(f) => f.cf(u),
            ModelCharFn::Cgmy(f) => f.cf(u),
        }
    }

    fn moment_exists(&self, order: f64) -> bool {
        match self {
            ModelCharFn::Bsm(f) => f.moment_exists(order),
            ModelCharFn::Heston(f) => f.moment_exists(order),
            ModelCharFn::Merton(f) => f.moment_exists(order),
            ModelCharFn::Kou(f) => f.moment_exists(order),
            ModelCharFn::Bates(f) => f.moment_exists(order),
            ModelCharFn::VarianceGamma(f) => f.moment_exists(order),
            ModelCharFn::Nig(f) => f.moment_exists(order),
            ModelCharFn::Cgmy(f) => f.moment_exists(order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_params::*;
    use crate::models::traits::is_finite_moment;
    use approx::assert_relative_eq;

    const S: f64 = 100.0;
    const R: f64 = 0.05;
    const Q: f64 = 0.02;
    const T: f64 = 0.75;

    fn all_models() -> Vec<Model> {
        let heston = HestonParams {
            v0: 0.04,
            kappa: 2.0,
            theta: 0.05,
            sigma_v: 0.5,
            rho: -0.7,
        };
        vec![
            Model::bsm(0.2),
            Model::Heston(heston),
            Model::Merton(MertonParams {
                sigma: 0.15,
                lambda: 0.5,
                mu_j: -0.1,
                sigma_j: 0.2,
            }),
            Model::Kou(KouParams {
                sigma: 0.15,
                lambda: 1.0,
                p_up: 0.4,
                eta_up: 10.0,
                eta_down: 5.0,
            }),
            Model::Bates(BatesParams {
                heston,
                lambda: 0.3,
                mu_j: -0.05,
                sigma_j: 0.1,
            }),
            Model::VarianceGamma(VarianceGammaParams {
                sigma: 0.2,
                theta: -0.14,
                nu: 0.2,
            }),
            Model::Nig(NigParams {
                alpha: 15.0,
                beta: -5.0,
                delta: 0.5,
            }),
            Model::Cgmy(CgmyParams {
                c: 1.0,
                g: 5.0,
                m: 5.0,
                y: 0.5,
            }),
        ]
    }

    #[test]
    fn every_model_is_a_martingale() {
        let forward = S * ((R - Q) * T).exp();
        for model in all_models() {
            let phi = model.characteristic_function(S, R, T, Q).unwrap();
            let at_zero = phi.cf(Complex64::new(0.0, 0.0));
            let at_minus_i = phi.cf(Complex64::new(0.0, -1.0));
            assert_relative_eq!(at_zero.re, 1.0, max_relative = 1e-12);
            assert!(at_zero.im.abs() < 1e-12, "{}", model.name());
            assert_relative_eq!(at_minus_i.re, forward, max_relative = 1e-9);
            assert!(at_minus_i.im.abs() < 1e-9 * forward, "{}", model.name());
        }
    }

    #[test]
    fn modulus_is_bounded_on_real_axis() {
        for model in all_models() {
            let phi = model.characteristic_function(S, R, T, Q).unwrap();
            for u in [0.5, 1.0, 5.0, 25.0, 100.0] {
                let v = phi.cf(Complex64::new(u, 0.0));
                assert!(v.norm() <= 1.0 + 1e-12, "{} at u={u}: {}", model.name(), v.norm());
            }
        }
    }

    #[test]
    fn bates_without_jumps_is_heston() {
        let heston = HestonParams {
            v0: 0.03,
            kappa: 1.2,
            theta: 0.04,
            sigma_v: 0.3,
            rho: -0.5,
        };
        let h = Model::Heston(heston).characteristic_function(S, R, T, Q).unwrap();
        let b = Model::Bates(BatesParams {
            heston,
            lambda: 0.0,
            mu_j: 0.0,
            sigma_j: 0.0,
        })
        .characteristic_function(S, R, T, Q)
        .unwrap();
        let u = Complex64::new(3.0, -1.25);
        assert_relative_eq!(h.cf(u).re, b.cf(u).re, max_relative = 1e-12);
        assert_relative_eq!(h.cf(u).im, b.cf(u).im, max_relative = 1e-12);
    }

    #[test]
    fn dampening_moment_exists_for_reference_models() {
        for model in all_models() {
            let phi = model.characteristic_function(S, R, T, Q).unwrap();
            assert!(phi.moment_exists(2.25), "{}", model.name());
            assert!(phi.moment_exists(-0.25), "{}", model.name());
        }
    }

    #[test]
    fn heavy_tails_lose_high_moments() {
        let vg = Model::VarianceGamma(VarianceGammaParams {
            sigma: 0.9,
            theta: -0.3,
            nu: 0.8,
        });
        let kou = Model::Kou(KouParams {
            sigma: 0.15,
            lambda: 1.0,
            p_up: 0.4,
            eta_up: 2.0,
            eta_down: 5.0,
        });
        let nig = Model::Nig(NigParams {
            alpha: 3.0,
            beta: 1.0,
            delta: 0.5,
        });
        let cgmy = Model::Cgmy(CgmyParams {
            c: 1.0,
            g: 5.0,
            m: 2.0,
            y: 0.5,
        });
        for model in [vg, kou, nig, cgmy] {
            let phi = model.characteristic_function(S, R, 1.0, 0.0).unwrap();
            assert!(phi.moment_exists(1.5), "{}", model.name());
            assert!(!phi.moment_exists(2.25), "{}", model.name());
        }

        // phi stays finite and real past the Kou boundary
        let phi = kou.characteristic_function(S, R, 1.0, 0.0).unwrap();
        let raw = phi.cf(Complex64::new(0.0, -2.25));
        assert!(raw.re.is_finite() && raw.re > 0.0 && raw.im.abs() < 1e-12 * raw.re);
    }

    #[test]
    fn heston_moments_explode_after_critical_time() {
        let params = HestonParams {
            v0: 0.04,
            kappa: 0.5,
            theta: 0.05,
            sigma_v: 1.5,
            rho: 0.9,
        };
        let short = HestonCharFn::new(S, R, 0.0, 0.5, params);
        let long = HestonCharFn::new(S, R, 0.0, 1.0, params);
        assert_relative_eq!(short.moment_explosion_time(2.25), 0.79274, max_relative = 1e-4);
        assert!(short.moment_exists(2.25));
        assert!(!long.moment_exists(2.25));
        assert!(!is_finite_moment(long.cf(Complex64::new(0.0, -2.25))));
        assert_eq!(long.moment_explosion_time(0.5), f64::INFINITY);

        let oscillating = HestonParams {
            kappa: 1.0,
            sigma_v: 1.0,
            rho: 0.0,
            ..params
        };
        let before = HestonCharFn::new(S, R, 0.0, 2.0, oscillating);
        let after = HestonCharFn::new(S, R, 0.0, 5.0, oscillating);
        assert_relative_eq!(before.moment_explosion_time(2.25), 3.28259, max_relative = 1e-4);
        assert!(before.moment_exists(2.25));
        assert!(!after.moment_exists(2.25));

        let damped = HestonCharFn::new(
            S,
            R,
            Q,
            5.0,
            HestonParams {
                kappa: 2.0,
                sigma_v: 0.5,
                rho: -0.7,
                ..params
            },
        );
        assert_eq!(damped.moment_explosion_time(2.25), f64::INFINITY);
    }

    #[test]
    fn closures_read_moments_off_phi() {
        let bsm = BlackScholesCharFn::new(S, R, Q, T, 0.2);
        let closure = move |u: Complex64| bsm.cf(u);
        assert!(closure.moment_exists(2.25));
        let broken = |_: Complex64| Complex64::new(f64::NAN, 0.0);
        assert!(!broken.moment_exists(2.25));
    }

    #[test]
    fn closures_are_providers() {
        let bsm = BlackScholesCharFn::new(S, R, Q, T, 0.2);
        let closure = move |u: Complex64| bsm.cf(u);
        let u = Complex64::new(1.0, -2.25);
        assert_eq!(closure.cf(u), bsm.cf(u));
    }
}
