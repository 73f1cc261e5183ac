
use approx::assert_abs_diff_eq;
use fourier_lib::models::bs::bs_price;
use fourier_lib::{
    price_direct, price_fft, price_option, price_strikes, BatesParams, CgmyParams, FftConfig,
    FftPricer, FftTransform, HestonParams, IntegrationConfig, KouParams, MertonParams, Model,
    NigParams, OptionInputs, OptionType, PricingError, Quadrature, VarianceGammaParams,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_utils::{init_tracing, load_reference_data, REFERENCE_DATA};

/// FFT prices reproduce closed-form Black-Scholes-Merton on the documented grid
#[test]
fn test_fft_matches_reference_fixture() {
    init_tracing();
    let cases = load_reference_data(REFERENCE_DATA).expect("Failed to load reference data");
    assert!(!cases.is_empty(), "No reference cases loaded");

    let pricer = FftPricer::new(&FftConfig::new(1.25, 7, 10)).unwrap();
    for case in &cases {
        let phi = Model::bsm(case.vol)
            .characteristic_function_for(&case.inputs)
            .unwrap();
        let priced = pricer.price(&phi, &case.inputs).unwrap();
        assert_abs_diff_eq!(priced.price, case.price, epsilon = 1e-6);
        let closed = Model::bsm(case.vol).closed_form_price(&case.inputs).unwrap();
        assert_abs_diff_eq!(closed, case.price, epsilon = 1e-9);
    }
}

#[test]
fn test_concrete_scenario_price() {
    let inputs = OptionInputs::call(100.0, 100.0, 0.05, 1.0, 0.02).unwrap();
    let priced = price_option(&Model::bsm(0.2), &inputs, &FftConfig::new(1.25, 7, 10)).unwrap();
    assert_abs_diff_eq!(priced.price, 9.227005508154036, epsilon = 1e-6);
}

#[test]
fn test_relative_error_on_wider_truncation() {
    let config = FftConfig::new(1.25, 8, 10);
    for strike in [80.0, 100.0, 125.0] {
        let inputs = OptionInputs::call(100.0, strike, 0.05, 1.0, 0.02).unwrap();
        let fft = price_option(&Model::bsm(0.2), &inputs, &config).unwrap().price;
        let exact = bs_price(OptionType::Call, 100.0, strike, 0.05, 0.02, 1.0, 0.2);
        assert!(
            ((fft - exact) / exact).abs() < 1e-3,
            "strike {strike}: fft={fft} exact={exact}"
        );
    }
}

#[test]
fn test_trapezoidal_weights_agree_with_simpson() {
    let inputs = OptionInputs::put(100.0, 95.0, 0.02, 0.5, 0.0).unwrap();
    let model = Model::bsm(0.3);
    let simpson = price_option(&model, &inputs, &FftConfig::default()).unwrap().price;
    let trapezoid = price_option(
        &model,
        &inputs,
        &FftConfig::default().with_quadrature(Quadrature::Trapezoidal),
    )
    .unwrap()
    .price;
    assert_abs_diff_eq!(simpson, trapezoid, epsilon = 1e-6);
}

/// Seeded sweep over strikes and maturities
#[test]
fn test_put_call_parity_sweep() {
    let mut rng = StdRng::seed_from_u64(7);
    let pricer = FftPricer::new(&FftConfig::default()).unwrap();
    for _ in 0..40 {
        let strike = rng.gen_range(60.0..160.0);
        let maturity = rng.gen_range(0.05..3.0);
        let rate = rng.gen_range(-0.01..0.08);
        let dividend = rng.gen_range(0.0..0.05);
        let vol = rng.gen_range(0.05..0.8);

        let call = OptionInputs::call(100.0, strike, rate, maturity, dividend).unwrap();
        let put = call.with_option_type(OptionType::Put);
        let phi = Model::bsm(vol).characteristic_function_for(&call).unwrap();
        let c = pricer.price(&phi, &call).unwrap().price;
        let p = pricer.price(&phi, &put).unwrap().price;
        assert_abs_diff_eq!(c - p, call.parity_gap(), epsilon = 1e-6);
    }
}

#[test]
fn test_price_is_monotone_in_volatility() {
    let pricer = FftPricer::new(&FftConfig::default()).unwrap();
    for option_type in [OptionType::Call, OptionType::Put] {
        let inputs = OptionInputs::new(100.0, 108.0, 0.03, 0.75, 0.01, option_type).unwrap();
        let mut last = f64::NEG_INFINITY;
        for step in 0..40 {
            let vol = 0.05 + 0.025 * step as f64;
            let phi = Model::bsm(vol).characteristic_function_for(&inputs).unwrap();
            let price = pricer.price(&phi, &inputs).unwrap().price;
            assert!(price >= last - 1e-10, "{option_type} vol={vol}: {price} < {last}");
            last = price;
        }
    }
}

#[test]
fn test_short_maturity_converges_to_intrinsic() {
    for (option_type, strike, intrinsic) in [
        (OptionType::Call, 90.0, 10.0),
        (OptionType::Call, 110.0, 0.0),
        (OptionType::Put, 110.0, 10.0),
        (OptionType::Put, 90.0, 0.0),
    ] {
        let inputs = OptionInputs::new(100.0, strike, 0.05, 1e-9, 0.0, option_type).unwrap();
        let priced = price_option(&Model::bsm(0.2), &inputs, &FftConfig::default()).unwrap();
        assert_abs_diff_eq!(priced.price, intrinsic, epsilon = 1e-6);
    }
}

#[test]
fn test_strike_outside_window_reports_bounds() {
    // b = pi * 2^10 / 2^7 ~ 25.1 in log-strike
    let inputs = OptionInputs::put(100.0, 1e-10, 0.05, 1.0, 0.0).unwrap();
    match price_option(&Model::bsm(0.2), &inputs, &FftConfig::default()) {
        Err(PricingError::StrikeOutOfRange { strike, lower, upper }) => {
            assert_eq!(strike, 1e-10);
            assert!(lower > strike && upper > 100.0);
        }
        other => panic!("expected StrikeOutOfRange, got {other:?}"),
    }
}

#[test]
fn test_singular_dampening_is_rejected() {
    let inputs = OptionInputs::call(100.0, 100.0, 0.05, 1.0, 0.0).unwrap();
    let phi = Model::bsm(0.2).characteristic_function_for(&inputs).unwrap();
    for alpha in [0.0, -1.0] {
        let err = price_fft(&phi, &inputs, &FftConfig::new(alpha, 7, 10)).unwrap_err();
        assert!(matches!(err, PricingError::InvalidDampening { .. }), "alpha={alpha}");
    }
}

#[test]
fn test_strip_pricing_from_one_pass() {
    let inputs = OptionInputs::put(100.0, 100.0, 0.04, 0.5, 0.01).unwrap();
    let strikes = [115.0, 85.0, 100.0, 92.5];
    let priced = price_strikes(&Model::bsm(0.25), &inputs, &strikes, &FftConfig::new(1.25, 8, 12))
        .unwrap();
    let returned: Vec<f64> = priced.iter().map(|(k, _)| *k).collect();
    assert_eq!(returned, vec![85.0, 92.5, 100.0, 115.0]);
    for (strike, price) in priced {
        let exact = bs_price(OptionType::Put, 100.0, strike, 0.04, 0.01, 0.5, 0.25);
        assert_abs_diff_eq!(price, exact, epsilon = 1e-3);
    }
}

fn non_bsm_models() -> Vec<Model> {
    let heston = HestonParams {
        v0: 0.04,
        kappa: 2.0,
        theta: 0.05,
        sigma_v: 0.5,
        rho: -0.7,
    };
    vec![
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

/// The FFT and direct inversion routes are independent; they must agree for every model
#[test]
fn test_fft_agrees_with_direct_integration() {
    let pricer = FftPricer::new(&FftConfig::default()).unwrap();
    let integration = IntegrationConfig::default();
    for model in non_bsm_models() {
        for strike in [90.0, 100.0, 115.0] {
            let inputs = OptionInputs::call(100.0, strike, 0.05, 0.75, 0.02).unwrap();
            let phi = model.characteristic_function_for(&inputs).unwrap();
            let fft = pricer.price(&phi, &inputs).unwrap().price;
            let direct = price_direct(&phi, &inputs, &integration).unwrap().price;
            assert_abs_diff_eq!(fft, direct, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_closure_characteristic_function() {
    let inputs = OptionInputs::call(100.0, 105.0, 0.05, 1.0, 0.0).unwrap();
    let (ln_s, r, t, vol) = (100f64.ln(), 0.05, 1.0, 0.2);
    let phi = move |u: num_complex::Complex64| {
        let i = num_complex::Complex64::new(0.0, 1.0);
        (i * u * (ln_s + (r - 0.5 * vol * vol) * t) - 0.5 * vol * vol * t * u * u).exp()
    };
    let priced = price_fft(&phi, &inputs, &FftConfig::default()).unwrap();
    let exact = bs_price(OptionType::Call, 100.0, 105.0, 0.05, 0.0, 1.0, 0.2);
    assert_abs_diff_eq!(priced.price, exact, epsilon = 1e-6);
}

/// Prices just past the intrinsic cutoff must stay continuous with the closed form
#[test]
fn test_short_maturities_have_no_price_cliff() {
    let config = FftConfig::default();
    for maturity in [1e-7, 1e-6, 1e-5, 1e-4, 1e-3] {
        for (option_type, strike) in [
            (OptionType::Call, 95.0),
            (OptionType::Call, 100.0),
            (OptionType::Put, 100.0),
            (OptionType::Put, 105.0),
        ] {
            let inputs = OptionInputs::new(100.0, strike, 0.05, maturity, 0.0, option_type).unwrap();
            let priced = price_option(&Model::bsm(0.2), &inputs, &config).unwrap().price;
            let exact = bs_price(option_type, 100.0, strike, 0.05, 0.0, maturity, 0.2);
            assert_abs_diff_eq!(priced, exact, epsilon = 1e-8);
        }
    }
}

/// Without the control variate a short-dated pass cannot be resolved by the grid
#[test]
fn test_truncation_error_is_reported() {
    let config = FftConfig::default().with_control_variate(false);
    let inputs = OptionInputs::call(100.0, 100.0, 0.05, 1e-4, 0.0).unwrap();
    match price_option(&Model::bsm(0.2), &inputs, &config) {
        Err(PricingError::TruncationExceeded { estimate, tolerance }) => {
            assert!(estimate > tolerance, "{estimate} <= {tolerance}");
        }
        other => panic!("expected TruncationExceeded, got {other:?}"),
    }

    let otm = price_option(&Model::bsm(0.2), &inputs.with_strike(110.0), &config);
    assert!(matches!(otm, Err(PricingError::TruncationExceeded { .. })));
}

fn heavy_tailed_models() -> Vec<Model> {
    vec![
        Model::VarianceGamma(VarianceGammaParams {
            sigma: 0.9,
            theta: -0.3,
            nu: 0.8,
        }),
        Model::Kou(KouParams {
            sigma: 0.15,
            lambda: 1.0,
            p_up: 0.4,
            eta_up: 2.0,
            eta_down: 5.0,
        }),
    ]
}

/// alpha = 1.25 needs E[S_T^2.25]; these models do not have it
#[test]
fn test_missing_moment_rejects_dampening() {
    let inputs = OptionInputs::call(100.0, 100.0, 0.03, 1.0, 0.0).unwrap();
    for model in heavy_tailed_models() {
        match price_option(&model, &inputs, &FftConfig::default()) {
            Err(PricingError::InvalidDampening { alpha, reason }) => {
                assert_eq!(alpha, 1.25);
                assert!(reason.contains("moment"), "{reason}");
            }
            other => panic!("{}: expected InvalidDampening, got {other:?}", model.name()),
        }
    }
}

/// A smaller alpha inside the moment range prices them, and the price does not depend on it
#[test]
fn test_lower_dampening_prices_heavy_tails() {
    let inputs = OptionInputs::call(100.0, 100.0, 0.03, 1.0, 0.0).unwrap();
    let (lower, upper) = inputs.price_bounds();
    for model in heavy_tailed_models() {
        let at = |alpha: f64| {
            price_option(&model, &inputs, &FftConfig::new(alpha, 7, 12))
                .unwrap()
                .price
        };
        let (low, high) = (at(0.3), at(0.5));
        assert!(low > lower && low < upper, "{}: {low}", model.name());
        assert_abs_diff_eq!(low, high, epsilon = 1e-6);
    }
}

/// The time-value transform agrees with the dampened call transform away from the money
#[test]
fn test_time_value_transform_agrees_with_damped_call() {
    let damped = FftPricer::new(&FftConfig::default()).unwrap();
    let time_value =
        FftPricer::new(&FftConfig::default().with_transform(FftTransform::TimeValue)).unwrap();
    for model in non_bsm_models() {
        for (option_type, strike) in [(OptionType::Call, 85.0), (OptionType::Put, 120.0)] {
            let inputs = OptionInputs::new(100.0, strike, 0.05, 0.75, 0.02, option_type).unwrap();
            let phi = model.characteristic_function_for(&inputs).unwrap();
            let a = damped.price(&phi, &inputs).unwrap().price;
            let b = time_value.price(&phi, &inputs).unwrap().price;
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }
}
