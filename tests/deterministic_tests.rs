use polynomial_estimation::{DeterministicEstimator, Observation, PolyEstimatorError, PolynomialEstimatorType};

#[test]
fn test_s1_direct_fit_exact() {
    let estimator = DeterministicEstimator::new(1).unwrap();
    estimator
        .set_evaluations(vec![
            Observation::direct(0.0, 2.0).unwrap(),
            Observation::direct(1.0, 5.0).unwrap(),
        ])
        .unwrap();

    let polynomial = estimator.estimate().unwrap();
    assert!((polynomial.coefficients()[0] - 2.0).abs() < 1e-12);
    assert!((polynomial.coefficients()[1] - 3.0).abs() < 1e-12);
}

#[test]
fn test_s2_lmse_with_four_direct_samples() {
    let estimator = DeterministicEstimator::new(1).unwrap();
    estimator
        .set_evaluations(vec![
            Observation::direct(-1.0, 2.0).unwrap(),
            Observation::direct(0.0, 1.0).unwrap(),
            Observation::direct(1.0, 0.0).unwrap(),
            Observation::direct(2.0, -1.0).unwrap(),
        ])
        .unwrap();

    let polynomial = estimator.estimate().unwrap();
    assert!((polynomial.coefficients()[0] - 1.0).abs() < 1e-12);
    assert!((polynomial.coefficients()[1] - (-1.0)).abs() < 1e-12);
}

#[test]
fn test_s3_direct_plus_derivative() {
    let estimator = DeterministicEstimator::new(2).unwrap();
    estimator
        .set_evaluations(vec![
            Observation::direct(0.0, 1.0).unwrap(),
            Observation::direct(1.0, 6.0).unwrap(),
            Observation::derivative(0.0, 2.0, 1).unwrap(),
        ])
        .unwrap();

    let polynomial = estimator.estimate().unwrap();
    assert!((polynomial.coefficients()[0] - 1.0).abs() < 1e-10);
    assert!((polynomial.coefficients()[1] - 2.0).abs() < 1e-10);
    assert!((polynomial.coefficients()[2] - 3.0).abs() < 1e-10);
}

#[test]
fn test_s4_indefinite_integral_at_non_degenerate_points() {
    let estimator = DeterministicEstimator::new(1).unwrap();
    estimator
        .set_evaluations(vec![
            Observation::integral(1.0, 13.5, 1, Some(vec![7.0])).unwrap(),
            Observation::integral(2.0, 25.0, 1, Some(vec![7.0])).unwrap(),
        ])
        .unwrap();

    let polynomial = estimator.estimate().unwrap();
    assert!((polynomial.coefficients()[0] - 4.0).abs() < 1e-10);
    assert!((polynomial.coefficients()[1] - 5.0).abs() < 1e-10);
}

#[test]
fn test_s4_degenerate_integral_row_at_x_zero_is_documented_not_a_panic() {
    // Every Integral row vanishes at x=0 for any order >= 1, since each term
    // carries a factor x^(j+order). Two such rows give a singular system.
    let row = Observation::integral(0.0, 7.0, 1, Some(vec![7.0]))
        .unwrap()
        .row(1);
    assert_eq!(row.0, vec![0.0, 0.0]);
}

#[test]
fn test_s5_interval_integral() {
    let estimator = DeterministicEstimator::new(1).unwrap();
    estimator
        .set_evaluations(vec![
            Observation::integral_interval(0.0, 2.0, 2.0, 1, None).unwrap(),
            Observation::integral_interval(1.0, 3.0, 4.0, 1, None).unwrap(),
        ])
        .unwrap();

    let polynomial = estimator.estimate().unwrap();
    assert!((polynomial.coefficients()[0] - 0.0).abs() < 1e-10);
    assert!((polynomial.coefficients()[1] - 1.0).abs() < 1e-10);
}

#[test]
fn test_all_degrees_one_through_five_recover_exactly() {
    for d in 1..=5usize {
        let generator: Vec<f64> = (0..=d).map(|i| (i as f64) + 1.0).collect();
        let observations: Vec<Observation> = (0..=d)
            .map(|i| {
                let x = i as f64;
                let y = generator
                    .iter()
                    .enumerate()
                    .map(|(p, &c)| c * x.powi(p as i32))
                    .sum();
                Observation::direct(x, y).unwrap()
            })
            .collect();

        let estimator = DeterministicEstimator::new(d).unwrap();
        estimator.set_evaluations(observations).unwrap();
        let polynomial = estimator.estimate().unwrap();

        for (recovered, expected) in polynomial.coefficients().iter().zip(generator.iter()) {
            assert!((recovered - expected).abs() < 1e-8, "degree {d}");
        }
    }
}

#[test]
fn test_min_number_of_evaluations_equals_degree_plus_one() {
    for d in 1..=5usize {
        let estimator = DeterministicEstimator::new(d).unwrap();
        assert_eq!(estimator.min_number_of_evaluations(), d + 1);
    }
}

#[test]
fn test_get_type_returns_constructed_variant() {
    let estimator = DeterministicEstimator::new(1).unwrap();
    assert_eq!(estimator.get_type(), PolynomialEstimatorType::Lmse);
}

struct SetDegreeDuringEstimate;

impl polynomial_estimation::EstimatorListener<DeterministicEstimator> for SetDegreeDuringEstimate {
    fn on_estimate_start(&mut self, estimator: &DeterministicEstimator) {
        let err = estimator.set_degree(2).unwrap_err();
        assert!(matches!(err, PolyEstimatorError::Locked));
    }
}

#[test]
fn test_setter_called_from_listener_fails_with_locked() {
    // The listener is handed `&DeterministicEstimator`; every setter takes
    // `&self` too, so the callback can actually attempt one. It must observe
    // the estimator locked and get rejected, not silently no-op.
    let estimator = DeterministicEstimator::new(1).unwrap();
    estimator
        .set_evaluations(vec![
            Observation::direct(0.0, 2.0).unwrap(),
            Observation::direct(1.0, 5.0).unwrap(),
        ])
        .unwrap();
    estimator
        .set_listener(Some(Box::new(SetDegreeDuringEstimate)))
        .unwrap();

    assert!(estimator.estimate().is_ok());
    assert_eq!(estimator.get_degree(), 1, "rejected setter must not take effect");
    assert!(!estimator.is_locked());
}

#[test]
fn test_not_ready_when_too_few_observations() {
    let estimator = DeterministicEstimator::new(2).unwrap();
    estimator
        .set_evaluations(vec![Observation::direct(0.0, 1.0).unwrap()])
        .unwrap();
    let err = estimator.estimate().unwrap_err();
    assert!(matches!(err, PolyEstimatorError::NotReady(_)));
}
