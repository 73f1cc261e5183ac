use fourier_lib::{
    default_configs, implied_volatility, price_option, ImpliedVolSolver, IvCache, MarketQuote, Model,
    OptionInputs, PricingError,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Fourier-lib Implied Volatility Demo\n");

    // 1. Round trip: price at 20% and solve it back
    let mut config = default_configs::fast();
    config.solver.seed_vol = 0.3;
    let inputs = OptionInputs::call(100.0, 100.0, 0.05, 1.0, 0.02)?;
    let price = price_option(&Model::bsm(0.2), &inputs, &config.fft)?.price;
    let solution = implied_volatility(&inputs.with_observed_price(price), &config)?;
    println!("1. Round trip from price {price:.6}:");
    println!(
        "   vol={:.6} converged={} iterations={} route={:?}\n",
        solution.volatility, solution.converged, solution.iterations, solution.route
    );

    // 2. A put smile solved in parallel, then again through a cache
    println!("2. Batch solve of a put smile:");
    let solver = ImpliedVolSolver::new(default_configs::production())?;
    let quotes: Vec<_> = [(80.0, 0.32), (90.0, 0.27), (100.0, 0.23), (110.0, 0.21)]
        .iter()
        .map(|&(strike, vol)| -> Result<MarketQuote, PricingError> {
            let put = OptionInputs::put(100.0, strike, 0.03, 0.5, 0.0)?;
            let price = price_option(&Model::bsm(vol), &put, &solver.config().fft)?.price;
            Ok(put.with_observed_price(price))
        })
        .collect::<Result<_, PricingError>>()?;
    for (quote, result) in quotes.iter().zip(solver.solve_batch(&quotes, &Model::bsm(0.25))) {
        let solution = result?;
        println!("   K={:>5.1} vol={:.6}", quote.inputs.strike, solution.volatility);
    }

    let mut cache = IvCache::new();
    for quote in quotes.iter().chain(quotes.iter()) {
        solver.solve(quote, &Model::bsm(0.25), Some(&mut cache))?;
    }
    let (hits, misses) = cache.stats();
    println!("   cache: {hits} hits, {misses} misses\n");

    // 3. Failure: a zero premium for an in-the-money call
    println!("3. Arbitrage check:");
    let bad = OptionInputs::call(120.0, 100.0, 0.05, 1.0, 0.0)?.with_observed_price(0.0);
    match implied_volatility(&bad, &config) {
        Err(e) => println!("   rejected: {e}"),
        Ok(s) => println!("   unexpected solution {s:?}"),
    }

    Ok(())
}
