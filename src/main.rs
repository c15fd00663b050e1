use hen_pinch::{
    HenSynthesisBuilder, InMemorySource, MinUtilityProblem, ProblemData, Stream, Utility,
};
use rust_decimal::dec;

fn main() {
    let source = InMemorySource::new().with_problem(
        "four_stream",
        ProblemData {
            streams: vec![
                Stream::new(dec!(150), dec!(60), dec!(2)).expect("valid stream"),
                Stream::new(dec!(90), dec!(60), dec!(4)).expect("valid stream"),
                Stream::new(dec!(20), dec!(125), dec!(1.5)).expect("valid stream"),
                Stream::new(dec!(25), dec!(100), dec!(3)).expect("valid stream"),
            ],
            hot_utility: Utility::new(dec!(180), dec!(179)).expect("valid utility"),
            cold_utility: Utility::new(dec!(20), dec!(30)).expect("valid utility"),
            dt_min: dec!(10),
        },
    );

    let result = MinUtilityProblem::from_source(&source, "four_stream")
        .and_then(|problem| Ok(HenSynthesisBuilder::default().problem(problem).build()?))
        .and_then(|synthesis| synthesis.compute());

    match result {
        Err(e) => {
            eprintln!("Synthesis failed: {e}");
            std::process::exit(1);
        }
        Ok(report) => {
            println!("Minimum hot utility:  {}", report.hot_utility);
            println!("Minimum cold utility: {}", report.cold_utility);
            println!("Pinch temperatures (shifted): {:?}", report.pinch_temperatures);
            println!("Matches ({}):", report.match_count);
            for (hot, cold) in &report.matches {
                println!("  {hot} <-> {cold}");
            }
            println!("Heat flows:");
            for flow in &report.heat_flows {
                println!(
                    "  {} [{}] -> {} [{}]: {}",
                    flow.hot, flow.hot_interval, flow.cold, flow.cold_interval, flow.heat
                );
            }
            println!(
                "Solver: {} ({} nodes)",
                report.solver_status, report.nodes_explored
            );
        }
    }
}
