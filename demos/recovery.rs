use mineral_recovery::identify::{identify, Mineralogy, MINERALS};
use mineral_recovery::input::{InputSet, ParticleSize, CYANIDE, LIME};
use mineral_recovery::recovery::RecoveryAggregator;
use mineral_recovery::PhysicalConstants;

fn main() {
    let mineralogy: Mineralogy = MINERALS
        .iter()
        .map(|mineral| match *mineral {
            "Iron" => (*mineral, 46.5),
            "Sulphur" => (*mineral, 53.0),
            _ => (*mineral, 0.0),
        })
        .collect();

    let identification = match identify(&mineralogy) {
        Ok(identification) => identification,
        Err(error) => {
            eprintln!("cannot identify the ore: {}", error);
            return;
        }
    };

    println!("ore type: {}", identification.ore_type);
    println!("reason: {}", identification.reason);

    if !identification.ore_type.is_known() {
        println!("unknown ore, skipping the simulation");
        return;
    }

    let inputs = InputSet::new()
        .with_gold_head_grade(2.0)
        .with_throughput(100.0)
        .with_reagent(CYANIDE, 0.5)
        .with_reagent(LIME, 1.2)
        .with_particle_size(ParticleSize::P80)
        .with_particle_diameter(2.0);

    let aggregator = RecoveryAggregator::new(PhysicalConstants::default());

    match aggregator.run(&inputs) {
        Ok(report) => {
            println!();
            print!("{}", report);
        }
        Err(error) => eprintln!("cannot compute the recovery: {}", error),
    }
}
