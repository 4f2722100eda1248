use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use malaria_abm::movement::move_agents;
use malaria_abm::parameters::Parameters;
use malaria_abm::setup::build_world;
use malaria_abm::transmission::{resolve_bites, HourlyContacts};
use malaria_abm::{simulation, Context, ContextParametersExt, ContextRandomExt};
use rand::rngs::SmallRng;
use rand::SeedableRng;

static SEED: u64 = 123;

fn bench_parameters() -> Parameters {
    Parameters {
        num_humans: 2000,
        num_mosquitoes: 2000,
        mosquito_floor: 1000,
        days: 10,
        ..Parameters::default()
    }
}

fn ten_days() -> Context {
    let mut context = Context::new();
    context.init_random(SEED);
    context
        .set_params(bench_parameters())
        .expect("benchmark parameters are valid");
    simulation::init(&mut context).expect("failed to build the world");
    context.execute();
    context
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("ten days", |bencher| bencher.iter_with_large_drop(ten_days));

    let parameters = Parameters::default();
    let world = build_world(&parameters, &mut SmallRng::seed_from_u64(SEED))
        .expect("failed to build the world");

    c.bench_function("one hour of movement and bites", |bencher| {
        let mut rng = SmallRng::seed_from_u64(SEED);
        bencher.iter_batched(
            || world.clone(),
            |mut world| {
                move_agents(&mut world, &parameters, 20, &mut rng).expect("movement failed");
                let contacts = HourlyContacts::build(&world);
                resolve_bites(&mut world, contacts, &parameters, 0, &mut rng)
                    .expect("transmission failed");
                world
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(simulation_benches, criterion_benchmark);
criterion_main!(simulation_benches);
