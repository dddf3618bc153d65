use std::{hint::black_box, sync::Arc};

use criterion::{Criterion, criterion_group, criterion_main};
use hermes_insertion::{
    problem::{
        capacity::Capacity,
        fleet::Fleet,
        job::JobIdx,
        location::Location,
        service::ServiceBuilder,
        travel_cost_matrix::TravelMatrices,
        vehicle::VehicleBuilder,
        vehicle_profile::VehicleProfile,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::recreate::{
        insertion_params::{InsertionParams, Threads},
        regret_insertion::RegretInsertion,
    },
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

fn random_problem(num_services: usize, num_vehicles: usize, seed: u64) -> VehicleRoutingProblem {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut locations = vec![Location::from_cartesian(50.0, 50.0)];
    locations.extend((0..num_services).map(|_| {
        Location::from_cartesian(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
    }));

    let services = (0..num_services)
        .map(|index| {
            let mut builder = ServiceBuilder::default();
            builder
                .set_external_id(format!("s{index}"))
                .set_location_id(index + 1)
                .set_demand(Capacity::from_vec(vec![1.0]));
            builder.build().unwrap()
        })
        .collect();

    let vehicles = (0..num_vehicles)
        .map(|index| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_vehicle_id(format!("v{index}"))
                .set_depot_location_id(0)
                .set_capacity(Capacity::from_vec(vec![
                    (num_services / num_vehicles + 1) as f64,
                ]));
            builder.build().unwrap()
        })
        .collect();

    let mut builder = VehicleRoutingProblemBuilder::default();
    builder
        .add_vehicle_profile(VehicleProfile::new(
            "car".to_owned(),
            TravelMatrices::from_euclidean(&locations),
        ))
        .set_locations(locations)
        .set_services(services)
        .set_fleet(Fleet::Finite(vehicles));
    builder.build().unwrap()
}

fn regret_insertion_benchmark(c: &mut Criterion) {
    let problem = Arc::new(random_problem(100, 10, 1));
    let jobs: Vec<JobIdx> = JobIdx::range(problem.num_jobs()).collect();

    for (name, threads) in [("single", Threads::Single), ("auto", Threads::Auto)] {
        let params = InsertionParams {
            threads,
            ..InsertionParams::default()
        };
        let mut engine =
            RegretInsertion::new(Arc::clone(&problem), params, SmallRng::seed_from_u64(7)).unwrap();

        c.bench_function(&format!("regret insertion 100 services ({name})"), |b| {
            b.iter(|| {
                let mut routes = Vec::new();
                engine
                    .insert_jobs(&mut routes, black_box(jobs.clone()))
                    .unwrap();
                routes
            })
        });
    }
}

criterion_group!(benches, regret_insertion_benchmark);
criterion_main!(benches);
