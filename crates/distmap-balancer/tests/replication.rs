//! Replicated balancing tests.
//!
//! Every rank of a job builds its own `Balancer` and computes the map from
//! the same weights. These tests simulate a job in-process and check that
//! all ranks agree, that the cache behaves the same on every rank, and that
//! the knapsack never does worse than its greedy seed.

use distmap_balancer::{
    Balancer, BalancerConfig, DistributionMap, KnapsackOptions, Strategy, knapsack, round_robin,
};

/// Deterministic pseudo-random weights (LCG), so every "rank" sees the same input.
fn weights(n: usize, seed: u64) -> Vec<u64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) % 1000 + 1
        })
        .collect()
}

fn job(nprocs: usize) -> Vec<Balancer> {
    (0..nprocs).map(Balancer::new).collect()
}

/// Maps are equal up to the owner rank.
fn same_assignment(a: &DistributionMap, b: &DistributionMap) -> bool {
    a.owners() == b.owners()
}

#[test]
fn all_ranks_compute_the_same_assignment() {
    let nprocs = 6;
    let input = weights(200, 42);
    let mut ranks = job(nprocs);

    let maps: Vec<DistributionMap> = ranks
        .iter_mut()
        .map(|b| b.distribute(&input, nprocs).unwrap())
        .collect();

    for (rank, map) in maps.iter().enumerate() {
        assert_eq!(map.owner_rank(), rank);
        assert!(same_assignment(map, &maps[0]));
    }
    // Owner rank takes part in equality.
    assert_ne!(maps[0], maps[1]);
}

#[test]
fn ranks_stay_in_agreement_across_repeated_steps() {
    let nprocs = 4;
    let mut ranks = job(nprocs);

    for step in 0..5u64 {
        let input = weights(50 + (step as usize % 2) * 10, step);
        let maps: Vec<DistributionMap> = ranks
            .iter_mut()
            .map(|b| b.distribute(&input, nprocs).unwrap())
            .collect();
        assert!(maps.iter().all(|m| same_assignment(m, &maps[0])));
    }

    // Two distinct unit counts were seen, so two maps are cached per rank.
    for balancer in &ranks {
        assert_eq!(balancer.cache_size(), 2);
    }
}

#[test]
fn round_robin_scenario() {
    let mut balancer = Balancer::new(3).with_strategy(Strategy::RoundRobin);
    let map = balancer.distribute(&[5, 4, 3, 2, 1], 2).unwrap();
    assert_eq!(map.owners(), &[0, 1, 0, 1, 0]);
    assert_eq!(map.owner_rank(), 3);
    assert_eq!(balancer.cache_size(), 0);
}

#[test]
fn knapsack_equals_round_robin_when_weights_do_not_matter() {
    for nprocs in 1..6 {
        for nunits in 0..12 {
            if nunits > nprocs && nprocs >= 2 {
                continue;
            }
            let input = weights(nunits, nunits as u64);
            let outcome = knapsack(&input, nprocs, 1, &KnapsackOptions::default()).unwrap();
            assert_eq!(outcome.map, round_robin(nunits, nprocs, 1).unwrap());
        }
    }
}

#[cfg(feature = "knapsack")]
#[test]
fn knapsack_is_total_and_conserves_weight() {
    for (n, nprocs, seed) in [(10, 3, 1), (37, 5, 2), (128, 16, 3), (300, 7, 4), (9, 8, 5)] {
        let input = weights(n, seed);
        let outcome = knapsack(&input, nprocs, 0, &KnapsackOptions::default()).unwrap();
        let report = outcome.report.unwrap();
        let map = outcome.map;

        assert_eq!(map.len(), n);
        assert_eq!(map.first_out_of_range(nprocs), None);

        let loads = map.loads(&input, nprocs);
        assert_eq!(loads.iter().sum::<u64>(), input.iter().sum::<u64>());
        assert!(report.final_max <= report.seed_max);
        assert!(!report.capped);

        // No process can be lighter than its share allows or heavier than
        // the largest unit on top of the ideal share.
        let ideal = input.iter().sum::<u64>().div_ceil(nprocs as u64);
        let largest = *input.iter().max().unwrap();
        assert!(report.final_max >= ideal.max(largest));
        assert!(report.final_max <= ideal + largest);
    }
}

#[cfg(feature = "knapsack")]
#[test]
fn knapsack_scenarios() {
    let even = [10, 10, 10, 10, 1, 1];
    let outcome = knapsack(&even, 2, 0, &KnapsackOptions::default()).unwrap();
    assert_eq!(outcome.report.unwrap().swaps, 0);
    assert_eq!(outcome.map.loads(&even, 2), vec![21, 21]);
    for process in 0..2 {
        let owned: Vec<u64> = outcome.map.units_of(process).map(|u| even[u]).collect();
        assert_eq!(owned.iter().filter(|&&w| w == 10).count(), 2);
        assert_eq!(owned.iter().filter(|&&w| w == 1).count(), 1);
    }

    let skewed = [9, 1, 1, 1, 1, 1, 1, 1, 1];
    let outcome = knapsack(&skewed, 3, 0, &KnapsackOptions::default()).unwrap();
    assert_eq!(outcome.report.unwrap().final_max, 9);
    let mut loads = outcome.map.loads(&skewed, 3);
    loads.sort_unstable();
    assert_eq!(loads, vec![4, 4, 9]);
}

#[test]
fn concatenated_maps_can_seed_the_cache() {
    let nprocs = 3;
    let mut balancer = Balancer::new(1);
    let coarse = balancer.distribute(&weights(8, 10), nprocs).unwrap();
    let fine = balancer.distribute(&weights(12, 11), nprocs).unwrap();
    assert_eq!(balancer.cache_size(), 2);

    let combined = balancer.concatenate(&coarse, &fine);
    assert_eq!(combined.len(), 20);
    assert_eq!(&combined.owners()[..8], coarse.owners());
    assert_eq!(&combined.owners()[8..], fine.owners());
    assert_eq!(combined.owner_rank(), 1);

    assert!(balancer.add_to_cache(&combined));
    assert_eq!(balancer.cache_size(), 3);
    let reused = balancer.distribute(&weights(20, 99), nprocs).unwrap();
    assert_eq!(reused, combined);

    let mut stats = Vec::new();
    balancer.write_cache_stats(&mut stats).unwrap();
    let stats = String::from_utf8(stats).unwrap();
    assert!(stats.contains("contains 3 map(s)"));
    assert!(stats.contains("Map #2 covers 20 units"));

    balancer.flush_cache();
    assert_eq!(balancer.cache_size(), 0);
}

#[test]
fn configured_balancers_agree() {
    let config = BalancerConfig::from_toml_str(
        "[balancer]\nstrategy = \"KNAPSACK\"\nmax_refine_iterations = 5\n",
    )
    .unwrap();
    let input = weights(64, 7);
    let maps: Vec<DistributionMap> = (0..4)
        .map(|rank| {
            Balancer::from_config(rank, &config)
                .distribute(&input, 4)
                .unwrap()
        })
        .collect();
    assert!(maps.iter().all(|m| same_assignment(m, &maps[0])));
}
