//! Load balancing strategies for distributing calls across instances

use rand::Rng;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Load balancing strategy, `random` or `round_robin` in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingStrategy {
    /// Uniform random choice among active instances
    #[default]
    Random,
    /// Round-robin over the addresses returned by each resolution
    RoundRobin,
}

/// Load balancer for selecting one address out of a resolution
pub struct LoadBalancer {
    strategy: LoadBalancingStrategy,
    round_robin_counter: Arc<AtomicUsize>,
}

impl LoadBalancer {
    /// Create a new load balancer with the specified strategy
    pub fn new(strategy: LoadBalancingStrategy) -> Self {
        Self {
            strategy,
            round_robin_counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn strategy(&self) -> LoadBalancingStrategy {
        self.strategy
    }

    /// Select an address based on the configured strategy
    pub fn select<'a>(&self, addresses: &'a [String]) -> Option<&'a str> {
        if addresses.is_empty() {
            return None;
        }

        let index = match self.strategy {
            LoadBalancingStrategy::Random => rand::thread_rng().gen_range(0..addresses.len()),
            LoadBalancingStrategy::RoundRobin => {
                self.round_robin_counter.fetch_add(1, Ordering::Relaxed) % addresses.len()
            }
        };
        addresses.get(index).map(String::as_str)
    }
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new(LoadBalancingStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("host:{}", 9000 + i)).collect()
    }

    #[test]
    fn test_empty_selects_nothing() {
        let lb = LoadBalancer::default();
        assert_eq!(lb.select(&[]), None);
    }

    #[test]
    fn test_single_address_always_selected() {
        let lb = LoadBalancer::default();
        let addrs = addresses(1);
        for _ in 0..10 {
            assert_eq!(lb.select(&addrs), Some("host:9000"));
        }
    }

    #[test]
    fn test_random_selection_is_fair() {
        let lb = LoadBalancer::new(LoadBalancingStrategy::Random);
        let addrs = addresses(2);
        let mut first = 0;
        for _ in 0..1000 {
            if lb.select(&addrs) == Some("host:9000") {
                first += 1;
            }
        }
        // Binomial(1000, 0.5) has a standard deviation of about 16
        assert!((400..=600).contains(&first), "host:9000 chosen {} times", first);
    }

    #[test]
    fn test_strategy_names() {
        let strategy: LoadBalancingStrategy = serde_json::from_str("\"round_robin\"").unwrap();
        assert_eq!(strategy, LoadBalancingStrategy::RoundRobin);
        let strategy: LoadBalancingStrategy = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(strategy, LoadBalancingStrategy::Random);
        assert!(serde_json::from_str::<LoadBalancingStrategy>("\"weighted\"").is_err());
    }

    #[test]
    fn test_round_robin_cycles() {
        let lb = LoadBalancer::new(LoadBalancingStrategy::RoundRobin);
        let addrs = addresses(3);
        let picks: Vec<&str> = (0..6).filter_map(|_| lb.select(&addrs)).collect();
        assert_eq!(
            picks,
            vec!["host:9000", "host:9001", "host:9002", "host:9000", "host:9001", "host:9002"]
        );
    }
}
