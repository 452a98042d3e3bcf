//! Phase grouping
//!
//! A [`Group`] labels the checks recorded through it with its path
//! (`::LOGIN`, `::LOGIN::nested`) and records `group_duration` when it is
//! dropped, including when an iteration aborts inside it.

use std::sync::Arc;
use std::time::Instant;

use super::metrics::{self, Metrics};

pub struct Group {
    path: String,
    started: Instant,
    metrics: Arc<Metrics>,
}

impl Group {
    /// The unnamed group every iteration starts in
    pub fn root(metrics: Arc<Metrics>) -> Self {
        Self {
            path: String::new(),
            started: Instant::now(),
            metrics,
        }
    }

    /// Enter a child group
    pub fn enter(&self, name: &str) -> Group {
        tracing::trace!(group = name, parent = %self.path, "Entering group");
        Group {
            path: format!("{}::{}", self.path, name),
            started: Instant::now(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Record a named check in this group and return its outcome
    pub fn check(&self, name: &str, passed: bool, tags: &[(&str, &str)]) -> bool {
        if !passed {
            tracing::debug!(group = %self.path, check = name, "Check failed");
        }
        self.metrics.record_check(&self.path, name, passed, tags);
        passed
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        if !self.path.is_empty() {
            let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
            self.metrics.add_trend(metrics::GROUP_DURATION, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_paths() {
        let root = Group::root(Arc::new(Metrics::new()));
        let login = root.enter("LOGIN");
        let nested = login.enter("token");
        assert_eq!(root.path(), "");
        assert_eq!(login.path(), "::LOGIN");
        assert_eq!(nested.path(), "::LOGIN::token");
    }

    #[test]
    fn test_check_records_under_group_path() {
        let registry = Arc::new(Metrics::new());
        let root = Group::root(registry.clone());
        let cars = root.enter("CARS");

        assert!(!cars.check("valid body", false, &[]));
        assert_eq!(registry.check("::CARS", "valid body"), Some((0, 1)));
    }

    #[test]
    fn test_duration_recorded_on_drop_for_named_groups_only() {
        let registry = Arc::new(Metrics::new());
        {
            let root = Group::root(registry.clone());
            let _login = root.enter("LOGIN");
        }
        assert_eq!(registry.trend_values(metrics::GROUP_DURATION).len(), 1);
    }
}
