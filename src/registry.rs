//! Named driver registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::driver::Driver;
use crate::error::{DriverError, Result};

/// Drivers available to [`open`](crate::open), keyed by name.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `driver` under `name`. Each name may be registered once.
    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn Driver>) -> Result<()> {
        let name = name.into();
        if self.drivers.contains_key(&name) {
            return Err(DriverError::DuplicateDriver(name));
        }
        self.drivers.insert(name, driver);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Driver>> {
        self.drivers
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::UnknownDriver(name.to_string()))
    }

    /// Registered driver names in sorted order.
    pub fn drivers(&self) -> Vec<&str> {
        self.drivers.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.drivers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCaps, MockDriver};

    #[test]
    fn test_register_and_get() {
        let mut registry = DriverRegistry::new();
        registry
            .register("mock", Arc::new(MockDriver::new(MockCaps::none())))
            .unwrap();
        registry
            .register("alpha", Arc::new(MockDriver::new(MockCaps::none())))
            .unwrap();

        assert!(registry.get("mock").is_ok());
        assert_eq!(registry.drivers(), vec!["alpha", "mock"]);
    }

    #[test]
    fn test_unknown_driver() {
        let registry = DriverRegistry::new();
        assert!(matches!(
            registry.get("nope").err(),
            Some(DriverError::UnknownDriver(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = DriverRegistry::new();
        let driver: Arc<dyn Driver> = Arc::new(MockDriver::new(MockCaps::none()));
        registry.register("mock", driver.clone()).unwrap();
        assert!(matches!(
            registry.register("mock", driver),
            Err(DriverError::DuplicateDriver(_))
        ));
    }
}
