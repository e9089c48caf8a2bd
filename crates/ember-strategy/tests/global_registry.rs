//! The process-wide registry lifecycle.
//!
//! Kept in its own test binary, as a single test, so nothing else
//! initialises the registry first.

use ember_session::StrategyOptions;
use ember_strategy::{global_registry, init_global_registry, RegistryError};

#[test]
fn test_registry_lifecycle() {
    assert_eq!(
        global_registry().unwrap_err(),
        RegistryError::NotInitialized
    );

    let registry = init_global_registry(&StrategyOptions::default()).unwrap();
    assert_eq!(registry.len(), 6);
    assert!(registry.contains("reduce_any"));
    assert!(std::ptr::eq(registry, global_registry().unwrap()));

    assert_eq!(
        init_global_registry(&StrategyOptions::default()).unwrap_err(),
        RegistryError::AlreadyInitialized
    );

    // read-only lookups from several threads
    std::thread::scope(|s| {
        for name in registry.names() {
            s.spawn(move || {
                let record = global_registry().unwrap().get(name).unwrap();
                assert_eq!(record.name, name);
            });
        }
    });
}
