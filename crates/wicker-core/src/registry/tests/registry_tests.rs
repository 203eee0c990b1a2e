use std::sync::Arc;

use crate::registry::error::RegistryError;
use crate::registry::{ModuleRegistry, ServiceHandle, ServiceInstance, SharedModuleRegistry};

#[test]
fn test_register_returns_distinct_handles() {
    let mut registry = ModuleRegistry::new();
    let a = registry.register("p1", "alpha").expect("first registration should succeed");
    let b = registry.register("p1", "beta").expect("second registration should succeed");
    assert_ne!(a, b);
}

#[test]
fn test_duplicate_registration_rejected_and_first_retained() {
    let mut registry = ModuleRegistry::new();
    let first = registry.register("p1", "alpha").unwrap();

    let err = registry.register("p1", "alpha").unwrap_err();
    match err {
        RegistryError::DuplicateService { project, service } => {
            assert_eq!(project, "p1");
            assert_eq!(service, "alpha");
        }
        other => panic!("expected DuplicateService, got {:?}", other),
    }

    // The first registration is the one retained
    let instance: ServiceInstance = Arc::new(41_u32);
    registry.store_resolved(first, instance);
    let resolved = registry.resolve("p1", "alpha").expect("first handle should still resolve");
    assert_eq!(*resolved.downcast::<u32>().unwrap(), 41);
}

#[test]
fn test_same_service_name_allowed_across_projects() {
    let mut registry = ModuleRegistry::new();
    registry.register("p1", "cache").unwrap();
    registry.register("p2", "cache").expect("same name under another project is fine");
}

#[test]
fn test_reverse_lookup_round_trip() {
    let mut registry = ModuleRegistry::new();
    let handle = registry.register("p1", "alpha").unwrap();
    let (project, service) = registry.identity_of(handle).unwrap();
    assert_eq!(project, "p1");
    assert_eq!(service, "alpha");
}

#[test]
fn test_unknown_handle_rejected() {
    let registry = ModuleRegistry::new();
    let bogus = ServiceHandle::test_handle(999);
    assert!(matches!(
        registry.identity_of(bogus),
        Err(RegistryError::UnknownHandle { .. })
    ));
    assert!(matches!(
        registry.resolve_by_handle(bogus),
        Err(RegistryError::UnknownHandle { .. })
    ));
}

#[test]
fn test_unwired_service_resolves_to_none() {
    let mut registry = ModuleRegistry::new();
    let handle = registry.register("p1", "alpha").unwrap();

    // Declared but not yet wired: not an error, just absent
    assert!(registry.resolve("p1", "alpha").is_none());
    assert!(registry.resolve_by_handle(handle).unwrap().is_none());

    registry.store_resolved(handle, Arc::new("ready".to_string()));
    assert!(registry.resolve("p1", "alpha").is_some());
    assert!(registry.resolve_by_handle(handle).unwrap().is_some());
}

#[test]
fn test_find_project_for_follows_registration_order() {
    let mut registry = ModuleRegistry::new();
    registry.register("p1", "cache").unwrap();
    registry.register("p2", "cache").unwrap();
    registry.register("p2", "fetch").unwrap();

    assert_eq!(registry.find_project_for("cache"), Some("p1"));
    assert_eq!(registry.find_project_for("fetch"), Some("p2"));
    assert_eq!(registry.find_project_for("missing"), None);
}

#[test]
fn test_clear_wipes_everything() {
    let mut registry = ModuleRegistry::new();
    let handle = registry.register("p1", "alpha").unwrap();
    registry.store_resolved(handle, Arc::new(1_u8));

    registry.clear();
    assert_eq!(registry.declared_count(), 0);
    assert!(registry.project_names().is_empty());
    assert!(registry.resolve("p1", "alpha").is_none());
    assert!(matches!(
        registry.identity_of(handle),
        Err(RegistryError::UnknownHandle { .. })
    ));
}

#[tokio::test]
async fn test_shared_registry_register_and_resolve() {
    let shared = SharedModuleRegistry::new();
    let handle = shared.register("p1", "alpha").await.unwrap();
    shared.store_resolved(handle, Arc::new(7_i64)).await;

    let instance = shared.resolve("p1", "alpha").await.expect("instance should be resolved");
    assert_eq!(*instance.downcast::<i64>().unwrap(), 7);
    assert_eq!(shared.project_names().await, vec!["p1".to_string()]);
}
