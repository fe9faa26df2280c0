use std::collections::HashMap;
use std::sync::Arc;

use crate::controller::{Controller, ControllerMeta};
use crate::errors::{MetadataError, MetadataResult};

/// A registry mapping controller names to their declared metadata.
///
/// This is the hand-off point between declaration and runtime: controllers
/// describe themselves once, and transport adapters (HTTP, jobs, CLI, ...)
/// read the stored records back to wire up the real framework.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    controllers: HashMap<String, Arc<ControllerMeta>>,
}

impl MetadataRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            controllers: HashMap::new(),
        }
    }

    /// Build and store a controller's metadata.
    ///
    /// Runs the controller's `describe` against a fresh `ControllerMeta`;
    /// any declaration failure aborts the registration.
    pub fn register<C: Controller>(&mut self) -> MetadataResult<Arc<ControllerMeta>> {
        if self.controllers.contains_key(C::NAME) {
            return Err(MetadataError::ControllerAlreadyRegistered(
                C::NAME.to_string(),
            ));
        }

        let mut meta = ControllerMeta::new(C::NAME);
        C::describe(&mut meta)?;

        let meta = Arc::new(meta);
        self.controllers.insert(C::NAME.to_string(), Arc::clone(&meta));
        Ok(meta)
    }

    /// Look up a controller's metadata by name
    pub fn get(&self, name: &str) -> Option<&Arc<ControllerMeta>> {
        self.controllers.get(name)
    }

    /// Iterate over all registered controllers
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ControllerMeta>> {
        self.controllers.values()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::HttpMethod;

    struct Todos;

    impl Controller for Todos {
        const NAME: &'static str = "todos";

        fn describe(meta: &mut ControllerMeta) -> MetadataResult<()> {
            meta.route(HttpMethod::Get, "/", "list")?
                .route(HttpMethod::Post, "/", "create")?;
            Ok(())
        }
    }

    struct Broken;

    impl Controller for Broken {
        const NAME: &'static str = "broken";

        fn describe(meta: &mut ControllerMeta) -> MetadataResult<()> {
            meta.route(HttpMethod::Get, "no-slash", "list")?;
            Ok(())
        }
    }

    #[test]
    fn registered_controllers_are_retrievable_by_name() {
        let mut registry = MetadataRegistry::new();
        registry.register::<Todos>().unwrap();

        let meta = registry.get("todos").unwrap();
        assert_eq!(meta.routes().len(), 2);
        assert!(registry.get("users").is_none());
    }

    #[test]
    fn duplicate_controllers_are_rejected() {
        let mut registry = MetadataRegistry::new();
        registry.register::<Todos>().unwrap();
        assert!(matches!(
            registry.register::<Todos>(),
            Err(MetadataError::ControllerAlreadyRegistered(name)) if name == "todos"
        ));
    }

    #[test]
    fn describe_failures_abort_registration() {
        let mut registry = MetadataRegistry::new();
        assert!(registry.register::<Broken>().is_err());
        assert!(registry.is_empty());
    }
}
