//! Demo plugin implementations for the example host
//!
//! Backs the manifests shipped under `demos/`. The greeter has no
//! dependencies; the reporter declares a graph dependency on the greeter in
//! its manifest and additionally exercises the informal mount-time
//! requirement path.

use tracing::info;

use crate::module::container::FactoryRegistry;
use crate::module::identity::ModuleId;
use crate::module::traits::{Module, MountContext};

/// Prints a configurable greeting.
#[derive(Debug, Default, Clone)]
pub struct GreeterModule {
    greeting: String,
}

impl Module for GreeterModule {
    fn mount(&mut self, ctx: &mut MountContext) -> bool {
        self.greeting = ctx.config_or("greeting", "hello");
        true
    }

    fn initialize(&mut self) {
        info!("{}, world", self.greeting);
    }

    fn verify(&self) -> bool {
        !self.greeting.is_empty()
    }
}

/// Reports on the greeter once its informal requirement is satisfied.
#[derive(Debug, Default, Clone)]
pub struct ReporterModule {
    greeter_seen: bool,
}

impl Module for ReporterModule {
    fn mount(&mut self, ctx: &mut MountContext) -> bool {
        ctx.require("demo.greeter");
        true
    }

    fn initialize(&mut self) {
        info!("Reporter initialized (greeter seen: {})", self.greeter_seen);
    }

    fn requirement_satisfied(&mut self, id: &ModuleId) {
        info!("Reporter: requirement {} satisfied", id);
        self.greeter_seen = true;
    }
}

/// Register factories for the demo plugins shipped under `demos/`.
pub fn register_demo_factories(registry: &mut FactoryRegistry) {
    registry.register("demo.greeter", || {
        Box::new(GreeterModule::default()) as Box<dyn Module>
    });
    registry.register("demo.reporter", || {
        Box::new(ReporterModule::default()) as Box<dyn Module>
    });
}
