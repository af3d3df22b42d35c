/// Tool implementations. Each submodule exports `descriptors()` (or
/// `descriptor()` for a single tool) plus a `register()` that binds its
/// handlers into a `ToolDispatcher`. `build()` assembles the full catalog.
pub mod analysis;
pub mod args;
pub mod circuits;
pub mod components;
pub mod derived;
pub mod library;
pub mod netlist;
pub mod render;
pub mod status;

use std::sync::Arc;

use crate::core::dispatcher::ToolDispatcher;
use crate::core::registry::ToolRegistry;

/// Builds the tool registry and a dispatcher with every handler bound to
/// it. Descriptor validation failures here are a programming error (a
/// hand-written descriptor with a bad schema), not a runtime condition, so
/// this panics rather than returning a `Result`.
pub fn build() -> (ToolRegistry, ToolDispatcher) {
    let mut descriptors = Vec::new();
    descriptors.push(status::descriptor());
    descriptors.extend(circuits::descriptors());
    descriptors.extend(components::descriptors());
    descriptors.extend(netlist::descriptors());
    descriptors.extend(analysis::descriptors());
    descriptors.extend(derived::descriptors());
    descriptors.extend(render::descriptors());
    descriptors.extend(library::descriptors());

    let registry_for_dispatch =
        Arc::new(ToolRegistry::new(descriptors.clone()).expect("built-in tool descriptors are well-formed"));
    let mut dispatcher = ToolDispatcher::new(registry_for_dispatch);

    status::register(&mut dispatcher);
    circuits::register(&mut dispatcher);
    components::register(&mut dispatcher);
    netlist::register(&mut dispatcher);
    analysis::register(&mut dispatcher);
    derived::register(&mut dispatcher);
    render::register(&mut dispatcher);
    library::register(&mut dispatcher);

    let registry = ToolRegistry::new(descriptors).expect("already validated above");
    (registry, dispatcher)
}
