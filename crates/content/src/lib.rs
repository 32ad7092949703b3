//! Stock capabilities for mudlark worlds.
//!
//! `Positioned` is the load-bearing capability: spatial containment, exits,
//! target selection, and the core movement and manipulation commands. The
//! rest layer behavior on top of it through hooks (`Dark`, `StickyBlob`,
//! `Important`, `Psychic`, `BlackHole`), ticks (`Bird`, `Wandering`), or
//! their own commands (`Colorful`, `Admin`).

pub mod admin;
pub mod bird;
pub mod black_hole;
pub mod colorful;
pub mod dark;
pub mod important;
pub mod positioned;
pub mod psychic;
pub mod sticky_blob;
pub mod util;
pub mod wandering;
pub mod world;

pub use admin::Admin;
pub use bird::Bird;
pub use black_hole::BlackHole;
pub use colorful::Colorful;
pub use dark::Dark;
pub use important::Important;
pub use positioned::Positioned;
pub use psychic::Psychic;
pub use sticky_blob::StickyBlob;
pub use wandering::Wandering;

use std::sync::Arc;

use mudlark_engine::{Registry, RegistryBuilder, Result};

/// Registers every stock capability on the given builder.
pub fn register_defaults(builder: &mut RegistryBuilder) {
    builder
        .register::<Positioned>()
        .register::<Colorful>()
        .register::<BlackHole>()
        .register::<Dark>()
        .register::<StickyBlob>()
        .register::<Important>()
        .register::<Psychic>()
        .register::<Bird>()
        .register::<Wandering>()
        .register::<Admin>();
}

/// A registry containing exactly the stock capabilities.
pub fn default_registry() -> Result<Arc<Registry>> {
    let mut builder = RegistryBuilder::default();
    register_defaults(&mut builder);
    builder.build()
}
