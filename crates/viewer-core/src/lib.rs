//! What the viewer draws: page virtualization, element culling, the render
//! cache and memory-pressure handling.

pub mod cache;
pub mod governor;
pub mod memory;
pub mod virtualization;

pub use cache::RenderCache;
pub use governor::{Governor, GovernorConfig, GovernorStats, RenderKey, TickReport};
pub use memory::{FixedMemoryProbe, MemoryProbe, MemoryUsage, ProcessMemoryProbe};
pub use virtualization::{cull, prefetch_page_indices, visible_range};
