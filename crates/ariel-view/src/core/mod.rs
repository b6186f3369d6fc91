//! Host-independent building blocks of the editor
//!
//! Nothing in here touches a widget, a DOM, or a terminal: the viewport,
//! debounce, and repair modules are plain state and transforms, and the
//! render adapter talks to engines only through [`DiagramEngine`].

mod debounce;
mod error;
mod export;
mod geometry;
pub mod logging;
mod renderer;
mod repair;
pub mod svg;
mod theme;
mod viewport;

pub use debounce::*;
pub use error::*;
pub use export::*;
pub use geometry::*;
pub use logging::{init_logging, LogFormat, LogSettings};
pub use renderer::*;
pub use repair::*;
pub use theme::*;
pub use viewport::*;
