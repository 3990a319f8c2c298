pub mod draw;
pub mod errors;
pub mod messages;
pub mod room;

// Re-export all types
pub use draw::*;
pub use errors::*;
pub use messages::*;
pub use room::*;
