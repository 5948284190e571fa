pub mod errors;
pub mod types;

pub use errors::{BridgeError, CallError, CodecError, ConfigError, TetherError};
pub use types::{SizeHint, UnknownBindingPolicy};

pub type Result<T> = std::result::Result<T, TetherError>;
