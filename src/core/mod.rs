// Module declarations
pub mod error;
pub mod value;
pub mod data_type;

// Re-exports for convenience
pub use error::{DatabaseError, SyntaxError};
pub use value::Value;
pub use data_type::ScalarType;
