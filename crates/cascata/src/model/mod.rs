mod identity;
mod relation;
mod ulid;
mod value;

pub use identity::*;
pub use relation::*;
pub use ulid::*;
pub use value::*;
