pub mod prediction;
pub mod request;
pub mod sequence;
pub mod upload;

pub use prediction::*;
pub use request::*;
pub use sequence::*;
pub use upload::*;
