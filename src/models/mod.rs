pub mod job;
pub mod media;
pub mod request;
pub mod result;

pub use job::*;
pub use media::*;
pub use request::*;
pub use result::*;
