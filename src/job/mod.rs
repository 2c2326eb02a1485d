// src/job/mod.rs

//! Turning user input into an immutable, validated job description.
//!
//! - [`request`]: raw values from the front-end.
//! - [`builder`]: validation, selection fallback, argument vector.
//! - [`spec`]: the resulting `JobSpec`.
//! - [`outputs`]: files a `JobSpec` will produce.

pub mod builder;
pub mod outputs;
pub mod request;
pub mod spec;

pub use builder::JobSpecBuilder;
pub use outputs::{ExpectedOutput, ExpectedOutputSet, OutputOwner};
pub use request::JobRequest;
pub use spec::JobSpec;
