pub mod aws;
pub mod client;
pub mod executor;

pub use aws::{CommandError, Program};
pub use client::{
    AwsClient, CheckResult, DoctorReport, ImageError, LookupError, PreflightError,
    PreflightReport, StackDescription, StackError,
};
pub use executor::{CommandExecutor, RealExecutor};
