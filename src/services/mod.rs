pub mod verification;

pub use verification::{VerificationError, VerificationService};
