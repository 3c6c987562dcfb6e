//! Login handle allocation for new directory accounts.
//!
//! A handle is `<given-name prefix>.<family name>`, grown one given-name
//! letter at a time (then suffixed with a random digit) until the directory
//! reports the full identifier as free within the target OU.

pub mod allocator;
pub mod digits;
pub mod existence;
pub mod field;
pub mod name;

pub use allocator::{Allocation, AllocationError, AllocationRequest, AllocatorPolicy, HandleAllocator};
pub use digits::{DigitSource, FixedDigits, SeededDigits, ThreadDigits};
pub use existence::ExistenceCheck;
pub use field::{FieldError, LoginField, LoginSnapshot, LoginStatus, Refresh};
pub use name::PersonName;
