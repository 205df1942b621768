//! Kernel descriptors shipped with the crate.
//!
//! Each module declares one operator on one backend and submits it through
//! [`register_kernel!`](crate::register_kernel).

pub mod argmin;
pub mod batch_to_space;
pub mod mul;
pub mod reduce_sum;
pub mod squeeze;
pub mod transpose;
