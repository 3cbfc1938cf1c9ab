pub mod crud;

pub use crud::{today, ResourceTable};
