pub mod catalog;
pub mod plane_io;
pub mod store;

pub use store::LocalStore;
