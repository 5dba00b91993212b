pub mod consts;
pub mod error;
pub mod gateway;
pub mod io;
pub mod jobs;
pub mod offsets;
pub mod pixels;
pub mod roi;
pub mod timer;
