pub mod image_data;
pub mod params;
pub mod poll;
mod status;

pub use status::JobStatus;
