pub mod suppression;
pub mod traits;
