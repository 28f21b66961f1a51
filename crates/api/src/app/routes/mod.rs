pub mod pets;
pub mod system;
