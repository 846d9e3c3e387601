pub mod paths;
pub mod requirements;
