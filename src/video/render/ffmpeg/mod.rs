pub mod compiler;
pub mod services;

#[cfg(test)]
pub mod fake;
