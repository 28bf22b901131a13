//! Request and response DTOs

pub mod forecast;
