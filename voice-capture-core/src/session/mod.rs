pub mod capture;
pub mod filters;
