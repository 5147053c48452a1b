pub mod app;
pub mod offers;
