pub mod container;
pub mod draft;
pub mod finalize;
pub mod haulage;
pub mod request;
pub mod seafreight;
pub mod services;
