pub mod email;
pub mod factory;
pub mod hosting;
pub mod repositories;
pub mod storage;
