pub mod config;
pub mod logging;

pub mod backup;
pub mod cancel;
pub mod executor;
pub mod fetch;
pub mod model;
pub mod naming;
pub mod plan;
pub mod pool;
pub mod retry;
pub mod source;
pub mod storage;
pub mod work;
