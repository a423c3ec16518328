pub mod live_worker;
pub mod still_worker;
