pub mod onboard;
pub mod register;
pub mod serve;
pub mod status;
