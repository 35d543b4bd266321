pub mod dispatch;
pub mod protocol;
pub mod tools;
pub mod transcript;
