pub mod init;
pub mod play;
pub mod profile;
pub mod ranking;
pub mod validate;
