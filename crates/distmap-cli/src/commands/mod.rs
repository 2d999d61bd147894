pub mod balance;
pub mod init;
