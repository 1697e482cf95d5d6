pub mod password;
pub mod validators;
