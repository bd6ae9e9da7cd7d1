pub mod group_member;
pub mod message;
pub mod shared_file;
pub mod transient;
