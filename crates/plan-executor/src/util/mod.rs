pub mod serialize;
