pub mod mtp;
