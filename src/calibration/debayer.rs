//! Debayering module for turning sensor mosaics into RGB chart images

pub mod cpu_debayer;

pub use cpu_debayer::CpuDebayer;
