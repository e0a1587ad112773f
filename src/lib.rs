//! Encbox - Password-based file encryption using AES-256-GCM

#![forbid(unsafe_code)]

pub mod container;
pub mod error;
pub mod file_ops;
pub mod password;
pub mod provider;
