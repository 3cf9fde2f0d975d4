//! Utility functions for input masks and string formatting.

pub mod format;

pub use format::{mask_cpf_cnpj, mask_phone_br, only_digits, truncate_string};
