mod sleep_compat;

pub use sleep_compat::sleep_compat;
