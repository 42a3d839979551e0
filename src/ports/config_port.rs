//! Configuration access port trait.
//!
//! Values come back as raw strings; `config_validation` parses them so that
//! a malformed value is reported instead of silently replaced by a default.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
