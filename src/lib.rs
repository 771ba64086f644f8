//! Runtime translation engine with language aliases, lazy locale loading,
//! fallback lookup and a parameter formatter pipeline.

pub mod config;
pub mod i18n;
pub mod locales;
