//! I18n Adapter - 标签目录
//!
//! - DefaultLabels: 内置英文标签
//! - JsonLabelCatalog: lang.json 多语言目录

mod default_labels;
mod json_catalog;

pub use default_labels::DefaultLabels;
pub use json_catalog::JsonLabelCatalog;
