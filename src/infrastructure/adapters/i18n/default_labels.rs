//! 内置英文标签

use std::sync::Arc;

use crate::application::ports::{LabelKey, LabelResolverPort};

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLabels;

impl DefaultLabels {
    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl LabelResolverPort for DefaultLabels {
    fn resolve(&self, key: LabelKey) -> String {
        key.default_text().to_string()
    }
}
