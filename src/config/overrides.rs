//! Command-line overrides applied on top of a parsed document

use super::schema::TypingConfig;
use std::path::PathBuf;

/// Values that replace their document counterparts before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub work_dir: Option<PathBuf>,
    pub max_epochs: Option<i64>,
    pub lr: Option<f64>,
    pub batch_size_per_gpu: Option<i64>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, config: &mut TypingConfig) {
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
        if let Some(epochs) = self.max_epochs {
            config.train.max_epochs = epochs;
        }
        if let Some(lr) = self.lr {
            config.train.optimizer.lr = lr;
        }
        if let Some(batch_size) = self.batch_size_per_gpu {
            config.train.dataloader.batch_size_per_gpu = batch_size;
        }
    }
}
