//! Numeric range validation

use super::schema::TypingConfig;

/// A numeric field outside its allowed range
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid value for {field}: {value} (expected {constraint})")]
pub struct ValueRangeError {
    pub field: String,
    pub value: String,
    pub constraint: &'static str,
}

impl ValueRangeError {
    pub(crate) fn new(field: impl Into<String>, value: impl ToString, constraint: &'static str) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
            constraint,
        }
    }
}

/// Validate every numeric field of a parsed document
///
/// Checks:
/// - Counts and sizes are strictly positive
/// - Learning rate and positive-class weight are strictly positive
/// - Rates lie in their unit interval
///
/// Returns the first violation found.
pub fn validate_config(config: &TypingConfig) -> Result<(), ValueRangeError> {
    positive_int("preprocessor.max_length", config.preprocessor.max_length)?;

    let dropout = config.model.word_dropout;
    if dropout.is_nan() || !(0.0..1.0).contains(&dropout) {
        return Err(ValueRangeError::new("model.word_dropout", dropout, "in [0, 1)"));
    }

    positive_float("model.pos_weight", config.model.pos_weight)?;

    positive_int("train.max_epochs", config.train.max_epochs)?;
    positive_int(
        "train.dataloader.batch_size_per_gpu",
        config.train.dataloader.batch_size_per_gpu,
    )?;

    let optimizer = &config.train.optimizer;
    positive_float("train.optimizer.lr", optimizer.lr)?;

    if let Some(wd) = optimizer.weight_decay {
        if wd.is_nan() || wd < 0.0 {
            return Err(ValueRangeError::new("train.optimizer.weight_decay", wd, ">= 0"));
        }
    }

    if let Some(betas) = optimizer.betas {
        for (i, beta) in betas.iter().enumerate() {
            if beta.is_nan() || *beta <= 0.0 || *beta >= 1.0 {
                return Err(ValueRangeError::new(
                    format!("train.optimizer.betas[{i}]"),
                    beta,
                    "in (0, 1)",
                ));
            }
        }
    }

    if let Some(scheduler) = &config.train.lr_scheduler {
        let rate = scheduler.warmup_rate;
        if rate.is_nan() || !(0.0..=1.0).contains(&rate) {
            return Err(ValueRangeError::new(
                "train.lr_scheduler.warmup_rate",
                rate,
                "in [0, 1]",
            ));
        }
    }

    Ok(())
}

/// Converts a strictly positive count field to `usize`
pub(crate) fn positive_count(field: &'static str, value: i64) -> Result<usize, ValueRangeError> {
    match usize::try_from(value) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValueRangeError::new(field, value, "> 0")),
    }
}

fn positive_int(field: &'static str, value: i64) -> Result<(), ValueRangeError> {
    if value <= 0 {
        return Err(ValueRangeError::new(field, value, "> 0"));
    }
    Ok(())
}

fn positive_float(field: &'static str, value: f64) -> Result<(), ValueRangeError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValueRangeError::new(field, value, "> 0"));
    }
    Ok(())
}
