use crate::animation::{AnimationDataset, Keyframe};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    #[error("invalid total_duration: {value}")]
    InvalidTotalDuration { value: f64 },
    #[error("invalid keyframe at index {index}: {reason}")]
    InvalidKeyframe { index: usize, reason: String },
    #[error("keyframes not in time order at index {index}")]
    KeyframesOutOfOrder { index: usize },
}

/// Validate an animation dataset by composing independent validators.
///
/// Visibility replay walks keyframes in array order, so the array must be
/// sorted by `time_offset`; ties are allowed and keep their given order.
pub fn validate_animation(data: &AnimationDataset) -> Result<(), Vec<AnimationError>> {
    let validators: &[fn(&AnimationDataset) -> Vec<AnimationError>] = &[
        validate_total_duration,
        validate_keyframes,
        validate_order,
    ];

    let errors: Vec<AnimationError> = validators.iter().flat_map(|v| v(data)).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_total_duration(data: &AnimationDataset) -> Vec<AnimationError> {
    if data.total_duration.is_finite() && data.total_duration >= 0.0 {
        vec![]
    } else {
        vec![AnimationError::InvalidTotalDuration {
            value: data.total_duration,
        }]
    }
}

fn validate_keyframes(data: &AnimationDataset) -> Vec<AnimationError> {
    data.keyframes
        .iter()
        .enumerate()
        .filter_map(|(index, kf)| {
            validate_keyframe(kf)
                .err()
                .map(|reason| AnimationError::InvalidKeyframe { index, reason })
        })
        .collect()
}

fn validate_order(data: &AnimationDataset) -> Vec<AnimationError> {
    data.keyframes
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            if pair[1].time_offset < pair[0].time_offset {
                Some(AnimationError::KeyframesOutOfOrder { index: i + 1 })
            } else {
                None
            }
        })
        .collect()
}

/// Validate a single keyframe, returning a human-readable reason on failure.
pub fn validate_keyframe(kf: &Keyframe) -> Result<(), String> {
    if kf.element_id.trim().is_empty() {
        return Err("missing element_id".to_string());
    }
    if !kf.time_offset.is_finite() || kf.time_offset < 0.0 {
        return Err(format!("time_offset must be >= 0, got {}", kf.time_offset));
    }
    if !kf.duration.is_finite() || kf.duration < 0.0 {
        return Err(format!("duration must be >= 0, got {}", kf.duration));
    }
    Ok(())
}
