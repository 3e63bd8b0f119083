use thiserror::Error;

use crate::types::{ItemId, UserId};

pub type AffinityResult<T> = Result<T, AffinityError>;

#[derive(Error, Debug)]
pub enum AffinityError {
    #[error("Invalid rating {value} from user {user_id} for item {item_id}: must lie in [{min}, {max}]")]
    InvalidRating {
        user_id: UserId,
        item_id: ItemId,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for AffinityError {
    fn from(err: config::ConfigError) -> Self {
        AffinityError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rating_message() {
        let err = AffinityError::InvalidRating {
            user_id: 7,
            item_id: 3,
            value: 6.5,
            min: 1.0,
            max: 5.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid rating 6.5 from user 7 for item 3: must lie in [1, 5]"
        );
    }

    #[test]
    fn test_lookup_messages_name_the_id() {
        assert_eq!(AffinityError::UnknownUser(4).to_string(), "Unknown user: 4");
        assert_eq!(AffinityError::UnknownItem(12).to_string(), "Unknown item: 12");
        assert_eq!(
            AffinityError::InvalidArgument("count".into()).to_string(),
            "Invalid argument: count"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AffinityError = config::ConfigError::Message("bad threshold".into()).into();
        assert!(matches!(err, AffinityError::Config(ref m) if m.contains("bad threshold")));
    }
}
