//! Notification channel test double.

mod recording;

pub use recording::{ChannelCall, RecordingChannel};
