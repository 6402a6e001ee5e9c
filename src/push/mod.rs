//! Push Module
//!
//! Decodes push messages into notification descriptors and displays them.

mod payload;
mod receiver;


pub use payload::{decode, DecodedPush, PushPayload};
pub use receiver::{default_actions, emergency_actions, PushReceiver, EMERGENCY_TAG, EMERGENCY_VIBRATE};
