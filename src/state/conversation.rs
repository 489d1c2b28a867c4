mod core;
mod machine;
mod state;


pub use machine::{
    ConversationState, Phase, SessionId, Speaker, Submission, Turn, FALLBACK_MESSAGE,
};
pub use state::{ConversationManager, ConversationStreamUpdate};
