pub mod accumulator;
mod conversation;
pub mod session;

pub use accumulator::{Accumulator, FragmentSink};
pub use conversation::{
    ConversationManager, ConversationState, ConversationStreamUpdate, Phase, SessionId, Speaker,
    Submission, Turn, FALLBACK_MESSAGE,
};
pub use session::StreamSession;
