pub mod bionic;
pub mod highlight;
pub mod pacer;
pub mod registry;
pub mod session;
pub mod surface;
pub mod token;
pub mod tokenizer;

pub use highlight::{FocusFrame, HighlightRenderer};
pub use pacer::{Pacer, PacerPhase, TickFrame, TickRequest};
pub use registry::WordRegistry;
pub use session::FlowSession;
pub use surface::{Rect, WordSurface};
pub use token::{Document, Segment, WordToken};
pub use tokenizer::{tokenize, tokenize_as, ContentKind};
