//! Wire protocol: the OSC codec, the TUIO 2Dcur profile on top of it, the
//! outbound frame counter and the inbound frame tracker.

pub mod frame_tracker;
pub mod osc;
pub mod sequence;
pub mod tuio;

pub use frame_tracker::FrameTracker;
pub use osc::{decode_packet, encode_packet, OscArg, OscBundle, OscError, OscMessage, OscPacket};
pub use sequence::FrameSequence;
pub use tuio::{build_cursor_bundle, decode_frame, encode_cursor_bundle, TuioError, TuioFrame};
