//! Morse code audio generation.
//!
//! This crate turns text into International Morse Code audio: it derives
//! sample-accurate timing from a words-per-minute speed (optionally with
//! Farnsworth spacing), walks the text through a symbol table and a gap state
//! machine, and synthesizes click-free tones into an audio [`Sink`].
//!
//! # Example
//!
//! ```
//! use morse::{RecordingSink, Session, SessionConfig};
//!
//! let config = SessionConfig::new(20).with_farnsworth(true);
//! let mut session = Session::new(RecordingSink::new(), config).unwrap();
//!
//! session.send_string("CQ CQ DE EI4HRB").unwrap();
//! session.drain().unwrap();
//! println!("Total time: {:.2} seconds.", session.timestamp());
//! session.close().unwrap();
//! ```
//!
//! Real playback goes through [`sink::AlsaSink`] (feature `alsa`); rendering
//! to disk goes through [`WavSink`].

pub mod error;
pub mod sequencer;
pub mod session;
pub mod sink;
pub mod synth;
pub mod table;
pub mod timing;

pub use error::{MorseError, Result};
pub use sequencer::encode;
pub use session::{Session, SessionConfig};
pub use sink::{BlockBuffer, RecordingSink, Sink, SinkError, StreamParams, WavSink};
pub use table::{lookup, Symbol, SymbolEntry};
pub use timing::Timing;
