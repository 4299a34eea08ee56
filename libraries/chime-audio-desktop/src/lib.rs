//! Chime Audio Desktop
//!
//! Desktop playback for Chime: CPAL output plus the consumer-facing
//! `Player`.
//!
//! # Example
//!
//! ```rust,no_run
//! use chime_audio_desktop::Player;
//! use chime_playback::PlayerConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut player = Player::new(PlayerConfig::default())?;
//!
//! player.equalizer().set_band_gain(0, 6.0); // warm up the low end
//! player.set_on_playback_end(|| println!("track finished"));
//!
//! if player.play("/music/song.flac") {
//!     player.set_sleep_timer(30.0); // stop in half an hour
//! }
//! # Ok(())
//! # }
//! ```

mod equalizer;
mod error;
mod output;
mod player;

pub use equalizer::Equalizer;
pub use error::{AudioOutputError, Result};
pub use output::{AudioOutput, PlayerEvent};
pub use player::Player;

// Re-exports so consumers need only this crate
pub use chime_playback::{MediaClock, PlaybackState, PlayerConfig};
