/// Core traits for Chime
use crate::error::Result;
use crate::types::DecodedAudio;
use std::path::Path;

/// Audio decoder trait
///
/// Implementers decode audio files into `DecodedAudio` (interleaved stereo
/// f32). The playback engine pulls from the fully decoded buffer, so a
/// single full-file decode is the only mode required.
pub trait AudioDecoder: Send {
    /// Decode an audio file from the given path (loads entire file)
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded
    fn decode(&mut self, path: &Path) -> Result<DecodedAudio>;

    /// Check if the decoder supports the given file format
    fn supports_format(&self, path: &Path) -> bool;
}
