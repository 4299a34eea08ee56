/// CPAL-based audio output with a dedicated audio thread
///
/// **Architecture**: a dedicated audio thread owns the CPAL `Stream`. The
/// control side talks to it over a bounded channel, which sidesteps
/// `Send`/`Sync` issues with CPAL's stream type across platforms and keeps
/// the workspace free of unsafe code.
///
/// The stream callback locks the shared engine once per block, renders,
/// and forwards an end-of-stream outcome as a `PlayerEvent`. It never
/// allocates, logs, or calls user code.
use crate::error::{AudioOutputError, Result};
use chime_playback::{PlaybackEngine, RenderOutcome};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Events forwarded out of the audio callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The stream ended of its own accord (not by explicit stop)
    TrackFinished,
}

/// Commands sent to the audio thread
enum OutputCommand {
    /// Build and start a stream; the result is reported back
    Start {
        reply: Sender<Result<()>>,
    },
    /// Drop the active stream
    Stop,
    /// Drop the stream and exit the thread
    Shutdown,
}

/// Scratch capacity for devices that are not plain stereo
/// (8192 frames covers every callback size CPAL hands out)
const SCRATCH_SAMPLES: usize = 8192 * 2;

/// How long the control side waits for the audio thread to open a stream
const START_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable handle for sending transport commands to the audio thread
///
/// Used by the sleep timer so its worker can close the stream without
/// holding the whole output.
#[derive(Clone)]
pub(crate) struct OutputController {
    command_tx: Sender<OutputCommand>,
}

impl OutputController {
    /// Drop the active stream; a no-op when nothing is playing
    pub(crate) fn stop(&self) {
        let _ = self.command_tx.send(OutputCommand::Stop);
    }
}

/// CPAL audio output bound to a shared playback engine
pub struct AudioOutput {
    command_tx: Sender<OutputCommand>,
    sample_rate: u32,
    channels: u16,
    callback_errors: Arc<AtomicUsize>,
    _audio_thread: Option<JoinHandle<()>>,
}

impl AudioOutput {
    /// Open the default output device and spawn the audio thread
    ///
    /// # Errors
    /// Returns an error if no device is available or it has no default
    /// configuration
    pub fn new(
        engine: Arc<Mutex<PlaybackEngine>>,
        event_tx: Sender<PlayerEvent>,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioOutputError::DeviceNotFound)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioOutputError::StreamBuild(e.to_string()))?;
        let config: StreamConfig = config.into();

        let sample_rate = config.sample_rate.0;
        let channels = config.channels;
        let callback_errors = Arc::new(AtomicUsize::new(0));

        let (command_tx, command_rx) = bounded::<OutputCommand>(32);

        let errors = Arc::clone(&callback_errors);
        let audio_thread = thread::spawn(move || {
            Self::audio_thread_run(device, config, engine, event_tx, command_rx, errors);
        });

        Ok(Self {
            command_tx,
            sample_rate,
            channels,
            callback_errors,
            _audio_thread: Some(audio_thread),
        })
    }

    /// The output device's sample rate; decoded audio is converted to this
    /// rate at load time
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The output device's channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of stream errors reported by CPAL so far
    ///
    /// Underruns and device hiccups are counted and logged out-of-band;
    /// they never interrupt playback.
    pub fn stream_error_count(&self) -> usize {
        self.callback_errors.load(Ordering::Relaxed)
    }

    /// Build and start the output stream
    pub fn start(&self) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.command_tx
            .send(OutputCommand::Start { reply: reply_tx })
            .map_err(|e| AudioOutputError::Disconnected(e.to_string()))?;

        reply_rx
            .recv_timeout(START_TIMEOUT)
            .map_err(|e| AudioOutputError::Disconnected(e.to_string()))?
    }

    /// Drop the active stream; a no-op when nothing is playing
    pub fn stop(&self) {
        let _ = self.command_tx.send(OutputCommand::Stop);
    }

    /// A cloneable transport handle for worker threads
    pub(crate) fn controller(&self) -> OutputController {
        OutputController {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Audio thread main loop; owns the CPAL stream
    fn audio_thread_run(
        device: Device,
        config: StreamConfig,
        engine: Arc<Mutex<PlaybackEngine>>,
        event_tx: Sender<PlayerEvent>,
        command_rx: Receiver<OutputCommand>,
        errors: Arc<AtomicUsize>,
    ) {
        let mut stream: Option<Stream> = None;

        while let Ok(command) = command_rx.recv() {
            match command {
                OutputCommand::Start { reply } => {
                    // Restarting always begins from a fresh stream
                    drop(stream.take());

                    let result = Self::build_stream(
                        &device,
                        &config,
                        Arc::clone(&engine),
                        event_tx.clone(),
                        Arc::clone(&errors),
                    );

                    match result {
                        Ok(s) => {
                            stream = Some(s);
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            log::error!("failed to open output stream: {}", e);
                            let _ = reply.send(Err(e));
                        }
                    }
                }
                OutputCommand::Stop => {
                    drop(stream.take());
                }
                OutputCommand::Shutdown => {
                    drop(stream.take());
                    break;
                }
            }
        }
    }

    fn build_stream(
        device: &Device,
        config: &StreamConfig,
        engine: Arc<Mutex<PlaybackEngine>>,
        event_tx: Sender<PlayerEvent>,
        errors: Arc<AtomicUsize>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;

        let error_errors = Arc::clone(&errors);
        let err_fn = move |err: cpal::StreamError| {
            error_errors.fetch_add(1, Ordering::Relaxed);
            log::error!("audio stream error: {}", err);
        };

        let stream = if channels == 2 {
            device.build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let outcome = engine.lock().unwrap().render_block(data);
                    if outcome == RenderOutcome::Finished {
                        // Non-blocking: a full event queue must not stall
                        // the audio thread
                        let _ = event_tx.try_send(PlayerEvent::TrackFinished);
                    }
                },
                err_fn,
                None,
            )
        } else {
            // Render stereo into scratch, then map onto the device layout.
            // The scratch lives in the closure so the callback never
            // allocates.
            let mut scratch = vec![0.0f32; SCRATCH_SAMPLES];
            device.build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let total_frames = data.len() / channels;
                    let mut offset = 0;

                    while offset < total_frames {
                        let chunk = (total_frames - offset).min(SCRATCH_SAMPLES / 2);
                        let stereo = &mut scratch[..chunk * 2];

                        let outcome = engine.lock().unwrap().render_block(stereo);
                        if outcome == RenderOutcome::Finished {
                            let _ = event_tx.try_send(PlayerEvent::TrackFinished);
                        }

                        for frame in 0..chunk {
                            let left = stereo[frame * 2];
                            let right = stereo[frame * 2 + 1];
                            let out = &mut data
                                [(offset + frame) * channels..(offset + frame + 1) * channels];
                            if channels == 1 {
                                out[0] = (left + right) * 0.5;
                            } else {
                                out[0] = left;
                                out[1] = right;
                                for extra in &mut out[2..] {
                                    *extra = 0.0;
                                }
                            }
                        }

                        offset += chunk;
                    }
                },
                err_fn,
                None,
            )
        }
        .map_err(|e| AudioOutputError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioOutputError::StreamBuild(e.to_string()))?;

        Ok(stream)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        // The audio thread drops the stream and exits
        let _ = self.command_tx.send(OutputCommand::Shutdown);
    }
}
