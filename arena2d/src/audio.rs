use std::io::Cursor;

use rodio::source::Buffered;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::assets::AssetLoader;
use crate::error::{AssetError, Result};

/// Lowest accepted linear volume (silence).
pub const MIN_VOLUME: f32 = 0.0;
/// Highest accepted linear volume (roughly +6 dB).
pub const MAX_VOLUME: f32 = 2.0;

/// Clamp a linear volume into `[MIN_VOLUME, MAX_VOLUME]`. NaN mutes.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        MIN_VOLUME
    } else {
        volume.clamp(MIN_VOLUME, MAX_VOLUME)
    }
}

/// Convert a linear volume to a gain in decibels: `20 * log10(volume)`.
///
/// The volume is clamped first. Zero maps to negative infinity instead of
/// going through `log10(0)`.
pub fn volume_to_db(volume: f32) -> f32 {
    let volume = clamp_volume(volume);
    if volume == 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * volume.log10()
    }
}

/// Convert a gain in decibels back to a linear amplitude factor.
pub fn db_to_amplitude(db: f32) -> f32 {
    if db == f32::NEG_INFINITY {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}

/// A playable, exclusively owned output line holding one decoded clip.
///
/// `stop` halts playback but keeps the play position; `rewind` moves the
/// position back to the start. `close` releases the device resources and
/// is only ever called once per line.
pub trait AudioLine {
    fn start(&mut self, looping: bool) -> Result<()>;
    fn stop(&mut self);
    fn rewind(&mut self);
    fn is_running(&self) -> bool;
    fn set_gain_db(&mut self, db: f32);
    fn close(&mut self);
}

/// Decodes clip bytes and acquires an output line for them.
pub trait AudioBackend {
    fn open_line(&self, name: &str, bytes: Vec<u8>) -> Result<Box<dyn AudioLine>>;
}

/// Backend playing through the default output device via rodio.
///
/// Every line opens its own output stream, so a clip keeps working
/// independently of any other clip.
#[derive(Clone, Copy, Debug, Default)]
pub struct RodioBackend;

impl AudioBackend for RodioBackend {
    fn open_line(&self, name: &str, bytes: Vec<u8>) -> Result<Box<dyn AudioLine>> {
        let clip = Decoder::new(Cursor::new(bytes))
            .map_err(|e| AssetError::decode(name, e))?
            .buffered();
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AssetError::Audio(format!("failed to open output stream: {}", e)))?;

        Ok(Box::new(RodioLine {
            _stream: stream,
            handle,
            clip,
            sink: None,
            sink_looping: false,
            amplitude: 1.0,
        }))
    }
}

struct RodioLine {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clip: Buffered<Decoder<Cursor<Vec<u8>>>>,
    // A paused sink holds the current play position.
    sink: Option<Sink>,
    sink_looping: bool,
    amplitude: f32,
}

impl AudioLine for RodioLine {
    fn start(&mut self, looping: bool) -> Result<()> {
        if let Some(sink) = &self.sink {
            if self.sink_looping == looping && !sink.empty() {
                sink.play();
                return Ok(());
            }
        }

        self.rewind();
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AssetError::Audio(format!("failed to create audio sink: {}", e)))?;
        if looping {
            sink.append(self.clip.clone().repeat_infinite());
        } else {
            sink.append(self.clip.clone());
        }
        sink.set_volume(self.amplitude);

        self.sink = Some(sink);
        self.sink_looping = looping;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn rewind(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_running(&self) -> bool {
        self.sink
            .as_ref()
            .map_or(false, |sink| !sink.is_paused() && !sink.empty())
    }

    fn set_gain_db(&mut self, db: f32) {
        self.amplitude = db_to_amplitude(db);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.amplitude);
        }
    }

    fn close(&mut self) {
        self.rewind();
    }
}

fn load_line(
    source: &str,
    loader: &AssetLoader,
    backend: &dyn AudioBackend,
) -> Result<Box<dyn AudioLine>> {
    let bytes = loader.load_bytes(source)?;
    backend.open_line(source, bytes)
}

/// A sound effect or music clip loaded from a file path or HTTP(S) URL.
///
/// Construction never fails: if the clip cannot be read, decoded or given
/// an output line, the sound is left silent and the failure is kept in
/// [`Sound::load_error`]. Use [`Sound::open`] to get the error up front.
pub struct Sound {
    source: String,
    looping: bool,
    volume: f32,
    line: Option<Box<dyn AudioLine>>,
    closed: bool,
    load_error: Option<AssetError>,
}

impl Sound {
    /// Load a sound through the default output device.
    pub fn new(source: impl Into<String>, looping: bool, volume: f32) -> Self {
        Self::with_backend(source, looping, volume, &AssetLoader::default(), &RodioBackend)
    }

    /// Load a sound, returning the load failure instead of keeping it.
    pub fn open(source: impl Into<String>, looping: bool, volume: f32) -> Result<Self> {
        Self::open_with(source, looping, volume, &AssetLoader::default(), &RodioBackend)
    }

    /// Like [`Sound::open`], with an explicit loader and audio backend.
    pub fn open_with(
        source: impl Into<String>,
        looping: bool,
        volume: f32,
        loader: &AssetLoader,
        backend: &dyn AudioBackend,
    ) -> Result<Self> {
        let source = source.into();
        let line = load_line(&source, loader, backend)?;
        Ok(Self::from_line(source, looping, volume, Ok(line)))
    }

    /// Load a sound with an explicit loader and audio backend.
    pub fn with_backend(
        source: impl Into<String>,
        looping: bool,
        volume: f32,
        loader: &AssetLoader,
        backend: &dyn AudioBackend,
    ) -> Self {
        let source = source.into();
        let line = load_line(&source, loader, backend);
        Self::from_line(source, looping, volume, line)
    }

    /// Build a sound from bytes already in memory (embedded assets).
    /// `name` is reported by [`Sound::source`].
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        looping: bool,
        volume: f32,
        backend: &dyn AudioBackend,
    ) -> Self {
        let name = name.into();
        let line = backend.open_line(&name, bytes);
        Self::from_line(name, looping, volume, line)
    }

    fn from_line(
        source: String,
        looping: bool,
        volume: f32,
        line: Result<Box<dyn AudioLine>>,
    ) -> Self {
        let volume = clamp_volume(volume);
        let (line, load_error) = match line {
            Ok(mut line) => {
                line.set_gain_db(volume_to_db(volume));
                log::debug!("Loaded sound {}", source);
                (Some(line), None)
            }
            Err(err) => {
                log::warn!("Sound {} is unavailable: {}", source, err);
                (None, Some(err))
            }
        };

        Self {
            source,
            looping,
            volume,
            line,
            closed: false,
            load_error,
        }
    }

    /// Start playback, looping if the loop flag is set.
    ///
    /// An idle sound is rewound and plays from the beginning. A sound that
    /// is already running is stopped and started again without a rewind:
    /// with the same loop mode it carries on from its current position,
    /// while a changed loop mode begins again from the start.
    pub fn play(&mut self) -> Result<()> {
        let looping = self.looping;
        let line = self.line_mut("play")?;
        if line.is_running() {
            line.stop();
        } else {
            line.rewind();
        }
        line.start(looping)
    }

    /// Halt playback. The sound stays loaded and can be played again.
    pub fn stop(&mut self) -> Result<()> {
        self.line_mut("stop")?.stop();
        Ok(())
    }

    /// Stop playback and release the output line for good.
    ///
    /// Closing twice returns [`AssetError::InvalidState`] and changes nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            log::warn!("Sound {} closed more than once", self.source);
            return Err(AssetError::InvalidState(format!(
                "sound {} is already closed",
                self.source
            )));
        }
        if let Some(mut line) = self.line.take() {
            line.stop();
            line.close();
        }
        self.closed = true;
        Ok(())
    }

    /// Change the loop flag. A running sound is restarted so the new mode
    /// applies immediately; setting the current value again does nothing.
    pub fn set_loop(&mut self, looping: bool) {
        if self.looping == looping {
            return;
        }
        self.looping = looping;
        if self.is_playing() {
            if let Err(err) = self.play() {
                log::warn!("Failed to restart sound {}: {}", self.source, err);
            }
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Set the linear volume, clamped to `[0.0, 2.0]`, and apply it as a
    /// decibel gain to the live line.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
        if let Some(line) = self.line.as_mut() {
            line.set_gain_db(volume_to_db(self.volume));
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Gain in decibels matching the current volume.
    pub fn gain_db(&self) -> f32 {
        volume_to_db(self.volume)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_playing(&self) -> bool {
        self.line.as_ref().map_or(false, |line| line.is_running())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The error that left this sound without an output line, if any.
    pub fn load_error(&self) -> Option<&AssetError> {
        self.load_error.as_ref()
    }

    fn line_mut(&mut self, op: &str) -> Result<&mut Box<dyn AudioLine>> {
        if self.closed {
            return Err(AssetError::InvalidState(format!(
                "cannot {} sound {}: it is closed",
                op, self.source
            )));
        }
        let source = &self.source;
        self.line.as_mut().ok_or_else(|| {
            AssetError::InvalidState(format!("cannot {} sound {}: it failed to load", op, source))
        })
    }
}

impl Drop for Sound {
    fn drop(&mut self) {
        if let Some(mut line) = self.line.take() {
            line.close();
        }
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sound")
            .field("source", &self.source)
            .field("looping", &self.looping)
            .field("volume", &self.volume)
            .field("loaded", &self.line.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
