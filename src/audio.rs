//! Sound cues
//!
//! The simulation only raises [`GameEvent`]s; [`SoundBoard`] turns them into
//! fire-and-forget commands on an [`AudioPort`]. Nothing here ever waits on
//! playback, and a missing audio device just means silence.
//!
//! On the web the port is [`WebAudio`]: procedurally generated voices on the
//! Web Audio API, no external files needed.

use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Virus eaten
    Squish,
    /// Ran into a clot
    Crash,
    /// Antibody picked up
    PowerUp,
    /// Menu / game-over loop
    Theme,
}

impl SoundCue {
    /// Looping cues keep going until `stop`
    pub fn looping(self) -> bool {
        matches!(self, SoundCue::Theme)
    }
}

/// Where sound commands go. Implementations must never block.
pub trait AudioPort {
    /// Start a cue at the given volume (0.0 - 1.0)
    fn play(&mut self, cue: SoundCue, volume: f32);
    /// Stop whatever loop is playing
    fn stop(&mut self);
    /// Whether a loop is playing
    fn is_playing(&self) -> bool;
}

/// Silent port for native builds and tests
#[derive(Debug, Default)]
pub struct NullAudio {
    looping: bool,
}

impl AudioPort for NullAudio {
    fn play(&mut self, cue: SoundCue, _volume: f32) {
        log::trace!("(silent) {:?}", cue);
        self.looping |= cue.looping();
    }

    fn stop(&mut self) {
        self.looping = false;
    }

    fn is_playing(&self) -> bool {
        self.looping
    }
}

/// Routes game events to sound cues and owns the mute switch
pub struct SoundBoard<A: AudioPort> {
    port: A,
    sound_on: bool,
    effect_volume: f32,
    theme_volume: f32,
}

impl<A: AudioPort> SoundBoard<A> {
    pub fn new(port: A, settings: &Settings) -> Self {
        Self {
            port,
            sound_on: settings.sound_on,
            effect_volume: settings.effect_volume(),
            theme_volume: settings.theme_volume(),
        }
    }

    #[inline]
    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    pub fn port(&self) -> &A {
        &self.port
    }

    /// Flip sound on/off. Turning it on in the menu starts the theme;
    /// turning it off silences everything.
    pub fn toggle_mute(&mut self, phase: GamePhase) -> bool {
        self.sound_on = !self.sound_on;
        if self.sound_on {
            if phase == GamePhase::Menu {
                self.start_theme();
            }
        } else if self.port.is_playing() {
            self.port.stop();
        }
        log::info!("Sound {}", if self.sound_on { "on" } else { "off" });
        self.sound_on
    }

    /// Play the cues for this frame's events
    pub fn handle(&mut self, events: &[GameEvent]) {
        if !self.sound_on {
            return;
        }
        for event in events {
            match event {
                GameEvent::VirusConsumed { .. } => self.effect(SoundCue::Squish),
                GameEvent::PowerUpCollected(_) => self.effect(SoundCue::PowerUp),
                GameEvent::GameOver { .. } => {
                    self.effect(SoundCue::Crash);
                    self.start_theme();
                }
                GameEvent::ReturnedToMenu => self.start_theme(),
                GameEvent::RunStarted => {
                    if self.port.is_playing() {
                        self.port.stop();
                    }
                }
                GameEvent::InvincibilityEnded => {}
            }
        }
    }

    fn effect(&mut self, cue: SoundCue) {
        self.port.play(cue, self.effect_volume);
    }

    fn start_theme(&mut self) {
        if !self.port.is_playing() {
            self.port.play(SoundCue::Theme, self.theme_volume);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioPort, SoundCue};

    /// Web Audio voices
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        /// Oscillators of the running loop
        theme: Vec<OscillatorNode>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                theme: Vec::new(),
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Squish - wet downward blip
        fn play_squish(ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            if let Some((osc, gain)) = Self::create_osc(ctx, 520.0, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.4, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.12)
                    .ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(140.0, t + 0.1)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.15).ok();
            }
            if let Some((osc, gain)) = Self::create_osc(ctx, 90.0, OscillatorType::Triangle) {
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.08)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.1).ok();
            }
        }

        /// Crash - low thud with a rasp on top
        fn play_crash(ctx: &AudioContext, vol: f32) {
            let t = ctx.current_time();
            if let Some((osc, gain)) = Self::create_osc(ctx, 110.0, OscillatorType::Sawtooth) {
                gain.gain().set_value_at_time(vol * 0.5, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.45)
                    .ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(30.0, t + 0.4)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.5).ok();
            }
            if let Some((osc, gain)) = Self::create_osc(ctx, 1200.0, OscillatorType::Square) {
                gain.gain().set_value_at_time(vol * 0.15, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }

        /// Pickup collect - happy ding
        fn play_pickup(ctx: &AudioContext, vol: f32) {
            for (i, freq) in [600.0, 800.0, 1000.0].iter().enumerate() {
                let delay = i as f64 * 0.08;
                if let Some((osc, gain)) = Self::create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.2).ok();
                }
            }
        }

        /// Theme - slow pulsing drone, runs until stopped
        fn start_theme(&mut self, vol: f32) {
            let Some(ctx) = &self.ctx else { return };
            for (freq, kind, level) in [
                (55.0, OscillatorType::Sine, 0.2),
                (82.5, OscillatorType::Triangle, 0.1),
                (110.5, OscillatorType::Sine, 0.05),
            ] {
                if let Some((osc, gain)) = Self::create_osc(ctx, freq, kind) {
                    gain.gain().set_value(vol * level);
                    osc.start().ok();
                    self.theme.push(osc);
                }
            }
        }
    }

    impl AudioPort for WebAudio {
        fn play(&mut self, cue: SoundCue, volume: f32) {
            if volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Squish => Self::play_squish(ctx, volume),
                SoundCue::Crash => Self::play_crash(ctx, volume),
                SoundCue::PowerUp => Self::play_pickup(ctx, volume),
                SoundCue::Theme => self.start_theme(volume),
            }
        }

        fn stop(&mut self) {
            for osc in self.theme.drain(..) {
                osc.stop().ok();
            }
        }

        fn is_playing(&self) -> bool {
            !self.theme.is_empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PowerUp;

    /// Port that remembers what it was told
    #[derive(Default)]
    struct Recorder {
        played: Vec<SoundCue>,
        stops: u32,
        looping: bool,
    }

    impl AudioPort for Recorder {
        fn play(&mut self, cue: SoundCue, _volume: f32) {
            self.played.push(cue);
            self.looping |= cue.looping();
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.looping = false;
        }

        fn is_playing(&self) -> bool {
            self.looping
        }
    }

    fn board(sound_on: bool) -> SoundBoard<Recorder> {
        let settings = Settings {
            sound_on,
            ..Settings::default()
        };
        SoundBoard::new(Recorder::default(), &settings)
    }

    #[test]
    fn test_silent_while_muted() {
        let mut b = board(false);
        b.handle(&[
            GameEvent::VirusConsumed { score: 1 },
            GameEvent::GameOver {
                score: 1,
                new_high: true,
            },
        ]);
        assert!(b.port().played.is_empty());
    }

    #[test]
    fn test_event_routing() {
        let mut b = board(true);
        b.handle(&[
            GameEvent::RunStarted,
            GameEvent::VirusConsumed { score: 1 },
            GameEvent::PowerUpCollected(PowerUp::Speed),
            GameEvent::GameOver {
                score: 1,
                new_high: false,
            },
        ]);
        assert_eq!(
            b.port().played,
            vec![
                SoundCue::Squish,
                SoundCue::PowerUp,
                SoundCue::Crash,
                SoundCue::Theme
            ]
        );
        assert!(b.port().is_playing());

        // A new run silences the theme
        b.handle(&[GameEvent::RunStarted]);
        assert!(!b.port().is_playing());
    }

    #[test]
    fn test_theme_not_layered() {
        let mut b = board(true);
        b.handle(&[GameEvent::ReturnedToMenu]);
        b.handle(&[GameEvent::ReturnedToMenu]);
        let themes = b
            .port()
            .played
            .iter()
            .filter(|c| **c == SoundCue::Theme)
            .count();
        assert_eq!(themes, 1);
    }

    #[test]
    fn test_mute_toggle() {
        let mut b = board(false);
        assert!(b.toggle_mute(GamePhase::Menu));
        assert_eq!(b.port().played, vec![SoundCue::Theme]);

        assert!(!b.toggle_mute(GamePhase::Menu));
        assert!(!b.port().is_playing());
        assert_eq!(b.port().stops, 1);

        // Unmuting mid-run doesn't start the theme
        assert!(b.toggle_mute(GamePhase::Playing));
        assert_eq!(b.port().played.len(), 1);
    }
}
