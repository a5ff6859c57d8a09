//! The game controller
//!
//! Owns the world and everything around it (controls, sound, camera) and
//! drives one frame at a time. Platform code only forwards key events and
//! supplies the output ports.

use crate::audio::{AudioPort, SoundBoard};
use crate::platform::Controls;
use crate::render::{Camera, Hud, HudSink, PostProcess, Renderer, SceneView};
use crate::settings::Settings;
use crate::sim::{GameEvent, TickReport, World, tick};
use crate::tuning::Tuning;

pub struct Game<A: AudioPort> {
    world: World,
    controls: Controls,
    sound: SoundBoard<A>,
    camera: Camera,
}

impl<A: AudioPort> Game<A> {
    pub fn new(tuning: Tuning, settings: &Settings, seed: u64, audio: A) -> Self {
        let world = World::new(
            tuning,
            seed,
            settings.base_emphasis,
            settings.effective_boosted_emphasis(),
        );
        Self {
            world,
            controls: Controls::new(),
            sound: SoundBoard::new(audio, settings),
            camera: Camera::default(),
        }
    }

    /// Returns false for keys the game doesn't use
    pub fn on_key_down(&mut self, code: &str) -> bool {
        self.controls.on_key_down(code)
    }

    pub fn on_key_up(&mut self, code: &str) -> bool {
        self.controls.on_key_up(code)
    }

    pub fn set_autopilot(&mut self, on: bool) {
        if self.controls.autopilot != on {
            log::info!("Autopilot {}", if on { "on" } else { "off" });
        }
        self.controls.autopilot = on;
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn sound(&self) -> &SoundBoard<A> {
        &self.sound
    }

    pub fn hud(&self) -> Hud {
        Hud::capture(&self.world.state, self.sound.sound_on())
    }

    /// Advance the simulation one frame and route its side effects
    pub fn step(&mut self) -> TickReport {
        if self.controls.take_mute_toggle() {
            self.sound.toggle_mute(self.world.state.phase);
        }

        let input = self.controls.take_input();
        let report = tick(&mut self.world, &input);

        let events = self.world.state.drain_events();
        self.sound.handle(&events);
        for event in &events {
            if let GameEvent::GameOver { score, new_high } = event {
                log::debug!(
                    "Game over at frame {} (score {}, new high: {})",
                    self.world.state.frame,
                    score,
                    new_high
                );
            }
        }

        self.camera.follow(self.world.state.player.pos);
        report
    }

    /// One full frame: simulate, draw, post-process, update the HUD
    pub fn frame<R, P, H>(&mut self, renderer: &mut R, post: &mut P, hud: &mut H) -> TickReport
    where
        R: Renderer,
        P: PostProcess,
        H: HudSink,
    {
        let report = self.step();

        let scene = SceneView::capture(&self.world);
        post.set_strength(scene.emphasis);
        renderer.render(&scene, &self.camera);
        post.render();
        hud.show(&self.hud());
        report
    }
}
