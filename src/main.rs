//! Vein Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlCanvasElement, KeyboardEvent};

    use vein_runner::audio::WebAudio;
    use vein_runner::render::canvas::{CanvasRenderer, CanvasWash};
    use vein_runner::render::{Hud, HudSink};
    use vein_runner::{Game, Settings, Tuning};

    /// Pushes HUD text and menu visibility into the page
    struct DomHud {
        document: Document,
        last: Option<Hud>,
    }

    impl DomHud {
        fn element(&self, id: &str) -> Option<Element> {
            self.document.get_element_by_id(id)
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.element(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_class(&self, id: &str, class: &str, on: bool) {
            if let Some(el) = self.element(id) {
                let _ = el.class_list().toggle_with_force(class, on);
            }
        }
    }

    impl HudSink for DomHud {
        fn show(&mut self, hud: &Hud) {
            // The DOM only changes when the HUD does
            if self.last.as_ref() == Some(hud) {
                return;
            }
            self.set_text("currentscore", &hud.score.to_string());
            self.set_text("endscore", &hud.end_score.to_string());
            self.set_text("highscore", &hud.high_score.to_string());
            self.set_text("speed", &hud.speed_text());
            self.set_text("distance", &hud.distance_text());

            self.set_class("startmenu", "started", hud.show_start_menu());
            self.set_class("scoremenu", "started", hud.show_score());
            self.set_class("endmenu", "ended", hud.show_end_menu());
            self.set_class("scoremenu", "invincible", hud.invincible);
            self.last = Some(hud.clone());
        }
    }

    struct App {
        game: Game<WebAudio>,
        renderer: CanvasRenderer,
        wash: CanvasWash,
        hud: DomHud,
        dpr: f64,
    }

    impl App {
        fn frame(&mut self) {
            self.renderer.resize(self.dpr);
            self.game
                .frame(&mut self.renderer, &mut self.wash, &mut self.hud);
        }
    }

    /// Optional JSON tuning embedded in the page
    fn page_tuning(document: &Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
            .filter(|text| !text.trim().is_empty())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Using page tuning");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring page tuning: {}", e);
                Tuning::default()
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Vein Runner starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let renderer = CanvasRenderer::new(canvas).ok_or("canvas has no 2d context")?;

        let seed = js_sys::Date::now() as u64;
        let tuning = page_tuning(&document);
        let settings = Settings::default();
        let game = Game::new(tuning, &settings, seed, WebAudio::new());
        log::info!("Game initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App {
            game,
            wash: renderer.wash(settings.base_emphasis),
            renderer,
            hud: DomHud {
                document: document.clone(),
                last: None,
            },
            dpr: window.device_pixel_ratio(),
        }));

        setup_keyboard(&window, app.clone())?;
        request_animation_frame(app);

        log::info!("Vein Runner running!");
        Ok(())
    }

    /// Keys typed into a text box belong to the text box
    fn from_text_box(event: &KeyboardEvent) -> bool {
        event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .is_some_and(|el| el.tag_name() == "INPUT")
    }

    fn setup_keyboard(window: &web_sys::Window, app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if from_text_box(&event) {
                    return;
                }
                if app.borrow_mut().game.on_key_down(&event.key()) {
                    event.prevent_default();
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if from_text_box(&event) {
                    return;
                }
                app.borrow_mut().game.on_key_up(&event.key());
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            app.borrow_mut().frame();
            request_animation_frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: the autopilot plays for a while and the leaderboard is logged.
///
/// Usage: `vein-runner [tuning.json] [frames]`
#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use vein_runner::audio::NullAudio;
    use vein_runner::{Game, Settings, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Vein Runner (native) starting...");
    log::info!("Native mode runs a headless autopilot demo - build for wasm32 to play");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading tuning file {path}"))?;
            Tuning::from_json(&json).with_context(|| format!("loading tuning from {path}"))?
        }
        None => Tuning::default(),
    };
    let frames: u64 = match args.next() {
        Some(n) => n.parse().with_context(|| format!("frame count {n:?}"))?,
        None => 20_000,
    };

    let mut game = Game::new(tuning, &Settings::default(), 42, NullAudio::default());
    game.set_autopilot(true);

    let mut segments = 0u32;
    for _ in 0..frames {
        if game.step().advance.appended.is_some() {
            segments += 1;
        }
    }

    let state = &game.world().state;
    log::info!(
        "Demo finished: {} frames, {} segments streamed, {} runs, high score {}",
        state.frame,
        segments,
        state.runs,
        state.high_score
    );
    for (rank, entry) in state.scores.entries.iter().enumerate() {
        log::info!(
            "#{:<2} {:>4} viruses  {:>7.0} units  (run {})",
            rank + 1,
            entry.score,
            entry.distance,
            entry.run
        );
    }
    Ok(())
}
