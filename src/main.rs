//! Tube Racer entry point
//!
//! Handles platform-specific initialization and runs the game loop. The wasm
//! build wires DOM screens, keyboard input, and a requestAnimationFrame loop
//! to the session; the native build runs a headless demo race.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent, MouseEvent};

    use tube_racer::consts::*;
    use tube_racer::{RaceEvent, RaceSession, RaceState};

    /// Host-side state around the session
    struct Host {
        session: RaceSession,
        accumulator: f32,
        last_time: f64,
        /// Seconds left to keep "GO!" on screen after the countdown
        go_timer: f32,
    }

    impl Host {
        fn new(seed: u64) -> Self {
            Self {
                session: RaceSession::new(seed),
                accumulator: 0.0,
                last_time: 0.0,
                go_timer: 0.0,
            }
        }

        /// Run fixed-timestep simulation ticks and collect events
        fn update(&mut self, dt: f32) -> Vec<RaceEvent> {
            let dt = dt.min(0.1);
            self.accumulator += dt;
            self.go_timer = (self.go_timer - dt).max(0.0);

            let mut events = Vec::new();
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                events.extend(self.session.step(SIM_DT));
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
            events
        }
    }

    fn set_class(document: &Document, id: &str, class: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", class);
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Toggle the screen-state DOM to match the race state
    fn show_screen(document: &Document, state: RaceState) {
        match state {
            RaceState::Start => {
                set_class(document, "start-screen", "screen active");
                set_class(document, "hud", "hidden");
                set_class(document, "end-screen", "hidden");
            }
            RaceState::Countdown | RaceState::Racing => {
                set_class(document, "start-screen", "hidden");
                set_class(document, "hud", "");
                set_class(document, "end-screen", "hidden");
            }
            RaceState::Finished => {
                set_class(document, "hud", "hidden");
                set_class(document, "end-screen", "screen active");
            }
        }
    }

    /// Update HUD readouts while racing
    fn update_hud(document: &Document, host: &Host) {
        let hud = host.session.hud();

        set_text(document, "speed", &format!("{} km/h", (hud.speed * 10.0).floor()));
        set_text(
            document,
            "lap",
            &format!("Lap: {}/{}", hud.lap.min(hud.total_laps), hud.total_laps),
        );
        set_text(
            document,
            "position",
            &format!("Pos: {}/{}", hud.position, host.session.vehicles().len()),
        );

        // Countdown readout: 3..1, then "GO!" held briefly
        match hud.state {
            RaceState::Countdown => {
                set_class(document, "countdown", "");
                set_text(document, "countdown", &format!("{}", hud.countdown.ceil() as u32));
            }
            RaceState::Racing if host.go_timer > 0.0 => {
                set_class(document, "countdown", "");
                set_text(document, "countdown", "GO!");
            }
            _ => set_class(document, "countdown", "hidden"),
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Tube Racer starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let seed = js_sys::Date::now() as u64;
        let host = Rc::new(RefCell::new(Host::new(seed)));
        log::info!("Session initialized with seed: {seed}");

        show_screen(&document, RaceState::Start);

        setup_buttons(&document, host.clone());
        setup_keyboard(host.clone());

        request_animation_frame(host);

        log::info!("Tube Racer running!");
    }

    fn setup_buttons(document: &Document, host: Rc<RefCell<Host>>) {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                host.borrow_mut().session.start();
                show_screen(&document, RaceState::Countdown);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                let seed = js_sys::Date::now() as u64;
                let mut h = host.borrow_mut();
                h.session.reset(seed);
                h.accumulator = 0.0;
                h.go_timer = 0.0;
                show_screen(&document, RaceState::Start);
                log::info!("Session reset with seed: {seed}");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();

        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                apply_key(&mut host.borrow_mut().session, &event.code(), true);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                apply_key(&mut host.borrow_mut().session, &event.code(), false);
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn apply_key(session: &mut RaceSession, code: &str, pressed: bool) {
        match code {
            "ArrowUp" | "KeyW" => session.input.forward = pressed,
            "ArrowDown" | "KeyS" => session.input.backward = pressed,
            "ArrowLeft" | "KeyA" => session.input.left = pressed,
            "ArrowRight" | "KeyD" => session.input.right = pressed,
            _ => {}
        }
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(host: Rc<RefCell<Host>>, time: f64) {
        {
            let mut h = host.borrow_mut();
            let dt = if h.last_time > 0.0 {
                ((time - h.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            h.last_time = time;

            let events = h.update(dt);
            let document = web_sys::window().unwrap().document().unwrap();
            for event in events {
                match event {
                    RaceEvent::CountdownFinished => h.go_timer = 1.0,
                    RaceEvent::RaceFinished => {
                        show_screen(&document, RaceState::Finished);
                        let hud = h.session.hud();
                        set_text(
                            &document,
                            "results",
                            &format!("You Finished! Position: {}", hud.position),
                        );
                        log::info!("Race finished in position {}", hud.position);
                    }
                    _ => {}
                }
            }
            update_hud(&document, &h);

            // This is where an external scene collaborator would consume
            // h.session.transforms() for rendering.
        }

        request_animation_frame(host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use tube_racer::consts::*;
    use tube_racer::{RaceEvent, RaceSession, RaceState};

    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42u64);
    log::info!("Tube Racer headless demo, seed {seed}");

    let mut session = RaceSession::new(seed);
    session.start();

    // Let the AI cars race for a minute; the player car sits on the grid
    let frames = 60 * 60;
    for _ in 0..frames {
        for event in session.step(SIM_DT) {
            if let RaceEvent::LapCompleted { vehicle, lap } = event {
                log::info!("vehicle {vehicle} entered lap {lap}");
            }
        }
        if session.state() == RaceState::Finished {
            break;
        }
    }

    let summary = serde_json::json!({
        "seed": session.seed(),
        "state": format!("{:?}", session.state()),
        "standings": session.standings(),
        "laps": session.vehicles().iter().map(|v| v.lap).collect::<Vec<_>>(),
    });
    println!("{summary}");
}
