//! Browser shell: canvas, DOM listeners, the animation loop and the phase screens.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, EventTarget, HtmlCanvasElement, KeyboardEvent, PointerEvent, window};

use crate::config::AppConfig;
use crate::effects::WebAudio;
use crate::minigame::{Input, Key};
use crate::narrative::NarrativeGenerator;
use crate::paint;
use crate::session::{self, LevelOutcome, Session, SessionPhase};

/// Longest frame step fed to the timers, so a backgrounded tab does not
/// replay seconds of game time in one go.
const MAX_FRAME_MS: f64 = 100.0;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

struct AppState {
    session: Rc<RefCell<Session>>,
    generator: Rc<NarrativeGenerator>,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    last_ts: Option<f64>,
    listeners: Vec<Listener>,
    frame: FrameCallback,
    raf_id: Rc<Cell<Option<i32>>>,
    running: Rc<Cell<bool>>,
}

thread_local! {
    static APP: RefCell<Option<AppState>> = const { RefCell::new(None) };
}

pub fn start(config: AppConfig) -> Result<(), JsValue> {
    stop();

    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(&config.canvas_id) {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(&config.canvas_id);
        c.set_attribute(
            "style",
            "position:fixed; left:50%; top:50%; transform:translate(-50%,-50%); border-radius:18px; border:4px solid #9d174d; background:#fff1f2; touch-action:none;",
        )?;
        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&c)?;
        c
    };
    canvas.set_width(config.width);
    canvas.set_height(config.height);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    let rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let session = Rc::new(RefCell::new(Session::new(Rc::new(WebAudio), rng)));
    let generator = Rc::new(NarrativeGenerator::browser(config.reward.clone()));

    let mut listeners = Vec::new();
    listen(&mut listeners, doc.clone().into(), "keydown", |evt| {
        if let Some(evt) = evt.dyn_ref::<KeyboardEvent>() {
            on_key(evt, true);
        }
    })?;
    listen(&mut listeners, doc.into(), "keyup", |evt| {
        if let Some(evt) = evt.dyn_ref::<KeyboardEvent>() {
            on_key(evt, false);
        }
    })?;
    // Pointer events cover mouse, touch and pen alike.
    listen(&mut listeners, canvas.clone().into(), "pointerdown", |evt| {
        if let Some(evt) = evt.dyn_ref::<PointerEvent>() {
            evt.prevent_default();
            on_pointer_down(evt);
        }
    })?;
    listen(&mut listeners, canvas.clone().into(), "pointermove", |evt| {
        if let Some(evt) = evt.dyn_ref::<PointerEvent>() {
            evt.prevent_default();
            on_pointer_move(evt);
        }
    })?;
    for event in ["pointerup", "pointercancel", "pointerleave"] {
        listen(&mut listeners, canvas.clone().into(), event, |evt| {
            evt.prevent_default();
            dispatch(&Input::Release);
        })?;
    }

    tracing::info!(canvas = %config.canvas_id, width = config.width, height = config.height, "app started");
    APP.with(|cell| {
        *cell.borrow_mut() = Some(AppState {
            session,
            generator,
            canvas,
            ctx,
            last_ts: None,
            listeners,
            frame: Rc::new(RefCell::new(None)),
            raf_id: Rc::new(Cell::new(None)),
            running: Rc::new(Cell::new(true)),
        });
    });
    start_loop()
}

/// Remove the listeners and cancel the frame loop. The session is dropped.
pub fn stop() {
    let Some(app) = APP.with(|cell| cell.borrow_mut().take()) else {
        return;
    };
    app.running.set(false);
    if let (Some(id), Some(w)) = (app.raf_id.get(), window()) {
        let _ = w.cancel_animation_frame(id);
    }
    app.frame.borrow_mut().take();
    for l in &app.listeners {
        let _ = l
            .target
            .remove_event_listener_with_callback(l.event, l.closure.as_ref().unchecked_ref());
    }
    tracing::info!("app stopped");
}

fn listen(
    listeners: &mut Vec<Listener>,
    target: EventTarget,
    event: &'static str,
    mut handler: impl FnMut(&web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move |evt: web_sys::Event| handler(&evt)) as Box<dyn FnMut(_)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    listeners.push(Listener { target, event, closure });
    Ok(())
}

fn start_loop() -> Result<(), JsValue> {
    let (frame, raf_id, running) = APP.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|app| (app.frame.clone(), app.raf_id.clone(), app.running.clone()))
    })
    .ok_or_else(|| JsValue::from_str("app not started"))?;

    let f = frame.clone();
    let id = raf_id.clone();
    *frame.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        if !running.get() {
            return;
        }
        tick(ts);
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            id.set(w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
        }
    }) as Box<dyn FnMut(f64)>));

    let w = window().ok_or_else(|| JsValue::from_str("no window"))?;
    if let Some(cb) = frame.borrow().as_ref() {
        raf_id.set(Some(w.request_animation_frame(cb.as_ref().unchecked_ref())?));
    }
    Ok(())
}

fn tick(ts: f64) {
    let outcome = APP.with(|cell| {
        let mut guard = cell.borrow_mut();
        let app = guard.as_mut()?;
        let dt = app.last_ts.map_or(0.0, |last| (ts - last).clamp(0.0, MAX_FRAME_MS));
        app.last_ts = Some(ts);
        let outcome = app.session.borrow_mut().frame(dt);
        render(app);
        outcome
    });
    if let Some(outcome) = outcome {
        handle_outcome(outcome);
    }
}

fn handle_outcome(outcome: LevelOutcome) {
    let LevelOutcome::Finished(ticket) = outcome else {
        return;
    };
    let handles = APP.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|app| (app.session.clone(), app.generator.clone()))
    });
    if let Some((session, generator)) = handles {
        wasm_bindgen_futures::spawn_local(session::run_reward(session, generator, ticket));
    }
}

fn with_session<R>(f: impl FnOnce(&mut Session, &HtmlCanvasElement) -> R) -> Option<R> {
    APP.with(|cell| {
        let guard = cell.borrow();
        let app = guard.as_ref()?;
        let mut session = app.session.borrow_mut();
        Some(f(&mut session, &app.canvas))
    })
}

fn dispatch(input: &Input) {
    if let Some(Some(outcome)) = with_session(|s, _| s.input(input)) {
        handle_outcome(outcome);
    }
}

/// Enter or click on a non-playing screen.
fn screen_action(session: &mut Session) {
    let result = match session.phase() {
        SessionPhase::Intro => session.start(),
        SessionPhase::Transitioning(_) => session.confirm_transition(),
        SessionPhase::Reward => {
            session.restart();
            Ok(())
        }
        _ => Ok(()),
    };
    if let Err(err) = result {
        tracing::debug!(%err, "screen action ignored");
    }
}

fn map_key(key: &str) -> Option<Key> {
    match key {
        "ArrowLeft" => Some(Key::Left),
        "ArrowRight" => Some(Key::Right),
        "Enter" => Some(Key::Enter),
        "Backspace" => Some(Key::Backspace),
        " " => Some(Key::Space),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Key::Char(c)),
                _ => None,
            }
        }
    }
}

fn on_key(evt: &KeyboardEvent, pressed: bool) {
    let Some(key) = map_key(&evt.key()) else {
        return;
    };
    let playing = with_session(|s, _| matches!(s.phase(), SessionPhase::Playing(_))).unwrap_or(false);
    if !playing {
        if pressed && key == Key::Enter {
            with_session(|s, _| screen_action(s));
        }
        return;
    }
    // Held keys repeat keydown; only arrows care about being held.
    if evt.repeat() && !matches!(key, Key::Left | Key::Right) {
        return;
    }
    if matches!(key, Key::Space | Key::Left | Key::Right) {
        evt.prevent_default();
    }
    dispatch(&Input::Key { key, pressed });
}

/// Client coordinates to percentages of the canvas box.
fn to_pct(client_x: f64, client_y: f64, left: f64, top: f64, width: f64, height: f64) -> (f64, f64) {
    (
        (client_x - left) / width.max(1.0) * 100.0,
        (client_y - top) / height.max(1.0) * 100.0,
    )
}

fn pointer_pct(evt: &PointerEvent, canvas: &HtmlCanvasElement) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    to_pct(
        f64::from(evt.client_x()),
        f64::from(evt.client_y()),
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height(),
    )
}

fn on_pointer_down(evt: &PointerEvent) {
    let outcome = with_session(|s, canvas| {
        if matches!(s.phase(), SessionPhase::Playing(_)) {
            let (x, y) = pointer_pct(evt, canvas);
            s.pointer_down(x, y)
        } else {
            screen_action(s);
            None
        }
    });
    if let Some(Some(outcome)) = outcome {
        handle_outcome(outcome);
    }
}

fn on_pointer_move(evt: &PointerEvent) {
    let input = with_session(|_, canvas| {
        let (x_pct, y_pct) = pointer_pct(evt, canvas);
        Input::Pointer { x_pct, y_pct }
    });
    if let Some(input) = input {
        dispatch(&input);
    }
}

// --- Screens -----------------------------------------------------------------

fn render(app: &AppState) {
    let ctx = &app.ctx;
    let w = f64::from(app.canvas.width());
    let h = f64::from(app.canvas.height());
    let session = app.session.borrow();
    let cx = w / 2.0;

    match session.phase() {
        SessionPhase::Intro => {
            paint::clear(ctx, w, h);
            paint::heart(ctx, cx, h * 0.3, 30.0, paint::ACCENT);
            paint::centered_text(ctx, "Felices 8 Meses", cx, h * 0.5, "bold 24px sans-serif", paint::TEXT);
            paint::centered_text(ctx, "JUGAR", cx, h * 0.75, "bold 18px sans-serif", paint::ACCENT);
        }
        SessionPhase::Transitioning(_) => {
            let level = session.current_level();
            paint::clear(ctx, w, h);
            paint::centered_text(ctx, &format!("NIVEL {}", level.id), cx, h * 0.2, "bold 14px monospace", paint::MUTED);
            paint::centered_text(ctx, level.name, cx, h * 0.35, "bold 20px sans-serif", paint::TEXT);
            paint::paragraph(ctx, level.instruction, cx, h * 0.5, 18.0, "14px sans-serif", paint::TEXT);
            paint::centered_text(ctx, "JUGAR", cx, h * 0.8, "bold 18px sans-serif", paint::ACCENT);
        }
        SessionPhase::Playing(_) => {
            let Some(game) = session.active_game() else {
                return;
            };
            game.draw(ctx, w, h);
            let level = session.current_level();
            ctx.set_font("bold 11px monospace");
            ctx.set_fill_style_str(paint::MUTED);
            ctx.set_text_align("left");
            ctx.fill_text(&format!("LVL {}", level.id), 8.0, 16.0).ok();
            ctx.set_text_align("right");
            ctx.fill_text(&format!("MES {}", level.id), w - 8.0, 16.0).ok();
            paint::centered_text(ctx, &game.status(), cx, 16.0, "bold 11px monospace", paint::TEXT);
        }
        SessionPhase::Reward => {
            let state = session.state();
            paint::clear(ctx, w, h);
            paint::heart(ctx, cx, h * 0.15, 20.0, paint::ACCENT);
            if state.reward_loading {
                paint::centered_text(ctx, "Escribiendo carta...", cx, h * 0.5, "italic 14px sans-serif", paint::MUTED);
            } else {
                paint::paragraph(ctx, &state.reward_text, cx, h * 0.3, 20.0, "14px serif", paint::TEXT);
            }
            paint::centered_text(ctx, "REINICIAR", cx, h * 0.9, "bold 16px sans-serif", paint::ACCENT);
        }
        SessionPhase::GameOver => paint::clear(ctx, w, h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        assert_eq!(map_key("ArrowLeft"), Some(Key::Left));
        assert_eq!(map_key(" "), Some(Key::Space));
        assert_eq!(map_key("8"), Some(Key::Char('8')));
        assert_eq!(map_key("ñ"), Some(Key::Char('ñ')));
        assert_eq!(map_key("Shift"), None);
        assert_eq!(map_key(""), None);
    }

    #[test]
    fn test_to_pct_maps_canvas_box() {
        assert_eq!(to_pct(160.0, 220.0, 10.0, 20.0, 300.0, 400.0), (50.0, 50.0));
        assert_eq!(to_pct(10.0, 20.0, 10.0, 20.0, 300.0, 400.0), (0.0, 0.0));
        assert_eq!(to_pct(5.0, 5.0, 0.0, 0.0, 0.0, 0.0), (500.0, 500.0));
    }

    #[test]
    fn test_screen_action_restarts_while_letter_loads() {
        use crate::effects::RecordingEffects;

        let mut s = Session::new(Rc::new(RecordingEffects::default()), SmallRng::seed_from_u64(5));
        screen_action(&mut s);
        for _ in 0..8 {
            screen_action(&mut s);
            s.complete_level().unwrap();
        }
        assert_eq!(s.phase(), SessionPhase::Reward);
        assert!(s.state().reward_loading);

        screen_action(&mut s);
        assert_eq!(s.phase(), SessionPhase::Intro);
        assert!(!s.state().reward_loading);
    }
}
