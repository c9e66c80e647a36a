//! Konami egg entry point
//!
//! Platform glue only: canvas and overlay DOM wiring, normalization of
//! keyboard / pointer / on-screen-button events into the shell's token
//! stream, and the animation-frame driver. All gameplay lives in the
//! library crate.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement,
        KeyboardEvent, MouseEvent, PointerEvent, TouchEvent,
    };

    use konami_egg::draw::{DrawCmd, Rgba, TextAlign, TextBaseline};
    use konami_egg::layout::Viewport;
    use konami_egg::shell::{ModeKind, Shell, ShellEvent};
    use konami_egg::sim::Dir;

    /// Application state shared by every event listener
    struct App {
        shell: Shell,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        /// One-shot restart trigger, armed shortly after the terminal
        /// overlay appears so the key that ended the game cannot
        /// immediately restart it
        restart_armed: bool,
    }

    impl App {
        /// Press path shared by keyboard and on-screen buttons
        fn press_token(&mut self, key: &str) {
            let token = key.to_lowercase();
            self.shell.handle_token(&token, now_ms());
            match token.as_str() {
                "arrowleft" => self.shell.hold_paddle(Dir::Left, true),
                "arrowright" => self.shell.hold_paddle(Dir::Right, true),
                _ => {}
            }
        }

        fn release_token(&mut self, key: &str) {
            match key.to_lowercase().as_str() {
                "arrowleft" => self.shell.hold_paddle(Dir::Left, false),
                "arrowright" => self.shell.hold_paddle(Dir::Right, false),
                _ => {}
            }
        }

        /// Consume the armed restart trigger if there is one
        fn try_restart(&mut self) -> bool {
            if self.restart_armed && self.shell.is_terminal() {
                self.restart_armed = false;
                self.shell.restart();
                true
            } else {
                false
            }
        }
    }

    fn now_ms() -> f64 {
        js_sys::Date::now()
    }

    fn window() -> web_sys::Window {
        web_sys::window().expect("no window")
    }

    fn document() -> Document {
        window().document().expect("no document")
    }

    fn window_viewport() -> Viewport {
        let w = window();
        let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
        let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
        Viewport::new(width as f32, height as f32)
    }

    fn css_color(c: Rgba) -> String {
        format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("failed to init logger");

        log::info!("konami-egg starting...");

        let document = document();
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let viewport = window_viewport();
        canvas.set_width(viewport.width as u32);
        canvas.set_height(viewport.height as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .expect("get_context failed")
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        // The banner prefers the page font for native text rendering;
        // wait briefly for it but never block on a slow load
        if !ensure_font_loaded(&document).await {
            log::warn!("banner font not detected, using fallback rendering");
        }

        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App {
            shell: Shell::new(viewport, seed),
            canvas: canvas.clone(),
            ctx,
            restart_armed: false,
        }));

        log::info!("initialized with seed {seed}, viewport {viewport:?}");

        setup_keyboard(app.clone());
        setup_buttons(app.clone());
        setup_pointer_paddle(app.clone());
        setup_resize(app.clone());

        request_animation_frame(app);

        log::info!("konami-egg running!");
    }

    /// Check the banner font against the font API with bounded
    /// polling. Purely cosmetic: a miss just means fallback glyphs.
    async fn ensure_font_loaded(document: &Document) -> bool {
        let fonts = document.fonts();
        let font_spec = "12px \"Nothing\"";

        let _ = wasm_bindgen_futures::JsFuture::from(fonts.load(font_spec)).await;
        if fonts.check(font_spec).unwrap_or(false) {
            return true;
        }
        for _ in 0..6 {
            delay_ms(100).await;
            if fonts.check(font_spec).unwrap_or(false) {
                return true;
            }
        }
        false
    }

    async fn delay_ms(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut app = app.borrow_mut();
                if app.try_restart() {
                    return;
                }
                let key = event.key();
                // Keep arrow keys from scrolling the page while a game
                // is consuming them
                if app.shell.mode_kind() != ModeKind::Banner
                    && key.starts_with("Arrow")
                {
                    event.prevent_default();
                }
                app.press_token(&key);
            });
            let _ = window()
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().release_token(&event.key());
            });
            let _ = window()
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Resolve an event to the on-screen button that owns its target
    fn pressed_button(event: &web_sys::Event) -> Option<(HtmlElement, String)> {
        let target = event.target()?.dyn_into::<Element>().ok()?;
        let button = target.closest("[data-key]").ok()??;
        let key = button.get_attribute("data-key")?;
        let el = button.dyn_into::<HtmlElement>().ok()?;
        Some((el, key))
    }

    /// One document-level handler pair for all on-screen buttons. Touch
    /// devices get touch events so a tap does not also fire a
    /// synthesized click; everything else uses pointer events. The
    /// sequence detector additionally debounces whatever slips through.
    fn setup_buttons(app: Rc<RefCell<App>>) {
        let document = document();
        let touch_capable = window().navigator().max_touch_points() > 0;

        if touch_capable {
            {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    let mut app = app.borrow_mut();
                    if app.try_restart() {
                        return;
                    }
                    let Some((el, key)) = pressed_button(&event) else {
                        return;
                    };
                    event.prevent_default();
                    let _ = el.class_list().add_1("pressed");
                    app.press_token(&key);
                });
                let _ = document.add_event_listener_with_callback(
                    "touchstart",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
            {
                let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                    let Some((el, key)) = pressed_button(&event) else {
                        return;
                    };
                    event.prevent_default();
                    let _ = el.class_list().remove_1("pressed");
                    app.borrow_mut().release_token(&key);
                });
                let _ = document.add_event_listener_with_callback(
                    "touchend",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
        } else {
            {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                    if event.pointer_type() == "mouse" && event.button() != 0 {
                        return;
                    }
                    let mut app = app.borrow_mut();
                    if app.try_restart() {
                        return;
                    }
                    let Some((el, key)) = pressed_button(&event) else {
                        return;
                    };
                    let _ = el.class_list().add_1("pressed");
                    app.press_token(&key);
                });
                let _ = document.add_event_listener_with_callback(
                    "pointerdown",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
            {
                let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                    let Some((el, key)) = pressed_button(&event) else {
                        return;
                    };
                    let _ = el.class_list().remove_1("pressed");
                    app.borrow_mut().release_token(&key);
                });
                let _ = document.add_event_listener_with_callback(
                    "pointerup",
                    closure.as_ref().unchecked_ref(),
                );
                closure.forget();
            }
        }
    }

    /// Absolute paddle control from the mouse while breakout runs
    fn setup_pointer_paddle(app: Rc<RefCell<App>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let mut app = app.borrow_mut();
            if app.shell.mode_kind() != ModeKind::Breakout {
                return;
            }
            let rect = app.canvas.get_bounding_client_rect();
            let x = event.client_x() as f32 - rect.left() as f32;
            app.shell.pointer_paddle(x);
        });
        let _ = document()
            .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut app = app.borrow_mut();
            let viewport = window_viewport();
            app.canvas.set_width(viewport.width as u32);
            app.canvas.set_height(viewport.height as u32);
            app.shell.resize(viewport);
        });
        let _ =
            window().add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window().request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, _time: f64) {
        let events = {
            let mut a = app.borrow_mut();
            a.shell.update(now_ms());
            let cmds = a.shell.draw();
            render(&a.ctx, &a.canvas, &cmds);
            a.shell.drain_events()
        };

        if !events.is_empty() {
            let (canvas, narrow) = {
                let a = app.borrow();
                (a.canvas.clone(), a.shell.viewport().is_narrow())
            };
            apply_events(&document(), &canvas, narrow, &app, events);
        }

        request_animation_frame(app);
    }

    /// Replay the frame's draw list onto the 2d context
    fn render(ctx: &CanvasRenderingContext2d, canvas: &HtmlCanvasElement, cmds: &[DrawCmd]) {
        ctx.set_image_smoothing_enabled(false);
        for cmd in cmds {
            match cmd {
                DrawCmd::Clear { color } => {
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.fill_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
                }
                DrawCmd::FillRect { x, y, w, h, color } => {
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.fill_rect(*x as f64, *y as f64, *w as f64, *h as f64);
                }
                DrawCmd::FillCircle { cx, cy, r, color } => {
                    ctx.begin_path();
                    let _ = ctx.arc(*cx as f64, *cy as f64, *r as f64, 0.0, std::f64::consts::TAU);
                    ctx.set_fill_style_str(&css_color(*color));
                    ctx.fill();
                }
                DrawCmd::Text { text, x, y, px, align, baseline, color } => {
                    ctx.set_font(&format!("{px}px \"Nothing\", monospace"));
                    ctx.set_text_align(match align {
                        TextAlign::Left => "left",
                        TextAlign::Center => "center",
                    });
                    ctx.set_text_baseline(match baseline {
                        TextBaseline::Alphabetic => "alphabetic",
                        TextBaseline::Middle => "middle",
                    });
                    ctx.set_fill_style_str(&css_color(*color));
                    let _ = ctx.fill_text(text, *x as f64, *y as f64);
                }
            }
        }
    }

    fn apply_events(
        document: &Document,
        canvas: &HtmlCanvasElement,
        narrow: bool,
        app: &Rc<RefCell<App>>,
        events: Vec<ShellEvent>,
    ) {
        for event in events {
            match event {
                ShellEvent::ModeEntered(kind) => {
                    hide_overlay(document, canvas);
                    update_controls(document, kind);
                }
                ShellEvent::Terminal { message, color, score } => {
                    show_overlay(document, canvas, narrow, message, color, score);
                    arm_restart_later(app.clone());
                }
            }
        }
    }

    /// Arm the one-shot restart trigger after a short delay so the
    /// input that ended the game cannot restart it in the same breath
    fn arm_restart_later(app: Rc<RefCell<App>>) {
        let closure = Closure::once(move || {
            app.borrow_mut().restart_armed = true;
        });
        let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            500,
        );
        closure.forget();
    }

    fn styled(document: &Document, id: &str) -> Option<HtmlElement> {
        document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    }

    fn set_display(document: &Document, id: &str, value: &str) {
        if let Some(el) = styled(document, id) {
            let _ = el.style().set_property("display", value);
        }
    }

    fn show_overlay(
        document: &Document,
        canvas: &HtmlCanvasElement,
        narrow: bool,
        message: &str,
        color: Rgba,
        score: Option<u32>,
    ) {
        let _ = canvas.style().set_property("filter", "blur(10px)");
        set_display(document, "overlay", "flex");

        if let Some(el) = styled(document, "overlayText") {
            el.set_text_content(Some(message));
            let _ = el.style().set_property("color", &css_color(color));
        }
        if let Some(el) = styled(document, "overlaySubtext") {
            let subtext = score.map(|s| format!("Score: {s}")).unwrap_or_default();
            el.set_text_content(Some(&subtext));
        }
        if let Some(el) = styled(document, "overlayFooter") {
            el.set_text_content(Some(if narrow {
                "Tap screen to restart"
            } else {
                "Press any key to restart"
            }));
        }
        // The reward link only appears on a win
        if score.is_some() {
            set_display(document, "giftLink", "block");
        }
    }

    fn hide_overlay(document: &Document, canvas: &HtmlCanvasElement) {
        let _ = canvas.style().set_property("filter", "none");
        set_display(document, "overlay", "none");
        set_display(document, "giftLink", "none");
    }

    /// Swap the on-screen control panel to match the mode
    fn update_controls(document: &Document, kind: ModeKind) {
        let breakout = kind == ModeKind::Breakout;
        set_display(document, "virtualButtons", if breakout { "none" } else { "block" });
        set_display(document, "breakoutButtons", if breakout { "block" } else { "none" });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("konami-egg (native) starting...");
    log::info!("the interactive build targets wasm32; running the headless smoke scenario");

    println!("\nRunning smoke scenario...");
    smoke_scenario();
}

#[cfg(not(target_arch = "wasm32"))]
fn smoke_scenario() {
    use konami_egg::layout::Viewport;
    use konami_egg::sequence::KONAMI_TOKENS;
    use konami_egg::shell::{ModeKind, Shell};

    let mut shell = Shell::new(Viewport::new(1280.0, 900.0), 42);
    let mut t = 0.0;
    for tok in KONAMI_TOKENS {
        shell.handle_token(tok, t);
        t += 100.0;
    }
    assert_eq!(shell.mode_kind(), ModeKind::Snake, "konami must start snake");

    shell.update(t);
    for _ in 0..50 {
        t += 100.0;
        shell.update(t);
    }
    let game = shell.active_snake().expect("snake active");
    println!(
        "✓ snake running: {} collectibles, length {}",
        game.total_dots(),
        game.len()
    );
}
