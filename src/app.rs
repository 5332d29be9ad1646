use crate::config::{Config, RendererMode};
use crate::emitter::EmitterKind;
use crate::render::{AsciiRenderer, Frame, HalfBlockRenderer, Renderer};
use crate::session::{Session, SessionError};
use crate::surface::Canvas;
use crate::terminal::TerminalGuard;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Modal state layered over the canvas. While anything modal is up the
/// animation timer does not fire, the way a blocking dialog would stall it.
#[derive(Debug, Default)]
struct Ui {
    notice: Option<String>,
    prompt: Option<String>,
    show_help: bool,
    show_status: bool,
}

impl Ui {
    fn is_modal(&self) -> bool {
        self.notice.is_some() || self.prompt.is_some()
    }

    /// Pasted text only lands in an open prompt; elsewhere it is dropped so
    /// it cannot trigger bindings.
    fn paste(&mut self, text: &str) {
        if let Some(buf) = self.prompt.as_mut() {
            buf.extend(text.chars().filter(|c| !c.is_control()));
        } else {
            log::debug!("ignored paste of {} bytes outside the open prompt", text.len());
        }
    }

    fn report(&mut self, err: &SessionError) {
        log::warn!("{err}");
        self.notice = Some(format!(
            "{}\n{}\n\npress any key",
            err.severity().title(),
            err
        ));
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
    };
    let (px_w_mul, px_h_mul) = cfg.renderer.pixels_per_cell();

    let mut session = Session::new(fastrand::Rng::new())
        .with_cell_size(cfg.cell_size)
        .with_respawn(cfg.shooting_respawn)
        .with_params(cfg.spike_params())
        .with_style(cfg.style);

    let mut ui = Ui {
        show_status: true,
        ..Ui::default()
    };

    let mut last_size = TerminalGuard::size()?;
    if last_size.1 < 4 || last_size.0 < 8 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 8x4, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }
    let mut hud_rows = hud_rows_for(last_size, ui.show_status);
    let (cw, ch) = canvas_size(last_size, hud_rows, px_w_mul, px_h_mul);
    let mut canvas = Canvas::new(cw, ch);

    if let Some(path) = &cfg.image {
        match session.load_image_file(path, &mut canvas) {
            Ok(()) if cfg.autostart => {
                if let Err(err) = session.start(Instant::now()) {
                    ui.report(&err);
                }
            }
            Ok(()) => {}
            Err(err) => ui.report(&err),
        }
    }

    let period = Duration::from_millis(cfg.tick_ms.max(1));
    let mut pixels: Vec<u8> = Vec::new();
    log::info!(
        "front-end up: {}x{} terminal, renderer {}, tick {}ms",
        last_size.0,
        last_size.1,
        renderer.name(),
        period.as_millis()
    );

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking).
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let old_status = ui.show_status;
                    if handle_key(k.code, k.modifiers, &mut session, &mut canvas, &mut ui) {
                        log::info!("quit requested");
                        return Ok(());
                    }
                    if ui.show_status != old_status {
                        hud_rows = hud_rows_for(last_size, ui.show_status);
                        let (w, h) = canvas_size(last_size, hud_rows, px_w_mul, px_h_mul);
                        canvas.resize(w, h);
                    }
                }
                Event::Paste(text) => ui.paste(&text),
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    hud_rows = hud_rows_for(last_size, ui.show_status);
                    let (w, h) = canvas_size(last_size, hud_rows, px_w_mul, px_h_mul);
                    canvas.resize(w, h);
                }
                _ => {}
            }
        }

        if session.is_running() && !ui.is_modal() {
            let t = session.elapsed(now);
            let report = session.tick(t, &mut canvas);
            log::trace!(
                "frame {}: drew {} cells, skipped {}, {} spikes",
                report.frame,
                report.drawn,
                report.skipped,
                report.emitters
            );
        }

        let (term_cols, term_rows) = last_size;
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);
        canvas.rasterize(&mut pixels);

        let hud = if ui.show_status {
            build_hud(&session)
        } else {
            String::new()
        };
        let prompt_text = ui.prompt.as_ref().map(|buf| prompt_popup_text(buf));
        let overlay = if let Some(text) = &ui.notice {
            Some(text.as_str())
        } else if let Some(text) = &prompt_text {
            Some(text.as_str())
        } else if ui.show_help {
            Some(help_popup_text())
        } else {
            None
        };

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width: canvas.width() as usize,
            pixel_height: canvas.height() as usize,
            pixels_rgba: &pixels,
            hud: &hud,
            hud_rows,
            overlay,
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;

        // Fixed period; a slow tick is followed immediately by the next one.
        let elapsed = now.elapsed();
        if elapsed < period {
            std::thread::sleep(period - elapsed);
        }
    }
}

fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    session: &mut Session,
    canvas: &mut Canvas,
    ui: &mut Ui,
) -> bool {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return true;
    }

    if ui.notice.take().is_some() {
        return false;
    }

    if let Some(buf) = ui.prompt.as_mut() {
        match code {
            KeyCode::Esc => ui.prompt = None,
            KeyCode::Enter => {
                let path = prompt_path(buf);
                ui.prompt = None;
                if path.as_os_str().is_empty() {
                    return false;
                }
                if let Err(err) = session.load_image_file(&path, canvas) {
                    ui.report(&err);
                }
            }
            KeyCode::Backspace => {
                buf.pop();
            }
            KeyCode::Char(c) => buf.push(c),
            _ => {}
        }
        return false;
    }

    let spike = |kind: EmitterKind, session: &mut Session, ui: &mut Ui| {
        if let Err(err) = session.generate_spikes(kind) {
            ui.report(&err);
        }
    };

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char('1') => spike(EmitterKind::Spiral, session, ui),
        KeyCode::Char('2') => spike(EmitterKind::Shooting, session, ui),
        KeyCode::Char('3') => spike(EmitterKind::Orbit, session, ui),
        KeyCode::Char('4') => spike(EmitterKind::Bounce, session, ui),
        KeyCode::Tab | KeyCode::Right => session.set_style(session.style().next()),
        KeyCode::BackTab | KeyCode::Left => session.set_style(session.style().prev()),
        KeyCode::Up => session.params_mut().nudge_intensity(1),
        KeyCode::Down => session.params_mut().nudge_intensity(-1),
        KeyCode::Char(']') => session.params_mut().nudge_radius(1),
        KeyCode::Char('[') => session.params_mut().nudge_radius(-1),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Enter => {
            if let Err(err) = session.start(Instant::now()) {
                ui.report(&err);
            }
        }
        KeyCode::Char('x') | KeyCode::Char('X') => session.stop(canvas),
        KeyCode::Char('c') | KeyCode::Char('C') => session.clear_spikes(),
        KeyCode::Char('o') | KeyCode::Char('O') => {
            ui.show_help = false;
            ui.prompt = Some(String::new());
        }
        KeyCode::Char('i') | KeyCode::Char('I') => ui.show_status = !ui.show_status,
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => {
            ui.show_help = !ui.show_help;
        }
        _ => {}
    }
    false
}

fn hud_rows_for(size: (u16, u16), show_status: bool) -> u16 {
    if !show_status {
        return 0;
    }
    size.1.saturating_sub(1).min(2)
}

/// Canvas pixel size for the area above the HUD.
fn canvas_size(size: (u16, u16), hud_rows: u16, px_w_mul: usize, px_h_mul: usize) -> (u32, u32) {
    let (cols, rows) = size;
    let visual_rows = rows.saturating_sub(hud_rows).max(1);
    let w = (cols as usize).saturating_mul(px_w_mul);
    let h = (visual_rows as usize).saturating_mul(px_h_mul);
    (w as u32, h as u32)
}

fn build_hud(session: &Session) -> String {
    let params = session.params();
    let spikes = match session.emitters().kind() {
        Some(kind) => format!("{} x{}", kind.label(), session.emitters().len()),
        None => "none".to_string(),
    };
    format!(
        "{}\nStyle: {} | Spikes: {} | Int: {:.1} | Radius: {:.0} | {} | 1-4 spikes  tab style  s/x start/stop  c clear  o open  ? help  q quit",
        session.status(),
        session.style().label(),
        spikes,
        params.intensity,
        params.radius,
        if session.is_running() { "running" } else { "idle" },
    )
}

fn prompt_popup_text(buf: &str) -> String {
    format!("Open image\npath: {buf}_\n\njpg, jpeg, png, bmp, gif | enter load | esc cancel")
}

fn help_popup_text() -> &'static str {
    "Spike Art Hotkeys\n\
o  open image (type a path, enter to load)\n\
s / enter  start animation\n\
x  stop and restore the image\n\
1 / 2 / 3 / 4  spiral / shooting / orbit / bounce spikes\n\
c  clear spikes\n\
tab / right, shift-tab / left  next / previous style\n\
up / down  spike intensity (applies to new spikes)\n\
[ / ]  spike radius (applies to new spikes)\n\
i  show/hide status\n\
? / h / F1  toggle this help\n\
q or esc  quit"
}

/// Path typed or pasted into the open prompt. File managers often paste
/// quoted paths, so one layer of matching quotes is removed.
fn prompt_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| raw.strip_prefix(*q).and_then(|r| r.strip_suffix(*q)))
        .unwrap_or(raw);
    PathBuf::from(unquoted)
}
