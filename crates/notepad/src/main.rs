use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};
use log::LevelFilter;
use notepad::{dialog::TerminalDialogs, session::APP_TITLE, ui, App};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{env, io, path::PathBuf, time::Instant};

#[tokio::main]
async fn main() -> Result<()> {
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("notepad", LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = enable_raw_mode() {
        eprintln!("Failed to initialize the terminal: {}", e);
        return Err(e.into());
    }
    // Ctrl+Shift+S is only distinguishable from Ctrl+S with enhanced key reporting.
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal(enhanced_keys);
        original_hook(panic_info);
    }));

    let mut stdout = io::stdout();
    if let Err(e) = execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        SetTitle(APP_TITLE)
    ) {
        let _ = disable_raw_mode();
        eprintln!("Failed to configure the terminal: {}", e);
        return Err(e.into());
    }
    if enhanced_keys {
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        );
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let args: Vec<String> = env::args().collect();
    let mut app = App::new().await;
    log::info!("Application initialized successfully");

    if let Some(arg) = args.get(1) {
        app.open_initial_file(&PathBuf::from(arg)).await;
    } else {
        log::info!("No file specified, starting with empty buffer");
    }

    app.start(Instant::now());
    let res = run_app(&mut terminal, app).await;

    restore_terminal(enhanced_keys)?;

    if let Err(err) = res {
        log::error!("Application error: {:#}", err);
        eprintln!("Notepad stopped because of an error: {:#}", err);
        return Err(err);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        // The last frame doubles as the backdrop for any dialog opened this turn.
        let drawn = match terminal.draw(|f| ui::draw(f, &mut app)) {
            Ok(frame) => Some(frame.buffer.clone()),
            Err(e) => {
                log::error!("Terminal draw error: {}", e);
                None
            }
        };
        let backdrop = drawn.unwrap_or_else(|| terminal.current_buffer_mut().clone());

        app.update_status();

        if app.should_quit() {
            log::info!("Application shutdown requested");
            break;
        }

        if event::poll(app.poll_timeout(Instant::now()))? {
            let event = event::read()?;
            let mut dialogs = TerminalDialogs::new(terminal, backdrop);
            let result = match event {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    app.handle_key_event(key, &mut dialogs).await
                }
                Event::Paste(text) => app.handle_paste(text, &mut dialogs).await,
                Event::Resize(width, height) => {
                    log::debug!("Terminal resized to {}x{}", width, height);
                    Ok(())
                }
                _ => Ok(()),
            };
            if let Err(e) = result {
                log::error!("Event handling error: {:#}", e);
                app.status.set_error(format!("Error: {}", e));
            }
        }

        if let Err(e) = app.on_tick(Instant::now()).await {
            log::error!("Autosave error: {:#}", e);
        }
    }

    log::info!("Application loop ended successfully");
    Ok(())
}

/// Restore terminal to normal state
fn restore_terminal(enhanced_keys: bool) -> Result<()> {
    let mut stdout = io::stdout();
    if enhanced_keys {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen)?;
    let _ = execute!(stdout, crossterm::cursor::Show);
    Ok(())
}
