use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use arboard::Clipboard;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tray_icon::menu::{AboutMetadataBuilder, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIconBuilder, TrayIconEvent};
use whisprer::config_ext::ConfigExt;
use whisprer::event::AppEvent;
use whisprer::icon::StateIcon;
use whisprer::notify::{NotificationLayer, notify};
use whisprer::session::SessionCoordinator;
use whisprer::sink::{ClipboardSink, ConsoleSink, EventLoopSink};
use whisprer::{
    APP_NAME, APP_NAME_PRETTY, ConfigManager, DEFAULT_LOG_LEVEL, RemoteClient, RemoteConfig,
    SessionSink, SessionState, VERSION,
};

fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WHISPRER_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .finish()
        .with(NotificationLayer::new())
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config)?;

    // Set up hotkey
    let hotkey = config.hotkey();
    let hotkey_manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
    hotkey_manager
        .register(hotkey)
        .context("Failed to register hotkey")?;

    let mut clipboard = Clipboard::new()?;

    // Create the tray menu
    let tray_menu = Menu::new();
    let menu_toggle = MenuItem::new("Start recording", true, None);
    let menu_copy_config = MenuItem::new("Copy config path", true, None);
    let menu_quit = MenuItem::new("Quit", true, None);
    tray_menu.append_items(&[
        // the name of the app
        &MenuItem::new(APP_NAME_PRETTY, false, None),
        &PredefinedMenuItem::separator(),
        &menu_toggle,
        &PredefinedMenuItem::separator(),
        &PredefinedMenuItem::about(
            None,
            Some(
                AboutMetadataBuilder::new()
                    .version(Some(VERSION.to_owned()))
                    .build(),
            ),
        ),
        &menu_copy_config,
        &PredefinedMenuItem::separator(),
        &menu_quit,
    ])?;

    // Set up the event loop
    let mut icon_tray = None;

    let menu_channel = MenuEvent::receiver();
    let tray_channel = TrayIconEvent::receiver();
    let hotkey_channel = GlobalHotKeyEvent::receiver();

    let event_loop: EventLoop<AppEvent> = EventLoopBuilder::with_user_event().build();
    let event_sender = event_loop.create_proxy();

    // Result sinks: console always, clipboard when auto_copy is on, and
    // the event loop feeding the tray adapter.
    let mut sinks: Vec<Arc<dyn SessionSink>> = vec![Arc::new(ConsoleSink)];
    if config.auto_copy {
        match ClipboardSink::new() {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => warn!("Clipboard unavailable, transcripts will not be copied: {e}"),
        }
    }
    sinks.push(Arc::new(EventLoopSink::new(event_sender)));

    let mut remote_config = RemoteConfig::new(config.api_key().unwrap_or_default());
    if let Some(endpoint) = config.endpoint() {
        remote_config = remote_config.with_endpoint(endpoint);
    }
    let transcriber = Arc::new(RemoteClient::new(remote_config)?);

    let recordings_dir = env::temp_dir().join(APP_NAME);
    let mut coordinator = SessionCoordinator::new(transcriber, sinks, recordings_dir)?;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::NewEvents(StartCause::Init) = event {
            // We create the icon once the event loop is actually running
            // to prevent issues like https://github.com/tauri-apps/tray-icon/issues/90

            icon_tray.replace(
                TrayIconBuilder::new()
                    .with_menu(Box::new(tray_menu.clone()))
                    .with_tooltip("whisprer - speech to text")
                    .with_icon(SessionState::Idle.icon())
                    .build()
                    .unwrap(),
            );

            // We have to request a redraw here to have the icon actually show up.
            // Tao only exposes a redraw method on the Window so we use core-foundation directly.
            #[cfg(target_os = "macos")]
            unsafe {
                use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};

                let rl = CFRunLoopGetMain();
                CFRunLoopWakeUp(rl);
            }

            info!("Whisprer ready");
        }

        if let Ok(event) = menu_channel.try_recv() {
            if event.id == menu_quit.id() {
                coordinator.shutdown();
                icon_tray.take();
                *control_flow = ControlFlow::Exit;
            } else if event.id == menu_toggle.id() {
                coordinator.toggle();
            } else if event.id == menu_copy_config.id() {
                if let Err(e) =
                    clipboard.set_text(config_manager.config_path().to_string_lossy().into_owned())
                {
                    error!("Failed to copy config path to clipboard: {e}");
                }
            }
        }

        #[expect(clippy::redundant_pattern_matching)]
        if let Ok(_) = tray_channel.try_recv() {
            // Handle tray icon events
        }

        // Handle session outcomes forwarded by the event loop sink
        if let Event::UserEvent(event) = event {
            match event {
                AppEvent::StateChanged(state) => {
                    icon_tray.as_ref().map(|i| i.set_icon(Some(state.icon())));
                    menu_toggle.set_text(match state {
                        SessionState::Idle => "Start recording",
                        SessionState::Recording => "Stop recording",
                        SessionState::Transcribing => "Transcribing...",
                    });
                }
                AppEvent::TranscriptReady(text) => {
                    notify("Transcript ready", &text);
                }
                AppEvent::Status(message) => {
                    notify(&message, "");
                }
            };
        }

        // Handle hotkey events
        if let Ok(event) = hotkey_channel.try_recv() {
            if event.id() == hotkey.id() && event.state() == HotKeyState::Pressed {
                coordinator.toggle();
            }
        }
    });
}
