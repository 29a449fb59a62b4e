use std::path::Path;
use std::sync::LazyLock;

use crate::SessionState;

const COLOR_RECORDING: (u8, u8, u8) = (255, 59, 48);
const COLOR_TRANSCRIBING: (u8, u8, u8) = (255, 204, 0);
pub const ICON_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/icon.png");

static ICON_IDLE: LazyLock<tray_icon::Icon> = LazyLock::new(|| load_icon(ICON_PATH, None));
static ICON_RECORDING: LazyLock<tray_icon::Icon> =
    LazyLock::new(|| load_icon(ICON_PATH, Some(COLOR_RECORDING)));
static ICON_TRANSCRIBING: LazyLock<tray_icon::Icon> =
    LazyLock::new(|| load_icon(ICON_PATH, Some(COLOR_TRANSCRIBING)));

/// Tray icon shown for each session state.
pub trait StateIcon {
    fn icon(&self) -> tray_icon::Icon;
}

impl StateIcon for SessionState {
    fn icon(&self) -> tray_icon::Icon {
        match self {
            SessionState::Idle => ICON_IDLE.clone(),
            SessionState::Recording => ICON_RECORDING.clone(),
            SessionState::Transcribing => ICON_TRANSCRIBING.clone(),
        }
    }
}

fn load_icon(path: impl AsRef<Path>, recolor: Option<(u8, u8, u8)>) -> tray_icon::Icon {
    let (icon_rgba, icon_width, icon_height) = {
        let mut image = image::open(path)
            .expect("Failed to open icon path")
            .into_rgba8();

        if let Some((r, g, b)) = recolor {
            for pixel in image.pixels_mut() {
                pixel[0] = r;
                pixel[1] = g;
                pixel[2] = b;
            }
        }

        let (width, height) = image.dimensions();
        let rgba = image.into_raw();
        (rgba, width, height)
    };
    tray_icon::Icon::from_rgba(icon_rgba, icon_width, icon_height).expect("Failed to open icon")
}
