//! JsPlayground - the playground handle exposed to JavaScript.

use jcdn_browser::PlaygroundApp;
use jcdn_core::{NavigationKey, PlaygroundConfig, SourceKind};
use tracing::Level;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlIFrameElement};

use crate::init_logging;

/// Start the playground.
///
/// `root` contains the editor hosts (`[data-mode]` elements with a
/// `<textarea>`), `preview` is the iframe the output renders into. `config`
/// is an optional plain object; missing fields take their defaults.
#[wasm_bindgen(js_name = startPlayground)]
pub fn start_playground(
    root: &Element,
    preview: HtmlIFrameElement,
    config: JsValue,
) -> Result<JsPlayground, JsError> {
    let config: PlaygroundConfig = if config.is_undefined() || config.is_null() {
        PlaygroundConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    init_logging(level);
    tracing::info!(namespace = %config.namespace, "starting playground");

    let app = PlaygroundApp::start(root, preview, config)?;
    Ok(JsPlayground { app })
}

/// A running playground.
#[wasm_bindgen]
pub struct JsPlayground {
    app: PlaygroundApp,
}

#[wasm_bindgen]
impl JsPlayground {
    /// Select the editor at `index` and focus it. Returns false for an
    /// out-of-range index.
    #[wasm_bindgen(js_name = selectEditor)]
    pub fn select_editor(&self, index: u32) -> Result<bool, JsError> {
        let result = self
            .app
            .playground()
            .borrow_mut()
            .select_editor(index as usize);
        Ok(result?)
    }

    /// Apply a `KeyboardEvent.key` value. Returns true if the selection moved.
    #[wasm_bindgen(js_name = switchEditor)]
    pub fn switch_editor(&self, key: &str) -> Result<bool, JsError> {
        let Some(key) = NavigationKey::from_key(key) else {
            return Ok(false);
        };
        let result = self.app.playground().borrow_mut().switch_editor(key);
        Ok(result?)
    }

    #[wasm_bindgen(js_name = selectedEditor)]
    pub fn selected_editor(&self) -> u32 {
        self.app.playground().borrow().selected() as u32
    }

    /// Current text for `html`, `css` or `javascript`.
    #[wasm_bindgen]
    pub fn text(&self, kind: &str) -> Option<String> {
        let kind = SourceKind::from_storage_key(kind)?;
        self.app
            .playground()
            .borrow()
            .text(kind)
            .map(str::to_owned)
    }

    #[wasm_bindgen(js_name = isPreviewReady)]
    pub fn is_preview_ready(&self) -> bool {
        self.app.playground().borrow().is_bootstrapped()
    }
}
