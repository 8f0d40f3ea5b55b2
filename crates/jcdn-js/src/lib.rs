//! WASM bindings for the jcdn live code playground.
//!
//! The page calls `startPlayground(root, preview, config?)` once; everything
//! after that is driven by editor and keyboard events.

mod playground;

pub use playground::*;

use tracing::Level;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Route `tracing` output to the browser console. Only the first call
/// installs a subscriber.
fn init_logging(max_level: Level) {
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(max_level)
            .build(),
    );
    let _ = set_global_default(Registry::default().with(wasm_layer));
}
