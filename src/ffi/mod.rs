pub mod browser;
pub mod trashpack;

pub use self::{
    browser::{BrowserPlatform, InjectedWallet},
    trashpack::TrashpackWallet,
};
use crate::{AdapterConfig, WalletAdapter};
use wasm_bindgen::JsValue;

/// decode the [`AdapterConfig`] from a JS object, missing fields keep their
/// default value
pub fn config_from_js(config: JsValue) -> Result<AdapterConfig, serde_wasm_bindgen::Error> {
    if config.is_undefined() || config.is_null() {
        return Ok(AdapterConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
}

/// Create the adapter for the current page and start looking for the
/// extension in the background.
///
/// Listen to [`AdapterEventKind::ReadyStateChange`] to know when the wallet
/// is detected.
///
/// [`AdapterEventKind::ReadyStateChange`]: crate::AdapterEventKind::ReadyStateChange
pub fn trashpack_adapter(config: AdapterConfig) -> WalletAdapter<BrowserPlatform> {
    let adapter = WalletAdapter::with_config(BrowserPlatform, config);

    let detecting = adapter.clone();
    wasm_bindgen_futures::spawn_local(async move {
        detecting.detect().await;
    });

    adapter
}
