use super::trashpack::{self, TrashpackWallet};
use crate::{
    error::ProviderError,
    event::{EventEmitter, Listener, ListenerId},
    solana::{SendOptions, Signature, Transaction, WalletIdentity},
    wallet::{
        Location, Platform, ProviderEvent, ProviderEventKind, WalletProvider,
        is_ios_redirectable,
    },
};
use js_sys::{Function, Uint8Array};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc, time::Duration};
use tracing::warn;
use url::Url;
use wasm_bindgen::{JsCast as _, JsValue, closure::Closure};
use wasm_bindgen_futures::JsFuture;

/// read `target[name]`, `None` if missing, `null` or `undefined`
fn property(target: &JsValue, name: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_null() && !value.is_undefined())
}

fn window() -> Option<JsValue> {
    property(&js_sys::global(), "window")
}

fn looks_like_trashpack(value: &JsValue) -> bool {
    if !value.is_object() {
        return false;
    }

    let has_function_property = |prop: &str| {
        property(value, prop)
            .map(|v| v.is_function())
            .unwrap_or(false)
    };

    has_function_property("connect")
        && has_function_property("disconnect")
        && has_function_property("signTransaction")
        && has_function_property("signAllTransactions")
        && has_function_property("signAndSendTransaction")
        && has_function_property("signMessage")
        && has_function_property("on")
        && has_function_property("off")
}

fn provider_error(error: JsValue) -> ProviderError {
    if let Some(message) = error.as_string() {
        return ProviderError {
            code: None,
            message,
        };
    }

    serde_wasm_bindgen::from_value(error.clone()).unwrap_or_else(|decode_error| {
        ProviderError::internal(format!(
            "Couldn't decode the error content: {decode_error} ({error:?})"
        ))
    })
}

fn identity(value: JsValue) -> Option<WalletIdentity> {
    if value.is_null() || value.is_undefined() {
        return None;
    }

    if let Some(encoded) = value.as_string() {
        return Some(WalletIdentity::Base58(encoded));
    }

    if value.is_instance_of::<Uint8Array>() {
        return Some(WalletIdentity::Bytes(Uint8Array::new(&value).to_vec()));
    }

    if let Some(to_bytes) = property(&value, "toBytes").and_then(|f| f.dyn_into::<Function>().ok())
    {
        match to_bytes.call0(&value) {
            Ok(bytes) => return Some(WalletIdentity::Bytes(Uint8Array::new(&bytes).to_vec())),
            Err(error) => warn!(?error, "publicKey.toBytes() failed"),
        }
    }

    // leave it to the normalization to reject what it can't read
    let raw = serde_wasm_bindgen::from_value(value).unwrap_or(serde_json::Value::Null);
    Some(WalletIdentity::Raw(raw))
}

fn provider_event(kind: ProviderEventKind, value: JsValue) -> ProviderEvent {
    match kind {
        ProviderEventKind::Disconnect => ProviderEvent::Disconnect,
        ProviderEventKind::AccountChanged => ProviderEvent::AccountChanged(identity(value)),
    }
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, ProviderError> {
    serde_wasm_bindgen::to_value(value).map_err(|error| {
        ProviderError::internal(format!("Couldn't encode the request: {error}"))
    })
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, ProviderError> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|error| ProviderError::internal(format!("Couldn't decode the {what}: {error}")))
}

/// [`WalletProvider`] over the wallet object injected in the page.
///
/// Listeners registered from Rust share a single JS callback per event.
#[derive(Clone)]
pub struct InjectedWallet {
    wallet: TrashpackWallet,
    events: Rc<EventEmitter<ProviderEvent>>,
    bridges: Rc<RefCell<BTreeMap<ProviderEventKind, Closure<dyn FnMut(JsValue)>>>>,
}

impl InjectedWallet {
    pub fn new(wallet: TrashpackWallet) -> Self {
        Self {
            wallet,
            events: Rc::default(),
            bridges: Rc::default(),
        }
    }

    pub fn as_js(&self) -> &TrashpackWallet {
        &self.wallet
    }
}

impl WalletProvider for InjectedWallet {
    fn is_trashpack(&self) -> bool {
        self.wallet.is_trashpack().unwrap_or(false)
    }

    fn is_connected(&self) -> bool {
        self.wallet.is_connected().unwrap_or(false)
    }

    fn public_key(&self) -> Option<WalletIdentity> {
        identity(self.wallet.public_key())
    }

    async fn connect(&self) -> Result<Option<WalletIdentity>, ProviderError> {
        let result = self.wallet.connect().await.map_err(provider_error)?;
        Ok(property(&result, "publicKey").and_then(identity))
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.wallet.disconnect().await.map_err(provider_error)?;
        Ok(())
    }

    async fn sign_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<Transaction>, ProviderError> {
        let signed = self
            .wallet
            .sign_transaction(to_js(transaction)?)
            .await
            .map_err(provider_error)?;

        if signed.is_null() || signed.is_undefined() {
            Ok(None)
        } else {
            from_js(signed, "signed transaction").map(Some)
        }
    }

    async fn sign_all_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<Option<Vec<Transaction>>, ProviderError> {
        let signed = self
            .wallet
            .sign_all_transactions(to_js(transactions)?)
            .await
            .map_err(provider_error)?;

        if signed.is_null() || signed.is_undefined() {
            Ok(None)
        } else {
            from_js(signed, "signed transactions").map(Some)
        }
    }

    async fn sign_and_send_transaction(
        &self,
        transaction: &Transaction,
        options: &SendOptions,
    ) -> Result<Signature, ProviderError> {
        #[derive(serde::Deserialize)]
        struct Sent {
            signature: Signature,
        }

        let sent = self
            .wallet
            .sign_and_send_transaction(to_js(transaction)?, to_js(options)?)
            .await
            .map_err(provider_error)?;

        from_js::<Sent>(sent, "transaction signature").map(|sent| sent.signature)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, ProviderError> {
        let signed = self
            .wallet
            .sign_message(Uint8Array::from(message))
            .await
            .map_err(provider_error)?;

        let Some(signature) = property(&signed, "signature") else {
            return Err(ProviderError::internal(format!(
                "Missing signature in {signed:?}"
            )));
        };
        let signature = Uint8Array::new(&signature).to_vec();
        Signature::try_from(signature.as_slice()).map_err(|error| {
            ProviderError::internal(format!("Invalid message signature: {error}"))
        })
    }

    fn on(&self, kind: ProviderEventKind, listener: Listener<ProviderEvent>) -> ListenerId {
        let mut bridges = self.bridges.borrow_mut();
        if !bridges.contains_key(&kind) {
            let events = Rc::clone(&self.events);
            let bridge = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
                events.emit(&provider_event(kind, value));
            });
            self.wallet
                .on(kind.as_str(), bridge.as_ref().unchecked_ref());
            bridges.insert(kind, bridge);
        }

        self.events.on(kind, listener)
    }

    fn off(&self, kind: ProviderEventKind, id: ListenerId) -> bool {
        let removed = self.events.off(kind, id);

        if self.events.listener_count(kind) == 0 {
            if let Some(bridge) = self.bridges.borrow_mut().remove(&kind) {
                self.wallet
                    .off(kind.as_str(), bridge.as_ref().unchecked_ref());
            }
        }

        removed
    }
}

/// The browser window the dApp runs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPlatform;

impl Platform for BrowserPlatform {
    type Wallet = InjectedWallet;

    fn is_supported(&self) -> bool {
        window().is_some() && property(&js_sys::global(), "document").is_some()
    }

    fn is_ios_redirectable(&self) -> bool {
        property(&js_sys::global(), "navigator")
            .and_then(|navigator| property(&navigator, "userAgent"))
            .and_then(|user_agent| user_agent.as_string())
            .is_some_and(|user_agent| is_ios_redirectable(&user_agent))
    }

    fn wallet(&self) -> Option<InjectedWallet> {
        let window = window()?;

        ["trashpack", "solana"]
            .into_iter()
            .filter_map(|name| property(&window, name))
            .find(looks_like_trashpack)
            .map(|wallet| InjectedWallet::new(wallet.unchecked_into()))
    }

    fn location(&self) -> Location {
        let location = window().and_then(|window| property(&window, "location"));
        let read = |name: &str| {
            location
                .as_ref()
                .and_then(|location| property(location, name))
                .and_then(|value| value.as_string())
                .unwrap_or_default()
        };

        Location {
            href: read("href"),
            origin: read("origin"),
        }
    }

    fn redirect(&self, url: &Url) {
        let Some(location) = window().and_then(|window| property(&window, "location")) else {
            warn!(%url, "no window.location to redirect with");
            return;
        };

        if let Err(error) = js_sys::Reflect::set(
            &location,
            &JsValue::from_str("href"),
            &JsValue::from_str(url.as_str()),
        ) {
            warn!(%url, ?error, "failed to redirect");
        }
    }

    async fn sleep(&self, duration: Duration) {
        let timeout = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            trashpack::set_timeout(&resolve, timeout);
        });

        if let Err(error) = JsFuture::from(promise).await {
            warn!(?error, "detection timer failed");
        }
    }
}
