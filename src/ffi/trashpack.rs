use js_sys::{Function, Uint8Array};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// The wallet object the TrashPack extension injects as
    /// `window.trashpack` (and `window.solana` when no other wallet took it).
    #[derive(Clone, PartialEq)]
    pub type TrashpackWallet;

    /// Marker flag identifying the TrashPack extension among the injected
    /// Solana wallets.
    #[wasm_bindgen(method, getter, js_name = "isTrashPack")]
    pub fn is_trashpack(this: &TrashpackWallet) -> Option<bool>;

    /// `true` if the dApp already has an approved connection with the
    /// wallet.
    #[wasm_bindgen(method, getter, js_name = "isConnected")]
    pub fn is_connected(this: &TrashpackWallet) -> Option<bool>;

    /// Public key of the connected account. Depending on the version of the
    /// extension it is either the base58 string or an object with a
    /// `toBytes()` method.
    #[wasm_bindgen(method, getter, js_name = "publicKey")]
    pub fn public_key(this: &TrashpackWallet) -> JsValue;

    /// Prompt the user to approve the connection with the dApp. Resolves to
    /// `{ publicKey }`.
    #[wasm_bindgen(method, catch)]
    pub async fn connect(this: &TrashpackWallet) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    pub async fn disconnect(this: &TrashpackWallet) -> Result<JsValue, JsValue>;

    /// Resolves to the signed transaction.
    #[wasm_bindgen(method, catch, js_name = "signTransaction")]
    pub async fn sign_transaction(
        this: &TrashpackWallet,
        transaction: JsValue,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = "signAllTransactions")]
    pub async fn sign_all_transactions(
        this: &TrashpackWallet,
        transactions: JsValue,
    ) -> Result<JsValue, JsValue>;

    /// Sign the transaction and submit it to the wallet's own RPC node.
    /// Resolves to `{ signature }`, the base58 transaction signature.
    #[wasm_bindgen(method, catch, js_name = "signAndSendTransaction")]
    pub async fn sign_and_send_transaction(
        this: &TrashpackWallet,
        transaction: JsValue,
        options: JsValue,
    ) -> Result<JsValue, JsValue>;

    /// Resolves to `{ signature, publicKey }`, the signature being the raw
    /// 64 bytes.
    #[wasm_bindgen(method, catch, js_name = "signMessage")]
    pub async fn sign_message(this: &TrashpackWallet, message: Uint8Array)
    -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &TrashpackWallet, event: &str, listener: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &TrashpackWallet, event: &str, listener: &Function);
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    pub fn set_timeout(handler: &Function, timeout: i32) -> JsValue;
}
