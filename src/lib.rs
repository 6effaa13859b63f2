/*!

# TrashPack wallet adapter for Solana dApps

This library is meant to be used by web applications that need to interact with the
TrashPack browser extension. It tracks whether the extension is available, manages the
connection with it and forwards the signing requests of the dApp.

## Features

- Detect the injected wallet (or redirect to the TrashPack app on iOS)
- Connect and disconnect, follow the account changes made in the wallet
- Sign and send legacy and versioned transactions
- Sign arbitrary messages

## Usage

Create the adapter for the current page. The detection of the extension starts
in the background:

```no_run
use trashpack_adapter::{AdapterConfig, AdapterEvent, AdapterEventKind, ffi::trashpack_adapter};

let adapter = trashpack_adapter(AdapterConfig::default());

adapter.on(AdapterEventKind::ReadyStateChange, |event: &AdapterEvent| {
    println!("{event:?}");
});
```

Once the wallet is [`ReadyState::Installed`] you can connect to it and use the
connected account:

```no_run
# use trashpack_adapter::{AdapterConfig, ffi::trashpack_adapter};
#
# async fn test() -> anyhow::Result<()> {
# let adapter = trashpack_adapter(AdapterConfig::default());
adapter.connect().await?;

let signature = adapter.sign_message(b"hello").await?;
println!("{:?} signed {signature}", adapter.public_key());
# Ok(()) }
```

Every failing operation is returned to the caller and is also emitted as an
[`AdapterEvent::Error`] to the listeners.

*/

mod adapter;
mod config;
pub mod error;
pub mod event;
pub mod ffi;
pub mod solana;
pub mod wallet;

pub use self::{
    adapter::{
        AdapterEvent, AdapterEventKind, ReadyState, WALLET_ICON, WALLET_NAME, WALLET_URL,
        WalletAdapter,
    },
    config::{
        AdapterConfig, DEFAULT_CONNECT_URL, DEFAULT_DETECTION_INTERVAL_MS,
        DEFAULT_MAX_DETECTION_ATTEMPTS,
    },
    error::{WalletError, WalletErrorKind},
};
